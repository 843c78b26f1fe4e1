// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for versioned cache operations.

use std::fmt;

/// The layer an operation failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// The record source rejected the operation.
    ///
    /// For saves and removes nothing was cached; the caller sees the source's
    /// error as the cause.
    Source,
    /// The shared remote cache failed.
    ///
    /// For saves and removes the record source step has already succeeded, so
    /// the caches may be stale until the next read revalidates the version.
    Remote,
    /// A value read from the remote cache could not be decoded, or a record
    /// could not be encoded for it.
    Codec,
}

impl Layer {
    /// Returns the layer name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Remote => "remote",
            Self::Codec => "codec",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a versioned cache operation.
///
/// Every failure names the [`Layer`] it came from; the underlying error is
/// kept as the cause and is reachable through [`std::error::Error::source()`].
///
/// # Examples
///
/// ```
/// use vcache::{Error, Layer};
///
/// fn describe(error: &Error) -> &'static str {
///     match error.layer() {
///         Layer::Source => "the record store failed",
///         Layer::Remote | Layer::Codec => "the cache failed",
///     }
/// }
/// ```
#[ohno::error]
#[display("vcache {layer} failure")]
pub struct Error {
    layer: Layer,
}

impl Error {
    pub(crate) fn from_source(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(Layer::Source, cause)
    }

    pub(crate) fn from_remote(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(Layer::Remote, cause)
    }

    pub(crate) fn from_codec(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(Layer::Codec, cause)
    }

    /// Returns the layer the operation failed in.
    #[must_use]
    pub fn layer(&self) -> Layer {
        self.layer
    }
}

/// A specialized [`Result`] type for versioned cache operations.
pub type Result<T> = std::result::Result<T, Error>;
