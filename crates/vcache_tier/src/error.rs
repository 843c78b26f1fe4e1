// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for remote cache operations.

/// An error from a remote cache operation.
///
/// This is an opaque error type that can wrap any underlying error from a
/// remote cache client (network, timeout, protocol). Use
/// [`std::error::Error::source()`] to access the underlying cause if needed.
///
/// # Example
///
/// ```
/// use vcache_tier::Error;
///
/// let error = Error::from_message("connection reset");
/// ```
#[ohno::error]
pub struct Error {}

impl Error {
    /// Creates a new error from any type that can be converted to an error.
    ///
    /// This is the public API for creating remote cache errors from external crates.
    ///
    /// # Examples
    ///
    /// ```
    /// use vcache_tier::Error;
    ///
    /// let error = Error::from_message("operation failed");
    /// ```
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}

/// A specialized [`Result`] type for remote cache operations.
pub type Result<T> = std::result::Result<T, Error>;
