// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Derivation of version and data keys.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use vcache_tier::{Kind, RecordId};

const SEPARATOR: char = '~';
const NUMBER_TAG: char = '#';

/// Builds the remote cache keys for a record identity.
///
/// Keys have the shape `{prefix}~v~{kind}~{id}` for the version counter and
/// `{prefix}~d~{version}~{kind}~{id}` for the snapshot written at a version.
/// Inside the prefix, kind and id, `%` is written as `%25`, `~` as `%7E` and
/// `#` as `%23`, so the separator never occurs within a component. Numeric ids
/// are tagged with a leading `#`, which keeps `7` and `"7"` apart. Distinct
/// identities or versions never share a key.
///
/// # Examples
///
/// ```
/// use vcache::KeyScheme;
/// use vcache_tier::{Kind, RecordId};
///
/// let keys = KeyScheme::new("app");
/// let kind = Kind::new("zen/moon/bar");
/// let id = RecordId::from("x1");
///
/// assert_eq!(keys.version_key(&kind, &id), "app~v~zen/moon/bar~x1");
/// assert_eq!(keys.data_key(&kind, &id, 3), "app~d~3~zen/moon/bar~x1");
/// assert_eq!(keys.version_key(&kind, &RecordId::from(7_u64)), "app~v~zen/moon/bar~#7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    prefix: Arc<str>,
}

impl KeyScheme {
    /// Creates a key scheme that namespaces every key under `prefix`.
    #[must_use]
    pub fn new(prefix: impl AsRef<str>) -> Self {
        Self {
            prefix: Arc::from(escape(prefix.as_ref())),
        }
    }

    /// Returns the key of the version counter for a record identity.
    #[must_use]
    pub fn version_key(&self, kind: &Kind, id: &RecordId) -> String {
        format!(
            "{prefix}{SEPARATOR}v{SEPARATOR}{kind}{SEPARATOR}{id}",
            prefix = self.prefix,
            kind = escape(kind.as_str()),
            id = IdComponent(id),
        )
    }

    /// Returns the key of the snapshot written at `version` for a record identity.
    #[must_use]
    pub fn data_key(&self, kind: &Kind, id: &RecordId, version: u64) -> String {
        format!(
            "{prefix}{SEPARATOR}d{SEPARATOR}{version}{SEPARATOR}{kind}{SEPARATOR}{id}",
            prefix = self.prefix,
            kind = escape(kind.as_str()),
            id = IdComponent(id),
        )
    }
}

/// Renders a record id as a key component.
struct IdComponent<'a>(&'a RecordId);

impl fmt::Display for IdComponent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            RecordId::Number(number) => write!(f, "{NUMBER_TAG}{number}"),
            RecordId::Text(text) => f.write_str(&escape(text)),
        }
    }
}

fn escape(component: &str) -> Cow<'_, str> {
    if !component.contains(['%', SEPARATOR, NUMBER_TAG]) {
        return Cow::Borrowed(component);
    }

    let mut escaped = String::with_capacity(component.len() + 4);
    for c in component.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            SEPARATOR => escaped.push_str("%7E"),
            NUMBER_TAG => escaped.push_str("%23"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}
