// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The record model shared by the versioned cache and its record source.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name reserved for the record identity.
const ID_FIELD: &str = "id";

/// A stable type descriptor distinguishing record kinds.
///
/// Kinds namespace record identities: the same id under two kinds names two
/// different records. A typical kind is a canonical path such as `zen/moon/bar`.
///
/// # Examples
///
/// ```
/// use vcache_tier::Kind;
///
/// let kind = Kind::new("shop/product");
/// assert_eq!(kind.as_str(), "shop/product");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(Arc<str>);

impl Kind {
    /// Creates a kind from its descriptor.
    #[must_use]
    pub fn new(descriptor: impl AsRef<str>) -> Self {
        Self(Arc::from(descriptor.as_ref()))
    }

    /// Returns the descriptor string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Kind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An opaque record identifier assigned by the record source.
///
/// Identifiers are either text or unsigned numbers; the distinction survives
/// a trip through the remote cache so a reloaded record compares equal to the
/// saved one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// A numeric identifier.
    Number(u64),
    /// A textual identifier.
    Text(String),
}

impl RecordId {
    /// Interprets a JSON value as an identifier.
    ///
    /// Returns `None` for anything other than a string or an unsigned integer.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Number(number) => number.as_u64().map(Self::Number),
            _ => None,
        }
    }

    /// Converts the identifier into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Number(number) => Value::from(*number),
            Self::Text(text) => Value::from(text.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A snapshot of one record: its kind, its identity once assigned, and its fields.
///
/// The `id` field name is reserved: setting a field called `id` sets the
/// identity instead.
///
/// # Examples
///
/// ```
/// use vcache_tier::{Kind, Record, RecordId};
///
/// let record = Record::new(Kind::new("shop/product"))
///     .with_id("p1")
///     .with_field("price", 12);
///
/// assert_eq!(record.id(), Some(&RecordId::from("p1")));
/// assert_eq!(record.field("price"), Some(&serde_json::json!(12)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    kind: Kind,
    id: Option<RecordId>,
    fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record of the given kind with no identity.
    #[must_use]
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            id: None,
            fields: Map::new(),
        }
    }

    /// Creates a record from its parts.
    ///
    /// An `id` entry inside `fields` is moved into the identity.
    #[must_use]
    pub fn from_parts(kind: Kind, id: Option<RecordId>, fields: Map<String, Value>) -> Self {
        let mut record = Self::new(kind);
        record.id = id;
        for (name, value) in fields {
            record.set_field(name, value);
        }
        record
    }

    /// Sets the identity, returning the record.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets a field, returning the record.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Returns the record kind.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Returns the identity, if one has been assigned.
    #[must_use]
    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    /// Assigns the identity.
    pub fn set_id(&mut self, id: impl Into<RecordId>) {
        self.id = Some(id.into());
    }

    /// Returns a field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field value; a field named `id` sets the identity.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if name == ID_FIELD {
            self.id = RecordId::from_value(&value);
            return;
        }
        self.fields.insert(name, value);
    }

    /// Returns all fields except the identity.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns `true` when every field of the filter equals the record's value for it.
    ///
    /// An `id` entry in the filter is compared with the identity.
    #[must_use]
    pub fn matches(&self, filter: &Map<String, Value>) -> bool {
        filter.iter().all(|(name, expected)| {
            if name == ID_FIELD {
                self.id.as_ref().is_some_and(|id| &id.to_value() == expected)
            } else {
                self.fields.get(name) == Some(expected)
            }
        })
    }
}

/// A load or remove query.
///
/// Only identity-shaped queries are eligible for caching: a bare id, or a
/// field filter holding exactly one field, `id`. Every other filter is an
/// arbitrary predicate query the cache cannot answer.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vcache_tier::{Query, RecordId};
///
/// assert_eq!(Query::id("p1").identity(), Some(RecordId::from("p1")));
///
/// let by_id = Query::from_value(json!({ "id": 7 })).unwrap();
/// assert_eq!(by_id.identity(), Some(RecordId::from(7_u64)));
///
/// let by_fields = Query::from_value(json!({ "id": 7, "price": 12 })).unwrap();
/// assert_eq!(by_fields.identity(), None);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// A bare record identifier.
    Id(RecordId),
    /// A field filter.
    Fields(Map<String, Value>),
}

impl Query {
    /// Creates a bare-id query.
    #[must_use]
    pub fn id(id: impl Into<RecordId>) -> Self {
        Self::Id(id.into())
    }

    /// Creates a field-filter query.
    #[must_use]
    pub fn fields(fields: Map<String, Value>) -> Self {
        Self::Fields(fields)
    }

    /// Interprets a JSON value as a query.
    ///
    /// Strings and unsigned numbers become bare-id queries, objects become
    /// field filters; anything else yields `None`.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::Fields(fields)),
            other => RecordId::from_value(&other).map(Self::Id),
        }
    }

    /// Returns the identity when the query is identity-shaped.
    #[must_use]
    pub fn identity(&self) -> Option<RecordId> {
        match self {
            Self::Id(id) => Some(id.clone()),
            Self::Fields(fields) if fields.len() == 1 => fields.get(ID_FIELD).and_then(RecordId::from_value),
            Self::Fields(_) => None,
        }
    }

    /// Returns `true` when the record satisfies the query.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Id(id) => record.id() == Some(id),
            Self::Fields(fields) => record.matches(fields),
        }
    }
}

impl From<RecordId> for Query {
    fn from(value: RecordId) -> Self {
        Self::Id(value)
    }
}
