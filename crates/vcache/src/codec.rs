// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Encoding of version counters and record snapshots for the remote cache.
//!
//! Counters are ASCII decimal integers so the remote's own increment and a
//! plain read agree on the representation. Snapshots are JSON objects holding
//! the record id and its fields; the kind is implied by the key.

use bytes::Bytes;
use serde_json::{Map, Value};
use vcache_tier::{Kind, Record};

use crate::{Error, Result};

pub(crate) fn encode_counter(value: i64) -> Bytes {
    Bytes::from(value.to_string())
}

pub(crate) fn decode_counter(payload: &[u8]) -> Result<i64> {
    std::str::from_utf8(payload)
        .map_err(Error::from_codec)?
        .trim()
        .parse::<i64>()
        .map_err(Error::from_codec)
}

pub(crate) fn encode_record(record: &Record) -> Result<Bytes> {
    let mut object = Map::with_capacity(record.fields().len() + 1);
    if let Some(id) = record.id() {
        object.insert("id".to_string(), id.to_value());
    }
    object.extend(record.fields().iter().map(|(name, value)| (name.clone(), value.clone())));

    serde_json::to_vec(&Value::Object(object))
        .map(Bytes::from)
        .map_err(Error::from_codec)
}

pub(crate) fn decode_record(kind: &Kind, payload: &[u8]) -> Result<Record> {
    match serde_json::from_slice::<Value>(payload).map_err(Error::from_codec)? {
        Value::Object(fields) => Ok(Record::from_parts(kind.clone(), None, fields)),
        other => Err(Error::from_codec(format!("expected a JSON object snapshot, found {other}"))),
    }
}
