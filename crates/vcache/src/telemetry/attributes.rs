// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const KIND_NAME: &str = "vcache.kind";

#[cfg(test)]
pub(crate) const KEY_NAME: &str = "vcache.key";

#[cfg(any(feature = "metrics", test))]
pub(crate) const EVENT_NAME: &str = "vcache.event";
