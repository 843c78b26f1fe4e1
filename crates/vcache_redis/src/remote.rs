// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use vcache_tier::{Error, RemoteCache};

/// Increments a counter only when it exists; replies nil otherwise.
const INCR_IF_PRESENT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return redis.call('INCRBY', KEYS[1], ARGV[1])
end
return false
";

/// A [`RemoteCache`] backed by a Redis server.
///
/// Commands run over a [`ConnectionManager`], which reconnects on its own
/// after connection failures; the failed command itself is reported as an
/// error. Clones share the same connection.
///
/// | Operation | Redis command |
/// |---|---|
/// | `get` | `GET` |
/// | `set` | `SET key value EX ttl` |
/// | `add` | `SET key value EX ttl NX` |
/// | `incr` | `INCRBY` inside a script, only when the key exists |
/// | `delete` | `DEL` |
///
/// Expiries are rounded up to whole seconds, with a minimum of one second.
#[derive(Clone)]
pub struct RedisRemote {
    conn: ConnectionManager,
    incr_script: Script,
}

impl fmt::Debug for RedisRemote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisRemote").finish_non_exhaustive()
    }
}

impl RedisRemote {
    /// Wraps an established connection manager.
    #[must_use]
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            incr_script: Script::new(INCR_IF_PRESENT),
        }
    }

    /// Connects to the Redis server at `url`, e.g. `redis://127.0.0.1:6379`.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is invalid or the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = Client::open(url).map_err(Error::from_message)?;
        let conn = ConnectionManager::new(client).await.map_err(Error::from_message)?;
        tracing::debug!(redis.url = url, "vcache.redis.connected");
        Ok(Self::new(conn))
    }
}

impl RemoteCache for RedisRemote {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, Error> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(Error::from_message)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), Error> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value.as_ref())
            .arg("EX")
            .arg(ttl_seconds(ttl))
            .query_async(&mut conn)
            .await
            .map_err(Error::from_message)
    }

    async fn add(&self, key: &str, value: Bytes, ttl: Duration) -> Result<bool, Error> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value.as_ref())
            .arg("EX")
            .arg(ttl_seconds(ttl))
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(Error::from_message)?;
        Ok(reply.is_some())
    }

    async fn incr(&self, key: &str, delta: u64) -> Result<Option<i64>, Error> {
        let mut conn = self.conn.clone();
        self.incr_script
            .key(key)
            .arg(delta)
            .invoke_async(&mut conn)
            .await
            .map_err(Error::from_message)
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(Error::from_message)
    }
}

/// Rounds an expiry up to whole seconds, never below one.
fn ttl_seconds(ttl: Duration) -> u64 {
    let seconds = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    seconds.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_rounds_up_to_whole_seconds() {
        assert_eq!(ttl_seconds(Duration::from_secs(3600)), 3600);
        assert_eq!(ttl_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_seconds(Duration::from_millis(1)), 1);
    }

    #[test]
    fn zero_ttl_becomes_one_second() {
        assert_eq!(ttl_seconds(Duration::ZERO), 1);
    }
}
