//! Key-value storage backing the comment engine.
//!
//! The engine only needs string keys mapped to string values, plus an atomic
//! increment for the hardened counter. [`KvStore`] captures that surface so the
//! sequence and repository layers can run against Redis in production and an
//! in-memory map under test.

use std::{
    collections::BTreeMap,
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use redis::{
    AsyncCommands, Client, RedisError, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;
use tokio::{sync::OnceCell, time::timeout};
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The value is not a non-negative integer, or incrementing it would overflow.
    #[error("value under {key:?} cannot be incremented")]
    NotACounter { key: String },
}

/// String-to-string storage shared by every request handler.
///
/// Implementations are cheap to clone; clones address the same data.
pub trait KvStore: Clone + Send + Sync + 'static {
    /// Returns `Ok(None)` when the key does not exist.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Writes `value` under `key` with no expiration.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Increments the non-negative integer under `key` by one and returns the
    /// new value. An absent key counts as zero. Anything else is refused with
    /// [`StoreError::NotACounter`] and left as it was.
    fn incr(&self, key: &str) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

/// In-process store, used by tests and by `--store memory`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a key. The engine never deletes; tests use this to open gaps.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.lock().remove(key)
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a consistent map: every mutation is a single insert.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut data = self.lock();
        let current = match data.get(key) {
            Some(raw) => raw.parse::<i64>().ok().filter(|value| *value >= 0),
            None => Some(0),
        };
        let next = current
            .and_then(|value| value.checked_add(1))
            .ok_or_else(|| StoreError::NotACounter {
                key: key.to_string(),
            })?;
        data.insert(key.to_string(), next.to_string());
        Ok(next)
    }
}

/// `INCR` that refuses to touch a negative counter. Redis itself rejects
/// non-integers and overflow.
const GUARDED_INCR: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]))
if current and current < 0 then
    return redis.error_reply('ERR value is negative')
end
return redis.call('INCR', KEYS[1])
"#;

/// Redis-backed store.
///
/// The connection is opened on first use, so the engine starts (and reports
/// `StoreUnavailable`) even while Redis is down.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    incr_script: Arc<Script>,
    op_timeout: Duration,
}

impl RedisStore {
    /// `endpoint` is `host:port`, as in `REDIS_ENDPOINT`.
    pub fn open(endpoint: &str, op_timeout: Duration) -> Result<Self, StoreError> {
        let url = format!("redis://{endpoint}/");
        let client = Client::open(url.as_str()).map_err(unavailable)?;

        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
            incr_script: Arc::new(Script::new(GUARDED_INCR)),
            op_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                debug!("opening redis connection");
                let config = ConnectionManagerConfig::new().set_number_of_retries(1);
                self.client
                    .get_connection_manager_with_config(config)
                    .await
                    .map_err(unavailable)
            });

        match timeout(self.op_timeout, manager).await {
            Ok(manager) => Ok(manager?.clone()),
            Err(_) => Err(StoreError::Unavailable(
                "timed out connecting to redis".to_string(),
            )),
        }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        timeout(self.op_timeout, op).await.unwrap_or_else(|_| {
            Err(StoreError::Unavailable(
                "timed out waiting for redis".to_string(),
            ))
        })
    }
}

impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        self.bounded(async move { conn.get(key).await.map_err(unavailable) })
            .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        self.bounded(async move { conn.set(key, value).await.map_err(unavailable) })
            .await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.connection().await?;
        self.bounded(async move {
            self.incr_script
                .key(key)
                .invoke_async(&mut conn)
                .await
                .map_err(|err: RedisError| {
                    if is_transport_error(&err) {
                        unavailable(err)
                    } else {
                        StoreError::NotACounter {
                            key: key.to_string(),
                        }
                    }
                })
        })
        .await
    }
}

fn is_transport_error(err: &RedisError) -> bool {
    err.is_io_error()
        || err.is_timeout()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
}

fn unavailable(err: RedisError) -> StoreError {
    warn!(error = %err, "problem with redis");
    StoreError::Unavailable(err.to_string())
}
