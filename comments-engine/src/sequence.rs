//! Index allocation over a single counter key.
//!
//! The counter lives entirely in the store; this type holds nothing but the
//! store handle and the chosen [`IncrementMode`].

use clap::ValueEnum;
use tracing::warn;

use crate::{error::EngineError, store::KvStore};

/// Store key holding the high-water mark.
pub const COUNTER_KEY: &str = "index";

/// How [`Sequence::next_index`] advances the counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum IncrementMode {
    /// Store-native increment-and-get. Concurrent callers always receive
    /// distinct indices.
    #[default]
    Atomic,
    /// Read the counter, then write `value + 1`. Two callers that read the same
    /// value both receive `value + 1` and the counter advances only once.
    /// Kept for compatibility with deployments that depend on the old
    /// behavior.
    ReadThenWrite,
}

#[derive(Clone)]
pub struct Sequence<S> {
    store: S,
    mode: IncrementMode,
}

impl<S: KvStore> Sequence<S> {
    pub fn new(store: S, mode: IncrementMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> IncrementMode {
        self.mode
    }

    /// Current high-water mark; an absent counter reads as 0.
    pub async fn peek_index(&self) -> Result<u64, EngineError> {
        match self.store.get(COUNTER_KEY).await? {
            None => Ok(0),
            Some(raw) => parse_counter(&raw),
        }
    }

    /// Allocates the next index and returns it.
    pub async fn next_index(&self) -> Result<u64, EngineError> {
        match self.mode {
            IncrementMode::Atomic => {
                let value = self.store.incr(COUNTER_KEY).await?;
                u64::try_from(value)
                    .ok()
                    .filter(|index| *index > 0)
                    .ok_or_else(|| corrupt(&value.to_string()))
            }
            IncrementMode::ReadThenWrite => {
                let current = self.peek_index().await?;
                let next = current
                    .checked_add(1)
                    .ok_or_else(|| corrupt(&current.to_string()))?;
                self.store.set(COUNTER_KEY, &next.to_string()).await?;
                Ok(next)
            }
        }
    }
}

fn parse_counter(raw: &str) -> Result<u64, EngineError> {
    raw.parse::<u64>().map_err(|_| corrupt(raw))
}

fn corrupt(raw: &str) -> EngineError {
    warn!(key = COUNTER_KEY, value = raw, "problem in stored data");
    EngineError::CorruptState {
        key: COUNTER_KEY.to_string(),
        detail: format!("{raw:?} is not a counter the engine can advance"),
    }
}
