//! Comment persistence on top of [`Sequence`].

use tracing::{debug, warn};

use crate::{
    error::EngineError,
    sequence::{IncrementMode, Sequence},
    store::KvStore,
};

/// Number of offsets below the high-water mark scanned by [`CommentRepository::latest`].
pub const RECENT_WINDOW: u64 = 10;

const COMMENT_KEY_PREFIX: &str = "comment";

pub fn comment_key(index: u64) -> String {
    format!("{COMMENT_KEY_PREFIX}{index}")
}

#[derive(Clone)]
pub struct CommentRepository<S> {
    store: S,
    sequence: Sequence<S>,
}

impl<S: KvStore> CommentRepository<S> {
    pub fn new(store: S, mode: IncrementMode) -> Self {
        Self {
            sequence: Sequence::new(store.clone(), mode),
            store,
        }
    }

    pub fn sequence(&self) -> &Sequence<S> {
        &self.sequence
    }

    /// Writes `text` under a freshly allocated index and returns that index.
    ///
    /// A failed write leaves the allocated index permanently unused.
    pub async fn store(&self, text: &str) -> Result<u64, EngineError> {
        let index = self.sequence.next_index().await?;
        self.store
            .set(&comment_key(index), text)
            .await
            .inspect_err(|err| warn!(index, error = %err, "allocated index left empty"))?;

        debug!(index, "stored comment");
        Ok(index)
    }

    /// Up to [`RECENT_WINDOW`] comments, newest first.
    ///
    /// Indices with no record are skipped, not backfilled from further down.
    pub async fn latest(&self) -> Result<Vec<String>, EngineError> {
        let high_water = self.sequence.peek_index().await?;
        let mut comments = Vec::new();

        for index in recent_indices(high_water) {
            match self.store.get(&comment_key(index)).await? {
                Some(text) => comments.push(text),
                None => debug!(index, "skipping gap"),
            }
        }

        Ok(comments)
    }
}

/// Candidate indices for the recent scan, descending, stopping before 0.
fn recent_indices(high_water: u64) -> impl Iterator<Item = u64> {
    (0..RECENT_WINDOW).map_while(move |offset| high_water.checked_sub(offset).filter(|i| *i > 0))
}
