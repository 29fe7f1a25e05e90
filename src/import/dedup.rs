//! Pre-run snapshot of feed product ids already in storage.

use rocket_db_pools::sqlx::{self, PgPool};
use std::collections::HashSet;

/// Immutable set of every `feed_product_id` known at run start.
///
/// Loaded with a single bulk query before the import loop begins and never
/// refreshed during the run: rows flushed later in the same run are invisible
/// to the snapshot, so a feed file that repeats an id queues every occurrence
/// for insertion.
pub struct DedupSnapshot {
    known: HashSet<String>,
}

impl DedupSnapshot {
    /// Load all known feed product ids in one pass.
    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT feed_product_id FROM products")
            .fetch_all(pool)
            .await?;

        Ok(Self {
            known: ids.into_iter().collect(),
        })
    }

    /// Whether storage already carried this feed id when the run started.
    pub fn contains(&self, feed_product_id: &str) -> bool {
        self.known.contains(feed_product_id)
    }

    /// Number of ids captured by the snapshot.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_hit_only_snapshotted_ids() {
        let snapshot = DedupSnapshot {
            known: ["100".to_string(), "200".to_string()].into_iter().collect(),
        };

        assert!(snapshot.contains("100"));
        assert!(snapshot.contains("200"));
        assert!(!snapshot.contains("300"));
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.is_empty());
    }
}
