use crate::errors::history_error::HistoryError;
use sqlx::{
    Row,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use std::str::FromStr;

/// One persisted chat line, as replayed to a newly joined client.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub sender: String,
    pub text: String,
}

/// Durable chat history, backed by a sqlite database. Appends are
/// best-effort; the router spawns them detached and only logs failures.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    /// Opens (or creates) the database at `path` and makes sure the chats
    /// table exists. `sqlite::memory:` works for tests.
    pub async fn connect(path: &str) -> Result<Self, HistoryError> {
        let options = SqliteConnectOptions::from_str(path)?.create_if_missing(true);

        // One connection keeps writers serialized and keeps an in-memory
        // database from being a different database per pool connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                text TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(HistoryStore { pool })
    }

    /// Appends one chat line. `created_at` is server-assigned Unix
    /// milliseconds.
    pub async fn append(
        &self,
        sender: &str,
        text: &str,
        created_at: i64,
    ) -> Result<(), HistoryError> {
        sqlx::query("INSERT INTO chats (name, text, created_at) VALUES (?, ?, ?)")
            .bind(sender)
            .bind(text)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Returns the `limit` most recent entries, ordered oldest-first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<HistoryEntry>, HistoryError> {
        let rows = sqlx::query(
            "SELECT name, text FROM (
                SELECT id, name, text, created_at FROM chats
                ORDER BY created_at DESC, id DESC LIMIT ?
            ) ORDER BY created_at ASC, id ASC",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| HistoryEntry {
                sender: row.get("name"),
                text: row.get("text"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> HistoryStore {
        HistoryStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn replays_oldest_first() {
        let store = store().await;
        store.append("bob", "third", 30).await.unwrap();
        store.append("alice", "first", 10).await.unwrap();
        store.append("alice", "second", 20).await.unwrap();

        let entries = store.recent(10).await.unwrap();
        let texts: Vec<&str> = entries.iter().map(|entry| entry.text.as_str()).collect();

        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn keeps_only_the_most_recent_entries() {
        let store = store().await;
        for created_at in 1..=5 {
            store
                .append("alice", &format!("line {created_at}"), created_at)
                .await
                .unwrap();
        }

        let entries = store.recent(2).await.unwrap();
        let texts: Vec<&str> = entries.iter().map(|entry| entry.text.as_str()).collect();

        assert_eq!(texts, vec!["line 4", "line 5"]);
    }

    #[tokio::test]
    async fn breaks_timestamp_ties_by_insertion_order() {
        let store = store().await;
        store.append("alice", "one", 10).await.unwrap();
        store.append("bob", "two", 10).await.unwrap();

        let entries = store.recent(10).await.unwrap();

        assert_eq!(
            entries,
            vec![
                HistoryEntry {
                    sender: "alice".to_string(),
                    text: "one".to_string()
                },
                HistoryEntry {
                    sender: "bob".to_string(),
                    text: "two".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn empty_store_replays_nothing() {
        let store = store().await;
        assert!(store.recent(100).await.unwrap().is_empty());
    }
}
