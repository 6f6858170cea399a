//! Durable backend: a SQLite file with a derived FTS5 index.

use std::path::Path;

use serde_json::{Map, Value};
use sqlx::{
	Row, SqlitePool,
	sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, warn};

use crate::{
	BoxFuture, MemoryStore, OVERFETCH_FACTOR, Result,
	model::{self, MemoryItem, MemoryStats, StoreOutcome, StoreRequest},
};

const DB_FILE: &str = "memory.sqlite";
const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS memories (
	id TEXT PRIMARY KEY,
	content TEXT NOT NULL,
	metadata TEXT NOT NULL,
	usefulness REAL NOT NULL,
	created_at TEXT NOT NULL
);
CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(content, id UNINDEXED)";

pub struct SqliteStore {
	pool: SqlitePool,
}
impl SqliteStore {
	/// Open (creating if needed) the database under `data_dir` and bootstrap
	/// the schema. WAL mode provides the single-writer guarantee concurrent
	/// stores rely on.
	pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
		let data_dir = data_dir.as_ref();

		std::fs::create_dir_all(data_dir)?;

		let options = SqliteConnectOptions::new()
			.filename(data_dir.join(DB_FILE))
			.create_if_missing(true)
			.journal_mode(SqliteJournalMode::Wal)
			.busy_timeout(std::time::Duration::from_secs(5));
		let pool = SqlitePoolOptions::new().max_connections(4).connect_with(options).await?;

		for statement in SCHEMA.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&pool).await?;
		}

		Ok(Self { pool })
	}

	async fn try_store(&self, request: StoreRequest) -> Result<String> {
		let record = request.into_record(OffsetDateTime::now_utc());
		let metadata = serde_json::to_string(&record.metadata)?;
		let created_at = record.created_at.format(&Rfc3339)?;

		// created_at is deliberately absent from the update set: the insert
		// time survives upserts.
		sqlx::query(
			"\
INSERT INTO memories (id, content, metadata, usefulness, created_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(id) DO UPDATE SET
	content = excluded.content,
	metadata = excluded.metadata,
	usefulness = excluded.usefulness",
		)
		.bind(&record.id)
		.bind(&record.content)
		.bind(&metadata)
		.bind(record.usefulness)
		.bind(&created_at)
		.execute(&self.pool)
		.await?;

		// The durable row is the invariant; the index is best-effort.
		if let Err(err) = self.reindex(&record.id, &record.content).await {
			warn!(id = record.id.as_str(), %err, "Full-text reindex failed.");
		}

		Ok(record.id)
	}

	async fn reindex(&self, id: &str, content: &str) -> Result<()> {
		sqlx::query("DELETE FROM memories_fts WHERE id = ?1")
			.bind(id)
			.execute(&self.pool)
			.await?;
		sqlx::query("INSERT INTO memories_fts (content, id) VALUES (?1, ?2)")
			.bind(content)
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn try_search(
		&self,
		query: &str,
		limit: usize,
		session: Option<&str>,
	) -> Result<Vec<MemoryItem>> {
		let fetch = (limit.saturating_mul(OVERFETCH_FACTOR)) as i64;
		let rows = match sqlx::query_as::<_, MemoryRow>(
			"\
SELECT m.id, m.content, m.metadata, m.usefulness
FROM memories_fts f
JOIN memories m ON m.id = f.id
WHERE f MATCH ?1
LIMIT ?2",
		)
		.bind(query)
		.bind(fetch)
		.fetch_all(&self.pool)
		.await
		{
			Ok(rows) => rows,
			Err(err) => {
				// Malformed MATCH syntax (or a missing index) degrades to an
				// unordered scan of the primary table.
				debug!(%err, "FTS query failed, scanning the primary table.");

				sqlx::query_as::<_, MemoryRow>(
					"SELECT id, content, metadata, usefulness FROM memories LIMIT ?1",
				)
				.bind(fetch)
				.fetch_all(&self.pool)
				.await?
			},
		};
		let items = rows.into_iter().map(MemoryRow::into_item).collect();

		Ok(model::filter_session(items, session, limit))
	}

	async fn try_stats(&self) -> Result<MemoryStats> {
		let row = sqlx::query(
			"SELECT COUNT(*) AS total, COALESCE(AVG(usefulness), 0.0) AS average FROM memories",
		)
		.fetch_one(&self.pool)
		.await?;
		let total: i64 = row.try_get("total")?;
		let average: f64 = row.try_get("average")?;

		Ok(MemoryStats {
			total_memories: total as u64,
			average_usefulness: average,
			cache_size: 0,
		})
	}
}

impl MemoryStore for SqliteStore {
	fn kind(&self) -> &str {
		"sqlite"
	}

	fn store<'a>(&'a self, request: StoreRequest) -> BoxFuture<'a, StoreOutcome> {
		Box::pin(async move {
			match self.try_store(request).await {
				Ok(id) => {
					debug!(id = id.as_str(), "Stored memory.");

					StoreOutcome::stored(id)
				},
				Err(err) => {
					warn!(%err, "Store failed.");

					StoreOutcome::failed(err.to_string())
				},
			}
		})
	}

	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: usize,
		session: Option<&'a str>,
	) -> BoxFuture<'a, Vec<MemoryItem>> {
		Box::pin(async move {
			if query.trim().is_empty() {
				return Vec::new();
			}

			match self.try_search(query, limit, session).await {
				Ok(items) => items,
				Err(err) => {
					warn!(%err, "Search failed.");

					Vec::new()
				},
			}
		})
	}

	fn stats<'a>(&'a self) -> BoxFuture<'a, MemoryStats> {
		Box::pin(async move {
			match self.try_stats().await {
				Ok(stats) => stats,
				Err(err) => {
					warn!(%err, "Stats query failed.");

					MemoryStats::default()
				},
			}
		})
	}
}

#[derive(sqlx::FromRow)]
struct MemoryRow {
	id: String,
	content: String,
	metadata: String,
	usefulness: f64,
}
impl MemoryRow {
	fn into_item(self) -> MemoryItem {
		let metadata =
			serde_json::from_str(&self.metadata).unwrap_or_else(|_| Value::Object(Map::new()));

		MemoryItem {
			id: self.id,
			content: self.content,
			metadata,
			usefulness: self.usefulness,
		}
	}
}
