//! In-process fallback used when no durable backend is available. Data lives
//! for the process lifetime only.

use std::sync::Mutex;

use time::OffsetDateTime;
use tracing::debug;

use crate::{
	BoxFuture, MemoryStore,
	model::{self, MemoryItem, MemoryRecord, MemoryStats, StoreOutcome, StoreRequest},
};

pub struct EphemeralStore {
	kind: String,
	records: Mutex<Vec<MemoryRecord>>,
}
impl EphemeralStore {
	pub fn new() -> Self {
		Self::tagged("memory".to_string())
	}

	/// Tag the reported kind with a diagnostic note, e.g. why a durable
	/// backend was not selected.
	pub fn with_note(note: &str) -> Self {
		Self::tagged(format!("memory [{note}]"))
	}

	fn tagged(kind: String) -> Self {
		Self { kind, records: Mutex::new(Vec::new()) }
	}
}
impl Default for EphemeralStore {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryStore for EphemeralStore {
	fn kind(&self) -> &str {
		&self.kind
	}

	fn store<'a>(&'a self, request: StoreRequest) -> BoxFuture<'a, StoreOutcome> {
		Box::pin(async move {
			let record = request.into_record(OffsetDateTime::now_utc());
			let id = record.id.clone();
			let mut records = self.records.lock().unwrap_or_else(|err| err.into_inner());

			match records.iter_mut().find(|existing| existing.id == record.id) {
				Some(existing) => {
					existing.content = record.content;
					existing.metadata = record.metadata;
					existing.usefulness = record.usefulness;
				},
				None => records.push(record),
			}

			debug!(id = id.as_str(), "Stored memory in the ephemeral store.");

			StoreOutcome::stored(id)
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

			let needle = query.to_lowercase();
			let items = {
				let records = self.records.lock().unwrap_or_else(|err| err.into_inner());

				records
					.iter()
					.filter(|record| record.content.to_lowercase().contains(&needle))
					.map(MemoryRecord::to_item)
					.collect()
			};

			model::filter_session(items, session, limit)
		})
	}

	fn stats<'a>(&'a self) -> BoxFuture<'a, MemoryStats> {
		Box::pin(async move {
			let records = self.records.lock().unwrap_or_else(|err| err.into_inner());
			let total = records.len();
			let average = if total == 0 {
				0.0
			} else {
				records.iter().map(|record| record.usefulness).sum::<f64>() / total as f64
			};

			MemoryStats {
				total_memories: total as u64,
				average_usefulness: average,
				cache_size: 0,
			}
		})
	}
}
