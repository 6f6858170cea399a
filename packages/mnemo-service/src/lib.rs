//! The replication coordinator: composes the acting store with the replica
//! and applies the dual-write and fallback-read policies.

pub mod search;
pub mod stats;
pub mod store;

pub use search::{DEFAULT_SEARCH_LIMIT, SearchMemoriesRequest, SearchMemoriesResponse};
pub use stats::GetStatsResponse;
pub use store::{StoreMemoryRequest, StoreMemoryResponse};

use std::sync::Arc;

use serde_json::{Map, Value, json};

use mnemo_store::{MemoryStore, model::SESSION_KEY};

pub struct MemoryService {
	acting: Arc<dyn MemoryStore>,
	replica: Arc<dyn MemoryStore>,
	dual_write: bool,
	default_session_id: Option<String>,
}
impl MemoryService {
	pub fn new(
		acting: Arc<dyn MemoryStore>,
		replica: Arc<dyn MemoryStore>,
		dual_write: bool,
		default_session_id: Option<String>,
	) -> Self {
		Self { acting, replica, dual_write, default_session_id }
	}

	pub fn driver_kind(&self) -> &str {
		self.acting.kind()
	}

	pub fn dual_write(&self) -> bool {
		self.dual_write
	}

	/// Fill the configured default session id into metadata that carries
	/// none. A no-op unless a default is configured.
	fn apply_default_session(&self, metadata: &mut Map<String, Value>) {
		if metadata.get(SESSION_KEY).and_then(Value::as_str).is_some() {
			return;
		}

		if let Some(default) = &self.default_session_id {
			metadata.insert(SESSION_KEY.to_string(), json!(default));
		}
	}
}
