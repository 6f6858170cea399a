use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use mnemo_store::{MemoryItem, model::SESSION_KEY};

use crate::MemoryService;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchMemoriesRequest {
	#[serde(default)]
	pub query: String,
	#[serde(default)]
	pub limit: Option<usize>,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	/// Top-level alternative to `metadata.sessionId`; the metadata shape
	/// wins when both are present.
	#[serde(default, rename = "sessionId")]
	pub session_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchMemoriesResponse {
	pub ok: bool,
	pub items: Vec<MemoryItem>,
}

impl MemoryService {
	pub async fn search_memories(&self, request: SearchMemoriesRequest) -> SearchMemoriesResponse {
		let limit = request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
		let session = request
			.metadata
			.get(SESSION_KEY)
			.and_then(Value::as_str)
			.map(str::to_string)
			.or(request.session_id)
			.or_else(|| self.default_session_id.clone());
		let session = session.as_deref();
		let mut items = self.acting.search(&request.query, limit, session).await;

		// Session-scoped queries that miss the acting store fall back to the
		// replica.
		if items.is_empty() && let Some(session) = session {
			let fallback = self.replica.search(&request.query, limit, Some(session)).await;

			if !fallback.is_empty() {
				debug!(count = fallback.len(), "Search served from the replica.");

				items = fallback;
			}
		}

		SearchMemoriesResponse { ok: true, items }
	}
}
