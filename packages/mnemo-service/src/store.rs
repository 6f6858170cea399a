use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use mnemo_store::StoreRequest;

use crate::MemoryService;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreMemoryRequest {
	#[serde(default)]
	pub id: Option<String>,
	#[serde(default)]
	pub content: String,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	#[serde(default)]
	pub usefulness: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreMemoryResponse {
	pub ok: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl MemoryService {
	pub async fn store_memory(&self, request: StoreMemoryRequest) -> StoreMemoryResponse {
		let mut metadata = request.metadata;

		self.apply_default_session(&mut metadata);

		let store_request = StoreRequest {
			id: request.id,
			content: request.content,
			metadata,
			usefulness: request.usefulness,
		};
		let session_scoped = store_request.session_id().is_some();
		let mut mirrored = store_request.clone();
		let outcome = self.acting.store(store_request).await;

		if outcome.ok && self.dual_write && session_scoped {
			// Mirror under the id the acting store settled on, so both
			// stores hold the same record.
			mirrored.id = outcome.id.clone();

			// At-most-once delivery: the response never waits on the replica
			// and a failed mirror is only logged.
			let replica = Arc::clone(&self.replica);

			tokio::spawn(async move {
				let replicated = replica.store(mirrored).await;

				if replicated.ok {
					debug!(id = ?replicated.id, "Mirrored memory to the replica.");
				} else {
					warn!(error = ?replicated.error, "Replica write failed.");
				}
			});
		}

		StoreMemoryResponse { ok: outcome.ok, id: outcome.id, error: outcome.error }
	}
}
