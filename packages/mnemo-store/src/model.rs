use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

pub const SESSION_KEY: &str = "sessionId";

/// A stored record. `created_at` is assigned by the store at first insert and
/// kept across upserts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
	pub id: String,
	pub content: String,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	#[serde(default)]
	pub usefulness: f64,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl MemoryRecord {
	pub fn session_id(&self) -> Option<&str> {
		self.metadata.get(SESSION_KEY).and_then(Value::as_str)
	}

	pub fn to_item(&self) -> MemoryItem {
		MemoryItem {
			id: self.id.clone(),
			content: self.content.clone(),
			metadata: Value::Object(self.metadata.clone()),
			usefulness: self.usefulness,
		}
	}
}

/// An incoming write. Missing `id` means the store generates one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreRequest {
	#[serde(default)]
	pub id: Option<String>,
	#[serde(default)]
	pub content: String,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	#[serde(default)]
	pub usefulness: f64,
}
impl StoreRequest {
	pub fn session_id(&self) -> Option<&str> {
		self.metadata.get(SESSION_KEY).and_then(Value::as_str)
	}

	pub fn into_record(self, created_at: OffsetDateTime) -> MemoryRecord {
		MemoryRecord {
			id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
			content: self.content,
			metadata: self.metadata,
			usefulness: self.usefulness,
			created_at,
		}
	}
}

/// Result of a write. Failures are values, never errors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreOutcome {
	pub ok: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}
impl StoreOutcome {
	pub fn stored(id: String) -> Self {
		Self { ok: true, id: Some(id), error: None }
	}

	pub fn failed(message: impl Into<String>) -> Self {
		Self { ok: false, id: None, error: Some(message.into()) }
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
	pub id: String,
	pub content: String,
	pub metadata: Value,
	pub usefulness: f64,
}
impl MemoryItem {
	pub fn session_id(&self) -> Option<&str> {
		self.metadata.get(SESSION_KEY).and_then(Value::as_str)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
	pub total_memories: u64,
	pub average_usefulness: f64,
	/// Reserved; no in-memory cache layer exists.
	pub cache_size: u64,
}

/// Keep candidates for the requested session, then truncate to `limit`.
pub fn filter_session(items: Vec<MemoryItem>, session: Option<&str>, limit: usize) -> Vec<MemoryItem> {
	let mut filtered: Vec<MemoryItem> = match session {
		Some(session) =>
			items.into_iter().filter(|item| item.session_id() == Some(session)).collect(),
		None => items,
	};

	filtered.truncate(limit);

	filtered
}
