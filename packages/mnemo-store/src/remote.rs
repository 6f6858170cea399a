//! Optional remote replica speaking the PostgREST wire shape. Unconfigured
//! instances degrade to a no-op state that never touches the network.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
	BoxFuture, Error, MemoryStore, OVERFETCH_FACTOR, Result,
	model::{self, MemoryItem, MemoryStats, StoreOutcome, StoreRequest},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RemoteStore {
	kind: String,
	inner: Option<RemoteInner>,
}
impl RemoteStore {
	pub fn new(url: Option<String>, key: Option<String>) -> Self {
		let (Some(url), Some(key)) = (url, key) else {
			return Self::disabled("remote url/key missing");
		};
		// The connect timeout bounds outbound calls so a slow replica cannot
		// stall the request path.
		let client = match Client::builder()
			.connect_timeout(CONNECT_TIMEOUT)
			.timeout(REQUEST_TIMEOUT)
			.build()
		{
			Ok(client) => client,
			Err(err) => return Self::disabled(&format!("client init failed: {err}")),
		};
		let base = url.trim_end_matches('/').to_string();

		Self { kind: "remote".to_string(), inner: Some(RemoteInner { client, base, key }) }
	}

	fn disabled(note: &str) -> Self {
		Self { kind: format!("remote [disabled: {note}]"), inner: None }
	}

	pub fn is_enabled(&self) -> bool {
		self.inner.is_some()
	}
}

impl MemoryStore for RemoteStore {
	fn kind(&self) -> &str {
		&self.kind
	}

	fn store<'a>(&'a self, request: StoreRequest) -> BoxFuture<'a, StoreOutcome> {
		Box::pin(async move {
			let Some(inner) = &self.inner else {
				return StoreOutcome::failed("remote store disabled");
			};
			let record = request.into_record(OffsetDateTime::now_utc());
			let id = record.id.clone();

			match inner.upsert(&record).await {
				Ok(()) => {
					debug!(id = id.as_str(), "Upserted memory in the remote store.");

					StoreOutcome::stored(id)
				},
				Err(err) => {
					warn!(%err, "Remote upsert failed.");

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
			let Some(inner) = &self.inner else {
				return Vec::new();
			};

			if query.trim().is_empty() {
				return Vec::new();
			}

			// The simplified remote path does not push full-text search: it
			// fetches a recent window and filters here.
			match inner.recent(limit.saturating_mul(OVERFETCH_FACTOR)).await {
				Ok(items) => model::filter_session(items, session, limit),
				Err(err) => {
					warn!(%err, "Remote search failed.");

					Vec::new()
				},
			}
		})
	}

	fn stats<'a>(&'a self) -> BoxFuture<'a, MemoryStats> {
		Box::pin(async move {
			let Some(inner) = &self.inner else {
				return MemoryStats::default();
			};

			match inner.count().await {
				Ok(total) => MemoryStats {
					total_memories: total,
					average_usefulness: 0.0,
					cache_size: 0,
				},
				Err(err) => {
					warn!(%err, "Remote count failed.");

					MemoryStats::default()
				},
			}
		})
	}
}

struct RemoteInner {
	client: Client,
	base: String,
	key: String,
}
impl RemoteInner {
	fn endpoint(&self) -> String {
		format!("{}/rest/v1/memories", self.base)
	}

	async fn upsert(&self, record: &crate::MemoryRecord) -> Result<()> {
		let response = self
			.client
			.post(self.endpoint())
			.header("apikey", &self.key)
			.bearer_auth(&self.key)
			.header("Prefer", "resolution=merge-duplicates")
			.json(record)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(Error::Remote { message: format!("upsert returned {}", response.status()) });
		}

		Ok(())
	}

	async fn recent(&self, fetch: usize) -> Result<Vec<MemoryItem>> {
		let fetch = fetch.to_string();
		let response = self
			.client
			.get(self.endpoint())
			.header("apikey", &self.key)
			.bearer_auth(&self.key)
			.query(&[
				("select", "id,content,metadata,usefulness"),
				("order", "created_at.desc"),
				("limit", fetch.as_str()),
			])
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(Error::Remote { message: format!("select returned {}", response.status()) });
		}

		let rows: Vec<RemoteRow> = response.json().await?;

		Ok(rows.into_iter().map(RemoteRow::into_item).collect())
	}

	async fn count(&self) -> Result<u64> {
		let response = self
			.client
			.get(self.endpoint())
			.header("apikey", &self.key)
			.bearer_auth(&self.key)
			.header("Prefer", "count=exact")
			.header("Range", "0-0")
			.query(&[("select", "id")])
			.send()
			.await?;
		let header = response
			.headers()
			.get("content-range")
			.and_then(|value| value.to_str().ok())
			.ok_or_else(|| Error::Remote { message: "missing content-range header".to_string() })?;

		header
			.rsplit('/')
			.next()
			.and_then(|raw| raw.parse().ok())
			.ok_or_else(|| Error::Remote { message: format!("unparsable content-range {header:?}") })
	}
}

#[derive(Debug, Deserialize)]
struct RemoteRow {
	id: String,
	#[serde(default)]
	content: String,
	#[serde(default)]
	metadata: Value,
	#[serde(default)]
	usefulness: f64,
}
impl RemoteRow {
	fn into_item(self) -> MemoryItem {
		MemoryItem {
			id: self.id,
			content: self.content,
			metadata: self.metadata,
			usefulness: self.usefulness,
		}
	}
}
