//! Record store backends and the capability contract they satisfy.

pub mod ephemeral;
pub mod model;
pub mod remote;
pub mod sqlite;
pub mod time_serde;

mod error;

pub use error::{Error, Result};
pub use model::{MemoryItem, MemoryRecord, MemoryStats, StoreOutcome, StoreRequest};

use std::{future::Future, pin::Pin, sync::Arc};

use tracing::warn;

use crate::{ephemeral::EphemeralStore, remote::RemoteStore, sqlite::SqliteStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Candidate multiplier applied before session filtering truncates to the
/// requested limit.
pub const OVERFETCH_FACTOR: usize = 3;

/// Capability contract every backend satisfies. Operations never fail:
/// internal errors are absorbed at the backend boundary and surface as
/// `ok: false` outcomes, empty result sets, or zero stats.
pub trait MemoryStore
where
	Self: Send + Sync,
{
	/// Diagnostic backend tag; may embed a fallback note.
	fn kind(&self) -> &str;

	fn store<'a>(&'a self, request: StoreRequest) -> BoxFuture<'a, StoreOutcome>;

	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: usize,
		session: Option<&'a str>,
	) -> BoxFuture<'a, Vec<MemoryItem>>;

	fn stats<'a>(&'a self) -> BoxFuture<'a, MemoryStats>;
}

/// Pick the acting backend from configuration. Evaluated once at startup;
/// configuration problems degrade to the ephemeral store instead of failing
/// the process.
pub async fn select_backend(cfg: &mnemo_config::Config) -> Arc<dyn MemoryStore> {
	match cfg.storage.driver.as_str() {
		"sqlite" => match SqliteStore::open(&cfg.storage.data_dir).await {
			Ok(store) => Arc::new(store),
			Err(err) => {
				warn!(%err, "SQLite store unavailable, degrading to the ephemeral store.");

				Arc::new(EphemeralStore::with_note(&format!("fallback: {err}")))
			},
		},
		"remote" => Arc::new(RemoteStore::new(
			cfg.replication.remote_url.clone(),
			cfg.replication.remote_key.clone(),
		)),
		other => {
			warn!(driver = other, "Unknown driver, degrading to the ephemeral store.");

			Arc::new(EphemeralStore::with_note("unknown-driver"))
		},
	}
}
