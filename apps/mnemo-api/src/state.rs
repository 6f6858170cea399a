use std::sync::Arc;

use mnemo_config::Config;
use mnemo_service::MemoryService;
use mnemo_store::{remote::RemoteStore, select_backend};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MemoryService>,
	pub token: String,
}
impl AppState {
	/// Construction never fails: configuration problems degrade to fallback
	/// backends and are visible through `/health`.
	pub async fn new(config: Config) -> Self {
		let acting = select_backend(&config).await;
		let replica = Arc::new(RemoteStore::new(
			config.replication.remote_url.clone(),
			config.replication.remote_key.clone(),
		));
		let service = MemoryService::new(
			acting,
			replica,
			config.replication.dual_write,
			config.context.default_session_id.clone(),
		);

		Self { service: Arc::new(service), token: config.service.token }
	}
}
