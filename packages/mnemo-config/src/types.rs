use std::net::SocketAddr;

use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub replication: Replication,
	pub context: Context,
}
impl Config {
	/// Derive the bind address from the configured listen URL.
	pub fn listen_addr(&self) -> Result<SocketAddr> {
		let raw = self.service.listen_url.trim();
		let rest = raw
			.strip_prefix("http://")
			.or_else(|| raw.strip_prefix("https://"))
			.unwrap_or(raw);
		let authority = rest.split('/').next().unwrap_or(rest);

		authority
			.parse()
			.map_err(|_| Error::InvalidListenUrl { value: self.service.listen_url.clone() })
	}
}

#[derive(Clone, Debug)]
pub struct Service {
	/// URL the gateway listens on, e.g. `http://127.0.0.1:8787`.
	pub listen_url: String,
	/// Shared bearer token guarding the `/tools` routes.
	pub token: String,
	pub log_level: String,
}

#[derive(Clone, Debug)]
pub struct Storage {
	/// Backend selector: `sqlite`, `remote`, or anything else for the
	/// ephemeral fallback.
	pub driver: String,
	pub data_dir: String,
}

#[derive(Clone, Debug)]
pub struct Replication {
	pub dual_write: bool,
	pub remote_url: Option<String>,
	pub remote_key: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Context {
	/// Filled into store/search requests that carry no `sessionId`.
	pub default_session_id: Option<String>,
}
