//! Shared test scaffolding: temp data dirs and config builders.

use std::path::Path;

use tempfile::TempDir;

use mnemo_config::{Config, Context, Replication, Service, Storage};

pub const TEST_TOKEN: &str = "test-token";

/// A throwaway data directory, removed on drop.
pub struct TestDir {
	dir: TempDir,
}
impl TestDir {
	pub fn new() -> Self {
		Self { dir: TempDir::new().expect("failed to create temp data dir") }
	}

	pub fn path(&self) -> &Path {
		self.dir.path()
	}
}
impl Default for TestDir {
	fn default() -> Self {
		Self::new()
	}
}

/// A full config for tests: loopback listen URL, the shared test token, no
/// replication.
pub fn test_config(driver: &str, data_dir: &Path) -> Config {
	Config {
		service: Service {
			listen_url: "http://127.0.0.1:0".to_string(),
			token: TEST_TOKEN.to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage {
			driver: driver.to_string(),
			data_dir: data_dir.display().to_string(),
		},
		replication: Replication { dual_write: false, remote_url: None, remote_key: None },
		context: Context { default_session_id: None },
	}
}
