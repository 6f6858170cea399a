mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Context, Replication, Service, Storage};

use std::env;

pub const DEFAULT_LISTEN_URL: &str = "http://127.0.0.1:8787";
pub const DEFAULT_TOKEN: &str = "dev-memory-token-12345";

/// Load configuration from the process environment.
pub fn load() -> Result<Config> {
	load_from(|key| env::var(key).ok())
}

/// Load configuration from an arbitrary key/value source.
pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
	let required = |key: &str, default: &str| {
		lookup(key).filter(|value| !value.trim().is_empty()).unwrap_or_else(|| default.to_string())
	};
	let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
	let cfg = Config {
		service: Service {
			listen_url: required("MNEMO_LISTEN_URL", DEFAULT_LISTEN_URL),
			token: required("MNEMO_TOKEN", DEFAULT_TOKEN),
			log_level: required("MNEMO_LOG", "info"),
		},
		storage: Storage {
			driver: required("MNEMO_DRIVER", "sqlite"),
			data_dir: required("MNEMO_DATA_DIR", "./mnemo/data"),
		},
		replication: Replication {
			dual_write: required("MNEMO_DUAL_WRITE", "0") == "1",
			remote_url: optional("MNEMO_REMOTE_URL"),
			remote_key: optional("MNEMO_REMOTE_KEY"),
		},
		context: Context { default_session_id: optional("MNEMO_SESSION_ID") },
	};

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.token.trim().is_empty() {
		return Err(Error::Validation { message: "MNEMO_TOKEN must be non-empty.".to_string() });
	}

	cfg.listen_addr()?;

	Ok(())
}
