use std::collections::HashMap;

use mnemo_config::{DEFAULT_LISTEN_URL, DEFAULT_TOKEN, load_from};

fn from_pairs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
	pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
}

#[test]
fn load_applies_defaults_when_unset() {
	let cfg = load_from(|_| None).expect("config");

	assert_eq!(cfg.service.listen_url, DEFAULT_LISTEN_URL);
	assert_eq!(cfg.service.token, DEFAULT_TOKEN);
	assert_eq!(cfg.storage.driver, "sqlite");
	assert!(!cfg.replication.dual_write);
	assert_eq!(cfg.replication.remote_url, None);
	assert_eq!(cfg.context.default_session_id, None);
}

#[test]
fn load_reads_overrides() {
	let vars = from_pairs(&[
		("MNEMO_DRIVER", "remote"),
		("MNEMO_LISTEN_URL", "http://0.0.0.0:9900"),
		("MNEMO_TOKEN", "secret"),
		("MNEMO_DUAL_WRITE", "1"),
		("MNEMO_REMOTE_URL", "https://replica.example.com"),
		("MNEMO_REMOTE_KEY", "service-key"),
		("MNEMO_SESSION_ID", "sess_a"),
	]);
	let cfg = load_from(|key| vars.get(key).cloned()).expect("config");

	assert_eq!(cfg.storage.driver, "remote");
	assert_eq!(cfg.service.token, "secret");
	assert!(cfg.replication.dual_write);
	assert_eq!(cfg.replication.remote_url.as_deref(), Some("https://replica.example.com"));
	assert_eq!(cfg.replication.remote_key.as_deref(), Some("service-key"));
	assert_eq!(cfg.context.default_session_id.as_deref(), Some("sess_a"));
}

#[test]
fn blank_values_fall_back_to_defaults() {
	let vars = from_pairs(&[("MNEMO_REMOTE_URL", "  "), ("MNEMO_DRIVER", "")]);
	let cfg = load_from(|key| vars.get(key).cloned()).expect("config");

	assert_eq!(cfg.storage.driver, "sqlite");
	assert_eq!(cfg.replication.remote_url, None);
}

#[test]
fn listen_addr_strips_scheme_and_path() {
	let cfg = load_from(|_| None).expect("config");

	assert_eq!(cfg.listen_addr().expect("addr").to_string(), "127.0.0.1:8787");

	let vars = from_pairs(&[("MNEMO_LISTEN_URL", "http://0.0.0.0:8000/")]);
	let cfg = load_from(|key| vars.get(key).cloned()).expect("config");

	assert_eq!(cfg.listen_addr().expect("addr").to_string(), "0.0.0.0:8000");
}

#[test]
fn unparsable_listen_url_is_rejected() {
	let vars = from_pairs(&[("MNEMO_LISTEN_URL", "not a url")]);

	assert!(load_from(|key| vars.get(key).cloned()).is_err());
}
