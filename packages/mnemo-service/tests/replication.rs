use std::{sync::Arc, time::Duration};

use serde_json::{Map, json};

use mnemo_service::{MemoryService, SearchMemoriesRequest, StoreMemoryRequest};
use mnemo_store::{MemoryStore, ephemeral::EphemeralStore};

fn session_metadata(session: &str) -> Map<String, serde_json::Value> {
	let mut map = Map::new();

	map.insert("sessionId".to_string(), json!(session));

	map
}

fn store_request(content: &str, session: Option<&str>) -> StoreMemoryRequest {
	StoreMemoryRequest {
		id: None,
		content: content.to_string(),
		metadata: session.map(session_metadata).unwrap_or_default(),
		usefulness: 0.0,
	}
}

fn search_request(query: &str, session: Option<&str>) -> SearchMemoriesRequest {
	SearchMemoriesRequest {
		query: query.to_string(),
		limit: None,
		metadata: session.map(session_metadata).unwrap_or_default(),
		session_id: None,
	}
}

fn service(
	acting: Arc<EphemeralStore>,
	replica: Arc<EphemeralStore>,
	dual_write: bool,
	default_session_id: Option<&str>,
) -> MemoryService {
	MemoryService::new(acting, replica, dual_write, default_session_id.map(str::to_string))
}

async fn wait_for_total(store: &EphemeralStore, expected: u64) {
	for _ in 0..100 {
		if store.stats().await.total_memories == expected {
			return;
		}

		tokio::time::sleep(Duration::from_millis(10)).await;
	}

	panic!("store never reached {expected} records");
}

#[tokio::test]
async fn dual_write_mirrors_session_scoped_stores() {
	let acting = Arc::new(EphemeralStore::new());
	let replica = Arc::new(EphemeralStore::new());
	let service = service(Arc::clone(&acting), Arc::clone(&replica), true, None);

	let response = service.store_memory(store_request("build failed on CI", Some("s1"))).await;

	assert!(response.ok);

	let id = response.id.expect("assigned id");

	// The response does not wait on the mirror; it lands shortly after.
	wait_for_total(&replica, 1).await;

	let mirrored = replica.search("failed", 10, Some("s1")).await;

	assert_eq!(mirrored.len(), 1);
	assert_eq!(mirrored[0].id, id);
	assert_eq!(acting.stats().await.total_memories, 1);
}

#[tokio::test]
async fn dual_write_skips_records_without_a_session() {
	let acting = Arc::new(EphemeralStore::new());
	let replica = Arc::new(EphemeralStore::new());
	let service = service(Arc::clone(&acting), Arc::clone(&replica), true, None);

	assert!(service.store_memory(store_request("unscoped", None)).await.ok);

	tokio::time::sleep(Duration::from_millis(50)).await;

	assert_eq!(acting.stats().await.total_memories, 1);
	assert_eq!(replica.stats().await.total_memories, 0);
}

#[tokio::test]
async fn dual_write_disabled_never_touches_the_replica() {
	let acting = Arc::new(EphemeralStore::new());
	let replica = Arc::new(EphemeralStore::new());
	let service = service(Arc::clone(&acting), Arc::clone(&replica), false, None);

	assert!(service.store_memory(store_request("scoped", Some("s1"))).await.ok);

	tokio::time::sleep(Duration::from_millis(50)).await;

	assert_eq!(replica.stats().await.total_memories, 0);
}

#[tokio::test]
async fn session_scoped_misses_fall_back_to_the_replica() {
	let acting = Arc::new(EphemeralStore::new());
	let replica = Arc::new(EphemeralStore::new());

	assert!(
		replica
			.store(mnemo_store::StoreRequest {
				id: Some("r1".to_string()),
				content: "replica only".to_string(),
				metadata: session_metadata("s1"),
				usefulness: 0.0,
			})
			.await
			.ok
	);

	let service = service(acting, replica, false, None);
	let response = service.search_memories(search_request("replica", Some("s1"))).await;

	assert!(response.ok);
	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].id, "r1");
}

#[tokio::test]
async fn unscoped_misses_do_not_fall_back() {
	let acting = Arc::new(EphemeralStore::new());
	let replica = Arc::new(EphemeralStore::new());

	assert!(
		replica
			.store(mnemo_store::StoreRequest {
				id: None,
				content: "replica only".to_string(),
				metadata: session_metadata("s1"),
				usefulness: 0.0,
			})
			.await
			.ok
	);

	let service = service(acting, replica, false, None);
	let response = service.search_memories(search_request("replica", None)).await;

	assert!(response.items.is_empty());
}

#[tokio::test]
async fn acting_store_results_win_over_the_replica() {
	let acting = Arc::new(EphemeralStore::new());
	let replica = Arc::new(EphemeralStore::new());
	let service = service(Arc::clone(&acting), Arc::clone(&replica), false, None);

	assert!(service.store_memory(store_request("primary copy", Some("s1"))).await.ok);
	assert!(
		replica
			.store(mnemo_store::StoreRequest {
				id: Some("r1".to_string()),
				content: "replica copy".to_string(),
				metadata: session_metadata("s1"),
				usefulness: 0.0,
			})
			.await
			.ok
	);

	let response = service.search_memories(search_request("copy", Some("s1"))).await;

	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].content, "primary copy");
}

#[tokio::test]
async fn top_level_session_id_scopes_the_search() {
	let acting = Arc::new(EphemeralStore::new());
	let service = service(Arc::clone(&acting), Arc::new(EphemeralStore::new()), false, None);

	assert!(service.store_memory(store_request("scoped note", Some("s1"))).await.ok);

	let request = SearchMemoriesRequest {
		query: "scoped".to_string(),
		limit: None,
		metadata: Map::new(),
		session_id: Some("s2".to_string()),
	};

	assert!(service.search_memories(request).await.items.is_empty());
}

#[tokio::test]
async fn configured_default_session_scopes_requests() {
	let acting = Arc::new(EphemeralStore::new());
	let service =
		service(Arc::clone(&acting), Arc::new(EphemeralStore::new()), false, Some("sess_d"));

	assert!(service.store_memory(store_request("defaulted", None)).await.ok);

	let response = service.search_memories(search_request("defaulted", None)).await;

	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].session_id(), Some("sess_d"));
}

#[tokio::test]
async fn stats_come_from_the_acting_store() {
	let acting = Arc::new(EphemeralStore::new());
	let replica = Arc::new(EphemeralStore::new());
	let service = service(Arc::clone(&acting), Arc::clone(&replica), false, None);

	assert!(service.store_memory(store_request("only primary", None)).await.ok);
	assert!(
		replica
			.store(mnemo_store::StoreRequest::default())
			.await
			.ok
	);

	let stats = service.get_stats().await;

	assert_eq!(stats.total_memories, 1);
	assert_eq!(stats.cache_size, 0);
}
