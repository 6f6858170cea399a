use axum::{
	Json, Router,
	body::Bytes,
	extract::{Request, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Serialize, de::DeserializeOwned};

use mnemo_service::{
	GetStatsResponse, SearchMemoriesRequest, SearchMemoriesResponse, StoreMemoryRequest,
	StoreMemoryResponse,
};

use crate::state::AppState;

const UNAUTHORIZED_HINT: &str =
	"Unauthorized: set MNEMO_TOKEN and send Authorization: Bearer <token>";

pub fn router(state: AppState) -> Router {
	let tools = Router::new()
		.route("/store_memory", post(store_memory))
		.route("/search_memories", post(search_memories))
		.route("/get_stats", post(get_stats))
		.layer(middleware::from_fn_with_state(state.clone(), require_bearer));

	Router::new()
		.route("/health", get(health))
		.nest("/tools", tools)
		.fallback(not_found)
		.with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
	ok: bool,
	driver: String,
	dual_write: bool,
}

#[derive(Serialize)]
struct ErrorBody {
	ok: bool,
	error: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(HealthResponse {
		ok: true,
		driver: state.service.driver_kind().to_string(),
		dual_write: state.service.dual_write(),
	})
}

async fn store_memory(State(state): State<AppState>, body: Bytes) -> Json<StoreMemoryResponse> {
	let request: StoreMemoryRequest = lenient_json(&body);

	Json(state.service.store_memory(request).await)
}

async fn search_memories(
	State(state): State<AppState>,
	body: Bytes,
) -> Json<SearchMemoriesResponse> {
	let request: SearchMemoriesRequest = lenient_json(&body);

	Json(state.service.search_memories(request).await)
}

async fn get_stats(State(state): State<AppState>, _body: Bytes) -> Json<GetStatsResponse> {
	Json(state.service.get_stats().await)
}

async fn not_found() -> Response {
	(StatusCode::NOT_FOUND, Json(ErrorBody { ok: false, error: "Not Found".to_string() }))
		.into_response()
}

/// Rejects before any routing side effect; `/health` stays outside the
/// guarded nest.
async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
	if is_authorized(request.headers(), &state.token) {
		return next.run(request).await;
	}

	(
		StatusCode::UNAUTHORIZED,
		Json(ErrorBody { ok: false, error: UNAUTHORIZED_HINT.to_string() }),
	)
		.into_response()
}

fn is_authorized(headers: &HeaderMap, token: &str) -> bool {
	read_bearer_token(headers).is_some_and(|presented| presented == token)
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

/// Malformed bodies degrade to the request type's defaults (an empty
/// object); required-field validation stays with the backends.
fn lenient_json<T>(body: &Bytes) -> T
where
	T: DeserializeOwned + Default,
{
	serde_json::from_slice(body).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

	use super::{is_authorized, read_bearer_token};

	#[test]
	fn bearer_token_is_extracted_and_trimmed() {
		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer  secret "));

		assert_eq!(read_bearer_token(&headers), Some("secret"));
		assert!(is_authorized(&headers, "secret"));
		assert!(!is_authorized(&headers, "other"));
	}

	#[test]
	fn missing_or_malformed_headers_are_rejected() {
		let headers = HeaderMap::new();

		assert_eq!(read_bearer_token(&headers), None);

		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic secret"));

		assert_eq!(read_bearer_token(&headers), None);

		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));

		assert_eq!(read_bearer_token(&headers), None);
	}
}
