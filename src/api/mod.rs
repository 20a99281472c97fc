// 🌐 Mock API - JSON:API routes over the seeded store
//
// /health                                GET - Health check
// {accounting_path}
// ├── /:currency/currency                GET - Currency
// ├── /:currency/accounts                GET - List accounts
// │   └── /:code                         GET - Account by code
// └── /:currency/transfers               GET - Transfers of filter[account]
//     └── /:id                           GET - Transfer by ID
// {social_path}
// ├── /:group                            GET - Group
// ├── /:group/members                    GET - List members
// │   └── /:id                           GET - Member by ID
// ├── /:group/needs                      GET - List needs
// │   └── /:code                         GET - Need by code
// └── /:group/offers                     GET - List offers
//     └── /:code                         GET - Offer by code
//
// Every error response goes through the Error Dispatcher before leaving
// the router.

mod accounting;
pub mod document;
pub mod error;
mod social;

use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use document::{Document, Resource, Resources};
pub use error::ApiError;

use crate::config::AppConfig;
use crate::dispatcher::ErrorDispatcher;
use crate::error::{ErrorCode, KError};
use crate::store::MockStore;

pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MockStore>,
    pub dispatcher: Arc<ErrorDispatcher>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn resources(&self) -> Resources<'_> {
        Resources::new(&self.store, &self.config)
    }
}

/// Plain response wrapper for non JSON:API endpoints
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let accounting = Router::new()
        .route("/:currency/currency", get(accounting::get_currency))
        .route("/:currency/accounts", get(accounting::list_accounts))
        .route("/:currency/accounts/:code", get(accounting::get_account))
        .route("/:currency/transfers", get(accounting::list_transfers))
        .route("/:currency/transfers/:id", get(accounting::get_transfer));

    let social = Router::new()
        .route("/:group", get(social::get_group))
        .route("/:group/members", get(social::list_members))
        .route("/:group/members/:id", get(social::get_member))
        .route("/:group/needs", get(social::list_needs))
        .route("/:group/needs/:code", get(social::get_need))
        .route("/:group/offers", get(social::list_offers))
        .route("/:group/offers/:code", get(social::get_offer));

    let latency = Duration::from_millis(state.config.api.latency_ms);

    Router::new()
        .route("/health", get(health_check))
        .nest(&state.config.api.accounting_path, accounting)
        .nest(&state.config.api.social_path, social)
        .fallback(unexpected_request)
        .layer(from_fn_with_state(state.clone(), dispatch_errors))
        .layer(from_fn_with_state(latency, simulate_latency))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

async fn unexpected_request(request: Request) -> ApiError {
    ApiError::unexpected(format!("no mock route for {} {}", request.method(), request.uri()))
}

// ============================================================================
// Middleware
// ============================================================================

/// Report every error response to the dispatcher
///
/// Rejections produced by axum itself (405, extractor failures) carry no
/// `KError`; they are rewritten into a JSON:API error document first.
async fn dispatch_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;

    if let Some(error) = response.extensions().get::<KError>() {
        state.dispatcher.handle(error);
        return response;
    }

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let code = if status.is_client_error() {
        ErrorCode::UnexpectedRequest
    } else {
        ErrorCode::Internal
    };
    let error = KError::new(code, format!("{} {} answered {}", method, uri, status));
    state.dispatcher.handle(&error);
    ApiError { status, error }.into_response()
}

/// Delay every response to mimic a network round-trip
async fn simulate_latency(State(latency): State<Duration>, request: Request, next: Next) -> Response {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedConfig;
    use crate::dispatcher::testing::{KeyTranslator, RecordingNotifier};
    use crate::fixtures;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        store: Arc<MockStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness() -> Harness {
        let reference = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let store = Arc::new(fixtures::seed(&SeedConfig::default(), reference));
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Arc::new(ErrorDispatcher::new(
            Arc::new(KeyTranslator::default()),
            notifier.clone(),
            false,
        ));
        let state = AppState {
            store: store.clone(),
            dispatcher,
            config: Arc::new(AppConfig::default()),
        };
        Harness {
            router: router(state),
            store,
            notifier,
        }
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn ids(document: &Value) -> Vec<String> {
        document["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn health_check_endpoint() {
        let (status, body) = get(harness().router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn get_account_by_code() {
        let h = harness();
        let account = &h.store.accounts()[12];
        let currency = h.store.currency_of_account(account).unwrap();

        let uri = format!("/accounting/{}/accounts/{}", currency.code, account.code);
        let (status, body) = get(h.router, &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "accounts");
        assert_eq!(body["data"]["id"], account.id.as_str());
        assert_eq!(body["data"]["attributes"]["code"], account.code.as_str());
        assert_eq!(
            body["data"]["relationships"]["currency"]["data"]["id"],
            currency.id.as_str()
        );
        assert_eq!(
            body["data"]["links"]["self"],
            format!("http://localhost:2025{}", uri)
        );
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn account_from_other_currency_is_not_found() {
        let h = harness();
        // GRP10010 belongs to GRP1
        let (status, body) = get(h.router, "/accounting/GRP0/accounts/GRP10010").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["status"], "404");
        assert_eq!(body["errors"][0]["code"], "NotFound");
        assert_eq!(h.notifier.messages(), vec!["T(error-not-found)"]);
    }

    #[tokio::test]
    async fn list_accounts_with_search_and_sort() {
        let h = harness();
        let (status, body) = get(h.router, "/accounting/GRP0/accounts?sort=-code").await;

        assert_eq!(status, StatusCode::OK);
        let codes: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["attributes"]["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes.len(), 10);
        assert_eq!(codes[0], "GRP00009");
        assert_eq!(codes[9], "GRP00000");

        let (_, body) = get(harness().router, "/accounting/GRP0/accounts?filter%5Bsearch%5D=grp00003").await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transfers_require_account_filter() {
        let h = harness();
        let (status, body) = get(h.router, "/accounting/GRP0/transfers").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "UnexpectedRequest");
        assert_eq!(h.notifier.messages(), vec!["T(error-unexpected-request)"]);
    }

    #[tokio::test]
    async fn transfers_of_account() {
        let h = harness();
        let first = &h.store.accounts()[0];
        let uri = format!(
            "/accounting/GRP0/transfers?filter%5Baccount%5D={}&sort=-created",
            first.id
        );
        let (status, body) = get(h.router, &uri).await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 25);
        let created: Vec<&str> = data
            .iter()
            .map(|r| r["attributes"]["created"].as_str().unwrap())
            .collect();
        assert!(created.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn transfers_filtered_by_state_keep_order() {
        let h = harness();
        let first = &h.store.accounts()[0];
        let uri = format!(
            "/accounting/GRP0/transfers?filter%5Baccount%5D={}&filter%5Bstate%5D=pending",
            first.id
        );
        let (status, body) = get(h.router, &uri).await;

        assert_eq!(status, StatusCode::OK);
        let expected: Vec<String> = h
            .store
            .transfers()
            .iter()
            .filter(|t| t.is_pending())
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(ids(&body), expected);
        for resource in body["data"].as_array().unwrap() {
            assert!(resource["attributes"]["expires"].is_string());
        }
    }

    #[tokio::test]
    async fn transfers_include_payer_and_payee() {
        let h = harness();
        let partner = h.store.transfers()[0].payee_id.clone();
        let uri = format!(
            "/accounting/GRP0/transfers?filter%5Baccount%5D={}&include=payer,payee",
            partner
        );
        let (status, body) = get(h.router, &uri).await;

        assert_eq!(status, StatusCode::OK);
        let included = body["included"].as_array().unwrap();
        assert_eq!(included.len(), 2);
        assert!(included.iter().all(|r| r["type"] == "accounts"));
    }

    #[tokio::test]
    async fn unknown_sort_field_is_invalid_query() {
        let h = harness();
        let (status, body) = get(h.router, "/accounting/GRP0/accounts?sort=color").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "InvalidQuery");
    }

    #[tokio::test]
    async fn transfer_in_other_currency_is_not_found() {
        let h = harness();
        let transfer = &h.store.transfers()[0];

        let uri = format!("/accounting/GRP0/transfers/{}", transfer.id);
        let (status, body) = get(h.router.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], transfer.id.as_str());

        let uri = format!("/accounting/GRP1/transfers/{}", transfer.id);
        let (status, _) = get(h.router, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn currency_and_group() {
        let h = harness();
        let (status, body) = get(h.router.clone(), "/accounting/GRP2/currency").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "currencies");
        assert_eq!(body["data"]["attributes"]["code"], "GRP2");

        let (status, body) = get(h.router, "/social/GRP2?include=currency").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "groups");
        assert_eq!(body["included"][0]["attributes"]["code"], "GRP2");
    }

    #[tokio::test]
    async fn member_of_account() {
        let h = harness();
        let account = &h.store.accounts()[3];
        let member = h.store.member_of_account(&account.id).unwrap();

        let uri = format!("/social/GRP0/members?filter%5Baccount%5D={}", account.id);
        let (status, body) = get(h.router, &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![member.id.clone()]);
    }

    #[tokio::test]
    async fn list_needs_with_search() {
        let h = harness();
        let group = h.store.group_by_code("GRP0").unwrap();
        let expected: Vec<String> = h
            .store
            .needs_of_group(&group.id)
            .iter()
            .map(|n| n.id.clone())
            .collect();

        let (status, body) = get(h.router.clone(), "/social/GRP0/needs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), expected);
        assert_eq!(body["data"][0]["type"], "needs");
        assert!(body["data"][0]["attributes"]["category"].is_string());

        let category = h.store.needs_of_group(&group.id)[1].category.clone();
        let uri = format!("/social/GRP0/needs?filter%5Bsearch%5D={}", category);
        let (status, body) = get(h.router, &uri).await;
        assert_eq!(status, StatusCode::OK);
        let found = ids(&body);
        assert!(found.contains(&expected[1]));
        for resource in body["data"].as_array().unwrap() {
            let attrs = &resource["attributes"];
            let text = format!("{} {}", attrs["content"], attrs["category"]).to_lowercase();
            assert!(text.contains(&category));
        }
    }

    #[tokio::test]
    async fn get_need_by_code_with_member() {
        let h = harness();
        let group = h.store.group_by_code("GRP0").unwrap();
        let need = h.store.needs_of_group(&group.id)[0].clone();

        let uri = format!("/social/GRP0/needs/{}?include=member", need.code);
        let (status, body) = get(h.router.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], need.id.as_str());
        assert_eq!(body["data"]["attributes"]["code"], need.code.as_str());
        assert!(body["data"]["attributes"]["expires"].is_string());
        assert_eq!(
            body["data"]["relationships"]["member"]["data"]["id"],
            need.member_id.as_str()
        );
        assert_eq!(body["included"][0]["type"], "members");
        assert_eq!(body["included"][0]["id"], need.member_id.as_str());

        // Codes are scoped to their group
        let uri = format!("/social/GRP1/needs/{}", need.code);
        let (status, _) = get(h.router, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn offers_of_group() {
        let h = harness();
        let group = h.store.group_by_code("GRP2").unwrap();
        let offer = h.store.offers_of_group(&group.id)[2].clone();

        let (status, body) = get(h.router.clone(), "/social/GRP2/offers?sort=-created").await;
        assert_eq!(status, StatusCode::OK);
        let created: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["attributes"]["created"].as_str().unwrap())
            .collect();
        assert_eq!(created.len(), 4);
        assert!(created.windows(2).all(|w| w[0] >= w[1]));

        let uri = format!("/social/GRP2/offers/{}?include=group", offer.code);
        let (status, body) = get(h.router.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "offers");
        assert_eq!(body["data"]["attributes"]["name"], offer.name.as_str());
        assert_eq!(body["included"][0]["attributes"]["code"], "GRP2");

        let (status, body) = get(h.router, "/social/GRP2/offers/Nothing-here").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "NotFound");
    }

    #[tokio::test]
    async fn wrong_method_is_reported() {
        let h = harness();
        let request = Request::builder()
            .method("POST")
            .uri("/accounting/GRP0/accounts")
            .body(Body::empty())
            .unwrap();
        let response = h.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["content-type"], JSONAPI_MEDIA_TYPE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["errors"][0]["status"], "405");
        assert_eq!(body["errors"][0]["code"], "UnexpectedRequest");
        assert_eq!(h.notifier.messages(), vec!["T(error-unexpected-request)"]);
    }

    #[tokio::test]
    async fn unknown_route_is_reported() {
        let h = harness();
        let (status, body) = get(h.router, "/payments/GRP0").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "UnexpectedRequest");
        assert_eq!(h.notifier.messages().len(), 1);
    }
}
