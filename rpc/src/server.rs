//! Router construction and the HTTP server loop.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

use siglink_gateway::AuthorizationSink;
use siglink_store::threshold::RoleThreshold;
use siglink_store::Store;
use siglink_sync::{SyncEngine, SyncScheduler};
use siglink_types::{Amount, IdentityId, RoleId, Timestamp, WalletAddress};
use siglink_verification::{ChallengeService, VerificationPipeline};

use crate::error::RpcError;
use crate::handlers::{
    IssueChallengeRequest, IssueChallengeResponse, PutThresholdRequest, StatsResponse,
    ThresholdResponse, UpdateThresholdRequest, WalletListResponse, WalletResponse, WebhookAck,
};

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub challenges: Arc<ChallengeService>,
    pub pipeline: Arc<VerificationPipeline>,
    pub scheduler: Arc<SyncScheduler>,
    pub engine: Arc<SyncEngine>,
    pub sink: Arc<dyn AuthorizationSink>,
}

/// Build the full API router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/challenges", post(issue_challenge))
        .route("/v1/webhook", post(webhook))
        .route("/v1/sync", post(trigger_sync))
        .route("/v1/thresholds", get(list_thresholds).post(put_threshold))
        .route(
            "/v1/thresholds/:role_id",
            axum::routing::put(update_threshold).delete(delete_threshold),
        )
        .route("/v1/wallets", get(list_wallets))
        .route("/v1/wallets/:address", delete(delete_wallet))
        .route("/v1/wallets/:address/verify", post(verify_wallet))
        .route("/v1/stats", get(stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The HTTP server, configured with a port and shared state.
pub struct RpcServer {
    pub port: u16,
    pub state: Arc<AppState>,
}

impl RpcServer {
    pub fn new(port: u16, state: Arc<AppState>) -> Self {
        Self { port, state }
    }

    /// Serve until the process shuts down.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(self.state.clone());
        let addr = format!("0.0.0.0:{}", self.port);
        info!("rpc server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn issue_challenge(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IssueChallengeRequest>,
) -> Result<impl IntoResponse, RpcError> {
    let identity = IdentityId::parse(request.identity)?;
    let address = WalletAddress::parse(request.address)?;
    let issued = state
        .challenges
        .issue(&identity, &address, Timestamp::now())?;
    Ok(Json(IssueChallengeResponse {
        code: issued.code.value(),
        expires_at: issued.expires_at.as_secs(),
        reused: issued.reused,
    }))
}

/// Ack the batch immediately; the pipeline runs in the background so the
/// notifier never times out waiting on ledger round-trips.
async fn webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, RpcError> {
    let items = match payload {
        serde_json::Value::Array(items) => items,
        object @ serde_json::Value::Object(_) => vec![object],
        _ => {
            return Err(RpcError::InvalidRequest(
                "expected a notification object or array".into(),
            ))
        }
    };

    let received = items.len();
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        let summary = pipeline.process_batch(items, Timestamp::now()).await;
        tracing::debug!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            failed = summary.failed,
            "webhook batch processed"
        );
    });

    Ok((StatusCode::ACCEPTED, Json(WebhookAck { received })))
}

async fn trigger_sync(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, RpcError> {
    let summary = state.scheduler.run_once(Timestamp::now()).await?;
    Ok(Json(summary))
}

async fn list_thresholds(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, RpcError> {
    let ladder = state.store.thresholds_desc()?;
    let response: Vec<ThresholdResponse> = ladder.iter().map(Into::into).collect();
    Ok(Json(response))
}

async fn put_threshold(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PutThresholdRequest>,
) -> Result<impl IntoResponse, RpcError> {
    if request.role_id.is_empty() {
        return Err(RpcError::InvalidRequest("role_id must be non-empty".into()));
    }
    let record = RoleThreshold {
        role_id: RoleId::new(request.role_id),
        role_name: request.role_name,
        threshold: Amount::parse(&request.threshold)?,
    };
    state.store.put_threshold(&record)?;
    Ok(Json(ThresholdResponse::from(&record)))
}

async fn update_threshold(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
    Json(request): Json<UpdateThresholdRequest>,
) -> Result<impl IntoResponse, RpcError> {
    let role_id = RoleId::new(role_id);
    if state.store.get_threshold(&role_id)?.is_none() {
        return Err(RpcError::NotFound(format!(
            "threshold {}",
            role_id.as_str()
        )));
    }
    let record = RoleThreshold {
        role_id,
        role_name: request.role_name,
        threshold: Amount::parse(&request.threshold)?,
    };
    state.store.put_threshold(&record)?;
    Ok(Json(ThresholdResponse::from(&record)))
}

async fn delete_threshold(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
) -> Result<impl IntoResponse, RpcError> {
    let role_id = RoleId::new(role_id);
    if !state.store.delete_threshold(&role_id)? {
        return Err(RpcError::NotFound(format!(
            "threshold {}",
            role_id.as_str()
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_wallets(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, RpcError> {
    let wallets = state.store.iter_wallets()?;
    Ok(Json(WalletListResponse {
        wallets: wallets.iter().map(Into::into).collect(),
    }))
}

async fn delete_wallet(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, RpcError> {
    let address = WalletAddress::parse(address)?;
    if !state.store.delete_wallet(&address)? {
        return Err(RpcError::NotFound(format!("wallet {}", address.short())));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Administrative override: mark a wallet verified without an on-chain
/// match. The owner is taken from the claim row, falling back to the
/// latest challenge's claimant.
async fn verify_wallet(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, RpcError> {
    let address = WalletAddress::parse(address)?;
    let owner = match state.store.get_wallet(&address)? {
        Some(wallet) => wallet.owner,
        None => match state.store.latest_challenge(&address)? {
            Some(challenge) => challenge.identity,
            None => {
                return Err(RpcError::NotFound(format!(
                    "no claim or challenge for {}",
                    address.short()
                )))
            }
        },
    };

    let now = Timestamp::now();
    state.store.commit_verification(&address, &owner, now)?;
    if let Err(e) = state.engine.refresh_identity(&owner, now).await {
        tracing::warn!(identity = %owner, error = %e, "post-verify refresh failed");
    }
    let notice = format!("wallet {} verified by an operator", address.short());
    if let Err(e) = state.sink.notify(&owner, &notice).await {
        tracing::debug!(identity = %owner, error = %e, "notice not delivered");
    }

    let record = state
        .store
        .get_wallet(&address)?
        .ok_or_else(|| RpcError::Internal("wallet vanished after commit".into()))?;
    Ok(Json(WalletResponse::from(&record)))
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, RpcError> {
    let now = Timestamp::now();
    Ok(Json(StatsResponse {
        verified_wallets: state.store.verified_wallet_count()?,
        pending_challenges: state.store.live_challenge_count(now)?,
        portfolios: state.store.iter_portfolios()?.len() as u64,
        processed_transactions: state.store.processed_count()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use siglink_nullables::{NullGateway, NullSink};
    use siglink_store::memory::MemoryStore;
    use siglink_sync::SchedulerConfig;
    use siglink_verification::ChallengeConfig;
    use tower::ServiceExt;

    fn app() -> (Arc<AppState>, Router) {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let gateway = Arc::new(NullGateway::new());
        let sink = Arc::new(NullSink::new());
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            gateway.clone(),
            sink.clone(),
        ));
        let state = Arc::new(AppState {
            store: store.clone(),
            challenges: Arc::new(ChallengeService::new(
                store.clone(),
                ChallengeConfig::default(),
            )),
            pipeline: Arc::new(VerificationPipeline::new(
                store.clone(),
                gateway,
                sink.clone(),
                engine.clone(),
            )),
            scheduler: Arc::new(SyncScheduler::new(engine.clone(), SchedulerConfig::default())),
            engine,
            sink,
        });
        let router = router(state.clone());
        (state, router)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn challenge_issuance_round_trip() {
        let (_state, router) = app();
        let (status, body) = send(
            router,
            post_json(
                "/v1/challenges",
                json!({"identity": "alice", "address": "A".repeat(60)}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let code = body["code"].as_u64().unwrap();
        assert!((10_000..=99_999).contains(&code));
        assert_eq!(body["reused"], json!(false));
    }

    #[tokio::test]
    async fn challenge_rejects_malformed_address() {
        let (_state, router) = app();
        let (status, body) = send(
            router,
            post_json(
                "/v1/challenges",
                json!({"identity": "alice", "address": "not-an-address"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn webhook_acks_batches_with_202() {
        let (_state, router) = app();
        let (status, body) = send(
            router.clone(),
            post_json("/v1/webhook", json!([{"a": 1}, {"b": 2}])),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["received"], json!(2));

        // A single object counts as a batch of one.
        let (status, body) = send(router, post_json("/v1/webhook", json!({"a": 1}))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["received"], json!(1));
    }

    #[tokio::test]
    async fn threshold_crud() {
        let (_state, router) = app();

        let (status, _) = send(
            router.clone(),
            post_json(
                "/v1/thresholds",
                json!({"role_id": "whale", "role_name": "Whale", "threshold": "1000"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            router.clone(),
            Request::get("/v1/thresholds").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["role_id"], json!("whale"));

        let (status, body) = send(
            router.clone(),
            Request::put("/v1/thresholds/whale")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"role_name": "Whale", "threshold": "2000"}).to_string(),
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["threshold"], json!("2000"));

        let (status, _) = send(
            router.clone(),
            Request::delete("/v1/thresholds/whale")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            router,
            Request::delete("/v1/thresholds/whale")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn manual_verify_uses_the_claim_row_owner() {
        let (state, router) = app();
        let address = WalletAddress::parse("A".repeat(60)).unwrap();
        let owner = IdentityId::parse("alice").unwrap();
        state
            .store
            .put_wallet(&siglink_store::wallet::WalletRecord::claimed(
                address.clone(),
                owner.clone(),
                Timestamp::new(1),
            ))
            .unwrap();

        let uri = format!("/v1/wallets/{}/verify", address.as_str());
        let (status, body) = send(
            router,
            Request::post(&uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verified"], json!(true));
        assert_eq!(body["owner"], json!("alice"));
    }

    #[tokio::test]
    async fn manual_verify_without_claim_or_challenge_is_404() {
        let (_state, router) = app();
        let uri = format!("/v1/wallets/{}/verify", "B".repeat(60));
        let (status, _) = send(
            router,
            Request::post(&uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_reflect_store_contents() {
        let (state, router) = app();
        let address = WalletAddress::parse("A".repeat(60)).unwrap();
        let owner = IdentityId::parse("alice").unwrap();
        let mut record = siglink_store::wallet::WalletRecord::claimed(
            address,
            owner,
            Timestamp::new(1),
        );
        record.verified = true;
        state.store.put_wallet(&record).unwrap();

        let (status, body) = send(
            router,
            Request::get("/v1/stats").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verified_wallets"], json!(1));
        assert_eq!(body["pending_challenges"], json!(0));
    }
}
