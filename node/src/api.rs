//! HTTP API for the Agora node

use agora_ballot::{BallotTransaction, ExecutionReceipt, Proposal, VotingSession};
use agora_core::{Address, AgoraError, AgoraResult, ProgramModule};
use agora_state::StateStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::runtime::NodeRuntime;

/// API state containing node runtime
pub type ApiState<S> = Arc<NodeRuntime<S>>;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

type ApiReply<T> = (StatusCode, Json<ApiResponse<T>>);

/// Node status response
#[derive(Serialize)]
pub struct NodeStatusResponse {
    pub name: String,
    pub program: String,
    pub program_version: String,
    pub program_id: String,
    pub state_version: u64,
    pub state_root: String,
}

/// Voting session response
#[derive(Serialize)]
pub struct SessionResponse {
    pub address: String,
    pub chairperson: String,
    pub deadline: u64,
    pub proposal_count: u32,
    pub winner_selected: bool,
    /// Present once the session is tallied
    pub winner_idx: Option<u32>,
}

impl SessionResponse {
    fn new(address: &Address, session: &VotingSession) -> Self {
        Self {
            address: address.to_hex(),
            chairperson: session.chairperson.to_hex(),
            deadline: session.deadline.as_millis(),
            proposal_count: session.proposal_count,
            winner_selected: session.winner_selected,
            winner_idx: session.winner_selected.then_some(session.winner_idx),
        }
    }
}

/// Proposal response
#[derive(Serialize)]
pub struct ProposalResponse {
    pub address: String,
    pub session: String,
    pub index: u32,
    pub text: String,
    pub vote_counter: u32,
}

impl ProposalResponse {
    fn new(address: &Address, proposal: &Proposal) -> Self {
        Self {
            address: address.to_hex(),
            session: proposal.session.to_hex(),
            index: proposal.index,
            text: proposal.text.clone(),
            vote_counter: proposal.vote_counter,
        }
    }
}

/// Account response
#[derive(Serialize)]
pub struct AccountResponse {
    pub address: String,
    pub nonce: u64,
}

/// Vote guard lookup response
#[derive(Serialize)]
pub struct VotedResponse {
    pub voter: String,
    pub proposal: String,
    pub voted: bool,
}

/// Transaction request carrying a hex-encoded signed transaction
#[derive(Deserialize)]
pub struct TransactionRequest {
    pub tx: String,
}

/// Transaction response
#[derive(Serialize)]
pub struct TransactionResponse {
    pub tx_id: String,
    pub address: String,
    pub state_version: u64,
}

impl From<ExecutionReceipt> for TransactionResponse {
    fn from(receipt: ExecutionReceipt) -> Self {
        Self {
            tx_id: receipt.tx_id.to_hex(),
            address: receipt.address.to_hex(),
            state_version: receipt.version.0,
        }
    }
}

/// Create API router
pub fn create_router<S: StateStore + 'static>(runtime: ApiState<S>) -> Router {
    let enable_cors = runtime.config().api.enable_cors;

    let router = Router::new()
        // Health
        .route("/health", get(health))
        .route("/status", get(status::<S>))
        // Transactions
        .route("/transaction", post(submit_transaction::<S>))
        // Ballot records
        .route("/session/:address", get(get_session::<S>))
        .route("/session/:address/proposals", get(get_session_proposals::<S>))
        .route("/proposal/:address", get(get_proposal::<S>))
        .route("/voted/:voter/:proposal", get(has_voted::<S>))
        // Accounts
        .route("/account/:address", get(get_account::<S>))
        .with_state(runtime)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

fn error_status(e: &AgoraError) -> StatusCode {
    if e.is_not_found() {
        return StatusCode::NOT_FOUND;
    }
    match e {
        AgoraError::StorageError(_)
        | AgoraError::SerializationError(_)
        | AgoraError::Internal(_)
        | AgoraError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn reply<T: Serialize>(result: AgoraResult<T>) -> ApiReply<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => (error_status(&e), Json(ApiResponse::err(e))),
    }
}

fn parse_address(s: &str) -> AgoraResult<Address> {
    Address::from_hex(s).map_err(|_| AgoraError::InvalidAddress(s.to_string()))
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Node status
async fn status<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
) -> ApiReply<NodeStatusResponse> {
    let result = async {
        Ok::<_, AgoraError>(NodeStatusResponse {
            name: runtime.config().name.clone(),
            program: runtime.ledger().program().name().to_string(),
            program_version: runtime.ledger().program().version().to_string(),
            program_id: runtime.program_id().to_hex(),
            state_version: runtime.state_version().await.0,
            state_root: runtime.state_root().await?.to_hex(),
        })
    };
    reply(result.await)
}

/// Submit transaction
async fn submit_transaction<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Json(req): Json<TransactionRequest>,
) -> ApiReply<TransactionResponse> {
    let result = async {
        let tx = BallotTransaction::from_hex(&req.tx)?;
        let receipt = runtime.submit_transaction(tx).await?;
        Ok::<_, AgoraError>(TransactionResponse::from(receipt))
    };
    reply(result.await)
}

/// Get voting session
async fn get_session<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
) -> ApiReply<SessionResponse> {
    let result = async {
        let address = parse_address(&address)?;
        let session = runtime.get_session(&address).await?;
        Ok::<_, AgoraError>(SessionResponse::new(&address, &session))
    };
    reply(result.await)
}

/// List proposals of a session in index order
async fn get_session_proposals<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
) -> ApiReply<Vec<ProposalResponse>> {
    let result = async {
        let address = parse_address(&address)?;
        let proposals = runtime.session_proposals(&address).await?;
        let proposals: Vec<ProposalResponse> = proposals
            .iter()
            .map(|(address, proposal)| ProposalResponse::new(address, proposal))
            .collect();
        Ok::<_, AgoraError>(proposals)
    };
    reply(result.await)
}

/// Get proposal
async fn get_proposal<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
) -> ApiReply<ProposalResponse> {
    let result = async {
        let address = parse_address(&address)?;
        let proposal = runtime.get_proposal(&address).await?;
        Ok::<_, AgoraError>(ProposalResponse::new(&address, &proposal))
    };
    reply(result.await)
}

/// Check whether a voter already voted on a proposal
async fn has_voted<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path((voter, proposal)): Path<(String, String)>,
) -> ApiReply<VotedResponse> {
    let result = async {
        let voter = parse_address(&voter)?;
        let proposal = parse_address(&proposal)?;
        let voted = runtime.has_voted(&voter, &proposal).await?;
        Ok::<_, AgoraError>(VotedResponse {
            voter: voter.to_hex(),
            proposal: proposal.to_hex(),
            voted,
        })
    };
    reply(result.await)
}

/// Get account
async fn get_account<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
) -> ApiReply<AccountResponse> {
    let result = async {
        let address = parse_address(&address)?;
        let nonce = runtime.get_nonce(&address).await?;
        Ok::<_, AgoraError>(AccountResponse {
            address: address.to_hex(),
            nonce: nonce.0,
        })
    };
    reply(result.await)
}

/// Start API server
pub async fn start_api_server<S: StateStore + 'static>(
    runtime: ApiState<S>,
    listen_addr: &str,
) -> anyhow::Result<()> {
    let router = create_router(runtime);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("API server listening on {}", listen_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
