//! REST API handlers for vault operations

use crate::api::websocket::{WsBroadcaster, WsEvent};
use crate::deployment::Deployment;
use crate::storage::Storage;
use crate::token::Token;
use crate::vault::{
    Address, EventRecord, GovernanceMode, Outcome, Proposal, SignedRequest, VaultError,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub deployment: Arc<RwLock<Deployment>>,
    pub storage: Arc<Storage>,
    pub ws_broadcaster: Arc<WsBroadcaster>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct VaultInfo {
    pub address: Address,
    pub label: Option<String>,
    pub policy: String,
    pub threshold: u32,
    pub owners: Vec<Address>,
    pub governance: GovernanceMode,
    pub transaction_count: u64,
    pub pending: Vec<u64>,
    pub event_count: usize,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OwnersResponse {
    pub owners: Vec<Address>,
    pub threshold: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct TransactionInfo {
    pub index: u64,
    pub target: Address,
    pub payload: String,
    pub executed: bool,
    pub confirmations: u32,
    pub required: u32,
    pub submitter: Address,
    pub submitted_at: String,
}

impl TransactionInfo {
    fn new(index: u64, proposal: &Proposal, required: u32) -> Self {
        Self {
            index,
            target: proposal.target,
            payload: hex::encode(&proposal.payload),
            executed: proposal.executed,
            confirmations: proposal.confirmations,
            required,
            submitter: proposal.submitter,
            submitted_at: proposal.submitted_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ConfirmationsResponse {
    pub index: u64,
    pub confirmers: Vec<Address>,
}

#[derive(Serialize)]
pub struct NonceResponse {
    pub address: Address,
    pub nonce: u64,
}

#[derive(Debug, Serialize)]
pub struct RequestResponse {
    pub outcome: Outcome,
    pub events: Vec<EventRecord>,
}

/// Token info for API responses
#[derive(Serialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub admin: Address,
    pub total_supply: String,
    pub holder_count: usize,
    pub paused: bool,
}

impl From<&Token> for TokenInfo {
    fn from(token: &Token) -> Self {
        Self {
            address: token.address,
            name: token.name().to_string(),
            symbol: token.symbol().to_string(),
            decimals: token.decimals(),
            admin: token.admin(),
            total_supply: token.total_supply().to_string(),
            holder_count: token.holder_count(),
            paused: token.is_paused(),
        }
    }
}

/// Token balance response
#[derive(Serialize)]
pub struct TokenBalanceResponse {
    pub token: Address,
    pub holder: Address,
    pub balance: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

fn api_error(status: StatusCode, error: impl ToString) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.to_string(),
        }),
    )
}

/// Map a vault error to its HTTP status
pub fn vault_error(e: VaultError) -> (StatusCode, Json<ApiError>) {
    let status = match &e {
        VaultError::Unauthorized(_) => StatusCode::FORBIDDEN,
        VaultError::InvalidConfiguration(_)
        | VaultError::InvalidOwner(_)
        | VaultError::InvalidRequest(_)
        | VaultError::StaleNonce { .. } => StatusCode::BAD_REQUEST,
        VaultError::ProposalNotFound(_) | VaultError::OwnerNotFound(_) => StatusCode::NOT_FOUND,
        VaultError::AlreadyExecuted(_)
        | VaultError::AlreadyConfirmed { .. }
        | VaultError::QuorumNotMet { .. } => StatusCode::CONFLICT,
        VaultError::ExecutionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    api_error(status, e)
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct EventsQuery {
    pub since: Option<u64>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/vault - Vault summary
pub async fn get_vault_info(State(state): State<ApiState>) -> Json<VaultInfo> {
    let deployment = state.deployment.read().await;
    let vault = &deployment.vault;

    Json(VaultInfo {
        address: vault.address(),
        label: vault.label().map(str::to_string),
        policy: vault.description(),
        threshold: vault.required_confirmations(),
        owners: vault.owners().to_vec(),
        governance: vault.governance_mode(),
        transaction_count: vault.transaction_count(),
        pending: vault.pending(),
        event_count: vault.events().len(),
        created_at: vault.created_at().to_rfc3339(),
    })
}

/// GET /api/vault/owners - Current owners and threshold
pub async fn get_owners(State(state): State<ApiState>) -> Json<OwnersResponse> {
    let deployment = state.deployment.read().await;

    Json(OwnersResponse {
        owners: deployment.vault.owners().to_vec(),
        threshold: deployment.vault.required_confirmations(),
    })
}

/// GET /api/vault/transactions - All proposals
pub async fn list_transactions(State(state): State<ApiState>) -> Json<Vec<TransactionInfo>> {
    let deployment = state.deployment.read().await;
    let required = deployment.vault.required_confirmations();

    Json(
        deployment
            .vault
            .transactions()
            .map(|(index, proposal)| TransactionInfo::new(index, proposal, required))
            .collect(),
    )
}

/// GET /api/vault/transactions/{index} - One proposal
pub async fn get_transaction(
    State(state): State<ApiState>,
    Path(index): Path<u64>,
) -> ApiResult<TransactionInfo> {
    let deployment = state.deployment.read().await;
    let vault = &deployment.vault;

    let proposal = vault.transaction(index).map_err(vault_error)?;
    Ok(Json(TransactionInfo::new(
        index,
        proposal,
        vault.required_confirmations(),
    )))
}

/// GET /api/vault/transactions/{index}/confirmations - Who confirmed a proposal
pub async fn get_confirmations(
    State(state): State<ApiState>,
    Path(index): Path<u64>,
) -> ApiResult<ConfirmationsResponse> {
    let deployment = state.deployment.read().await;

    deployment.vault.transaction(index).map_err(vault_error)?;
    Ok(Json(ConfirmationsResponse {
        index,
        confirmers: deployment.vault.confirmers(index),
    }))
}

/// GET /api/vault/nonce/{address} - Next request nonce for a caller
pub async fn get_nonce(
    State(state): State<ApiState>,
    Path(address): Path<Address>,
) -> Json<NonceResponse> {
    let deployment = state.deployment.read().await;

    Json(NonceResponse {
        address,
        nonce: deployment.vault.nonce(&address),
    })
}

/// GET /api/vault/events?since=N - Event log from sequence N
pub async fn get_events(
    State(state): State<ApiState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<EventRecord>> {
    let deployment = state.deployment.read().await;

    Json(
        deployment
            .vault
            .events()
            .since(query.since.unwrap_or(0))
            .to_vec(),
    )
}

/// POST /api/vault/requests - Apply a signed request
pub async fn submit_request(
    State(state): State<ApiState>,
    Json(request): Json<SignedRequest>,
) -> ApiResult<RequestResponse> {
    let mut deployment = state.deployment.write().await;
    let first_new = deployment.vault.events().len() as u64;

    let outcome = deployment.apply(&request).map_err(|e| {
        log::debug!("Request rejected: {}", e);
        vault_error(e)
    })?;

    if let Err(e) = state.storage.save(&deployment) {
        log::error!("Failed to persist vault state: {}", e);
    }

    let events = deployment.vault.events().since(first_new).to_vec();
    for record in &events {
        state.ws_broadcaster.broadcast(WsEvent::VaultEvent {
            record: record.clone(),
        });
    }

    Ok(Json(RequestResponse { outcome, events }))
}

/// GET /api/tokens - List all tokens
pub async fn list_tokens(State(state): State<ApiState>) -> Json<Vec<TokenInfo>> {
    let deployment = state.deployment.read().await;

    let mut tokens: Vec<TokenInfo> = deployment
        .tokens
        .list()
        .into_iter()
        .map(TokenInfo::from)
        .collect();
    tokens.sort_by_key(|t| t.address);

    Json(tokens)
}

/// GET /api/tokens/{address} - Get token info
pub async fn get_token(
    State(state): State<ApiState>,
    Path(address): Path<Address>,
) -> ApiResult<TokenInfo> {
    let deployment = state.deployment.read().await;

    match deployment.tokens.get(&address) {
        Some(token) => Ok(Json(TokenInfo::from(token))),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Token not found: {}", address),
        )),
    }
}

/// GET /api/tokens/{address}/balance/{holder} - Get token balance
pub async fn get_token_balance(
    State(state): State<ApiState>,
    Path((address, holder)): Path<(Address, Address)>,
) -> ApiResult<TokenBalanceResponse> {
    let deployment = state.deployment.read().await;

    let balance = deployment
        .tokens
        .balance_of(&address, &holder)
        .map_err(|e| api_error(StatusCode::NOT_FOUND, e))?;

    Ok(Json(TokenBalanceResponse {
        token: address,
        holder,
        balance: balance.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::storage::StorageConfig;
    use crate::token::TokenCall;
    use crate::vault::{Operation, VaultConfig};

    fn test_state(temp_dir: &tempfile::TempDir, keys: &[KeyPair], threshold: u32) -> ApiState {
        let owners = keys.iter().map(|k| k.address()).collect();
        let deployment = Deployment::new(VaultConfig::new(owners, threshold)).unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        ApiState {
            deployment: Arc::new(RwLock::new(deployment)),
            storage: Arc::new(storage),
            ws_broadcaster: Arc::new(WsBroadcaster::new()),
        }
    }

    async fn sign(state: &ApiState, key: &KeyPair, operation: Operation) -> SignedRequest {
        let deployment = state.deployment.read().await;
        let nonce = deployment.vault.nonce(&key.address());
        SignedRequest::sign(deployment.vault.address(), operation, nonce, key).unwrap()
    }

    #[test]
    fn test_error_status_mapping() {
        let someone = Address::from_data(b"someone");

        assert_eq!(
            vault_error(VaultError::Unauthorized(someone)).0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            vault_error(VaultError::ProposalNotFound(3)).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            vault_error(VaultError::QuorumNotMet { have: 1, need: 2 }).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            vault_error(VaultError::ExecutionFailed("boom".to_string())).0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_submit_request_persists_and_broadcasts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let keys = vec![KeyPair::generate(), KeyPair::generate()];
        let state = test_state(&temp_dir, &keys, 2);
        let mut rx = state.ws_broadcaster.subscribe();

        let token = {
            let mut deployment = state.deployment.write().await;
            let admin = deployment.vault.address();
            deployment
                .tokens
                .create_token("Vault Token".to_string(), "VLT".to_string(), 18, admin)
                .unwrap()
                .address
        };

        let request = sign(
            &state,
            &keys[0],
            Operation::Submit {
                target: token,
                payload: TokenCall::Pause.encode(),
            },
        )
        .await;
        let Json(response) = submit_request(State(state.clone()), Json(request))
            .await
            .unwrap();

        assert_eq!(response.outcome, Outcome::Submitted { index: 0 });
        assert_eq!(response.events.len(), 1);
        assert!(state.storage.exists());

        match rx.recv().await.unwrap() {
            WsEvent::VaultEvent { record } => assert_eq!(record.sequence, 0),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_request_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let keys = vec![KeyPair::generate(), KeyPair::generate()];
        let state = test_state(&temp_dir, &keys, 2);

        let outsider = KeyPair::generate();
        let request = sign(&state, &outsider, Operation::Confirm { index: 0 }).await;
        let (status, _) = submit_request(State(state.clone()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);

        let request = sign(&state, &keys[0], Operation::Execute { index: 9 }).await;
        let (status, _) = submit_request(State(state.clone()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Nothing was applied, so nothing was written
        assert!(!state.storage.exists());
    }

    #[tokio::test]
    async fn test_read_handlers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let keys = vec![KeyPair::generate()];
        let state = test_state(&temp_dir, &keys, 1);

        let Json(info) = get_vault_info(State(state.clone())).await;
        assert_eq!(info.policy, "1-of-1");
        assert_eq!(info.owners, vec![keys[0].address()]);

        let result = get_transaction(State(state.clone()), Path(0)).await;
        assert_eq!(result.unwrap_err().0, StatusCode::NOT_FOUND);

        let Json(nonce) = get_nonce(State(state.clone()), Path(keys[0].address())).await;
        assert_eq!(nonce.nonce, 0);

        let Json(events) =
            get_events(State(state.clone()), Query(EventsQuery { since: None })).await;
        assert!(events.is_empty());
    }
}
