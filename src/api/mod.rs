//! REST API module
//!
//! Provides HTTP REST API for programmatic access to a vault deployment.
//!
//! # Endpoints
//!
//! ## Vault
//! - `GET /api/vault` - Vault summary
//! - `GET /api/vault/owners` - Owners and threshold
//! - `GET /api/vault/transactions` - List proposals
//! - `GET /api/vault/transactions/{index}` - Get proposal
//! - `GET /api/vault/transactions/{index}/confirmations` - Confirming owners
//! - `GET /api/vault/nonce/{address}` - Next request nonce for a caller
//! - `GET /api/vault/events?since=N` - Event log
//! - `POST /api/vault/requests` - Apply a signed request
//!
//! ## Tokens
//! - `GET /api/tokens` - List tokens
//! - `GET /api/tokens/{address}` - Get token
//! - `GET /api/tokens/{address}/balance/{holder}` - Get balance
//!
//! ## WebSocket
//! - `GET /ws` - Real-time vault events

pub mod handlers;
pub mod routes;
pub mod websocket;

pub use handlers::ApiState;
pub use routes::create_router;
pub use websocket::{WsBroadcaster, WsEvent};
