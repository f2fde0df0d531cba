//! Simple REST API server example for the banking ledger.
//!
//! Run with: `cargo run --example server`
//!
//! Seeds accounts 1 through 10 at startup, then serves the ledger over HTTP.
//!
//! ## Endpoints
//!
//! - `GET /accounts` - List all accounts
//! - `POST /accounts` - Open a new account
//! - `GET /accounts/:id` - Get an account by id
//! - `DELETE /accounts/:id` - Close an account (balance must be zero)
//! - `POST /accounts/:id/deposits` - Deposit into an account
//! - `POST /accounts/:id/withdrawals` - Withdraw from an account
//! - `POST /transfers` - Transfer between two accounts
//!
//! ## Example Usage
//!
//! ```bash
//! # Deposit
//! curl -X POST http://localhost:3000/accounts/1/deposits \
//!   -H "Content-Type: application/json" \
//!   -d '{"amount": "100.00"}'
//!
//! # Transfer
//! curl -X POST http://localhost:3000/transfers \
//!   -H "Content-Type: application/json" \
//!   -d '{"source": 1, "destination": 2, "amount": "200.00"}'
//!
//! # Get account
//! curl http://localhost:3000/accounts/1
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bank_ledger_rs::{AccountId, Ledger, LedgerError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

// === Request/Response DTOs ===

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub id: u32,
    #[serde(default)]
    pub balance: Decimal,
}

/// Request body for deposits and withdrawals.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

/// Request body for transfers.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub source: u32,
    pub destination: u32,
    pub amount: Decimal,
}

/// Response body for account information.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: u32,
    pub balance: Decimal,
}

/// Response body for a completed transfer.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub source: u32,
    pub destination: u32,
    pub source_balance: Decimal,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

// === Error Handling ===

/// Wrapper for converting `LedgerError` into HTTP responses.
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            LedgerError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            LedgerError::InsufficientFunds => (StatusCode::CONFLICT, "INSUFFICIENT_FUNDS"),
            LedgerError::DuplicateAccount(_) => (StatusCode::CONFLICT, "DUPLICATE_ACCOUNT"),
            LedgerError::NonZeroBalance(_) => (StatusCode::CONFLICT, "NON_ZERO_BALANCE"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

fn account_response(snapshot: bank_ledger_rs::AccountSnapshot) -> Json<AccountResponse> {
    Json(AccountResponse {
        id: snapshot.id.0,
        balance: snapshot.balance,
    })
}

// === Handlers ===

/// GET /accounts/:id - Get account by id.
async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<AccountResponse>, AppError> {
    let snapshot = state.ledger.get_account(AccountId(id))?;
    Ok(account_response(snapshot))
}

/// POST /accounts - Open a new account.
async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let snapshot = state
        .ledger
        .create_account(AccountId(request.id), request.balance)?;
    Ok((StatusCode::CREATED, account_response(snapshot)))
}

/// DELETE /accounts/:id - Close an account.
async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_account(AccountId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /accounts/:id/deposits - Deposit into an account.
async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let snapshot = state.ledger.deposit(AccountId(id), request.amount)?;
    Ok(account_response(snapshot))
}

/// POST /accounts/:id/withdrawals - Withdraw from an account.
async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let snapshot = state.ledger.withdraw(AccountId(id), request.amount)?;
    Ok(account_response(snapshot))
}

/// POST /transfers - Transfer between two accounts.
async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let receipt = state.ledger.transfer(
        AccountId(request.source),
        AccountId(request.destination),
        request.amount,
    )?;
    Ok(Json(TransferResponse {
        source: receipt.source.0,
        destination: receipt.destination.0,
        source_balance: receipt.source_balance,
    }))
}

/// GET /accounts - List all accounts.
async fn list_accounts(State(state): State<AppState>) -> Json<Vec<AccountResponse>> {
    let accounts: Vec<AccountResponse> = state
        .ledger
        .accounts()
        .into_iter()
        .map(|snapshot| AccountResponse {
            id: snapshot.id.0,
            balance: snapshot.balance,
        })
        .collect();

    Json(accounts)
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{id}", get(get_account).delete(delete_account))
        .route("/accounts/{id}/deposits", post(deposit))
        .route("/accounts/{id}/withdrawals", post(withdraw))
        .route("/transfers", post(transfer))
        .with_state(state)
}

/// Seeds accounts 1..=10 with opening balances, mirroring a typical
/// bootstrap step.
fn seed_accounts(ledger: &Ledger) {
    for i in 1..=10u32 {
        ledger
            .create_account(AccountId(i), Decimal::from(1_000 * i))
            .expect("seeding a fresh ledger cannot fail");
    }
}

// === Main ===

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    let ledger = Arc::new(Ledger::new());
    seed_accounts(&ledger);

    let state = AppState { ledger };
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Bank ledger API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  GET    /accounts                  - List all accounts");
    println!("  POST   /accounts                  - Open an account");
    println!("  GET    /accounts/:id              - Get account by id");
    println!("  DELETE /accounts/:id              - Close an account");
    println!("  POST   /accounts/:id/deposits     - Deposit");
    println!("  POST   /accounts/:id/withdrawals  - Withdraw");
    println!("  POST   /transfers                 - Transfer between accounts");

    axum::serve(listener, app).await.unwrap();
}
