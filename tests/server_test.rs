// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Integration tests for the REST API boundary with concurrent requests.
//!
//! These tests verify that an HTTP translation layer over the ledger maps
//! outcome kinds to status codes and stays consistent under many concurrent
//! requests.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bank_ledger_rs::{AccountId, Ledger, LedgerError};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

// === DTOs (duplicated from the server example for test isolation) ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source: u32,
    pub destination: u32,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: u32,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub source: u32,
    pub destination: u32,
    pub source_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Server Setup ===

#[derive(Clone)]
struct AppState {
    ledger: Arc<Ledger>,
}

struct AppError(LedgerError);

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

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<AccountResponse>, AppError> {
    let snapshot = state.ledger.get_account(AccountId(id))?;
    Ok(Json(AccountResponse {
        id: snapshot.id.0,
        balance: snapshot.balance,
    }))
}

async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_account(AccountId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let snapshot = state.ledger.deposit(AccountId(id), request.amount)?;
    Ok(Json(AccountResponse {
        id: snapshot.id.0,
        balance: snapshot.balance,
    }))
}

async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let snapshot = state.ledger.withdraw(AccountId(id), request.amount)?;
    Ok(Json(AccountResponse {
        id: snapshot.id.0,
        balance: snapshot.balance,
    }))
}

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

/// Starts a server over the given ledger on an ephemeral port.
async fn spawn_server(ledger: Arc<Ledger>) -> SocketAddr {
    let state = AppState { ledger };
    let app = Router::new()
        .route("/accounts/{id}", get(get_account).delete(delete_account))
        .route("/accounts/{id}/deposits", post(deposit))
        .route("/accounts/{id}/withdrawals", post(withdraw))
        .route("/transfers", post(transfer))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn seeded_ledger(accounts: &[(u32, Decimal)]) -> Arc<Ledger> {
    let ledger = Ledger::new();
    for (id, balance) in accounts {
        ledger.create_account(AccountId(*id), *balance).unwrap();
    }
    Arc::new(ledger)
}

// === Tests ===

#[tokio::test]
async fn get_account_maps_to_200_and_404() {
    let addr = spawn_server(seeded_ledger(&[(1, dec!(100.00))])).await;
    let client = Client::new();

    let ok = client
        .get(format!("http://{addr}/accounts/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    let body: AccountResponse = ok.json().await.unwrap();
    assert_eq!(body.balance, dec!(100.00));

    let missing = client
        .get(format!("http://{addr}/accounts/99"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    let body: ErrorResponse = missing.json().await.unwrap();
    assert_eq!(body.code, "ACCOUNT_NOT_FOUND");
}

#[tokio::test]
async fn deposit_and_withdraw_roundtrip() {
    let addr = spawn_server(seeded_ledger(&[(1, dec!(100.00))])).await;
    let client = Client::new();

    let response = client
        .post(format!("http://{addr}/accounts/1/deposits"))
        .json(&AmountRequest {
            amount: dec!(50.00),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: AccountResponse = response.json().await.unwrap();
    assert_eq!(body.balance, dec!(150.00));

    let response = client
        .post(format!("http://{addr}/accounts/1/withdrawals"))
        .json(&AmountRequest {
            amount: dec!(30.00),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: AccountResponse = response.json().await.unwrap();
    assert_eq!(body.balance, dec!(120.00));
}

#[tokio::test]
async fn invalid_amount_maps_to_400() {
    let addr = spawn_server(seeded_ledger(&[(1, dec!(100.00))])).await;
    let client = Client::new();

    let response = client
        .post(format!("http://{addr}/accounts/1/deposits"))
        .json(&AmountRequest {
            amount: dec!(-5.00),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.code, "INVALID_AMOUNT");
}

#[tokio::test]
async fn insufficient_funds_maps_to_409() {
    let addr = spawn_server(seeded_ledger(&[(1, dec!(50.00))])).await;
    let client = Client::new();

    let response = client
        .post(format!("http://{addr}/accounts/1/withdrawals"))
        .json(&AmountRequest {
            amount: dec!(100.00),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.code, "INSUFFICIENT_FUNDS");

    // Balance unchanged
    let account: AccountResponse = client
        .get(format!("http://{addr}/accounts/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(account.balance, dec!(50.00));
}

#[tokio::test]
async fn transfer_reports_new_source_balance() {
    let addr = spawn_server(seeded_ledger(&[(1, dec!(500.00)), (2, dec!(100.00))])).await;
    let client = Client::new();

    let response = client
        .post(format!("http://{addr}/transfers"))
        .json(&TransferRequest {
            source: 1,
            destination: 2,
            amount: dec!(200.00),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: TransferResponse = response.json().await.unwrap();
    assert_eq!(body.source, 1);
    assert_eq!(body.destination, 2);
    assert_eq!(body.source_balance, dec!(300.00));
}

#[tokio::test]
async fn self_transfer_maps_to_400() {
    let addr = spawn_server(seeded_ledger(&[(1, dec!(100.00))])).await;
    let client = Client::new();

    let response = client
        .post(format!("http://{addr}/transfers"))
        .json(&TransferRequest {
            source: 1,
            destination: 1,
            amount: dec!(10.00),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn delete_maps_zero_and_nonzero_balances() {
    let addr = spawn_server(seeded_ledger(&[(1, dec!(100.00)), (2, Decimal::ZERO)])).await;
    let client = Client::new();

    let nonzero = client
        .delete(format!("http://{addr}/accounts/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(nonzero.status(), 409);
    let body: ErrorResponse = nonzero.json().await.unwrap();
    assert_eq!(body.code, "NON_ZERO_BALANCE");

    let zero = client
        .delete(format!("http://{addr}/accounts/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(zero.status(), 204);

    let gone = client
        .get(format!("http://{addr}/accounts/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_http_deposits_are_exact() {
    let ledger = seeded_ledger(&[(1, Decimal::ZERO)]);
    let addr = spawn_server(ledger.clone()).await;
    let client = Client::new();

    const REQUESTS: usize = 100;

    let calls = (0..REQUESTS).map(|_| {
        let client = client.clone();
        async move {
            let response = client
                .post(format!("http://{addr}/accounts/1/deposits"))
                .json(&AmountRequest {
                    amount: dec!(10.00),
                })
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
        }
    });
    futures::future::join_all(calls).await;

    let balance = ledger.get_account(AccountId(1)).unwrap().balance;
    assert_eq!(balance, dec!(1000.00));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_http_transfers_conserve_funds() {
    let ledger = seeded_ledger(&[(1, dec!(5000.00)), (2, dec!(5000.00))]);
    let addr = spawn_server(ledger.clone()).await;
    let client = Client::new();

    const REQUESTS: usize = 100;

    let calls = (0..REQUESTS).map(|i| {
        let client = client.clone();
        let (source, destination) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
        async move {
            let response = client
                .post(format!("http://{addr}/transfers"))
                .json(&TransferRequest {
                    source,
                    destination,
                    amount: dec!(10.00),
                })
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
        }
    });
    futures::future::join_all(calls).await;

    let total = ledger.get_account(AccountId(1)).unwrap().balance
        + ledger.get_account(AccountId(2)).unwrap().balance;
    assert_eq!(total, dec!(10000.00));
}
