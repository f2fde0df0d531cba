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

//! # Bank Ledger
//!
//! This library provides a concurrent in-memory banking ledger for executing
//! balance-affecting operations: deposits, withdrawals, and account-to-account
//! transfers.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Ledger service executing operations over accounts
//! - [`AccountStore`]: Concurrent store owning all account state
//! - [`AccountSnapshot`]: Immutable copy of an account's state
//! - [`Operation`]: Supported operation kinds for batch replay
//! - [`LedgerError`]: Typed failures (not found, invalid amount, ...)
//!
//! ## Example
//!
//! ```
//! use bank_ledger_rs::{AccountId, Ledger};
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new();
//! ledger.create_account(AccountId(1), dec!(500.00)).unwrap();
//! ledger.create_account(AccountId(2), dec!(100.00)).unwrap();
//!
//! // Move funds atomically between the two accounts
//! let receipt = ledger.transfer(AccountId(1), AccountId(2), dec!(200.00)).unwrap();
//! assert_eq!(receipt.source_balance, dec!(300.00));
//!
//! let destination = ledger.get_account(AccountId(2)).unwrap();
//! assert_eq!(destination.balance, dec!(300.00));
//! ```
//!
//! ## Thread Safety
//!
//! Every account is guarded by its own mutex, so operations on different
//! accounts proceed in parallel. A transfer locks exactly two accounts in
//! ascending id order, which keeps crossing transfers deadlock-free. No
//! account ever goes negative, and a failed operation mutates nothing.

pub mod account;
mod base;
pub mod error;
mod ledger;
mod operation;
mod store;

pub use account::AccountSnapshot;
pub use base::AccountId;
pub use error::LedgerError;
pub use ledger::{Ledger, TransferReceipt};
pub use operation::Operation;
pub use store::AccountStore;
