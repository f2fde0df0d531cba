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

//! Error types for ledger operations.

use crate::base::AccountId;
use thiserror::Error;

/// Ledger operation errors.
///
/// A returned error guarantees that no account balance was mutated by the
/// failed operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Referenced account does not exist
    #[error("account {0} not found")]
    NotFound(AccountId),

    /// Amount is zero or negative, or a transfer names the same account twice
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Withdrawal or transfer would drive the balance negative
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Account creation with an id that is already taken
    #[error("account {0} already exists")]
    DuplicateAccount(AccountId),

    /// Deletion attempted while the account still holds funds
    #[error("account {0} still holds funds")]
    NonZeroBalance(AccountId),
}
