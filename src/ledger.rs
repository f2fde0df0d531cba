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

//! Ledger service.
//!
//! The [`Ledger`] is the central component that executes balance-affecting
//! operations against the [`AccountStore`], enforcing amount validation and
//! the non-negative balance invariant.
//!
//! # Operations
//!
//! - **Deposits**: Credit funds to an account (cannot fail on balance grounds).
//! - **Withdrawals**: Debit funds (fails if insufficient funds).
//! - **Transfers**: Atomically move funds between two accounts.
//! - **Create/Delete**: Account lifecycle; deletion requires a zero balance.
//!
//! # Thread Safety
//!
//! The ledger uses per-account mutexes behind a [`DashMap`](dashmap::DashMap),
//! allowing operations on different accounts to proceed in parallel. Transfers
//! lock their two accounts in ascending id order, so crossing transfers never
//! deadlock.

use crate::account::AccountSnapshot;
use crate::base::AccountId;
use crate::error::LedgerError;
use crate::operation::Operation;
use crate::store::AccountStore;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

/// Outcome of a successful transfer.
///
/// Reports both parties and the remaining balance on the source account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub source: AccountId,
    pub destination: AccountId,
    pub source_balance: Decimal,
}

impl Serialize for TransferReceipt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("TransferReceipt", 3)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("destination", &self.destination)?;
        state.serialize_field("source_balance", &self.source_balance.round_dp(4))?;
        state.end()
    }
}

/// Ledger service over a shared account store.
///
/// # Invariants
///
/// - No account balance is ever negative.
/// - A failed operation leaves every balance unchanged.
/// - A transfer debits and credits as one atomic unit; no reader observes
///   the debit without the credit.
#[derive(Debug)]
pub struct Ledger {
    store: AccountStore,
}

impl Ledger {
    /// Creates a ledger with no accounts.
    pub fn new() -> Self {
        Ledger {
            store: AccountStore::new(),
        }
    }

    fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(())
    }

    /// Returns the account's current state.
    pub fn get_account(&self, id: AccountId) -> Result<AccountSnapshot, LedgerError> {
        self.store.get(id)
    }

    /// Credits `amount` to the account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - `amount` is zero or negative.
    /// - [`LedgerError::NotFound`] - the account does not exist.
    pub fn deposit(&self, id: AccountId, amount: Decimal) -> Result<AccountSnapshot, LedgerError> {
        Self::validate_amount(amount)?;
        let snapshot = self.store.mutate(id, |balance| Ok(balance + amount))?;
        debug!(account = %id, %amount, "deposit applied");
        Ok(snapshot)
    }

    /// Debits `amount` from the account.
    ///
    /// The funds check happens inside the same exclusive access as the
    /// decrement; two concurrent withdrawals can never both pass a stale
    /// check.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - `amount` is zero or negative.
    /// - [`LedgerError::NotFound`] - the account does not exist.
    /// - [`LedgerError::InsufficientFunds`] - the balance is below `amount`.
    pub fn withdraw(&self, id: AccountId, amount: Decimal) -> Result<AccountSnapshot, LedgerError> {
        Self::validate_amount(amount)?;
        let snapshot = self.store.mutate(id, |balance| {
            if balance < amount {
                Err(LedgerError::InsufficientFunds)
            } else {
                Ok(balance - amount)
            }
        })?;
        debug!(account = %id, %amount, "withdrawal applied");
        Ok(snapshot)
    }

    /// Moves `amount` from `source` to `destination` as one atomic unit.
    ///
    /// Existence of both accounts is validated before funds; a transfer that
    /// fails for any reason mutates neither account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - `amount` is zero or negative, or
    ///   `source == destination`.
    /// - [`LedgerError::NotFound`] - either account does not exist.
    /// - [`LedgerError::InsufficientFunds`] - the source balance is below
    ///   `amount`.
    pub fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        Self::validate_amount(amount)?;
        if source == destination {
            return Err(LedgerError::InvalidAmount);
        }
        let (from, _to) = self.store.mutate_pair(source, destination, |src, dst| {
            if src < amount {
                Err(LedgerError::InsufficientFunds)
            } else {
                Ok((src - amount, dst + amount))
            }
        })?;
        debug!(%source, %destination, %amount, "transfer applied");
        Ok(TransferReceipt {
            source,
            destination,
            source_balance: from.balance,
        })
    }

    /// Opens a new account with the given balance (zero allowed).
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - the opening balance is negative.
    /// - [`LedgerError::DuplicateAccount`] - the id is already taken.
    pub fn create_account(
        &self,
        id: AccountId,
        balance: Decimal,
    ) -> Result<AccountSnapshot, LedgerError> {
        if balance < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        self.store.create(id, balance)
    }

    /// Removes an account holding a zero balance.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] - the account does not exist.
    /// - [`LedgerError::NonZeroBalance`] - the account still holds funds.
    pub fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        self.store.delete(id)
    }

    /// Snapshots of all accounts, ascending by id.
    ///
    /// Useful for generating output reports of account states.
    pub fn accounts(&self) -> Vec<AccountSnapshot> {
        self.store.snapshots()
    }

    /// Dispatches a single [`Operation`], discarding the success payload.
    ///
    /// Batch drivers replay operation streams through this entry point.
    pub fn apply(&self, operation: Operation) -> Result<(), LedgerError> {
        match operation {
            Operation::Create { account, balance } => {
                self.create_account(account, balance).map(|_| ())
            }
            Operation::Deposit { account, amount } => self.deposit(account, amount).map(|_| ()),
            Operation::Withdraw { account, amount } => self.withdraw(account, amount).map(|_| ()),
            Operation::Transfer {
                source,
                destination,
                amount,
            } => self.transfer(source, destination, amount).map(|_| ()),
            Operation::Delete { account } => self.delete_account(account),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
