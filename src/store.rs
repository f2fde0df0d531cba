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

//! Concurrent account store.
//!
//! The [`AccountStore`] owns every account and is the only path to read or
//! mutate one. Accounts live in a [`DashMap`] as `Arc<Account>`; a caller
//! clones the `Arc` out of the map (releasing the map shard immediately) and
//! then takes the per-account mutex, so map access and balance access never
//! nest the wrong way around.
//!
//! # Locking
//!
//! - Single-account operations hold exactly one account mutex, for the
//!   duration of reading and writing the balance field.
//! - [`AccountStore::mutate_pair`] holds two account mutexes, always acquired
//!   in ascending id order regardless of argument order. Two transfers
//!   crossing in opposite directions therefore contend on the same first
//!   lock instead of waiting on each other in a cycle.
//! - [`AccountStore::delete`] marks the account closed under its mutex before
//!   removing the map entry, so a caller that cloned the `Arc` just before
//!   the removal observes NotFound instead of depositing into a dead account.

use crate::account::{Account, AccountSnapshot};
use crate::base::AccountId;
use crate::error::LedgerError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Account store indexed by account id.
#[derive(Debug)]
pub struct AccountStore {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl AccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    fn fetch(&self, id: AccountId) -> Result<Arc<Account>, LedgerError> {
        self.accounts
            .get(&id)
            .map(|account| account.clone())
            .ok_or(LedgerError::NotFound(id))
    }

    /// Returns a snapshot of the account's current state.
    pub fn get(&self, id: AccountId) -> Result<AccountSnapshot, LedgerError> {
        let account = self.fetch(id)?;
        let data = account.inner.lock();
        if data.closed {
            return Err(LedgerError::NotFound(id));
        }
        Ok(data.snapshot())
    }

    /// Applies a single balance transition under exclusive access to one
    /// account.
    ///
    /// `f` receives the current balance and returns the new one. If `f`
    /// returns an error, the account is left untouched and the error is
    /// surfaced unchanged.
    pub fn mutate<F>(&self, id: AccountId, f: F) -> Result<AccountSnapshot, LedgerError>
    where
        F: FnOnce(Decimal) -> Result<Decimal, LedgerError>,
    {
        let account = self.fetch(id)?;
        let mut data = account.inner.lock();
        if data.closed {
            return Err(LedgerError::NotFound(id));
        }
        data.balance = f(data.balance)?;
        data.assert_invariants();
        Ok(data.snapshot())
    }

    /// Applies a joint balance transition to two accounts: either both are
    /// mutated or neither is.
    ///
    /// `f` receives the balances in argument order `(a, b)` and returns the
    /// new pair in the same order. Existence of both accounts is validated
    /// before `f` runs. The two account mutexes are acquired in ascending id
    /// order regardless of argument order.
    pub fn mutate_pair<F>(
        &self,
        id_a: AccountId,
        id_b: AccountId,
        f: F,
    ) -> Result<(AccountSnapshot, AccountSnapshot), LedgerError>
    where
        F: FnOnce(Decimal, Decimal) -> Result<(Decimal, Decimal), LedgerError>,
    {
        if id_a == id_b {
            return Err(LedgerError::InvalidAmount);
        }

        let account_a = self.fetch(id_a)?;
        let account_b = self.fetch(id_b)?;

        // Canonical lock order: lower id first.
        let (first, second) = if id_a < id_b {
            (&account_a, &account_b)
        } else {
            (&account_b, &account_a)
        };
        let mut first_guard = first.inner.lock();
        let mut second_guard = second.inner.lock();
        let (data_a, data_b) = if id_a < id_b {
            (&mut *first_guard, &mut *second_guard)
        } else {
            (&mut *second_guard, &mut *first_guard)
        };

        if data_a.closed {
            return Err(LedgerError::NotFound(id_a));
        }
        if data_b.closed {
            return Err(LedgerError::NotFound(id_b));
        }

        let (balance_a, balance_b) = f(data_a.balance, data_b.balance)?;
        data_a.balance = balance_a;
        data_b.balance = balance_b;
        data_a.assert_invariants();
        data_b.assert_invariants();
        Ok((data_a.snapshot(), data_b.snapshot()))
    }

    /// Inserts a new account with the given opening balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateAccount`] if the id is already taken.
    pub fn create(&self, id: AccountId, balance: Decimal) -> Result<AccountSnapshot, LedgerError> {
        // Entry API for atomic check-and-insert.
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateAccount(id)),
            Entry::Vacant(entry) => {
                let account = Arc::new(Account::new(id, balance));
                let snapshot = account.inner.lock().snapshot();
                entry.insert(account);
                Ok(snapshot)
            }
        }
    }

    /// Removes an account, which must hold a zero balance.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] if the account does not exist.
    /// - [`LedgerError::NonZeroBalance`] if it still holds funds.
    pub fn delete(&self, id: AccountId) -> Result<(), LedgerError> {
        match self.accounts.entry(id) {
            Entry::Occupied(entry) => {
                let mut data = entry.get().inner.lock();
                if data.balance != Decimal::ZERO {
                    return Err(LedgerError::NonZeroBalance(id));
                }
                // Closing under the mutex fences out concurrent mutations
                // that already cloned the Arc.
                data.closed = true;
                drop(data);
                entry.remove();
                Ok(())
            }
            Entry::Vacant(_) => Err(LedgerError::NotFound(id)),
        }
    }

    /// Snapshots of all live accounts, ascending by id.
    pub fn snapshots(&self) -> Vec<AccountSnapshot> {
        let mut snapshots: Vec<AccountSnapshot> = self
            .accounts
            .iter()
            .filter_map(|entry| {
                let data = entry.value().inner.lock();
                if data.closed { None } else { Some(data.snapshot()) }
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Number of accounts in the store.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}
