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

//! Account state and snapshots.
//!
//! An [`Account`] guards its balance with a per-account mutex; the only way
//! state leaves this module is as an [`AccountSnapshot`], an owned copy taken
//! while the lock is held.

use crate::base::AccountId;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

#[derive(Debug)]
pub(crate) struct AccountData {
    pub(crate) id: AccountId,
    pub(crate) balance: Decimal,
    /// Set under the mutex at the moment the account is removed from the
    /// store, so callers still holding the `Arc` observe NotFound instead of
    /// mutating a removed account.
    pub(crate) closed: bool,
}

impl AccountData {
    fn new(id: AccountId, balance: Decimal) -> Self {
        Self {
            id,
            balance,
            closed: false,
        }
    }

    pub(crate) fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }

    pub(crate) fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            balance: self.balance,
        }
    }
}

/// Ledger account.
#[derive(Debug)]
pub(crate) struct Account {
    pub(crate) inner: Mutex<AccountData>,
}

impl Account {
    pub(crate) fn new(id: AccountId, balance: Decimal) -> Self {
        Self {
            inner: Mutex::new(AccountData::new(id, balance)),
        }
    }
}

/// Immutable copy of an account's state at a point in time.
///
/// Safe to hold and read after the account lock has been released; later
/// mutations of the account do not affect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub balance: Decimal,
}

impl AccountSnapshot {
    const DECIMAL_PRECISION: u32 = 4;
}

impl Serialize for AccountSnapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("AccountSnapshot", 2)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field(
            "balance",
            &self.balance.round_dp(AccountSnapshot::DECIMAL_PRECISION),
        )?;
        state.end()
    }
}
