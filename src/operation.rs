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

//! Balance-affecting operations.
//!
//! Each operation is a single atomic attempt; nothing is retried.

use crate::base::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Operation {
    Create {
        account: AccountId,
        balance: Decimal,
    },
    Deposit {
        account: AccountId,
        amount: Decimal,
    },
    Withdraw {
        account: AccountId,
        amount: Decimal,
    },
    Transfer {
        source: AccountId,
        destination: AccountId,
        amount: Decimal,
    },
    Delete {
        account: AccountId,
    },
}

impl Operation {
    /// The account the operation is charged against (the source for
    /// transfers).
    pub fn account(&self) -> AccountId {
        match self {
            Self::Create { account, .. } => *account,
            Self::Deposit { account, .. } => *account,
            Self::Withdraw { account, .. } => *account,
            Self::Transfer { source, .. } => *source,
            Self::Delete { account } => *account,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Self::Create { balance, .. } => *balance,
            Self::Deposit { amount, .. } => *amount,
            Self::Withdraw { amount, .. } => *amount,
            Self::Transfer { amount, .. } => *amount,
            Self::Delete { .. } => Decimal::ZERO,
        }
    }
}
