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

use bank_ledger_rs::{AccountId, Ledger, Operation};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Bank Ledger - Replay operation CSV files
///
/// Reads balance operations from a CSV file and outputs final account states
/// to stdout. Supports create, deposit, withdraw, transfer, and delete.
#[derive(Parser, Debug)]
#[command(name = "bank-ledger-rs")]
#[command(about = "Replays balance operations from a CSV file", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,account,to,amount
    /// Example: cargo run -- operations.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    init_tracing();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let ledger = match replay_operations(BufReader::new(file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error replaying operations: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_accounts(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Log to stderr, filterable via RUST_LOG (defaults to warn).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, account, to, amount`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    account: u32,
    #[serde(deserialize_with = "csv::invalid_option")]
    to: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
}

impl CsvRecord {
    /// Converts the CSV record to an [`Operation`].
    ///
    /// Returns `None` for unknown operation names or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        let account = AccountId(self.account);

        match self.op.to_lowercase().as_str() {
            "create" => Some(Operation::Create {
                account,
                balance: self.amount.unwrap_or(Decimal::ZERO),
            }),
            "deposit" => {
                let amount = self.amount?;
                Some(Operation::Deposit { account, amount })
            }
            "withdraw" => {
                let amount = self.amount?;
                Some(Operation::Withdraw { account, amount })
            }
            "transfer" => {
                let destination = AccountId(self.to?);
                let amount = self.amount?;
                Some(Operation::Transfer {
                    source: account,
                    destination,
                    amount,
                })
            }
            "delete" => Some(Operation::Delete { account }),
            _ => None,
        }
    }
}

/// Replays operations from a CSV reader against a fresh ledger.
///
/// Streaming parse; malformed rows and rejected operations are skipped and
/// logged rather than aborting the run.
///
/// # CSV Format
///
/// Expected columns: `op, account, to, amount`
/// - `op`: Operation name (create, deposit, withdraw, transfer, delete)
/// - `account`: Account id (u32); the source for transfers
/// - `to`: Destination account id (transfers only)
/// - `amount`: Decimal amount (opening balance for create; empty for delete)
///
/// # Example
///
/// ```csv
/// op,account,to,amount
/// create,1,,1000.0
/// create,2,,250.0
/// deposit,1,,100.0
/// transfer,1,2,50.0
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader itself fails; individual operation
/// failures do not stop processing.
pub fn replay_operations<R: Read>(reader: R) -> Result<Ledger, csv::Error> {
    let ledger = Ledger::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " deposit "
        .flexible(true) // Allow missing trailing fields
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_operation() else {
                    warn!("skipping invalid operation record");
                    continue;
                };

                if let Err(e) = ledger.apply(op) {
                    warn!(account = %op.account(), "skipping operation: {e}");
                }
            }
            Err(e) => {
                warn!("skipping malformed row: {e}");
                continue;
            }
        }
    }

    Ok(ledger)
}

/// Writes final account states to a CSV writer.
///
/// Columns: `id, balance`, ascending by id, balances with 4 decimal
/// precision.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for snapshot in ledger.accounts() {
        wtr.serialize(snapshot)?;
    }

    wtr.flush()?;
    Ok(())
}
