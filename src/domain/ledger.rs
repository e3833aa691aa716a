use std::collections::HashMap;

use super::{parse_saldo, Amount, CellValue, Record};

/// Ledger sheet column holding the owning portfolio's email address.
pub const PORTFOLIO_FIELD: &str = "portefeuille";
/// Ledger sheet column holding the row's balance.
pub const BALANCE_FIELD: &str = "saldo";

/// A single ledger row reduced to the two columns the totals care about.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    /// `None` when the row has no portfolio email.
    pub portfolio_email: Option<String>,
    pub balance: Amount,
}

impl LedgerRow {
    pub fn from_record(record: &Record) -> Self {
        let portfolio = record.get(PORTFOLIO_FIELD);
        Self {
            portfolio_email: portfolio.is_truthy().then(|| portfolio.to_display()),
            balance: balance_of(record.get(BALANCE_FIELD)),
        }
    }
}

/// Numeric cells count as-is; text goes through `parse_saldo`; blanks are zero.
fn balance_of(cell: &CellValue) -> Amount {
    match cell {
        cell if !cell.is_truthy() => 0.0,
        CellValue::Number(n) => *n,
        other => parse_saldo(&other.to_display()),
    }
}

/// Accumulated balance for one display name.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTotal {
    pub name: String,
    pub total: Amount,
}

/// Running totals keyed by display name.
#[derive(Debug, Clone, Default)]
pub struct UserTotals {
    totals: HashMap<String, Amount>,
}

impl UserTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, amount: Amount) {
        match self.totals.get_mut(name) {
            Some(total) => *total += amount,
            None => {
                self.totals.insert(name.to_string(), amount);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Amount> {
        self.totals.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn into_totals(self) -> Vec<UserTotal> {
        self.totals
            .into_iter()
            .map(|(name, total)| UserTotal { name, total })
            .collect()
    }
}
