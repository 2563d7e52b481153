use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Drops per XRP, the ledger's fixed scale factor
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Read-only snapshot of account-level state, re-fetched on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Ledger objects owned by the account, one reserve unit each
    pub owner_count: u32,
    /// Spendable balance in drops
    pub balance_drops: u64,
}

impl AccountSnapshot {
    /// Spendable balance in XRP
    pub fn balance_xrp(&self) -> Decimal {
        Decimal::from(self.balance_drops) / Decimal::from(DROPS_PER_XRP)
    }
}

/// A trust line between the account and one issuer/currency pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustLine {
    pub currency: String,
    pub issuer: String,
    pub balance: Decimal,
}

/// Wire form of one account_lines entry; the issuer arrives in the
/// `account` field and the balance as a decimal string
#[derive(Debug, Deserialize)]
pub struct TrustLineRecord {
    pub currency: String,
    pub account: String,
    pub balance: String,
}

impl TryFrom<TrustLineRecord> for TrustLine {
    type Error = AppError;

    fn try_from(record: TrustLineRecord) -> AppResult<Self> {
        let balance = record.balance.parse::<Decimal>().map_err(|e| {
            AppError::Internal(format!(
                "unparseable trust line balance {:?}: {}",
                record.balance, e
            ))
        })?;
        Ok(Self {
            currency: record.currency,
            issuer: record.account,
            balance,
        })
    }
}

/// Result of one full scan; `complete` is false when the server answered
/// a page with an error and the set was truncated
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub lines: Vec<TrustLine>,
    pub complete: bool,
}

/// Classified result of one retirement attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetirementOutcome {
    Success,
    /// Ledger reports the line is already gone (tecNO_LINE_REDUNDANT)
    AlreadyRetired,
    Failed(String),
}

/// Running counters folded over the batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: u32,
    pub already_retired: u32,
    pub failed: u32,
}

impl Tally {
    pub fn record(mut self, outcome: &RetirementOutcome) -> Self {
        match outcome {
            RetirementOutcome::Success => self.succeeded += 1,
            RetirementOutcome::AlreadyRetired => self.already_retired += 1,
            RetirementOutcome::Failed(_) => self.failed += 1,
        }
        self
    }
}

/// Aggregate outcome of a whole run
#[derive(Debug, Clone)]
pub struct FinalReport {
    pub candidates: usize,
    pub scan_complete: bool,
    pub tally: Tally,
    pub initial_owner_count: u32,
    /// None when the closing snapshot could not be fetched
    pub final_owner_count: Option<u32>,
    pub released_reserve: Option<Decimal>,
    /// The account has no owned objects left and qualifies for deletion
    pub deletion_ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn trust_line_parses_wire_record() {
        let record = TrustLineRecord {
            currency: "USD".to_string(),
            account: "rIssuer".to_string(),
            balance: "-0.5".to_string(),
        };
        let line = TrustLine::try_from(record).unwrap();
        assert_eq!(line.issuer, "rIssuer");
        assert_eq!(line.balance, dec!(-0.5));
    }

    #[test]
    fn tally_folds_outcomes() {
        let outcomes = [
            RetirementOutcome::Success,
            RetirementOutcome::AlreadyRetired,
            RetirementOutcome::Failed("tecNO_PERMISSION".to_string()),
            RetirementOutcome::Success,
        ];
        let tally = outcomes
            .iter()
            .fold(Tally::default(), |tally, outcome| tally.record(outcome));
        assert_eq!(tally.succeeded, 2);
        assert_eq!(tally.already_retired, 1);
        assert_eq!(tally.failed, 1);
    }

    #[test]
    fn snapshot_converts_drops_to_xrp() {
        let snapshot = AccountSnapshot {
            owner_count: 3,
            balance_drops: 12_500_000,
        };
        assert_eq!(snapshot.balance_xrp(), dec!(12.5));
    }
}
