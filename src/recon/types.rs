//! Core reconciliation data model shared by ingestion, matching and the
//! analysis pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::FieldValue;

/// Which source system a booking came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Internal,
    Custody,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Internal => write!(f, "internal"),
            Side::Custody => write!(f, "custody"),
        }
    }
}

/// One booking, reshaped into the shared field vocabulary.
///
/// Both sources produce the same shape; fields a source cannot supply are
/// `Absent`. The non-comparable context fields ride along because the
/// analysis stage uses them to explain why the comparable ones differ.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalEntry {
    /// Zero-based data row in the originating extract.
    pub row_id: Option<usize>,

    // Identifiers
    pub isin: FieldValue,
    pub sedol: FieldValue,
    pub ticker: FieldValue,
    pub ex_date: FieldValue,
    pub pay_date: FieldValue,
    pub currency: FieldValue,
    pub settlement_currency: FieldValue,
    pub custodian: FieldValue,
    pub company_name: FieldValue,
    pub instrument_description: FieldValue,
    pub organisation_name: FieldValue,

    // Dividend amounts and rates
    pub dividend_rate: FieldValue,
    pub gross_amount: FieldValue,
    pub net_amount: FieldValue,
    pub settlement_net_amount: FieldValue,
    pub withholding_tax: FieldValue,
    pub withholding_rate: FieldValue,
    pub total_tax_rate: FieldValue,

    // Position
    pub quantity: FieldValue,
    pub holding_quantity: FieldValue,
    pub loan_quantity: FieldValue,
    pub lending_percentage: FieldValue,

    // FX and cross-currency
    pub fx_rate: FieldValue,
    pub fx_rate_to_portfolio: FieldValue,
    pub is_cross_currency_reversal: FieldValue,

    // Additional tax detail
    pub local_tax: FieldValue,
    pub local_tax_settlement: FieldValue,

    // Restitution
    pub restitution_payment: FieldValue,
    pub restitution_amount: FieldValue,
    pub restitution_rate: FieldValue,

    // Portfolio-currency amounts
    pub portfolio_gross_amount: FieldValue,
    pub portfolio_net_amount: FieldValue,
    pub portfolio_withholding_tax: FieldValue,
}

/// A normalized booking plus the grouping identifiers it was filed under.
///
/// The event key and account id stay outside [`CanonicalEntry`] because they
/// decide where the entry lands rather than what it says.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub side: Side,
    /// Trimmed event key, `None` when the cell was empty or a null marker.
    pub event_key: Option<String>,
    /// Raw account cell, normalized into a bucket key during aggregation.
    pub account_id: Option<String>,
    pub entry: CanonicalEntry,
}

/// One field that disagrees between the two sides of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub field: String,
    pub internal: FieldValue,
    pub custody: FieldValue,
}

/// Paired bookings for one account within an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountBucket {
    pub internal: Option<CanonicalEntry>,
    pub custody: Option<CanonicalEntry>,
    pub mismatches: Vec<Mismatch>,
}

impl AccountBucket {
    pub fn entry(&self, side: Side) -> Option<&CanonicalEntry> {
        match side {
            Side::Internal => self.internal.as_ref(),
            Side::Custody => self.custody.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, side: Side) -> &mut Option<CanonicalEntry> {
        match side {
            Side::Internal => &mut self.internal,
            Side::Custody => &mut self.custody,
        }
    }
}

/// Everything known about one corporate-action event, keyed by account.
///
/// Account keys are sorted for stable serialization; event-level ordering is
/// handled by the aggregation step instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub event_key: String,
    pub accounts: BTreeMap<String, AccountBucket>,
}

impl EventRecord {
    pub fn new(event_key: impl Into<String>) -> Self {
        Self {
            event_key: event_key.into(),
            accounts: BTreeMap::new(),
        }
    }

    /// Total mismatches across all accounts, for logging.
    pub fn mismatch_count(&self) -> usize {
        self.accounts.values().map(|bucket| bucket.mismatches.len()).sum()
    }
}
