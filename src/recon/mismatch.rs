//! Field-by-field mismatch detection within an account bucket.

use super::types::{AccountBucket, CanonicalEntry, EventRecord, Mismatch};
use super::value::FieldValue;

/// Marker field flagging an account that only the ledger side booked.
pub const MISSING_CUSTODY: &str = "missing_custody";
/// Marker field flagging an account that only the custody side booked.
pub const MISSING_INTERNAL: &str = "missing_internal";

/// Fields both sources are expected to agree on.
///
/// Context fields only one source can supply are deliberately not listed;
/// comparing them would flag every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparableField {
    Isin,
    Sedol,
    ExDate,
    PayDate,
    Currency,
    SettlementCurrency,
    Custodian,
    DividendRate,
    GrossAmount,
    NetAmount,
    SettlementNetAmount,
    WithholdingTax,
    WithholdingRate,
    Quantity,
}

/// Comparison order, which is also the order mismatches are reported in.
pub const COMPARABLE_FIELDS: [ComparableField; 14] = [
    ComparableField::Isin,
    ComparableField::Sedol,
    ComparableField::ExDate,
    ComparableField::PayDate,
    ComparableField::Currency,
    ComparableField::SettlementCurrency,
    ComparableField::Custodian,
    ComparableField::DividendRate,
    ComparableField::GrossAmount,
    ComparableField::NetAmount,
    ComparableField::SettlementNetAmount,
    ComparableField::WithholdingTax,
    ComparableField::WithholdingRate,
    ComparableField::Quantity,
];

impl ComparableField {
    pub fn name(self) -> &'static str {
        match self {
            ComparableField::Isin => "isin",
            ComparableField::Sedol => "sedol",
            ComparableField::ExDate => "ex_date",
            ComparableField::PayDate => "pay_date",
            ComparableField::Currency => "currency",
            ComparableField::SettlementCurrency => "settlement_currency",
            ComparableField::Custodian => "custodian",
            ComparableField::DividendRate => "dividend_rate",
            ComparableField::GrossAmount => "gross_amount",
            ComparableField::NetAmount => "net_amount",
            ComparableField::SettlementNetAmount => "settlement_net_amount",
            ComparableField::WithholdingTax => "withholding_tax",
            ComparableField::WithholdingRate => "withholding_rate",
            ComparableField::Quantity => "quantity",
        }
    }

    pub fn value_of(self, entry: &CanonicalEntry) -> &FieldValue {
        match self {
            ComparableField::Isin => &entry.isin,
            ComparableField::Sedol => &entry.sedol,
            ComparableField::ExDate => &entry.ex_date,
            ComparableField::PayDate => &entry.pay_date,
            ComparableField::Currency => &entry.currency,
            ComparableField::SettlementCurrency => &entry.settlement_currency,
            ComparableField::Custodian => &entry.custodian,
            ComparableField::DividendRate => &entry.dividend_rate,
            ComparableField::GrossAmount => &entry.gross_amount,
            ComparableField::NetAmount => &entry.net_amount,
            ComparableField::SettlementNetAmount => &entry.settlement_net_amount,
            ComparableField::WithholdingTax => &entry.withholding_tax,
            ComparableField::WithholdingRate => &entry.withholding_rate,
            ComparableField::Quantity => &entry.quantity,
        }
    }
}

/// Whether two field values meaningfully differ.
///
/// Comparison happens on canonical string forms, so a date and the same
/// date spelled as text agree, as do numbers that only differ in trailing
/// zeros. Two absent values agree; absent versus present differs.
pub fn values_differ(a: &FieldValue, b: &FieldValue) -> bool {
    match (a.comparable_form(), b.comparable_form()) {
        (None, None) => false,
        (None, Some(_)) | (Some(_), None) => true,
        (Some(left), Some(right)) => left != right,
    }
}

/// Fill in the `mismatches` list of every account bucket in an event.
pub fn annotate_event(event: &mut EventRecord) {
    for (account, bucket) in event.accounts.iter_mut() {
        bucket.mismatches = detect(bucket);
        if !bucket.mismatches.is_empty() {
            let fields: Vec<&str> = bucket
                .mismatches
                .iter()
                .map(|mismatch| mismatch.field.as_str())
                .collect();
            tracing::debug!(
                event_key = %event.event_key,
                account = %account,
                fields = ?fields,
                "Field mismatches"
            );
        }
    }
}

fn detect(bucket: &AccountBucket) -> Vec<Mismatch> {
    match (&bucket.internal, &bucket.custody) {
        (Some(internal), Some(custody)) => COMPARABLE_FIELDS
            .iter()
            .filter_map(|field| {
                let left = field.value_of(internal);
                let right = field.value_of(custody);
                values_differ(left, right).then(|| Mismatch {
                    field: field.name().to_string(),
                    internal: left.clone(),
                    custody: right.clone(),
                })
            })
            .collect(),
        // One-sided accounts get a single synthetic marker instead of a
        // mismatch per field.
        (Some(_), None) => vec![Mismatch {
            field: MISSING_CUSTODY.to_string(),
            internal: FieldValue::Text("present".into()),
            custody: FieldValue::Text("missing".into()),
        }],
        (None, Some(_)) => vec![Mismatch {
            field: MISSING_INTERNAL.to_string(),
            internal: FieldValue::Text("missing".into()),
            custody: FieldValue::Text("present".into()),
        }],
        (None, None) => Vec::new(),
    }
}
