//! Source-specific column maps.
//!
//! Each source names and types its columns differently; these maps reshape
//! both into [`CanonicalEntry`] so the rest of the pipeline never sees a
//! source-specific column name. Context fields only one source can supply
//! stay `Absent` on the other side and are excluded from comparison.

use crate::ingest::{SourceRow, SourceTable};

use super::types::{CanonicalEntry, NormalizedRow, Side};
use super::value::{coerce_date, coerce_number, coerce_text, FieldValue};

/// Event key column, shared by both sources.
const EVENT_KEY_COLUMN: &str = "COAC_EVENT_KEY";

fn text(row: &SourceRow, column: &str) -> FieldValue {
    match row.get(column) {
        Some(cell) => coerce_text(cell),
        None => FieldValue::Absent,
    }
}

fn number(row: &SourceRow, column: &str) -> FieldValue {
    match row.get(column) {
        Some(cell) => coerce_number(cell),
        None => FieldValue::Absent,
    }
}

fn date(row: &SourceRow, column: &str) -> FieldValue {
    match row.get(column) {
        Some(cell) => coerce_date(cell),
        None => FieldValue::Absent,
    }
}

/// Trimmed event key, `None` when the cell is empty or a null marker.
fn event_key(row: &SourceRow) -> Option<String> {
    match text(row, EVENT_KEY_COLUMN) {
        FieldValue::Text(key) => {
            let key = key.trim();
            (!key.is_empty()).then(|| key.to_string())
        }
        _ => None,
    }
}

fn account_id(row: &SourceRow, column: &str) -> Option<String> {
    match text(row, column) {
        FieldValue::Text(id) => Some(id),
        _ => None,
    }
}

/// Normalize an internal ledger extract.
pub fn normalize_internal(table: &SourceTable) -> Vec<NormalizedRow> {
    table
        .rows
        .iter()
        .map(|row| NormalizedRow {
            side: Side::Internal,
            event_key: event_key(row),
            account_id: account_id(row, "BANK_ACCOUNT"),
            entry: internal_entry(row),
        })
        .collect()
}

fn internal_entry(row: &SourceRow) -> CanonicalEntry {
    CanonicalEntry {
        row_id: Some(row.index),
        isin: text(row, "ISIN"),
        sedol: text(row, "SEDOL"),
        ticker: text(row, "TICKER"),
        ex_date: date(row, "EXDATE"),
        pay_date: date(row, "PAYMENT_DATE"),
        currency: text(row, "QUOTATION_CURRENCY"),
        settlement_currency: text(row, "SETTLEMENT_CURRENCY"),
        custodian: text(row, "CUSTODIAN"),
        // The ledger's organisation name doubles as the company name.
        company_name: text(row, "ORGANISATION_NAME"),
        instrument_description: text(row, "INSTRUMENT_DESCRIPTION"),
        organisation_name: text(row, "ORGANISATION_NAME"),
        dividend_rate: number(row, "DIVIDENDS_PER_SHARE"),
        gross_amount: number(row, "GROSS_AMOUNT_QUOTATION"),
        net_amount: number(row, "NET_AMOUNT_QUOTATION"),
        settlement_net_amount: number(row, "NET_AMOUNT_SETTLEMENT"),
        withholding_tax: number(row, "WTHTAX_COST_QUOTATION"),
        withholding_rate: number(row, "WTHTAX_RATE"),
        total_tax_rate: number(row, "TOTAL_TAX_RATE"),
        quantity: number(row, "NOMINAL_BASIS"),
        fx_rate_to_portfolio: number(row, "AVG_FX_RATE_QUOTATION_TO_PORTFOLIO"),
        local_tax: number(row, "LOCALTAX_COST_QUOTATION"),
        local_tax_settlement: number(row, "LOCALTAX_COST_SETTLEMENT"),
        restitution_rate: number(row, "RESTITUTION_RATE"),
        portfolio_gross_amount: number(row, "GROSS_AMOUNT_PORTFOLIO"),
        portfolio_net_amount: number(row, "NET_AMOUNT_PORTFOLIO"),
        portfolio_withholding_tax: number(row, "WTHTAX_COST_PORTFOLIO"),
        // Position detail, FX rate and restitution payments only exist in
        // custody extracts.
        ..CanonicalEntry::default()
    }
}

/// Normalize a custody extract.
pub fn normalize_custody(table: &SourceTable) -> Vec<NormalizedRow> {
    // Some custody extracts carry event-level date columns instead of
    // booking-level ones. The fallback is decided per file, not per cell.
    let ex_date_column = if table.has_column("EX_DATE") {
        "EX_DATE"
    } else {
        "EVENT_EX_DATE"
    };
    let pay_date_column = if table.has_column("PAY_DATE") {
        "PAY_DATE"
    } else {
        "EVENT_PAYMENT_DATE"
    };

    table
        .rows
        .iter()
        .map(|row| NormalizedRow {
            side: Side::Custody,
            event_key: event_key(row),
            account_id: account_id(row, "BANK_ACCOUNTS"),
            entry: custody_entry(row, ex_date_column, pay_date_column),
        })
        .collect()
}

fn custody_entry(row: &SourceRow, ex_date_column: &str, pay_date_column: &str) -> CanonicalEntry {
    CanonicalEntry {
        row_id: Some(row.index),
        isin: text(row, "ISIN"),
        sedol: text(row, "SEDOL"),
        ex_date: date(row, ex_date_column),
        pay_date: date(row, pay_date_column),
        currency: text(row, "CURRENCIES"),
        settlement_currency: text(row, "SETTLED_CURRENCY"),
        custodian: text(row, "CUSTODIAN"),
        dividend_rate: number(row, "DIV_RATE"),
        gross_amount: number(row, "GROSS_AMOUNT"),
        net_amount: number(row, "NET_AMOUNT_QC"),
        settlement_net_amount: number(row, "NET_AMOUNT_SC"),
        withholding_tax: number(row, "TAX"),
        withholding_rate: number(row, "TAX_RATE"),
        quantity: number(row, "NOMINAL_BASIS"),
        holding_quantity: number(row, "HOLDING_QUANTITY"),
        loan_quantity: number(row, "LOAN_QUANTITY"),
        lending_percentage: number(row, "LENDING_PERCENTAGE"),
        fx_rate: number(row, "FX_RATE"),
        is_cross_currency_reversal: text(row, "IS_CROSS_CURRENCY_REVERSAL"),
        restitution_payment: number(row, "POSSIBLE_RESTITUTION_PAYMENT"),
        restitution_amount: number(row, "POSSIBLE_RESTITUTION_AMOUNT"),
        // Ticker, company naming, per-tax breakdowns and portfolio-currency
        // amounts only exist in the ledger extract.
        ..CanonicalEntry::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(columns: &[&str], rows: Vec<SourceRow>) -> SourceTable {
        SourceTable::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    #[test]
    fn internal_maps_quotation_columns() {
        let row = SourceRow::from_pairs(
            0,
            &[
                ("COAC_EVENT_KEY", "EV1"),
                ("ISIN", "US0378331005"),
                ("EXDATE", "15.04.2024"),
                ("PAYMENT_DATE", "2024-05-01"),
                ("QUOTATION_CURRENCY", "USD"),
                ("DIVIDENDS_PER_SHARE", "0.24"),
                ("GROSS_AMOUNT_QUOTATION", "1 200.50"),
                ("ORGANISATION_NAME", "Apple Inc"),
                ("BANK_ACCOUNT", "ACC-1"),
            ],
        );
        let columns = [
            "COAC_EVENT_KEY",
            "ISIN",
            "EXDATE",
            "PAYMENT_DATE",
            "QUOTATION_CURRENCY",
            "DIVIDENDS_PER_SHARE",
            "GROSS_AMOUNT_QUOTATION",
            "ORGANISATION_NAME",
            "BANK_ACCOUNT",
        ];

        let rows = normalize_internal(&table(&columns, vec![row]));
        assert_eq!(rows.len(), 1);
        let normalized = &rows[0];

        assert_eq!(normalized.side, Side::Internal);
        assert_eq!(normalized.event_key.as_deref(), Some("EV1"));
        assert_eq!(normalized.account_id.as_deref(), Some("ACC-1"));
        assert_eq!(normalized.entry.row_id, Some(0));
        assert_eq!(
            normalized.entry.ex_date,
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap())
        );
        assert_eq!(normalized.entry.gross_amount, FieldValue::Number(1200.50));
        assert_eq!(
            normalized.entry.company_name,
            FieldValue::Text("Apple Inc".into())
        );
        assert_eq!(
            normalized.entry.organisation_name,
            FieldValue::Text("Apple Inc".into())
        );
        // Custody-only fields stay absent on the ledger side.
        assert!(normalized.entry.fx_rate.is_absent());
        assert!(normalized.entry.holding_quantity.is_absent());
    }

    #[test]
    fn missing_columns_map_to_absent() {
        let row = SourceRow::from_pairs(3, &[("COAC_EVENT_KEY", "EV9")]);
        let rows = normalize_internal(&table(&["COAC_EVENT_KEY"], vec![row]));

        let entry = &rows[0].entry;
        assert_eq!(entry.row_id, Some(3));
        assert!(entry.isin.is_absent());
        assert!(entry.gross_amount.is_absent());
        assert!(entry.ex_date.is_absent());
    }

    #[test]
    fn custody_prefers_booking_level_dates() {
        let row = SourceRow::from_pairs(
            0,
            &[
                ("COAC_EVENT_KEY", "EV1"),
                ("EX_DATE", "01.02.2024"),
                ("EVENT_EX_DATE", "09.02.2024"),
            ],
        );
        let rows = normalize_custody(&table(
            &["COAC_EVENT_KEY", "EX_DATE", "EVENT_EX_DATE"],
            vec![row],
        ));

        assert_eq!(
            rows[0].entry.ex_date,
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        );
    }

    #[test]
    fn custody_falls_back_to_event_level_dates() {
        let row = SourceRow::from_pairs(
            0,
            &[
                ("COAC_EVENT_KEY", "EV1"),
                ("EVENT_EX_DATE", "09.02.2024"),
                ("EVENT_PAYMENT_DATE", "01.03.2024"),
            ],
        );
        let rows = normalize_custody(&table(
            &["COAC_EVENT_KEY", "EVENT_EX_DATE", "EVENT_PAYMENT_DATE"],
            vec![row],
        ));

        assert_eq!(
            rows[0].entry.ex_date,
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 2, 9).unwrap())
        );
        assert_eq!(
            rows[0].entry.pay_date,
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn custody_maps_its_own_column_names() {
        let row = SourceRow::from_pairs(
            1,
            &[
                ("COAC_EVENT_KEY", "EV2"),
                ("BANK_ACCOUNTS", "CUST-77"),
                ("CURRENCIES", "CHF"),
                ("SETTLED_CURRENCY", "USD"),
                ("DIV_RATE", "3.5"),
                ("NET_AMOUNT_QC", "950"),
                ("NET_AMOUNT_SC", "1 050"),
                ("TAX", "50"),
                ("IS_CROSS_CURRENCY_REVERSAL", "Y"),
            ],
        );
        let columns = [
            "COAC_EVENT_KEY",
            "BANK_ACCOUNTS",
            "CURRENCIES",
            "SETTLED_CURRENCY",
            "DIV_RATE",
            "NET_AMOUNT_QC",
            "NET_AMOUNT_SC",
            "TAX",
            "IS_CROSS_CURRENCY_REVERSAL",
        ];

        let rows = normalize_custody(&table(&columns, vec![row]));
        let normalized = &rows[0];

        assert_eq!(normalized.side, Side::Custody);
        assert_eq!(normalized.account_id.as_deref(), Some("CUST-77"));
        assert_eq!(normalized.entry.currency, FieldValue::Text("CHF".into()));
        assert_eq!(normalized.entry.settlement_net_amount, FieldValue::Number(1050.0));
        assert_eq!(
            normalized.entry.is_cross_currency_reversal,
            FieldValue::Text("Y".into())
        );
        // Ledger-only fields stay absent on the custody side.
        assert!(normalized.entry.ticker.is_absent());
        assert!(normalized.entry.total_tax_rate.is_absent());
        assert!(normalized.entry.portfolio_net_amount.is_absent());
    }

    #[test]
    fn marker_event_keys_are_dropped() {
        for cell in ["", "  ", "nan", "None"] {
            let row = SourceRow::from_pairs(0, &[("COAC_EVENT_KEY", cell)]);
            let rows = normalize_internal(&table(&["COAC_EVENT_KEY"], vec![row]));
            assert_eq!(rows[0].event_key, None, "cell {cell:?}");
        }
    }

    #[test]
    fn event_keys_are_trimmed() {
        let row = SourceRow::from_pairs(0, &[("COAC_EVENT_KEY", " EV7 ")]);
        let rows = normalize_custody(&table(&["COAC_EVENT_KEY"], vec![row]));
        assert_eq!(rows[0].event_key.as_deref(), Some("EV7"));
    }
}
