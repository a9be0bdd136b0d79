//! Financial statements from the fundamentals timeseries endpoint.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{Frequency, ProviderValue, StatementKind, Table};

use super::convert::from_json;
use super::models::YahooTimeseriesPoint;

const INCOME_ITEMS: &[&str] = &[
    "TotalRevenue",
    "CostOfRevenue",
    "GrossProfit",
    "OperatingExpense",
    "ResearchAndDevelopment",
    "SellingGeneralAndAdministration",
    "OperatingIncome",
    "InterestExpense",
    "PretaxIncome",
    "TaxProvision",
    "NetIncome",
    "NetIncomeCommonStockholders",
    "BasicEPS",
    "DilutedEPS",
    "BasicAverageShares",
    "DilutedAverageShares",
    "EBIT",
    "EBITDA",
];

const BALANCE_SHEET_ITEMS: &[&str] = &[
    "TotalAssets",
    "CurrentAssets",
    "CashAndCashEquivalents",
    "Receivables",
    "Inventory",
    "TotalNonCurrentAssets",
    "NetPPE",
    "Goodwill",
    "TotalLiabilitiesNetMinorityInterest",
    "CurrentLiabilities",
    "AccountsPayable",
    "LongTermDebt",
    "TotalDebt",
    "NetDebt",
    "StockholdersEquity",
    "RetainedEarnings",
    "WorkingCapital",
    "OrdinarySharesNumber",
];

const CASH_FLOW_ITEMS: &[&str] = &[
    "OperatingCashFlow",
    "InvestingCashFlow",
    "FinancingCashFlow",
    "FreeCashFlow",
    "CapitalExpenditure",
    "DepreciationAndAmortization",
    "StockBasedCompensation",
    "ChangeInWorkingCapital",
    "CashDividendsPaid",
    "RepurchaseOfCapitalStock",
    "IssuanceOfDebt",
    "RepaymentOfDebt",
    "BeginningCashPosition",
    "EndCashPosition",
];

pub fn line_items(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::Income => INCOME_ITEMS,
        StatementKind::BalanceSheet => BALANCE_SHEET_ITEMS,
        StatementKind::CashFlow => CASH_FLOW_ITEMS,
    }
}

/// Comma-separated `type` parameter, e.g. `annualTotalRevenue,annualNetIncome`.
pub fn timeseries_types(kind: StatementKind, frequency: Frequency) -> String {
    line_items(kind)
        .iter()
        .map(|item| format!("{}{}", frequency.as_str(), item))
        .collect::<Vec<_>>()
        .join(",")
}

/// Pivot timeseries results into a statement table.
///
/// Rows are line items in canonical order, columns are period end dates with
/// the newest first. Periods a line item did not report hold NaN.
pub fn statement_table(
    kind: StatementKind,
    frequency: Frequency,
    results: &[Map<String, Value>],
) -> Table {
    let prefix = frequency.as_str();
    let mut reported: HashMap<&str, HashMap<NaiveDate, ProviderValue>> = HashMap::new();
    let mut dates = BTreeSet::new();

    for result in results {
        let Some(series_type) = result
            .get("meta")
            .and_then(|m| m.get("type"))
            .and_then(|t| t.get(0))
            .and_then(Value::as_str)
        else {
            continue;
        };
        let Some(item) = series_type.strip_prefix(prefix) else {
            continue;
        };
        let Some(item) = line_items(kind).iter().find(|known| **known == item) else {
            continue;
        };
        let Some(points) = result.get(series_type).and_then(Value::as_array) else {
            continue;
        };

        for point in points.iter().filter(|p| !p.is_null()) {
            let point: YahooTimeseriesPoint = match serde_json::from_value(point.clone()) {
                Ok(point) => point,
                Err(e) => {
                    debug!("Skipping malformed {} point: {}", series_type, e);
                    continue;
                }
            };
            let Ok(date) = NaiveDate::parse_from_str(&point.as_of_date, "%Y-%m-%d") else {
                debug!("Skipping {} point dated {:?}", series_type, point.as_of_date);
                continue;
            };
            let value = point
                .reported_value
                .as_ref()
                .map(from_json)
                .unwrap_or(ProviderValue::Null);
            dates.insert(date);
            reported.entry(*item).or_default().insert(date, value);
        }
    }

    let dates: Vec<NaiveDate> = dates.into_iter().rev().collect();
    let mut table = Table::new(
        dates.iter().copied().map(ProviderValue::Date).collect(),
        Vec::new(),
        Vec::new(),
    );
    for item in line_items(kind) {
        let Some(values) = reported.get(item) else {
            continue;
        };
        let cells = dates
            .iter()
            .map(|d| values.get(d).cloned().unwrap_or(ProviderValue::Float(f64::NAN)))
            .collect();
        table.push_row(ProviderValue::str(*item), cells);
    }
    table
}
