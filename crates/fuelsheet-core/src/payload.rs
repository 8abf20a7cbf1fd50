//! Upstream report payload decoding
//!
//! The report service answers with one JSON object per report type, shaped
//! like a GraphQL `data` block:
//!
//! ```text
//! { "station": { "id": "...", "name": "..." },
//!   "fuelSaleMonth": { "fuelTypes": [...], "stationSales": [...], ... } }
//! ```
//!
//! Payloads may also arrive still wrapped in `{"data": {...}}`. Dates are
//! integers (`20180501`) or `YYYY-MM-DD` strings; category maps may contain
//! `null` values, which are treated as absent.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

use crate::{
    CategoryValues, DailySeries, EntityPeriodList, EntityPeriods, FetchError, MonthlySeries,
    Observation, PeriodRecord, PeriodWindow, ReportKind, Station,
};

/// Decode a payload for `kind`, stamping the requested `period` onto the record.
pub fn decode(kind: ReportKind, json: &str, period: NaiveDate) -> Result<PeriodRecord, FetchError> {
    let mut value: Value =
        serde_json::from_str(json).map_err(|e| FetchError::Malformed(format!("{kind}: {e}")))?;
    if let Value::Object(map) = &mut value {
        if let Some(data) = map.remove("data") {
            value = data;
        }
    }

    let record = match kind {
        ReportKind::FuelSales => {
            let payload: FuelSalesPayload = from_value(kind, value)?;
            PeriodRecord::FuelSales(payload.into_series(period).ok_or_else(|| missing(kind))?)
        }
        ReportKind::FuelDelivery => {
            let payload: FuelDeliveryPayload = from_value(kind, value)?;
            PeriodRecord::FuelDelivery(payload.into_series(period).ok_or_else(|| missing(kind))?)
        }
        ReportKind::OverShortMonth => {
            let payload: OverShortMonthPayload = from_value(kind, value)?;
            PeriodRecord::OverShortMonth(payload.into_series(period).ok_or_else(|| missing(kind))?)
        }
        ReportKind::OverShortAnnual => {
            let payload: OverShortAnnualPayload = from_value(kind, value)?;
            PeriodRecord::OverShortAnnual(payload.into_series(period).ok_or_else(|| missing(kind))?)
        }
        ReportKind::FuelSalesList => {
            let payload: FuelSalesListPayload = from_value(kind, value)?;
            PeriodRecord::FuelSalesList(payload.into_list(period).ok_or_else(|| missing(kind))?)
        }
    };
    Ok(record)
}

fn from_value<T: for<'de> Deserialize<'de>>(
    kind: ReportKind,
    value: Value,
) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| FetchError::Malformed(format!("{kind}: {e}")))
}

fn missing(kind: ReportKind) -> FetchError {
    FetchError::NotFound(format!("{kind}: payload has no report body"))
}

// ============================================================================
// Field Helpers
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Int(i64),
    Text(String),
}

impl RawScalar {
    fn into_text(self) -> String {
        match self {
            RawScalar::Int(n) => n.to_string(),
            RawScalar::Text(s) => s,
        }
    }
}

/// Parse `20180501`, `"20180501"` or `"2018-05-01"`
fn parse_date_key(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let n: i32 = raw.parse().ok()?;
        let (year, month, day) = (n / 10_000, (n / 100) % 100, n % 100);
        return NaiveDate::from_ymd_opt(year, month as u32, day as u32);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn date_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let text = RawScalar::deserialize(deserializer)?.into_text();
    parse_date_key(&text).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {text}")))
}

fn label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(RawScalar::deserialize(deserializer)?.into_text())
}

/// Category map that tolerates `null` values and a `null` map
fn values<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CategoryValues, D::Error> {
    let raw: Option<HashMap<String, Option<f64>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(code, value)| value.map(|v| (code, v)))
        .collect())
}

// ============================================================================
// Station Reports
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FuelSalesPayload {
    #[serde(default)]
    pub station: Station,
    #[serde(rename = "fuelSaleMonth")]
    pub report: Option<FuelSaleMonth>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelSaleMonth {
    #[serde(default)]
    pub fuel_types: Vec<String>,
    #[serde(default)]
    pub station_sales: Vec<StationSale>,
    #[serde(default, deserialize_with = "values")]
    pub sales_summary: CategoryValues,
    #[serde(default)]
    pub sales_total: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct StationSale {
    #[serde(deserialize_with = "date_key")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "values")]
    pub sales: CategoryValues,
}

impl FuelSalesPayload {
    pub fn into_series(self, period: NaiveDate) -> Option<DailySeries> {
        let report = self.report?;
        let mut series = DailySeries::new(self.station, period);
        series.categories = report.fuel_types;
        series.observations = report
            .station_sales
            .into_iter()
            .map(|sale| Observation::new(sale.date, sale.sales))
            .collect();
        series.summary = report.sales_summary;
        series.total = report.sales_total;
        Some(series)
    }
}

#[derive(Debug, Deserialize)]
pub struct FuelDeliveryPayload {
    #[serde(default)]
    pub station: Station,
    #[serde(rename = "fuelDeliveryReport")]
    pub report: Option<FuelDeliveryReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelDeliveryReport {
    #[serde(default)]
    pub fuel_types: Vec<String>,
    #[serde(default)]
    pub deliveries: Vec<DeliveryDay>,
    #[serde(default, deserialize_with = "values")]
    pub delivery_summary: CategoryValues,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryDay {
    #[serde(deserialize_with = "date_key")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "values")]
    pub data: CategoryValues,
}

impl FuelDeliveryPayload {
    pub fn into_series(self, period: NaiveDate) -> Option<DailySeries> {
        let report = self.report?;
        let mut series = DailySeries::new(self.station, period);
        series.categories = report.fuel_types;
        series.observations = report
            .deliveries
            .into_iter()
            .map(|day| Observation::new(day.date, day.data))
            .collect();
        series.summary = report.delivery_summary;
        Some(series)
    }
}

#[derive(Debug, Deserialize)]
pub struct OverShortMonthPayload {
    #[serde(default)]
    pub station: Station,
    #[serde(rename = "dipOSMonthReport")]
    pub report: Option<OverShortMonthReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverShortMonthReport {
    #[serde(default)]
    pub fuel_types: Vec<String>,
    #[serde(default)]
    pub over_short: Vec<OverShortDay>,
    #[serde(default, deserialize_with = "values")]
    pub over_short_summary: CategoryValues,
}

#[derive(Debug, Deserialize)]
pub struct OverShortDay {
    #[serde(deserialize_with = "date_key")]
    pub date: NaiveDate,
    #[serde(default)]
    pub data: HashMap<String, TankReading>,
}

/// Dip reading for one tank category on one day
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankReading {
    #[serde(default)]
    pub tank_litres: f64,
    #[serde(default)]
    pub over_short: f64,
}

impl OverShortMonthPayload {
    pub fn into_series(self, period: NaiveDate) -> Option<DailySeries> {
        let report = self.report?;
        let mut series = DailySeries::new(self.station, period);
        series.categories = report.fuel_types;
        series.observations = report
            .over_short
            .into_iter()
            .map(|day| {
                let values = day
                    .data
                    .into_iter()
                    .map(|(code, reading)| (code, reading.over_short))
                    .collect();
                Observation::new(day.date, values)
            })
            .collect();
        series.summary = report.over_short_summary;
        Some(series)
    }
}

#[derive(Debug, Deserialize)]
pub struct OverShortAnnualPayload {
    #[serde(default)]
    pub station: Station,
    #[serde(rename = "dipOSAnnualReport")]
    pub report: Option<OverShortAnnualReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverShortAnnualReport {
    #[serde(default)]
    pub fuel_types: Vec<String>,
    pub year: i32,
    #[serde(default)]
    pub months: HashMap<String, HashMap<String, Option<f64>>>,
    #[serde(default, deserialize_with = "values")]
    pub summary: CategoryValues,
}

impl OverShortAnnualPayload {
    pub fn into_series(self, period: NaiveDate) -> Option<MonthlySeries> {
        let report = self.report?;
        let mut series = MonthlySeries::new(self.station, period, report.year);
        series.categories = report.fuel_types;
        series.months = report
            .months
            .into_iter()
            .map(|(key, values)| {
                let values = values
                    .into_iter()
                    .filter_map(|(code, value)| value.map(|v| (code, v)))
                    .collect();
                (key, values)
            })
            .collect();
        series.summary = report.summary;
        Some(series)
    }
}

// ============================================================================
// Station List Report
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FuelSalesListPayload {
    #[serde(rename = "fuelSaleListReport")]
    pub report: Option<FuelSaleListReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelSaleListReport {
    #[serde(default)]
    pub period_header: Vec<PeriodHeader>,
    #[serde(default)]
    pub period_sales: Vec<PeriodSale>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodHeader {
    #[serde(deserialize_with = "label")]
    pub year_week: String,
    #[serde(deserialize_with = "date_key")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "date_key")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSale {
    #[serde(default)]
    pub fuel_prices: Option<FuelPrices>,
    #[serde(default)]
    pub periods: Vec<PeriodFuelSales>,
    #[serde(rename = "stationID", default)]
    pub station_id: String,
    #[serde(default)]
    pub station_name: String,
    #[serde(default, deserialize_with = "values")]
    pub station_total: CategoryValues,
}

#[derive(Debug, Default, Deserialize)]
pub struct FuelPrices {
    #[serde(default, deserialize_with = "values")]
    pub prices: CategoryValues,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFuelSales {
    #[serde(default, deserialize_with = "values")]
    pub fuel_sales: CategoryValues,
}

impl FuelSalesListPayload {
    pub fn into_list(self, period: NaiveDate) -> Option<EntityPeriodList> {
        let report = self.report?;
        let mut list = EntityPeriodList::new(period);
        list.windows = report
            .period_header
            .into_iter()
            .map(|header| PeriodWindow::new(header.year_week, header.start_date, header.end_date))
            .collect();
        list.entities = report
            .period_sales
            .into_iter()
            .map(|sale| EntityPeriods {
                station: Station::new(sale.station_id, sale.station_name),
                periods: sale.periods.into_iter().map(|p| p.fuel_sales).collect(),
                unit_prices: sale.fuel_prices.unwrap_or_default().prices,
                totals: sale.station_total,
            })
            .collect();
        Some(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn may() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 5, 1).unwrap()
    }

    #[test]
    fn date_keys_accept_both_encodings() {
        assert_eq!(parse_date_key("20180501"), Some(may()));
        assert_eq!(parse_date_key("2018-05-01"), Some(may()));
        assert_eq!(parse_date_key("20181301"), None);
        assert_eq!(parse_date_key("May 1"), None);
    }

    #[test]
    fn decodes_fuel_sales() {
        let json = r#"{
            "station": {"id": "st-1", "name": "Bridgeport"},
            "fuelSaleMonth": {
                "fuelTypes": ["DSL", "NL"],
                "stationSales": [
                    {"date": 20180501, "sales": {"NL": 100.0, "DSL": 50}},
                    {"date": "2018-05-02", "sales": {"NL": 80.5, "DSL": null}}
                ],
                "salesSummary": {"NL": 180.5, "DSL": 50},
                "salesTotal": 230.5
            }
        }"#;
        let record = decode(ReportKind::FuelSales, json, may()).unwrap();
        let PeriodRecord::FuelSales(series) = record else {
            panic!("expected fuel sales record");
        };
        assert_eq!(series.station.name, "Bridgeport");
        assert_eq!(series.categories, vec!["DSL", "NL"]);
        assert_eq!(series.observations.len(), 2);
        assert_eq!(series.observations[0].values["DSL"], 50.0);
        assert!(!series.observations[1].values.contains_key("DSL"));
        assert_eq!(series.total, Some(230.5));
        assert_eq!(series.period, may());
    }

    #[test]
    fn unwraps_graphql_data_envelope() {
        let json = r#"{"data": {
            "station": {"id": "st-1", "name": "Bridgeport"},
            "fuelDeliveryReport": {
                "fuelTypes": ["NL"],
                "deliveries": [{"date": 20180503, "data": {"NL": 12000}}],
                "deliverySummary": {"NL": 12000}
            }
        }}"#;
        let record = decode(ReportKind::FuelDelivery, json, may()).unwrap();
        let PeriodRecord::FuelDelivery(series) = record else {
            panic!("expected delivery record");
        };
        assert_eq!(series.observations[0].values["NL"], 12000.0);
        assert_eq!(series.total, None);
    }

    #[test]
    fn over_short_month_keeps_variance_only() {
        let json = r#"{
            "station": {"id": "st-1", "name": "Bridgeport"},
            "dipOSMonthReport": {
                "fuelTypes": ["NL"],
                "overShort": [{"date": 20180501, "data": {"NL": {"tankLitres": 9000, "overShort": -12.5}}}],
                "overShortSummary": {"NL": -12.5}
            }
        }"#;
        let PeriodRecord::OverShortMonth(series) =
            decode(ReportKind::OverShortMonth, json, may()).unwrap()
        else {
            panic!("expected over-short record");
        };
        assert_eq!(series.observations[0].values["NL"], -12.5);
    }

    #[test]
    fn decodes_annual_months() {
        let json = r#"{
            "station": {"id": "st-1", "name": "Bridgeport"},
            "dipOSAnnualReport": {
                "fuelTypes": ["NL", "DSL"],
                "year": 2018,
                "months": {"201802": {"NL": 2.0}, "201801": {"NL": -1.0, "DSL": null}},
                "summary": {"NL": 1.0}
            }
        }"#;
        let PeriodRecord::OverShortAnnual(series) =
            decode(ReportKind::OverShortAnnual, json, may()).unwrap()
        else {
            panic!("expected annual record");
        };
        assert_eq!(series.year, 2018);
        assert_eq!(series.months.len(), 2);
        assert_eq!(series.months["201801"].get("DSL"), None);
    }

    #[test]
    fn decodes_station_list() {
        let json = r#"{
            "fuelSaleListReport": {
                "periodHeader": [
                    {"yearWeek": 201818, "startDate": "2018-04-29", "endDate": "2018-05-05", "week": 18}
                ],
                "periodSales": [{
                    "fuelPrices": {"prices": {"201818": 1.129}},
                    "periods": [{"dates": "x", "fuelSales": {"NL": 1200, "DSL": 300}}],
                    "stationID": "st-1",
                    "stationName": "Bridgeport",
                    "stationTotal": {"NL": 1200, "DSL": 300}
                }]
            }
        }"#;
        let PeriodRecord::FuelSalesList(list) =
            decode(ReportKind::FuelSalesList, json, may()).unwrap()
        else {
            panic!("expected station list record");
        };
        assert_eq!(list.windows[0].label, "201818");
        assert_eq!(
            list.windows[0].start,
            NaiveDate::from_ymd_opt(2018, 4, 29).unwrap()
        );
        let entity = &list.entities[0];
        assert_eq!(entity.station.id, "st-1");
        assert_eq!(entity.value(0, "DSL"), 300.0);
        assert_eq!(entity.unit_price("201818"), 1.129);
    }

    #[test]
    fn null_report_body_is_not_found() {
        let json = r#"{"station": {"id": "st-1", "name": "x"}, "fuelSaleMonth": null}"#;
        let err = decode(ReportKind::FuelSales, json, may()).unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn bad_dates_are_malformed() {
        let json = r#"{"fuelSaleMonth": {"stationSales": [{"date": "yesterday"}]}}"#;
        let err = decode(ReportKind::FuelSales, json, may()).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        assert!(err.to_string().contains("fuel-sales"));
    }
}
