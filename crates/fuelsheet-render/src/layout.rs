//! Report layout algorithms
//!
//! Each report record becomes one sheet (the entity list becomes one sheet
//! per configured variant). Every layout follows the same outline:
//!
//! ```text
//! row 1   title, merged across the data width
//! row 2   headers
//! row 3.. one row per observation / entity / month
//! last    summary row, bold
//! ```
//!
//! A layout pass builds a standalone [`SheetBuilder`] and the sheet joins the
//! workbook only once the pass has succeeded.

use chrono::{Datelike, Months, NaiveDate};
use fuelsheet_core::{
    CategorySet, DailySeries, EntityPeriodList, LayoutError, MonthlySeries, PeriodRecord,
    RenderError, Renderer,
};

use crate::address::{CellAddress, CellRange};
use crate::formula::SumFormula;
use crate::sheet::{CellValue, LayoutCursor, SheetBuilder};
use crate::style::{FontColor, NumberFormat, Style};
use crate::workbook::Workbook;

/// First data row of every layout
const FIRST_DATA_ROW: u32 = 3;

/// Width of the numeric columns in daily and monthly layouts
const NUMBER_COLUMN_WIDTH: f64 = 10.0;

const NAME_COLUMN_WIDTH: f64 = 11.0;
const TOTAL_COLUMN_WIDTH: f64 = 14.0;

/// At most one year of monthly buckets is shown
const MAX_MONTHS: usize = 12;

const DAY_LABEL_FORMAT: &str = "%b %-d";
const PERIOD_TITLE_FORMAT: &str = "%B %Y";
const WINDOW_DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily report flavours sharing one layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DailyReport {
    Sales,
    Delivery,
    Variance,
}

impl DailyReport {
    fn sheet_name(self) -> &'static str {
        match self {
            DailyReport::Sales => "Fuel Sales",
            DailyReport::Delivery => "Fuel Delivery",
            DailyReport::Variance => "Over-Short Month",
        }
    }

    fn title(self, series: &DailySeries) -> String {
        let heading = match self {
            DailyReport::Sales => "Fuel Sales Detail",
            DailyReport::Delivery => "Fuel Deliveries",
            DailyReport::Variance => "Over-Short Month",
        };
        format!(
            "{} {} - {}",
            series.station.name,
            heading,
            series.period.format(PERIOD_TITLE_FORMAT)
        )
    }

    fn value_style(self, value: f64) -> Style {
        match self {
            DailyReport::Sales | DailyReport::Delivery => Style::number(NumberFormat::Integer),
            DailyReport::Variance => Style::number(NumberFormat::Decimal).signed(value),
        }
    }

    /// Deliveries leave empty days blank instead of showing zeros
    fn cell_value(self, value: f64) -> CellValue {
        if self == DailyReport::Delivery && value == 0.0 {
            CellValue::Blank
        } else {
            CellValue::Number(value)
        }
    }
}

/// One rendering of the entity period list, restricted to a single category
#[derive(Clone, Debug, PartialEq)]
pub struct EntityListVariant {
    /// Sheet name, also used as the title prefix
    pub label: String,
    pub category: String,
    /// Add a unit-price column after every value column
    pub priced: bool,
    /// Leave out entities whose reported total is zero or negative
    pub skip_non_positive: bool,
    pub value_width: f64,
}

impl EntityListVariant {
    pub fn no_lead() -> Self {
        Self {
            label: "No-Lead Fuel Sales by Station".into(),
            category: "NL".into(),
            priced: true,
            skip_non_positive: false,
            value_width: 10.5,
        }
    }

    pub fn diesel() -> Self {
        Self {
            label: "Diesel Fuel Sales by Station".into(),
            category: "DSL".into(),
            priced: false,
            skip_non_positive: true,
            value_width: 21.0,
        }
    }

    /// Columns used per period window
    fn window_span(&self) -> u16 {
        if self.priced {
            2
        } else {
            1
        }
    }
}

/// Lays report records out into workbook sheets
#[derive(Clone, Debug)]
pub struct ReportLayoutEngine {
    categories: CategorySet,
    entity_list_variants: Vec<EntityListVariant>,
}

impl Default for ReportLayoutEngine {
    fn default() -> Self {
        Self::new(CategorySet::default())
    }
}

impl ReportLayoutEngine {
    pub fn new(categories: CategorySet) -> Self {
        Self {
            categories,
            entity_list_variants: vec![EntityListVariant::no_lead(), EntityListVariant::diesel()],
        }
    }

    /// Replace the entity-list renderings (one sheet each)
    pub fn entity_list_variants(mut self, variants: Vec<EntityListVariant>) -> Self {
        self.entity_list_variants = variants;
        self
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Lay out one record, appending its sheet(s) to `workbook`
    pub fn layout(
        &self,
        workbook: &mut Workbook,
        record: &PeriodRecord,
    ) -> Result<(), LayoutError> {
        let sheets = match record {
            PeriodRecord::FuelSales(series) => vec![self.layout_daily(DailyReport::Sales, series)?],
            PeriodRecord::FuelDelivery(series) => {
                vec![self.layout_daily(DailyReport::Delivery, series)?]
            }
            PeriodRecord::OverShortMonth(series) => {
                vec![self.layout_daily(DailyReport::Variance, series)?]
            }
            PeriodRecord::FuelSalesList(list) => self
                .entity_list_variants
                .iter()
                .map(|variant| self.layout_entity_list(variant, list))
                .collect::<Result<Vec<_>, _>>()?,
            PeriodRecord::OverShortAnnual(series) => vec![self.layout_monthly(series)?],
        };
        for sheet in sheets {
            tracing::debug!(
                sheet = sheet.name(),
                rows = sheet.last_row(),
                "sheet laid out"
            );
            workbook.adopt(sheet);
        }
        Ok(())
    }

    /// Lay out every record into a fresh workbook, in report order
    pub fn layout_all(&self, records: &[PeriodRecord]) -> Result<Workbook, LayoutError> {
        let mut ordered: Vec<&PeriodRecord> = records.iter().collect();
        ordered.sort_by_key(|record| record.kind());

        let mut workbook = Workbook::new();
        for record in ordered {
            self.layout(&mut workbook, record)?;
        }
        Ok(workbook)
    }

    fn layout_daily(
        &self,
        report: DailyReport,
        series: &DailySeries,
    ) -> Result<SheetBuilder, LayoutError> {
        let categories = self.categories.canonicalize(&series.categories);
        let width = column_count(categories.len())?;
        let mut sheet = SheetBuilder::new(report.sheet_name());

        write_title(&mut sheet, report.title(series), width.saturating_add(2))?;
        write_category_header(&mut sheet, &categories)?;

        let mut cursor = LayoutCursor::new(1, FIRST_DATA_ROW);
        for observation in &series.observations {
            let label = day_label(observation.date);
            sheet.write_value(cursor.col, cursor.row, label, Style::PLAIN)?;
            cursor.advance(1);
            for value in CategorySet::project(&observation.values, &categories) {
                sheet.write_value(
                    cursor.col,
                    cursor.row,
                    report.cell_value(value),
                    report.value_style(value),
                )?;
                cursor.advance(1);
            }
            cursor.next_row();
        }

        sheet.write_value(cursor.col, cursor.row, CellValue::Blank, Style::BOLD)?;
        cursor.advance(1);
        for value in CategorySet::project(&series.summary, &categories) {
            let style = report.value_style(value).bold();
            sheet.write_value(cursor.col, cursor.row, value, style)?;
            cursor.advance(1);
        }

        if let (DailyReport::Sales, Some(total)) = (report, series.total) {
            let row = cursor.row + 2;
            sheet.write_value(1, row, "Total Sales", Style::BOLD)?;
            sheet.merge_region(1, row, 2, row)?;
            sheet.write_value(3, row, total, Style::number(NumberFormat::Integer).bold())?;
            sheet.merge_region(3, row, 4, row)?;
        }

        if report != DailyReport::Sales && width > 0 {
            sheet.set_column_width(2, width.saturating_add(1), NUMBER_COLUMN_WIDTH)?;
        }
        Ok(sheet)
    }

    fn layout_entity_list(
        &self,
        variant: &EntityListVariant,
        list: &EntityPeriodList,
    ) -> Result<SheetBuilder, LayoutError> {
        let span = variant.window_span();
        let windows = column_count(list.windows.len())?;
        let total_col = windows
            .checked_mul(span)
            .and_then(|cols| cols.checked_add(2))
            .ok_or(LayoutError::OutOfRangeAddress {
                col: u32::MAX,
                row: 1,
            })?;
        let value_col = |index: usize| 2 + index as u16 * span;

        let mut sheet = SheetBuilder::new(variant.label.as_str());
        let title = format!(
            "{} - {}",
            variant.label,
            list.period.format(PERIOD_TITLE_FORMAT)
        );
        write_title(&mut sheet, title, total_col)?;

        let muted = Style::PLAIN.color(FontColor::Muted);
        for (index, window) in list.windows.iter().enumerate() {
            let col = value_col(index);
            let text = format!(
                "{}/{}",
                window.start.format(WINDOW_DATE_FORMAT),
                window.end.format(WINDOW_DATE_FORMAT)
            );
            sheet.write_value(col, 2, text, muted)?;
            if variant.priced {
                sheet.merge_region(col, 2, col + 1, 2)?;
            }
        }

        let volume = Style::number(NumberFormat::Integer);
        let price = Style::number(NumberFormat::Decimal);
        let mut cursor = LayoutCursor::new(1, FIRST_DATA_ROW);
        for entity in &list.entities {
            if variant.skip_non_positive && entity.total(&variant.category) <= 0.0 {
                tracing::trace!(station = %entity.station.id, "skipped, no reported total");
                continue;
            }
            let name = entity.station.name.as_str();
            sheet.write_value(cursor.col, cursor.row, name, Style::PLAIN)?;

            let mut value_cells = Vec::with_capacity(list.windows.len());
            for (index, window) in list.windows.iter().enumerate() {
                let col = value_col(index);
                let value = entity.value(index, &variant.category);
                sheet.write_value(col, cursor.row, value, volume)?;
                value_cells.push(CellAddress::new(col, cursor.row)?);
                if variant.priced {
                    let unit_price = entity.unit_price(&window.label);
                    sheet.write_value(col + 1, cursor.row, unit_price, price)?;
                }
            }
            sheet.write_formula(
                total_col,
                cursor.row,
                SumFormula::over_cells(value_cells),
                volume.bold(),
            )?;
            cursor.next_row();
        }

        let last_entity_row = cursor.row - 1;
        if last_entity_row >= FIRST_DATA_ROW {
            let summary = cursor.row;
            let value_cols = (0..list.windows.len()).map(value_col);
            for col in value_cols.chain(std::iter::once(total_col)) {
                let block = CellRange::new(col, FIRST_DATA_ROW, col, last_entity_row)?;
                sheet.write_formula(col, summary, SumFormula::over_range(block), volume.bold())?;
            }
        }

        sheet.set_column_width(1, 1, NAME_COLUMN_WIDTH)?;
        if total_col > 2 {
            sheet.set_column_width(2, total_col - 1, variant.value_width)?;
        }
        sheet.set_column_width(total_col, total_col, TOTAL_COLUMN_WIDTH)?;
        Ok(sheet)
    }

    fn layout_monthly(&self, series: &MonthlySeries) -> Result<SheetBuilder, LayoutError> {
        let categories = self.categories.canonicalize(&series.categories);
        let width = column_count(categories.len())?;
        let mut sheet = SheetBuilder::new("Over-Short Annual");

        let title = format!(
            "{} Over-Short Annual - {}",
            series.station.name,
            series.period.format(PERIOD_TITLE_FORMAT)
        );
        write_title(&mut sheet, title, width.saturating_add(2))?;
        write_category_header(&mut sheet, &categories)?;

        let variance = Style::number(NumberFormat::Decimal);
        let mut cursor = LayoutCursor::new(1, FIRST_DATA_ROW);
        for month in months_of(series.year, series.months.len().min(MAX_MONTHS)) {
            let key = MonthlySeries::month_key(series.year, month.month());
            let name = month.format("%B").to_string();
            sheet.write_value(cursor.col, cursor.row, name, Style::PLAIN)?;
            cursor.advance(1);
            let values = series
                .months
                .get(&key)
                .map(|bucket| CategorySet::project(bucket, &categories))
                .unwrap_or_else(|| vec![0.0; categories.len()]);
            for value in values {
                sheet.write_value(cursor.col, cursor.row, value, variance.signed(value))?;
                cursor.advance(1);
            }
            cursor.next_row();
        }

        sheet.write_value(cursor.col, cursor.row, CellValue::Blank, Style::BOLD)?;
        cursor.advance(1);
        for value in CategorySet::project(&series.summary, &categories) {
            sheet.write_value(cursor.col, cursor.row, value, variance.bold().signed(value))?;
            cursor.advance(1);
        }

        sheet.set_column_width(1, width.saturating_add(1), NUMBER_COLUMN_WIDTH)?;
        Ok(sheet)
    }
}

impl Renderer for ReportLayoutEngine {
    type Output = Vec<u8>;

    fn render(&self, records: &[PeriodRecord]) -> Result<Vec<u8>, RenderError> {
        let workbook = self.layout_all(records)?;
        tracing::info!(sheets = workbook.sheets().len(), "rendering workbook");
        workbook.serialize_to_buffer()
    }
}

// ============================================================================
// Shared pieces
// ============================================================================

fn write_title(sheet: &mut SheetBuilder, title: String, last_col: u16) -> Result<(), LayoutError> {
    sheet.write_value(1, 1, title, Style::TITLE)?;
    if last_col > 1 {
        sheet.merge_region(1, 1, last_col, 1)?;
    }
    Ok(())
}

fn write_category_header(
    sheet: &mut SheetBuilder,
    categories: &[String],
) -> Result<(), LayoutError> {
    sheet.write_value(1, 2, "Date", Style::TITLE)?;
    for (col, category) in (2..).zip(categories) {
        sheet.write_value(col, 2, category.as_str(), Style::BOLD)?;
    }
    Ok(())
}

/// Column count as a column index, rejecting anything wider than a sheet
fn column_count(len: usize) -> Result<u16, LayoutError> {
    u16::try_from(len).map_err(|_| LayoutError::OutOfRangeAddress {
        col: u32::try_from(len).unwrap_or(u32::MAX),
        row: 1,
    })
}

fn day_label(date: NaiveDate) -> String {
    date.format(DAY_LABEL_FORMAT).to_string()
}

/// First day of `count` consecutive months starting in January of `year`
fn months_of(year: i32, count: usize) -> Vec<NaiveDate> {
    let Some(january) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };
    (0..count as u32)
        .filter_map(|offset| january.checked_add_months(Months::new(offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelsheet_core::{EntityPeriods, Observation, PeriodWindow, Station};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn values(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    fn daily(categories: &[&str]) -> DailySeries {
        let mut series = DailySeries::new(Station::new("st-1", "Bridgeport"), date(2018, 5, 1));
        series.categories = categories.iter().map(ToString::to_string).collect();
        series
    }

    #[test]
    fn months_start_in_january() {
        let months = months_of(2018, 3);
        assert_eq!(
            months,
            vec![date(2018, 1, 1), date(2018, 2, 1), date(2018, 3, 1)]
        );
        assert!(months_of(2018, 0).is_empty());
    }

    #[test]
    fn day_labels_use_short_month() {
        assert_eq!(day_label(date(2018, 5, 1)), "May 1");
        assert_eq!(day_label(date(2018, 12, 25)), "Dec 25");
    }

    #[test]
    fn title_spans_categories_plus_two() {
        let engine = ReportLayoutEngine::default();
        let sheet = engine
            .layout_daily(DailyReport::Sales, &daily(&["DSL", "NL"]))
            .unwrap();
        assert_eq!(sheet.merges()[0], CellRange::new(1, 1, 4, 1).unwrap());
        assert_eq!(
            sheet.row_values(1),
            vec!["Bridgeport Fuel Sales Detail - May 2018"]
        );
        assert_eq!(sheet.cell(1, 2).unwrap().style, Style::TITLE);
    }

    #[test]
    fn deliveries_blank_zero_values() {
        let engine = ReportLayoutEngine::default();
        let mut series = daily(&["NL", "DSL"]);
        let observation =
            Observation::new(date(2018, 5, 2), values(&[("NL", 0.0), ("DSL", 4500.0)]));
        series.observations.push(observation);
        let sheet = engine.layout_daily(DailyReport::Delivery, &series).unwrap();
        assert_eq!(sheet.row_values(3), vec!["May 2", "", "4500"]);
        assert_eq!(sheet.cell(2, 3).unwrap().value, CellValue::Blank);
        assert_eq!(sheet.column_widths().get(&2), Some(&10.0));
        assert_eq!(sheet.column_widths().get(&3), Some(&10.0));
        assert_eq!(sheet.column_widths().get(&4), None);
    }

    #[test]
    fn sales_without_total_has_no_total_block() {
        let engine = ReportLayoutEngine::default();
        let mut series = daily(&["NL"]);
        series.summary = values(&[("NL", 10.0)]);
        let sheet = engine.layout_daily(DailyReport::Sales, &series).unwrap();
        assert_eq!(sheet.last_row(), 3);
        assert_eq!(sheet.merges().len(), 1);
    }

    #[test]
    fn variance_summary_is_bold_red_when_negative() {
        let engine = ReportLayoutEngine::default();
        let mut series = daily(&["NL", "DSL"]);
        series.summary = values(&[("NL", -3.25), ("DSL", 1.0)]);
        let sheet = engine.layout_daily(DailyReport::Variance, &series).unwrap();
        let negative = sheet.cell(2, 3).unwrap().style;
        assert!(negative.bold && negative.is_negative());
        let positive = sheet.cell(3, 3).unwrap().style;
        assert!(positive.bold && !positive.is_negative());
        assert_eq!(positive.number_format, NumberFormat::Decimal);
    }

    #[test]
    fn entity_list_without_rows_has_no_summary() {
        let engine = ReportLayoutEngine::default();
        let mut list = EntityPeriodList::new(date(2018, 5, 1));
        let window = PeriodWindow::new("201819", date(2018, 5, 1), date(2018, 5, 6));
        list.windows.push(window);
        let sheet = engine
            .layout_entity_list(&EntityListVariant::diesel(), &list)
            .unwrap();
        assert_eq!(sheet.last_row(), 2);
        assert_eq!(sheet.row_values(2), vec!["", "2018-05-01/2018-05-06"]);
    }

    #[test]
    fn priced_variant_adds_price_columns() {
        let engine = ReportLayoutEngine::default();
        let mut list = EntityPeriodList::new(date(2018, 5, 1));
        list.windows = vec![
            PeriodWindow::new("201819", date(2018, 5, 1), date(2018, 5, 6)),
            PeriodWindow::new("201820", date(2018, 5, 7), date(2018, 5, 13)),
        ];
        let mut entity = EntityPeriods::new(Station::new("st-1", "Bridgeport"));
        entity.periods = vec![values(&[("NL", 10.0)]), values(&[("NL", 20.0)])];
        entity.unit_prices = values(&[("201819", 1.25)]);
        list.entities.push(entity);

        let sheet = engine
            .layout_entity_list(&EntityListVariant::no_lead(), &list)
            .unwrap();
        assert_eq!(
            sheet.row_values(3),
            vec!["Bridgeport", "10", "1.25", "20", "0", "30"]
        );
        let merges = sheet.merges();
        assert!(merges.contains(&CellRange::new(2, 2, 3, 2).unwrap()));
        assert!(merges.contains(&CellRange::new(1, 1, 6, 1).unwrap()));
        assert_eq!(sheet.column_widths().get(&1), Some(&11.0));
        assert_eq!(sheet.column_widths().get(&3), Some(&10.5));
        assert_eq!(sheet.column_widths().get(&6), Some(&14.0));
        assert_eq!(sheet.cell(2, 2).unwrap().style.color, FontColor::Muted);
    }

    #[test]
    fn layout_failure_leaves_workbook_untouched() {
        let engine = ReportLayoutEngine::new(CategorySet::new((0..30).map(|i| format!("C{i}"))));
        let mut series = daily(&[]);
        series.categories = engine.categories().codes().to_vec();
        let mut workbook = Workbook::new();
        let err = engine
            .layout(&mut workbook, &PeriodRecord::FuelSales(series))
            .unwrap_err();
        assert!(matches!(err, LayoutError::OutOfRangeAddress { .. }));
        assert_eq!(workbook.sheet_names(), vec!["Sheet1"]);
    }
}
