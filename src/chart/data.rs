use crate::chart::error::ChartError;
use crate::chart::spec::{ChartSpec, Sentinel};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Read;

/// Index of a CSV column, resolved once against the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column(usize);

#[derive(Debug, Clone)]
pub struct DataRow {
    pub date: NaiveDate,
    fields: Vec<String>,
}

impl DataRow {
    pub fn raw(&self, column: Column) -> &str {
        self.fields.get(column.0).map(String::as_str).unwrap_or("")
    }

    /// Numeric value, or `None` when the cell holds the sentinel.
    pub fn value(&self, column: Column, sentinel: Sentinel) -> Option<f64> {
        let raw = self.raw(column);
        if sentinel.is_missing(raw) {
            return None;
        }
        self.number(column)
    }

    /// Numeric value regardless of any missing-value convention. Blank and
    /// `-` cells read as `None`.
    pub fn number(&self, column: Column) -> Option<f64> {
        self.raw(column).trim().parse().ok().filter(|v: &f64| v.is_finite())
    }
}

/// Parsed CSV rows in date order.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: HashMap<String, Column>,
    rows: Vec<DataRow>,
}

impl Dataset {
    /// Reads a chart's CSV and checks it against the chart's schema: every
    /// configured column present, every date parseable with the configured
    /// format and non-decreasing, every value numeric or a missing marker.
    pub fn from_reader<R: Read>(reader: R, spec: &ChartSpec) -> Result<Self, ChartError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|err| ChartError::data_format(1, err.to_string()))?
            .clone();
        let columns: HashMap<String, Column> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.to_string(), Column(idx)))
            .collect();

        let date_column = *columns.get(&spec.date_column).ok_or_else(|| {
            ChartError::data_format(1, format!("missing date column '{}'", spec.date_column))
        })?;

        let mut required: Vec<(String, Column)> = Vec::new();
        let variants: Vec<Option<&str>> = if spec.variants.is_empty() {
            vec![None]
        } else {
            spec.variants.iter().map(|v| Some(v.as_str())).collect()
        };
        for variant in variants {
            for name in spec.columns(variant) {
                let column = *columns
                    .get(&name)
                    .ok_or_else(|| ChartError::data_format(1, format!("missing column '{name}'")))?;
                if !required.iter().any(|(_, c)| *c == column) {
                    required.push((name, column));
                }
            }
        }

        let mut rows: Vec<DataRow> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| {
                let line = err.position().map(|p| p.line()).unwrap_or(0);
                ChartError::data_format(line, err.to_string())
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let fields: Vec<String> = record.iter().map(str::to_string).collect();

            let raw_date = fields.get(date_column.0).map(String::as_str).unwrap_or("");
            let date = NaiveDate::parse_from_str(raw_date, &spec.date_format).map_err(|err| {
                ChartError::data_format(line, format!("bad date '{raw_date}': {err}"))
            })?;
            if let Some(previous) = rows.last() {
                if date < previous.date {
                    return Err(ChartError::data_format(
                        line,
                        format!("date {date} is earlier than {}", previous.date),
                    ));
                }
            }

            for (name, column) in &required {
                let raw = fields.get(column.0).map(String::as_str).unwrap_or("");
                if !is_missing_marker(raw) && !raw.parse::<f64>().is_ok_and(f64::is_finite) {
                    return Err(ChartError::data_format(
                        line,
                        format!("column '{name}' holds non-numeric value '{raw}'"),
                    ));
                }
            }

            rows.push(DataRow { date, fields });
        }

        Ok(Self { columns, rows })
    }

    pub fn column(&self, name: &str) -> Option<Column> {
        self.columns.get(name).copied()
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    /// Rows whose date lies within `[start, end]`.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> &[DataRow] {
        let lo = self.rows.partition_point(|row| row.date < start);
        let hi = self.rows.partition_point(|row| row.date <= end);
        &self.rows[lo..hi.max(lo)]
    }

    /// First row dated exactly `date`.
    pub fn find(&self, date: NaiveDate) -> Option<&DataRow> {
        let idx = self.rows.partition_point(|row| row.date < date);
        self.rows.get(idx).filter(|row| row.date == date)
    }
}

fn is_missing_marker(raw: &str) -> bool {
    raw.is_empty() || raw == "-"
}
