//! EIA-861 "Sales to Ultimate Customers" workbooks.
//!
//! Each report year ships as one workbook whose first sheet carries two title
//! rows, a header row with repeated labels per customer class, and one row per
//! utility, state and ownership combination. Loading renames the repeated
//! headers to standardized column names, and the later steps restrict the
//! combined frame to the target utilities.

use crate::{
    config::{
        EIA_COLUMN_MAPPING, EIA_HEADER_SKIP_ROWS, EIA_ID_COLUMNS, EIA_REQUIRED_COLUMNS,
        EIA_STRING_COLUMNS, TARGET_STATE, eia_file_name,
    },
    error::{DataError, Result, column_names, require_columns},
    universe::{Utility, id_filter},
};
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use polars::prelude::*;
use std::{collections::HashMap, path::Path};
use tracing::{debug, info};

/// Storage class of a standardized EIA column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Id,
    Text,
    Value,
}

impl ColumnKind {
    fn of(name: &str) -> Self {
        if EIA_ID_COLUMNS.contains(&name) {
            Self::Id
        } else if EIA_STRING_COLUMNS.contains(&name) {
            Self::Text
        } else {
            Self::Value
        }
    }
}

/// Load one EIA-861 workbook.
///
/// Fails with [`DataError::MissingFile`] when the workbook for `year` is absent.
pub fn load_eia_file(eia_dir: &Path, year: i64) -> Result<DataFrame> {
    let path = eia_dir.join(eia_file_name(year));
    if !path.exists() {
        return Err(DataError::MissingFile { path });
    }

    let excel_error = |message: String| DataError::Excel {
        path: path.clone(),
        message,
    };
    let mut workbook: Xlsx<_> =
        open_workbook(&path).map_err(|e: calamine::XlsxError| excel_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| excel_error("workbook has no worksheets".to_string()))?
        .map_err(|e| excel_error(e.to_string()))?;

    let df = eia_frame_from_range(&range, EIA_HEADER_SKIP_ROWS)?;
    debug!(year, rows = df.height(), path = %path.display(), "Loaded EIA workbook");
    Ok(df)
}

/// Convert a worksheet range into a frame of standardized EIA columns.
///
/// `skip_rows` counts sheet rows above the header, measured from the top of
/// the sheet. Only mapped headers are kept, in mapping order.
pub fn eia_frame_from_range(range: &Range<Data>, skip_rows: usize) -> Result<DataFrame> {
    let start_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows().skip(skip_rows.saturating_sub(start_row));

    let Some(header_row) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let headers = disambiguate_headers(
        header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| header_text(i, cell)),
    );
    let body: Vec<&[Data]> = rows.collect();

    let mut columns = Vec::new();
    for (source, target) in EIA_COLUMN_MAPPING {
        let Some(idx) = headers.iter().position(|h| h == source) else {
            continue;
        };
        let cells = body.iter().map(|row| row.get(idx).unwrap_or(&Data::Empty));
        let column = match ColumnKind::of(target) {
            ColumnKind::Id => {
                Column::new((*target).into(), cells.map(cell_i64).collect::<Vec<_>>())
            }
            ColumnKind::Text => {
                Column::new((*target).into(), cells.map(cell_text).collect::<Vec<_>>())
            }
            ColumnKind::Value => {
                Column::new((*target).into(), cells.map(cell_f64).collect::<Vec<_>>())
            }
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}

/// Load and vertically combine every configured EIA year.
///
/// Stops at the first missing workbook. Years with differing column sets are
/// combined diagonally; the result must still hold `report_year`,
/// `utility_id_eia` and `state`.
pub fn extract_eia_data(eia_dir: &Path, years: &[i64]) -> Result<DataFrame> {
    let frames = years
        .iter()
        .map(|&year| load_eia_file(eia_dir, year).map(IntoLazy::lazy))
        .collect::<Result<Vec<_>>>()?;

    if frames.is_empty() {
        return Err(DataError::missing_columns(EIA_REQUIRED_COLUMNS.iter().copied()));
    }

    let combined = concat_lf_diagonal(frames, UnionArgs::default())?.collect()?;
    require_columns(EIA_REQUIRED_COLUMNS, &column_names(&combined))?;

    info!(years = years.len(), rows = combined.height(), "Extracted EIA-861 data");
    Ok(combined)
}

/// Keep California rows belonging to the target utilities.
pub fn filter_eia_to_targets(df: &DataFrame) -> Result<DataFrame> {
    let names = column_names(df);
    require_columns(&["state", "utility_id_eia"], &names)?;

    let filtered = df
        .clone()
        .lazy()
        .filter(
            col("state")
                .eq(lit(TARGET_STATE))
                .and(id_filter("utility_id_eia", &Utility::eia_ids())),
        )
        .collect()?;

    debug!(rows = filtered.height(), "Filtered EIA rows to target utilities");
    Ok(filtered)
}

/// Collapse multiple rows per (`utility_id_eia`, `report_year`).
///
/// Numeric columns are summed, text columns keep their first non-null value.
pub fn aggregate_eia_duplicates(df: &DataFrame) -> Result<DataFrame> {
    let keys = ["utility_id_eia", "report_year"];
    let names = column_names(df);
    require_columns(&keys, &names)?;

    let aggs: Vec<Expr> = df
        .get_columns()
        .iter()
        .filter(|c| !keys.contains(&c.name().as_str()))
        .map(|c| {
            let name = c.name().as_str();
            if c.dtype() == &DataType::String {
                col(name).drop_nulls().first().alias(name)
            } else {
                col(name).sum().alias(name)
            }
        })
        .collect();

    let aggregated = df
        .clone()
        .lazy()
        .group_by([col(keys[0]), col(keys[1])])
        .agg(aggs)
        .sort(keys, SortMultipleOptions::default())
        .collect()?;

    debug!(
        before = df.height(),
        after = aggregated.height(),
        "Aggregated EIA duplicates"
    );
    Ok(aggregated)
}

/// Rename repeated labels `X`, `X.1`, `X.2`, ... from left to right.
fn disambiguate_headers<I: IntoIterator<Item = String>>(headers: I) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|header| {
            let count = seen.entry(header.clone()).or_insert(0);
            let name = if *count == 0 {
                header
            } else {
                format!("{header}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn header_text(idx: usize, cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => format!("Unnamed: {idx}"),
        other => other.to_string(),
    }
}

fn cell_f64(cell: &Data) -> Option<f64> {
    let value = match cell {
        Data::Int(i) => *i as f64,
        Data::Float(f) => *f,
        Data::String(s) => s.trim().replace(',', "").parse().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn cell_i64(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::String(s) => s.trim().parse().ok(),
        _ => cell_f64(cell)
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64),
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: [&str; 11] = [
        "Data Year",
        "Utility Number",
        "Utility Name",
        "State",
        "Ownership",
        "Thousand Dollars",
        "Megawatthours",
        "Count",
        "Thousand Dollars",
        "Megawatthours",
        "Count",
    ];

    fn sample_range() -> Range<Data> {
        let mut range = Range::new((0, 0), (5, HEADERS.len() as u32 - 1));
        range.set_value((0, 0), Data::String("Sales to Ultimate Customers".into()));
        range.set_value((1, 5), Data::String("RESIDENTIAL".into()));
        for (c, h) in HEADERS.iter().enumerate() {
            range.set_value((2, c as u32), Data::String((*h).into()));
        }

        let rows: [[Data; 11]; 3] = [
            [
                Data::Float(2021.0),
                Data::Int(14328),
                Data::String("Pacific Gas & Electric Co.".into()),
                Data::String("CA".into()),
                Data::String("Investor Owned".into()),
                Data::Float(6_000_000.0),
                Data::Float(30_000_000.0),
                Data::Int(5_000_000),
                Data::Float(5_500_000.0),
                Data::Float(33_000_000.0),
                Data::Int(600_000),
            ],
            [
                Data::Int(2021),
                Data::Int(17609),
                Data::String("Southern California Edison Co".into()),
                Data::String("CA".into()),
                Data::String("Investor Owned".into()),
                Data::String(".".into()),
                Data::Float(29_000_000.0),
                Data::Int(4_500_000),
                Data::Empty,
                Data::Float(31_000_000.0),
                Data::Int(550_000),
            ],
            [
                Data::Int(2021),
                Data::Int(99999),
                Data::String("Other Utility".into()),
                Data::String("NV".into()),
                Data::String("Cooperative".into()),
                Data::Float(10.0),
                Data::Float(20.0),
                Data::Int(30),
                Data::Float(40.0),
                Data::Float(50.0),
                Data::Int(60),
            ],
        ];
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((3 + r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    #[test]
    fn test_disambiguate_headers() {
        let headers = disambiguate_headers(
            ["Count", "State", "Count", "Count"]
                .into_iter()
                .map(String::from),
        );
        assert_eq!(headers, vec!["Count", "State", "Count.1", "Count.2"]);
    }

    #[test]
    fn test_frame_from_range_renames_and_types() {
        let df = eia_frame_from_range(&sample_range(), EIA_HEADER_SKIP_ROWS).unwrap();
        assert_eq!(df.height(), 3);

        let names = column_names(&df);
        assert_eq!(
            names,
            vec![
                "report_year",
                "utility_id_eia",
                "utility_name",
                "state",
                "ownership",
                "revenue_residential_k",
                "sales_mwh_residential",
                "customers_residential",
                "revenue_commercial_k",
                "sales_mwh_commercial",
                "customers_commercial",
            ]
        );

        assert_eq!(df.column("report_year").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("state").unwrap().dtype(), &DataType::String);
        assert_eq!(
            df.column("customers_residential").unwrap().dtype(),
            &DataType::Float64
        );

        let years = df.column("report_year").unwrap().i64().unwrap();
        assert_eq!(years.get(0), Some(2021));
        let revenue = df.column("revenue_residential_k").unwrap().f64().unwrap();
        assert_eq!(revenue.get(0), Some(6_000_000.0));
        assert_eq!(revenue.get(1), None);
        let commercial = df.column("revenue_commercial_k").unwrap().f64().unwrap();
        assert_eq!(commercial.get(1), None);
    }

    #[test]
    fn test_filter_and_aggregate() {
        let df = eia_frame_from_range(&sample_range(), EIA_HEADER_SKIP_ROWS).unwrap();
        let filtered = filter_eia_to_targets(&df).unwrap();
        assert_eq!(filtered.height(), 2);

        let doubled = filtered.vstack(&filtered).unwrap();
        let aggregated = aggregate_eia_duplicates(&doubled).unwrap();
        assert_eq!(aggregated.height(), 2);

        let ids = aggregated.column("utility_id_eia").unwrap().i64().unwrap();
        assert_eq!(ids.get(0), Some(14328));
        let sales = aggregated
            .column("sales_mwh_residential")
            .unwrap()
            .f64()
            .unwrap();
        assert_eq!(sales.get(0), Some(60_000_000.0));
        let names = aggregated.column("utility_name").unwrap().str().unwrap();
        assert_eq!(names.get(1), Some("Southern California Edison Co"));
    }

    #[test]
    fn test_missing_workbook_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_eia_data(dir.path(), &[2018, 2019]).unwrap_err();
        match err {
            DataError::MissingFile { path } => {
                assert!(path.ends_with("Sales_Ult_Cust_2018.xlsx"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_filter_requires_state() {
        let df = df! { "utility_id_eia" => [14328i64] }.unwrap();
        let err = filter_eia_to_targets(&df).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { columns } if columns == ["state"]));
    }
}
