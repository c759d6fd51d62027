use bytes::Bytes;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use polars::prelude::*;
use std::io::Cursor;
use std::time::Instant;

use crate::error::AppError;
use crate::models::{Column, ColumnValues, Dataset, EdaReport};
use crate::services::eda;
use crate::services::plot_store::PlotStore;
use crate::services::render::ChartRenderer;
use crate::services::utils::normalize_headers;

/// Cell values read as missing, matching the usual CSV conventions.
const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadFormat {
    Csv,
    Xlsx,
}

impl UploadFormat {
    fn from_file_name(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".xlsx") || lower.ends_with(".xlsm") {
            UploadFormat::Xlsx
        } else {
            UploadFormat::Csv
        }
    }
}

/// A column as read from the file, before header normalization.
struct RawColumn {
    header: String,
    values: ColumnValues,
}

fn string_values(series: &Series) -> Result<Vec<Option<String>>, PolarsError> {
    let strings = series.cast(&DataType::String)?;
    let values = strings.str()?.into_iter().map(|v| v.map(str::to_string)).collect();
    Ok(values)
}

fn series_to_values(series: &Series) -> Result<ColumnValues, PolarsError> {
    // An all-blank column carries no type information; treat it as numeric NaN
    if series.null_count() == series.len() {
        return Ok(ColumnValues::Numeric(vec![None; series.len()]));
    }

    let dtype = series.dtype();
    if dtype.is_numeric() {
        let floats = series.cast(&DataType::Float64)?;
        let values = floats.f64()?.into_iter().collect();
        Ok(ColumnValues::Numeric(values))
    } else if matches!(dtype, DataType::String) {
        Ok(ColumnValues::Text(string_values(series)?))
    } else {
        Ok(ColumnValues::Other {
            dtype: dtype.to_string(),
            values: string_values(series)?,
        })
    }
}

/// The header row exactly as written. polars renames blank and repeated
/// headers while parsing, so the names are read separately as plain text.
fn read_csv_header(data: &Bytes) -> Result<Vec<String>, AppError> {
    let header = CsvReader::new(Cursor::new(data.clone()))
        .has_header(false)
        .with_n_rows(Some(1))
        .infer_schema(Some(0))
        .finish()
        .map_err(|e| AppError::Ingestion(format!("Failed to read CSV header: {}", e)))?;

    header
        .get_columns()
        .iter()
        .map(|series| -> Result<String, AppError> {
            let cell = string_values(series)?.into_iter().next().flatten();
            Ok(cell.unwrap_or_default())
        })
        .collect()
}

fn read_csv(data: Bytes) -> Result<Vec<RawColumn>, AppError> {
    let headers = read_csv_header(&data)?;
    let null_values = NA_MARKERS.iter().map(|s| s.to_string()).collect();

    let df = CsvReader::new(Cursor::new(data))
        .has_header(true)
        .infer_schema(None)
        .with_null_values(Some(NullValues::AllColumns(null_values)))
        .finish()
        .map_err(|e| AppError::Ingestion(format!("Failed to parse CSV: {}", e)))?;

    tracing::debug!("CSV parsed: {} rows x {} columns", df.height(), df.width());

    if headers.len() != df.width() {
        return Err(AppError::Ingestion(format!(
            "Header has {} fields but the data has {} columns",
            headers.len(),
            df.width()
        )));
    }

    df.get_columns()
        .iter()
        .zip(headers)
        .map(|(series, header)| -> Result<RawColumn, AppError> {
            Ok(RawColumn {
                header,
                values: series_to_values(series)?,
            })
        })
        .collect()
}

/// Formula errors such as `#DIV/0!` read as missing, like blank cells.
fn is_missing_cell(cell: &Data) -> bool {
    matches!(cell, Data::Empty | Data::Error(_))
}

fn cells_to_values(cells: &[Data]) -> ColumnValues {
    let present: Vec<&Data> = cells.iter().filter(|c| !is_missing_cell(c)).collect();

    let cell_string = |cell: &Data| match cell {
        c if is_missing_cell(c) => None,
        other => Some(other.to_string()),
    };

    if present.iter().all(|c| matches!(c, Data::Int(_) | Data::Float(_))) {
        ColumnValues::Numeric(
            cells
                .iter()
                .map(|c| match c {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect(),
        )
    } else if present.iter().all(|c| matches!(c, Data::Bool(_))) {
        ColumnValues::Other {
            dtype: "bool".to_string(),
            values: cells.iter().map(cell_string).collect(),
        }
    } else if present
        .iter()
        .all(|c| matches!(c, Data::DateTime(_) | Data::DateTimeIso(_)))
    {
        ColumnValues::Other {
            dtype: "datetime".to_string(),
            values: cells.iter().map(cell_string).collect(),
        }
    } else {
        // Mixed or string cells are text, like an object column
        ColumnValues::Text(cells.iter().map(cell_string).collect())
    }
}

fn read_xlsx(data: Bytes) -> Result<Vec<RawColumn>, AppError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
        .map_err(|e| AppError::Ingestion(format!("Failed to open Excel file: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Ingestion("No sheets found in workbook".to_string()))?;
    tracing::debug!("Reading worksheet {}", sheet_name);

    let range = workbook.worksheet_range(&sheet_name)?;
    let rows: Vec<&[Data]> = range.rows().collect();
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| AppError::Ingestion(format!("Worksheet {} is empty", sheet_name)))?;

    Ok(header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let cells: Vec<Data> = body
                .iter()
                .map(|row| row.get(idx).cloned().unwrap_or(Data::Empty))
                .collect();
            RawColumn {
                header: match cell {
                    Data::Empty => String::new(),
                    other => other.to_string(),
                },
                values: cells_to_values(&cells),
            }
        })
        .collect())
}

/// Parses an uploaded file into a dataset with normalized column names.
pub fn ingest_upload(file_name: &str, data: Bytes) -> Result<Dataset, AppError> {
    if data.is_empty() {
        return Err(AppError::Ingestion("No columns to parse from file".to_string()));
    }

    let start = Instant::now();
    let format = UploadFormat::from_file_name(file_name);
    let raw = match format {
        UploadFormat::Csv => read_csv(data)?,
        UploadFormat::Xlsx => read_xlsx(data)?,
    };

    let headers: Vec<&str> = raw.iter().map(|c| c.header.as_str()).collect();
    let names = normalize_headers(&headers);

    let columns = raw
        .into_iter()
        .zip(names)
        .map(|(column, name)| Column { name, values: column.values })
        .collect();

    let dataset = Dataset::new(columns)?;
    let (rows, cols) = dataset.shape();
    tracing::info!(
        "Ingested {} ({:?}): {} rows, {} columns in {:?}",
        file_name,
        format,
        rows,
        cols,
        start.elapsed()
    );

    Ok(dataset)
}

/// Full pipeline for one upload: ingest, analyse, render into a fresh plot session.
pub fn analyze_upload(
    file_name: &str,
    data: Bytes,
    store: &PlotStore,
    renderer: &dyn ChartRenderer,
) -> Result<EdaReport, AppError> {
    let start = Instant::now();
    tracing::info!("Processing upload {}, size: {}KB", file_name, data.len() / 1024);

    let dataset = ingest_upload(file_name, data)?;
    let session = store.open_session()?;
    let report = eda::run_eda(&dataset, &session, renderer);

    tracing::info!("Total processing completed in {:?}", start.elapsed());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(text: &str) -> Bytes {
        Bytes::from(text.to_string())
    }

    #[test]
    fn csv_columns_are_typed_and_normalized() {
        let data = csv("Full Name,Category,Score\nann,A,1\nbob,B,2.5\ncid,,3\n");
        let dataset = ingest_upload("people.csv", data).unwrap();

        assert_eq!(dataset.column_names(), vec!["full_name", "category", "score"]);
        assert_eq!(dataset.shape(), (3, 3));

        let columns = dataset.columns();
        assert_eq!(
            columns[1].values,
            ColumnValues::Text(vec![Some("A".to_string()), Some("B".to_string()), None])
        );
        assert_eq!(columns[2].values, ColumnValues::Numeric(vec![Some(1.0), Some(2.5), Some(3.0)]));
    }

    #[test]
    fn na_markers_count_as_missing() {
        let data = csv("city,temp\nOslo,NA\nN/A,3\nRome,null\n");
        let dataset = ingest_upload("weather.csv", data).unwrap();
        let columns = dataset.columns();

        assert_eq!(columns[0].values.null_count(), 1);
        assert_eq!(columns[1].values.null_count(), 2);
    }

    #[test]
    fn all_blank_columns_are_numeric() {
        let data = csv("a,b\n1,\n2,\n");
        let dataset = ingest_upload("blank.csv", data).unwrap();
        assert_eq!(dataset.columns()[1].values, ColumnValues::Numeric(vec![None, None]));
    }

    #[test]
    fn empty_upload_is_an_ingestion_error() {
        let err = ingest_upload("empty.csv", Bytes::new()).unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn corrupt_workbook_is_an_ingestion_error() {
        let err = ingest_upload("broken.xlsx", csv("definitely not a zip archive")).unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn spreadsheet_cells_map_onto_column_kinds() {
        let numeric = cells_to_values(&[Data::Int(1), Data::Empty, Data::Float(2.5)]);
        assert_eq!(numeric, ColumnValues::Numeric(vec![Some(1.0), None, Some(2.5)]));

        let mixed = cells_to_values(&[Data::String("a".to_string()), Data::Int(3)]);
        assert_eq!(mixed, ColumnValues::Text(vec![Some("a".to_string()), Some("3".to_string())]));

        let flags = cells_to_values(&[Data::Bool(true), Data::Empty]);
        assert!(matches!(flags, ColumnValues::Other { ref dtype, .. } if dtype == "bool"));
    }

    #[test]
    fn spreadsheet_error_cells_are_missing() {
        let numeric = cells_to_values(&[
            Data::Float(1.5),
            Data::Error(calamine::CellErrorType::Div0),
            Data::Int(2),
        ]);
        assert_eq!(numeric, ColumnValues::Numeric(vec![Some(1.5), None, Some(2.0)]));

        let text = cells_to_values(&[Data::String("a".to_string()), Data::Error(calamine::CellErrorType::NA)]);
        assert_eq!(text, ColumnValues::Text(vec![Some("a".to_string()), None]));
    }

    #[test]
    fn blank_and_repeated_csv_headers_keep_their_own_names() {
        let data = csv(",,a,a\n1,2,3,4\n5,6,7,8\n");
        let dataset = ingest_upload("index.csv", data).unwrap();

        assert_eq!(dataset.column_names(), vec!["unnamed:_0", "unnamed:_1", "a", "a_1"]);
        assert_eq!(dataset.columns()[1].values, ColumnValues::Numeric(vec![Some(2.0), Some(6.0)]));
    }

    #[test]
    fn ragged_csv_rows_are_an_ingestion_error() {
        let err = ingest_upload("ragged.csv", csv("a,b\n1,2\n3,4,5\n")).unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn upload_format_follows_extension() {
        assert_eq!(UploadFormat::from_file_name("Sales.XLSX"), UploadFormat::Xlsx);
        assert_eq!(UploadFormat::from_file_name("data.csv"), UploadFormat::Csv);
        assert_eq!(UploadFormat::from_file_name("data"), UploadFormat::Csv);
    }
}
