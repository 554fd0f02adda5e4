use crate::core::xlsx::{write_workbook, Sheet};
use crate::domain::model::{ResultTable, DOCUMENT_ID_HEADER};
use crate::utils::error::{ExtractorError, Result};
use std::fmt;
use std::str::FromStr;

pub const DATA_SHEET: &str = "Extracted_Data";
pub const LOG_SHEET: &str = "Processing_Log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub const SUPPORTED: [&'static str; 3] = ["xlsx", "csv", "json"];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExtractorError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ExtractorError::InvalidConfigValueError {
                field: "output_formats".to_string(),
                value: other.to_string(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    Self::SUPPORTED.join(", ")
                ),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 將結果表編碼為指定格式；失敗只影響這次匯出
pub fn export(table: &ResultTable, format: ExportFormat) -> Result<Vec<u8>> {
    let encoded = match format {
        ExportFormat::Xlsx => encode_xlsx(table),
        ExportFormat::Csv => encode_csv(table),
        ExportFormat::Json => serde_json::to_vec_pretty(table).map_err(ExtractorError::from),
    };

    encoded.map_err(|e| match e {
        ExtractorError::ExportError { .. } => e,
        other => ExtractorError::ExportError {
            message: format!("{} export failed: {}", format, other),
        },
    })
}

fn encode_xlsx(table: &ResultTable) -> Result<Vec<u8>> {
    let data = Sheet::new(DATA_SHEET, ResultTable::header(), table.rows());

    let log_rows = table
        .results()
        .iter()
        .map(|result| {
            vec![
                result.document_id.clone(),
                result.status.label().to_string(),
                result.status.reason().unwrap_or_default().to_string(),
            ]
        })
        .collect();
    let log = Sheet::new(
        LOG_SHEET,
        vec![
            DOCUMENT_ID_HEADER.to_string(),
            "Status".to_string(),
            "Reason".to_string(),
        ],
        log_rows,
    );

    write_workbook(&[data, log])
}

fn encode_csv(table: &ResultTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ResultTable::header())?;
    for row in table.rows() {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExtractorError::ExportError {
            message: format!("csv export failed: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DocumentResult, ExtractedRecord, FailureKind};
    use crate::domain::schema::Field;

    fn sample_table() -> ResultTable {
        let record = ExtractedRecord::from_fn(|field| match field {
            Field::ExportersBusinessName => Some("ACME, \"Exports\"".to_string()),
            Field::ImportingCountry => Some("Thailand".to_string()),
            _ => None,
        });
        ResultTable::new(vec![
            DocumentResult::success("a.pdf", record),
            DocumentResult::failed("b.pdf", FailureKind::Llm, "HTTP 503"),
        ])
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_csv_export_quotes_values() {
        let bytes = export(&sample_table(), ExportFormat::Csv).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("Filename"));
        assert_eq!(headers.len(), 19);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(1), Some("ACME, \"Exports\""));
        assert_eq!(rows[0].get(18), Some("Thailand"));
        assert_eq!(rows[1].get(18), Some("N/A"));
    }

    #[test]
    fn test_json_export_is_array_of_results() {
        let bytes = export(&sample_table(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["fields"]["importing_country"], "Thailand");
        assert_eq!(items[1]["status"], "failed");
        assert_eq!(items[1]["error"], "HTTP 503");
    }

    #[test]
    fn test_xlsx_export_has_two_sheets() {
        let bytes = export(&sample_table(), ExportFormat::Xlsx).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("xl/worksheets/sheet1.xml").is_ok());
        assert!(archive.by_name("xl/worksheets/sheet2.xml").is_ok());
    }
}
