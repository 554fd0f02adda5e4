use crate::domain::schema::{Field, FIELDS, FIELD_COUNT, SECTIONS, SENTINEL};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;

/// 一份待處理的 PDF
#[derive(Clone)]
pub struct SourceDocument {
    pub id: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }
}

impl fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDocument")
            .field("id", &self.id)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// One value per schema field, every field always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    values: [String; FIELD_COUNT],
}

impl ExtractedRecord {
    /// Record with the sentinel in every field.
    pub fn unresolved() -> Self {
        Self {
            values: std::array::from_fn(|_| SENTINEL.to_string()),
        }
    }

    /// `resolve` returns `None` for fields that could not be determined.
    pub fn from_fn(mut resolve: impl FnMut(Field) -> Option<String>) -> Self {
        Self {
            values: std::array::from_fn(|position| {
                resolve(FIELDS[position]).unwrap_or_else(|| SENTINEL.to_string())
            }),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn is_missing(&self, field: Field) -> bool {
        self.get(field) == SENTINEL
    }

    pub fn is_unresolved(&self) -> bool {
        self.values.iter().all(|value| value == SENTINEL)
    }

    pub fn resolved_count(&self) -> usize {
        self.values.iter().filter(|value| *value != SENTINEL).count()
    }

    /// `(field, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        FIELDS
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Serialize for ExtractedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FIELD_COUNT))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// OCR 服務呼叫失敗
    Ocr,
    /// LLM 服務呼叫失敗
    Llm,
    /// LLM 有回應但不是可解析的 JSON
    MalformedResponse,
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureKind::Ocr => "text extraction failed",
            FailureKind::Llm => "field extraction failed",
            FailureKind::MalformedResponse => "unreadable model response",
            FailureKind::Timeout => "timed out",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    Success,
    Failed { kind: FailureKind, reason: String },
}

impl DocumentStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DocumentStatus::Success)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Success => "success",
            DocumentStatus::Failed { .. } => "failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            DocumentStatus::Success => None,
            DocumentStatus::Failed { reason, .. } => Some(reason),
        }
    }
}

/// 單一文件的處理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResult {
    pub document_id: String,
    pub record: ExtractedRecord,
    pub status: DocumentStatus,
}

impl DocumentResult {
    pub fn success(document_id: impl Into<String>, record: ExtractedRecord) -> Self {
        Self {
            document_id: document_id.into(),
            record,
            status: DocumentStatus::Success,
        }
    }

    pub fn failed(document_id: impl Into<String>, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            record: ExtractedRecord::unresolved(),
            status: DocumentStatus::Failed {
                kind,
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 依區塊分組的多行摘要，供 CLI 顯示
    pub fn summary(&self) -> String {
        let mut out = format!("📄 {} [{}]\n", self.document_id, self.status.label());
        if let Some(reason) = self.status.reason() {
            out.push_str(&format!("  ⚠️ {}\n", reason));
        }
        for (section, fields) in SECTIONS.iter() {
            out.push_str(&format!("  {}:\n", section));
            for field in fields.iter() {
                out.push_str(&format!("    {}: {}\n", field.label(), self.record.get(*field)));
            }
        }
        out
    }
}

impl Serialize for DocumentResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DocumentResult", 5)?;
        state.serialize_field("filename", &self.document_id)?;
        state.serialize_field("status", self.status.label())?;
        match &self.status {
            DocumentStatus::Success => {
                state.skip_field("failure")?;
                state.skip_field("error")?;
            }
            DocumentStatus::Failed { kind, reason } => {
                state.serialize_field("failure", kind)?;
                state.serialize_field("error", reason)?;
            }
        }
        state.serialize_field("fields", &self.record)?;
        state.end()
    }
}

/// 一次批次執行的完整結果，順序即提交順序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    results: Vec<DocumentResult>,
}

pub const DOCUMENT_ID_HEADER: &str = "Filename";

impl ResultTable {
    pub fn new(results: Vec<DocumentResult>) -> Self {
        Self { results }
    }

    /// `Filename` followed by the human-readable field headers.
    pub fn header() -> Vec<String> {
        std::iter::once(DOCUMENT_ID_HEADER.to_string())
            .chain(FIELDS.iter().map(|field| field.header()))
            .collect()
    }

    /// Document id followed by the field values in schema order.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.results
            .iter()
            .map(|result| {
                std::iter::once(result.document_id.clone())
                    .chain(result.record.values().iter().cloned())
                    .collect()
            })
            .collect()
    }

    pub fn results(&self) -> &[DocumentResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|result| result.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.successful()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_record_is_all_sentinel() {
        let record = ExtractedRecord::unresolved();
        assert!(record.is_unresolved());
        assert_eq!(record.resolved_count(), 0);
        assert_eq!(record.iter().count(), FIELD_COUNT);
    }

    #[test]
    fn test_from_fn_fills_sentinel() {
        let record = ExtractedRecord::from_fn(|field| match field {
            Field::ExportersCountry => Some("India".to_string()),
            _ => None,
        });
        assert_eq!(record.get(Field::ExportersCountry), "India");
        assert!(record.is_missing(Field::ImportingCountry));
        assert_eq!(record.resolved_count(), 1);
    }

    #[test]
    fn test_record_serializes_in_schema_order() {
        let record = ExtractedRecord::unresolved();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with("{\"exporters_business_name\":\"N/A\""));
        assert!(json.ends_with("\"importing_country\":\"N/A\"}"));
    }

    #[test]
    fn test_failed_result_serialization() {
        let result = DocumentResult::failed("a.pdf", FailureKind::Ocr, "quota exceeded");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["filename"], "a.pdf");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failure"], "ocr");
        assert_eq!(json["error"], "quota exceeded");
        assert_eq!(json["fields"]["value_fob"], "N/A");
    }

    #[test]
    fn test_summary_groups_fields() {
        let record = ExtractedRecord::from_fn(|field| match field {
            Field::ConsigneesName => Some("Siam Traders".to_string()),
            _ => None,
        });
        let summary = DocumentResult::success("a.pdf", record).summary();
        assert!(summary.starts_with("📄 a.pdf [success]"));
        assert!(summary.contains("  Consignee:\n    Consignee's name: Siam Traders\n"));
        assert!(summary.contains("    Value (FOB): N/A\n"));

        let failed = DocumentResult::failed("b.pdf", FailureKind::Timeout, "too slow").summary();
        assert!(failed.contains("⚠️ too slow"));
    }

    #[test]
    fn test_table_header_and_rows() {
        let table = ResultTable::new(vec![
            DocumentResult::success("a.pdf", ExtractedRecord::unresolved()),
            DocumentResult::failed("b.pdf", FailureKind::Llm, "boom"),
        ]);
        let header = ResultTable::header();
        assert_eq!(header.len(), FIELD_COUNT + 1);
        assert_eq!(header[0], "Filename");
        assert_eq!(header[1], "Exporters Business Name");

        let rows = table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "b.pdf");
        assert!(rows[1][1..].iter().all(|value| value == SENTINEL));
        assert_eq!(table.successful(), 1);
        assert_eq!(table.failed(), 1);
    }
}
