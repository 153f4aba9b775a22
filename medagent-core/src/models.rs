use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::language::LanguageCode;

/// A user-selected document, held in memory so it can be re-sent on re-analyze.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Content type sent with the multipart part, derived from the extension.
    pub fn mime_type(&self) -> &'static str {
        let extension = Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => "application/pdf",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("bmp") => "image/bmp",
            Some("tif") | Some("tiff") => "image/tiff",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One outgoing analysis call. Never mutated after it is handed to the service.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub id: Uuid,
    pub file: DocumentFile,
    pub language: LanguageCode,
}

impl AnalysisRequest {
    pub fn new(file: DocumentFile, language: LanguageCode) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            language,
        }
    }
}

// ---------------------------------------------------------------------------
// Lab report
// ---------------------------------------------------------------------------

/// Display tier of a classified lab value. `LOW` shares the `High` tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    High,
    Critical,
}

impl Severity {
    pub fn classify(status: Option<&str>) -> Self {
        let normalized = status.map(|s| s.trim().to_ascii_uppercase());
        match normalized.as_deref() {
            Some("CRITICAL") => Severity::Critical,
            Some("HIGH") | Some("LOW") => Severity::High,
            _ => Severity::Normal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Lab values arrive either as numbers or as free text (`"Positive"`, `"<0.5"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for LabValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            LabValue::Number(n) => write!(f, "{n}"),
            LabValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lab_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub normal: u32,
    #[serde(default)]
    pub abnormal: u32,
    #[serde(default)]
    pub critical: Option<u32>,
    #[serde(default)]
    pub pages: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedValue {
    #[serde(default)]
    pub test: String,
    #[serde(default)]
    pub value: Option<LabValue>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub unit: Option<String>,
    #[serde(default)]
    pub benchmark_min: Option<f64>,
    #[serde(default)]
    pub benchmark_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub benchmark_unit: Option<String>,
    #[serde(default)]
    pub deviation_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

impl ClassifiedValue {
    pub fn severity(&self) -> Severity {
        Severity::classify(self.status.as_deref())
    }
}

/// Lab-report variant of an analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabReportAnalysis {
    #[serde(default)]
    pub patient_info: Option<PatientInfo>,
    #[serde(default, rename = "stats")]
    pub summary_stats: SummaryStats,
    #[serde(default)]
    pub classified_values: Vec<ClassifiedValue>,
    #[serde(default, rename = "summary", deserialize_with = "lenient_string")]
    pub narrative_summary: Option<String>,
    #[serde(default)]
    pub critical_flags: BTreeSet<String>,
    #[serde(default)]
    pub critical_explanations: BTreeMap<String, String>,
    /// Long-form language the narrative was generated in.
    #[serde(default, deserialize_with = "lenient_string")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub extraction_method: Option<String>,
}

// ---------------------------------------------------------------------------
// Prescription
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    #[serde(default, rename = "medicine")]
    pub medicine_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dosage: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub frequency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timing: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub special_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub instruction_english: Option<String>,
    #[serde(
        default,
        rename = "instruction_translated",
        deserialize_with = "lenient_string"
    )]
    pub translated_instruction: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub language: Option<String>,
}

/// Prescription variant of an analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionAnalysis {
    #[serde(default, rename = "ocr_text", deserialize_with = "lenient_string")]
    pub extracted_text: Option<String>,
    /// Percentage, 0 to 100.
    #[serde(default, rename = "ocr_confidence")]
    pub extraction_confidence: Option<f64>,
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub detection_mode: Option<String>,
    #[serde(default)]
    pub medicine_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub language: Option<String>,
}

// ---------------------------------------------------------------------------
// Follow-up
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentRequest {
    pub phone: String,
    pub name: String,
    pub language: LanguageCode,
    pub doctor_phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckinRequest {
    pub phone: String,
    pub name: String,
    pub language: LanguageCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnrollmentReceipt {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl EnrollmentReceipt {
    pub fn ok(&self) -> bool {
        self.success
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckinReceipt {
    #[serde(default)]
    pub success: Option<bool>,
    /// Provider message id. Absent when messaging is not configured.
    #[serde(default, rename = "message_sid")]
    pub confirmation_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Accepts strings, numbers and booleans as text; null and empty strings become `None`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
