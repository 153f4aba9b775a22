//! Typed client for the external analysis/messaging service.
//!
//! Every operation is a single request: no retries, no caching and no timeout
//! beyond the transport default.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    AnalysisRequest, CheckinReceipt, CheckinRequest, DocumentFile, EnrollmentReceipt,
    EnrollmentRequest, LabReportAnalysis, PrescriptionAnalysis,
};
use crate::snapshot::{
    AlertFeed, DashboardAlert, DashboardStats, DoctorAlert, HealthStatus, RecoverySnapshot,
    RecoveryTimeline,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_RECOVERY_DAYS: u32 = 14;

/// The operations the console needs from the service.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze_lab_report(&self, request: &AnalysisRequest)
    -> ServiceResult<LabReportAnalysis>;

    async fn parse_prescription(
        &self,
        request: &AnalysisRequest,
    ) -> ServiceResult<PrescriptionAnalysis>;

    async fn enroll_patient(&self, request: &EnrollmentRequest) -> ServiceResult<EnrollmentReceipt>;

    /// A receipt without a confirmation id is a valid success (demo mode).
    async fn send_checkin(&self, request: &CheckinRequest) -> ServiceResult<CheckinReceipt>;

    async fn dashboard_stats(&self) -> ServiceResult<DashboardStats>;

    async fn dashboard_alerts(&self) -> ServiceResult<Vec<DashboardAlert>>;

    async fn recovery_snapshot(&self) -> ServiceResult<RecoverySnapshot>;

    async fn recovery_timeline(&self, phone: &str, days: u32) -> ServiceResult<RecoveryTimeline>;

    async fn doctor_alerts(&self) -> ServiceResult<Vec<DoctorAlert>>;

    async fn health(&self) -> ServiceResult<HealthStatus>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// [`AnalysisService`] over HTTP.
#[derive(Clone, Debug)]
pub struct HttpServiceClient {
    client: Client,
    base_url: String,
}

impl HttpServiceClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        request: &AnalysisRequest,
    ) -> ServiceResult<T> {
        info!(
            request_id = %request.id,
            endpoint = path,
            file = %request.file.name,
            bytes = request.file.len(),
            language = request.language.service_name(),
            "Uploading document for analysis"
        );

        let part = document_part(&request.file)?;
        let form = Form::new()
            .part("file", part)
            .text("language", request.language.service_name());

        let response = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_failure(path, e))?;

        read_payload(path, response).await
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> ServiceResult<T> {
        debug!(endpoint = path, "Posting form");
        let response = self
            .client
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .map_err(|e| transport_failure(path, e))?;

        read_payload(path, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ServiceResult<T> {
        debug!(endpoint = path, "Fetching");
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| transport_failure(path, e))?;

        read_payload(path, response).await
    }
}

#[async_trait]
impl AnalysisService for HttpServiceClient {
    async fn analyze_lab_report(
        &self,
        request: &AnalysisRequest,
    ) -> ServiceResult<LabReportAnalysis> {
        self.upload("/analyze-lab", request).await
    }

    async fn parse_prescription(
        &self,
        request: &AnalysisRequest,
    ) -> ServiceResult<PrescriptionAnalysis> {
        self.upload("/parse-prescription", request).await
    }

    async fn enroll_patient(&self, request: &EnrollmentRequest) -> ServiceResult<EnrollmentReceipt> {
        self.post_form(
            "/checkin/enroll",
            &[
                ("phone", request.phone.as_str()),
                ("name", request.name.as_str()),
                ("language", request.language.service_name()),
                ("doctor_phone", request.doctor_phone.as_str()),
            ],
        )
        .await
    }

    async fn send_checkin(&self, request: &CheckinRequest) -> ServiceResult<CheckinReceipt> {
        let receipt: CheckinReceipt = self
            .post_form(
                "/checkin/send",
                &[
                    ("phone", request.phone.as_str()),
                    ("name", request.name.as_str()),
                    ("language", request.language.service_name()),
                ],
            )
            .await?;

        // The service reports provider failures inside a 200 body.
        if receipt.success == Some(false) {
            let detail = receipt.error.unwrap_or_default();
            warn!(detail = %detail, "Check-in reported as unsuccessful");
            return Err(if detail.trim().is_empty() {
                ServiceError::RejectedOpaque { status: 200 }
            } else {
                ServiceError::Rejected {
                    status: 200,
                    detail,
                }
            });
        }

        Ok(receipt)
    }

    async fn dashboard_stats(&self) -> ServiceResult<DashboardStats> {
        self.get_json("/api/dashboard").await
    }

    async fn dashboard_alerts(&self) -> ServiceResult<Vec<DashboardAlert>> {
        let feed: AlertFeed = self.get_json("/api/alerts").await?;
        Ok(feed.alerts)
    }

    async fn recovery_snapshot(&self) -> ServiceResult<RecoverySnapshot> {
        self.get_json("/api/recovery").await
    }

    async fn recovery_timeline(&self, phone: &str, days: u32) -> ServiceResult<RecoveryTimeline> {
        let path = format!(
            "/checkin/recovery/{}?days={}",
            urlencoding::encode(phone),
            days
        );
        self.get_json(&path).await
    }

    async fn doctor_alerts(&self) -> ServiceResult<Vec<DoctorAlert>> {
        self.get_json("/checkin/alerts").await
    }

    async fn health(&self) -> ServiceResult<HealthStatus> {
        self.get_json("/health").await
    }
}

/// Multipart part for an uploaded document. Fails before anything is sent.
fn document_part(file: &DocumentFile) -> ServiceResult<Part> {
    Part::bytes(file.bytes.to_vec())
        .file_name(file.name.clone())
        .mime_str(file.mime_type())
        .map_err(|e| ServiceError::InvalidPayload(format!("content type for {}: {e}", file.name)))
}

fn transport_failure(endpoint: &str, err: reqwest::Error) -> ServiceError {
    warn!(endpoint, error = %err, "Service unreachable");
    ServiceError::Network(err.to_string())
}

async fn read_payload<T: DeserializeOwned>(endpoint: &str, response: Response) -> ServiceResult<T> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_failure(endpoint, e))?;

    if !status.is_success() {
        let err = rejection(status.as_u16(), &body);
        warn!(endpoint, status = status.as_u16(), error = %err, "Service rejected request");
        return Err(err);
    }

    serde_json::from_slice(&body).map_err(|e| {
        warn!(endpoint, error = %e, "Unexpected response payload");
        ServiceError::InvalidPayload(e.to_string())
    })
}

/// Classify a non-2xx body as a structured or opaque rejection.
pub(crate) fn rejection(status: u16, body: &[u8]) -> ServiceError {
    match extract_detail(body) {
        Some(detail) => ServiceError::Rejected { status, detail },
        None => ServiceError::RejectedOpaque { status },
    }
}

/// Pull a human-readable detail out of the service's error shapes:
/// `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}` and `{"error": "..."}`.
fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let detail = match value.get("detail") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    };
    detail
        .or_else(|| value.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|d| !d.trim().is_empty())
}
