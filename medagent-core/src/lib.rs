pub mod console;
pub mod error;
pub mod followup;
pub mod language;
pub mod models;
pub mod navigation;
pub mod service;
pub mod snapshot;
pub mod views;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use console::Console;
pub use error::{FollowUpError, ServiceError, ServiceResult, WorkflowError};
pub use followup::{CheckinDraft, CheckinState, EnrollmentDraft, EnrollmentState, FollowUpController};
pub use language::{LanguageCode, LanguageSelector};
pub use models::{
    AnalysisRequest, ClassifiedValue, DocumentFile, LabReportAnalysis, Medicine,
    PrescriptionAnalysis, Severity,
};
pub use navigation::Page;
pub use service::{AnalysisService, ClientConfig, HttpServiceClient};
pub use snapshot::{DashboardStats, RecoverySnapshot, SnapshotBoard};
pub use views::{LabReportView, PrescriptionView, RenderView};
pub use workflow::{
    DocumentKind, DocumentWorkflow, LabReport, LabReportWorkflow, Prescription,
    PrescriptionWorkflow, Resettable, WorkflowState,
};
