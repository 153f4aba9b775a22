//! Per-document analysis workflow: upload → pending → succeeded/failed → re-analyze.
//!
//! One [`DocumentWorkflow`] exists per document type. Each `analyze` call is a
//! single step: mark the workflow pending, issue one request, store the outcome.
//! Only the most recently started request may store its outcome; a response that
//! arrives after a newer request has started is dropped.

use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ServiceResult, WorkflowError};
use crate::language::{LanguageCode, LanguageSelector};
use crate::models::{AnalysisRequest, DocumentFile, LabReportAnalysis, PrescriptionAnalysis};
use crate::service::AnalysisService;
use crate::views::RenderView;

/// A document type: which endpoint analyzes it and what comes back.
#[async_trait]
pub trait DocumentKind: Send + Sync + 'static {
    type Result: Clone + fmt::Debug + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    async fn analyze(
        &self,
        service: &dyn AnalysisService,
        request: &AnalysisRequest,
    ) -> ServiceResult<Self::Result>;
}

/// Document kinds whose workflow can be sent back to `Idle` ("upload another").
pub trait Resettable: DocumentKind {}

#[derive(Debug, Clone, Copy, Default)]
pub struct LabReport;

#[async_trait]
impl DocumentKind for LabReport {
    type Result = LabReportAnalysis;

    fn name(&self) -> &'static str {
        "lab_report"
    }

    async fn analyze(
        &self,
        service: &dyn AnalysisService,
        request: &AnalysisRequest,
    ) -> ServiceResult<LabReportAnalysis> {
        service.analyze_lab_report(request).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Prescription;

#[async_trait]
impl DocumentKind for Prescription {
    type Result = PrescriptionAnalysis;

    fn name(&self) -> &'static str {
        "prescription"
    }

    async fn analyze(
        &self,
        service: &dyn AnalysisService,
        request: &AnalysisRequest,
    ) -> ServiceResult<PrescriptionAnalysis> {
        service.parse_prescription(request).await
    }
}

impl Resettable for Prescription {}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState<R> {
    Idle,
    Pending {
        file_name: String,
    },
    Succeeded {
        result: R,
        /// Kept so the same document can be re-analyzed.
        file: DocumentFile,
        /// Language the result was requested in.
        language: LanguageCode,
    },
    Failed {
        message: String,
    },
}

impl<R> WorkflowState<R> {
    pub fn is_pending(&self) -> bool {
        matches!(self, WorkflowState::Pending { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Pending { .. } => "pending",
            WorkflowState::Succeeded { .. } => "succeeded",
            WorkflowState::Failed { .. } => "failed",
        }
    }
}

pub struct DocumentWorkflow<K: DocumentKind> {
    kind: K,
    service: Arc<dyn AnalysisService>,
    output_language: LanguageSelector,
    state: watch::Sender<WorkflowState<K::Result>>,
    /// Number of requests started so far; the newest one owns the state cell.
    latest_request: Mutex<u64>,
}

pub type LabReportWorkflow = DocumentWorkflow<LabReport>;
pub type PrescriptionWorkflow = DocumentWorkflow<Prescription>;

impl<K: DocumentKind> DocumentWorkflow<K> {
    /// The output language starts at the UI language's current value and is
    /// independent from then on.
    pub fn new(kind: K, service: Arc<dyn AnalysisService>, ui_language: &LanguageSelector) -> Self {
        Self {
            kind,
            service,
            output_language: ui_language.fork(),
            state: watch::Sender::new(WorkflowState::Idle),
            latest_request: Mutex::new(0),
        }
    }

    pub fn state(&self) -> WorkflowState<K::Result> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState<K::Result>> {
        self.state.subscribe()
    }

    /// Upload controls are only offered while nothing is in flight.
    pub fn upload_enabled(&self) -> bool {
        !self.state.borrow().is_pending()
    }

    pub fn output_language(&self) -> LanguageCode {
        self.output_language.get()
    }

    pub fn output_language_selector(&self) -> &LanguageSelector {
        &self.output_language
    }

    /// Switch the language results are displayed in. Never contacts the service.
    pub fn set_output_language(&self, language: LanguageCode) -> bool {
        let changed = self.output_language.set(language);
        if changed {
            debug!(kind = self.kind.name(), language = %language, "Output language changed");
        }
        changed
    }

    /// Analyze a newly selected file in the current output language.
    pub async fn analyze(&self, file: DocumentFile) -> WorkflowState<K::Result> {
        self.run(file).await
    }

    /// Re-send the previously analyzed file in the *current* output language.
    pub async fn reanalyze(&self) -> Result<WorkflowState<K::Result>, WorkflowError> {
        let file = match &*self.state.borrow() {
            WorkflowState::Succeeded { file, .. } => file.clone(),
            _ => return Err(WorkflowError::NothingToReanalyze),
        };
        Ok(self.run(file).await)
    }

    /// Rendered result for the current output language, if there is one.
    pub fn view(&self) -> Option<<K::Result as RenderView>::View>
    where
        K::Result: RenderView,
    {
        match &*self.state.borrow() {
            WorkflowState::Succeeded {
                result, language, ..
            } => Some(result.render(*language, self.output_language.get())),
            _ => None,
        }
    }

    async fn run(&self, file: DocumentFile) -> WorkflowState<K::Result> {
        let language = self.output_language.get();
        let request = AnalysisRequest::new(file, language);

        let (ticket, previous) = {
            let mut latest = self.lock_latest();
            *latest += 1;
            let previous = self.state.send_replace(WorkflowState::Pending {
                file_name: request.file.name.clone(),
            });
            (*latest, previous)
        };
        let pending = PendingRun {
            workflow: self,
            ticket,
            previous: Some(previous),
        };

        info!(
            kind = self.kind.name(),
            request_id = %request.id,
            ticket,
            file = %request.file.name,
            language = %language,
            "Analysis started"
        );

        let next = match self.kind.analyze(self.service.as_ref(), &request).await {
            Ok(result) => WorkflowState::Succeeded {
                result,
                file: request.file,
                language,
            },
            Err(e) => {
                warn!(kind = self.kind.name(), ticket, error = %e, "Analysis failed");
                WorkflowState::Failed {
                    message: e.message(),
                }
            }
        };

        pending.finish(next);
        self.state()
    }

    fn lock_latest(&self) -> MutexGuard<'_, u64> {
        self.latest_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds a started request's claim on the state cell. `finish` stores the
/// outcome if the request is still the newest; dropping it unfinished puts
/// back whatever was shown before, unless a newer request has taken over.
struct PendingRun<'a, K: DocumentKind> {
    workflow: &'a DocumentWorkflow<K>,
    ticket: u64,
    previous: Option<WorkflowState<K::Result>>,
}

impl<K: DocumentKind> PendingRun<'_, K> {
    fn finish(mut self, next: WorkflowState<K::Result>) {
        self.previous = None;
        let workflow = self.workflow;
        let latest = workflow.lock_latest();
        if *latest == self.ticket {
            info!(
                kind = workflow.kind.name(),
                ticket = self.ticket,
                outcome = next.label(),
                "Analysis finished"
            );
            workflow.state.send_replace(next);
        } else {
            debug!(
                kind = workflow.kind.name(),
                ticket = self.ticket,
                latest = *latest,
                "Discarding response superseded by a newer request"
            );
        }
    }
}

impl<K: DocumentKind> Drop for PendingRun<'_, K> {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        let workflow = self.workflow;
        let latest = workflow.lock_latest();
        if *latest != self.ticket {
            return;
        }
        // an older request's Pending would never be cleared
        let restored = if previous.is_pending() {
            WorkflowState::Idle
        } else {
            previous
        };
        debug!(
            kind = workflow.kind.name(),
            ticket = self.ticket,
            restored = restored.label(),
            "Analysis abandoned before completion"
        );
        workflow.state.send_replace(restored);
    }
}

impl<K: Resettable> DocumentWorkflow<K> {
    /// Back to `Idle` from `Succeeded` or `Failed`.
    pub fn reset(&self) -> Result<(), WorkflowError> {
        let _latest = self.lock_latest();
        if self.state.borrow().is_pending() {
            return Err(WorkflowError::ResetWhilePending);
        }
        self.state.send_replace(WorkflowState::Idle);
        debug!(kind = self.kind.name(), "Workflow reset");
        Ok(())
    }
}
