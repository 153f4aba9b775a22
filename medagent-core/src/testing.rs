//! In-memory [`AnalysisService`] for controller tests.
//!
//! Responses are queued per operation and handed out in order. A queued
//! response can be gated so the test decides when the call completes. Calls
//! with nothing queued fail as if the service were unreachable.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

use crate::error::{ServiceError, ServiceResult};
use crate::language::LanguageCode;
use crate::models::{
    AnalysisRequest, CheckinReceipt, CheckinRequest, EnrollmentReceipt, EnrollmentRequest,
    LabReportAnalysis, PrescriptionAnalysis,
};
use crate::service::AnalysisService;
use crate::snapshot::{
    DashboardAlert, DashboardStats, DoctorAlert, HealthStatus, RecoverySnapshot, RecoveryTimeline,
};

struct Step<T> {
    result: ServiceResult<T>,
    gate: Option<oneshot::Receiver<()>>,
}

struct Script<T> {
    queue: Mutex<VecDeque<Step<T>>>,
}

impl<T> Script<T> {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, result: ServiceResult<T>) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Step { result, gate: None });
    }

    fn push_gated(&self, result: ServiceResult<T>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.queue.lock().unwrap().push_back(Step {
            result,
            gate: Some(rx),
        });
        tx
    }

    async fn next(&self) -> ServiceResult<T> {
        let step = self.queue.lock().unwrap().pop_front();
        match step {
            Some(Step { result, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => Err(ServiceError::Network("connection refused".to_string())),
        }
    }
}

pub(crate) struct ScriptedService {
    calls: Mutex<HashMap<&'static str, usize>>,
    uploads: Mutex<Vec<(String, LanguageCode)>>,
    enrollments: Mutex<Vec<EnrollmentRequest>>,
    checkins: Mutex<Vec<CheckinRequest>>,
    lab: Script<LabReportAnalysis>,
    prescription: Script<PrescriptionAnalysis>,
    enroll: Script<EnrollmentReceipt>,
    checkin: Script<CheckinReceipt>,
    stats: Script<DashboardStats>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            uploads: Mutex::new(Vec::new()),
            enrollments: Mutex::new(Vec::new()),
            checkins: Mutex::new(Vec::new()),
            lab: Script::new(),
            prescription: Script::new(),
            enroll: Script::new(),
            checkin: Script::new(),
            stats: Script::new(),
        }
    }

    /// Nothing scripted: every call fails with a network error.
    pub fn offline() -> Self {
        Self::new()
    }

    pub fn push_lab(&self, result: ServiceResult<LabReportAnalysis>) {
        self.lab.push(result);
    }

    pub fn push_lab_gated(&self, result: ServiceResult<LabReportAnalysis>) -> oneshot::Sender<()> {
        self.lab.push_gated(result)
    }

    pub fn push_prescription(&self, result: ServiceResult<PrescriptionAnalysis>) {
        self.prescription.push(result);
    }

    pub fn push_prescription_gated(
        &self,
        result: ServiceResult<PrescriptionAnalysis>,
    ) -> oneshot::Sender<()> {
        self.prescription.push_gated(result)
    }

    pub fn push_enroll(&self, result: ServiceResult<EnrollmentReceipt>) {
        self.enroll.push(result);
    }

    pub fn push_enroll_gated(
        &self,
        result: ServiceResult<EnrollmentReceipt>,
    ) -> oneshot::Sender<()> {
        self.enroll.push_gated(result)
    }

    pub fn push_checkin(&self, result: ServiceResult<CheckinReceipt>) {
        self.checkin.push(result);
    }

    pub fn push_checkin_gated(&self, result: ServiceResult<CheckinReceipt>) -> oneshot::Sender<()> {
        self.checkin.push_gated(result)
    }

    pub fn set_dashboard_stats(&self, result: ServiceResult<DashboardStats>) {
        self.stats.push(result);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// File name and language of every document upload, in call order.
    pub fn uploads(&self) -> Vec<(String, LanguageCode)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn enrollments(&self) -> Vec<EnrollmentRequest> {
        self.enrollments.lock().unwrap().clone()
    }

    pub fn checkins(&self) -> Vec<CheckinRequest> {
        self.checkins.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
    }

    fn record_upload(&self, operation: &'static str, request: &AnalysisRequest) {
        self.record(operation);
        self.uploads
            .lock()
            .unwrap()
            .push((request.file.name.clone(), request.language));
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn analyze_lab_report(
        &self,
        request: &AnalysisRequest,
    ) -> ServiceResult<LabReportAnalysis> {
        self.record_upload("analyze_lab_report", request);
        self.lab.next().await
    }

    async fn parse_prescription(
        &self,
        request: &AnalysisRequest,
    ) -> ServiceResult<PrescriptionAnalysis> {
        self.record_upload("parse_prescription", request);
        self.prescription.next().await
    }

    async fn enroll_patient(&self, request: &EnrollmentRequest) -> ServiceResult<EnrollmentReceipt> {
        self.record("enroll_patient");
        self.enrollments.lock().unwrap().push(request.clone());
        self.enroll.next().await
    }

    async fn send_checkin(&self, request: &CheckinRequest) -> ServiceResult<CheckinReceipt> {
        self.record("send_checkin");
        self.checkins.lock().unwrap().push(request.clone());
        self.checkin.next().await
    }

    async fn dashboard_stats(&self) -> ServiceResult<DashboardStats> {
        self.record("dashboard_stats");
        self.stats.next().await
    }

    async fn dashboard_alerts(&self) -> ServiceResult<Vec<DashboardAlert>> {
        self.record("dashboard_alerts");
        Err(ServiceError::Network("connection refused".to_string()))
    }

    async fn recovery_snapshot(&self) -> ServiceResult<RecoverySnapshot> {
        self.record("recovery_snapshot");
        Err(ServiceError::Network("connection refused".to_string()))
    }

    async fn recovery_timeline(&self, _phone: &str, _days: u32) -> ServiceResult<RecoveryTimeline> {
        self.record("recovery_timeline");
        Err(ServiceError::Network("connection refused".to_string()))
    }

    async fn doctor_alerts(&self) -> ServiceResult<Vec<DoctorAlert>> {
        self.record("doctor_alerts");
        Err(ServiceError::Network("connection refused".to_string()))
    }

    async fn health(&self) -> ServiceResult<HealthStatus> {
        self.record("health");
        Err(ServiceError::Network("connection refused".to_string()))
    }
}
