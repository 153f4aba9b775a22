//! Follow-up controls: manual check-in trigger and patient enrollment.
//!
//! The two sub-flows share nothing but the service handle; each has its own
//! state cell and its own in-flight guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{FollowUpError, GENERIC_FAILURE_MESSAGE};
use crate::language::{LanguageCode, LanguageSelector};
use crate::models::{CheckinRequest, EnrollmentRequest};
use crate::service::AnalysisService;

pub const DEFAULT_PATIENT_NAME: &str = "Patient";
pub const DEMO_MODE_MESSAGE: &str =
    "Check-in accepted in demo mode: messaging is not configured, no confirmation id was issued.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckinState {
    Idle,
    Pending,
    Sent { confirmation_id: Option<String> },
    Failed { message: String },
}

impl CheckinState {
    /// Success without a provider confirmation.
    pub fn is_demo_mode(&self) -> bool {
        matches!(
            self,
            CheckinState::Sent {
                confirmation_id: None
            }
        )
    }

    /// Text shown under the trigger, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            CheckinState::Idle | CheckinState::Pending => None,
            CheckinState::Sent {
                confirmation_id: Some(id),
            } => Some(format!("Check-in sent! SID: {id}")),
            CheckinState::Sent {
                confirmation_id: None,
            } => Some(DEMO_MODE_MESSAGE.to_string()),
            CheckinState::Failed { message } => Some(message.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentState {
    Idle,
    Submitted { ok: bool, message: String },
}

/// Manual check-in form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckinDraft {
    pub phone: String,
    pub name: String,
    pub language: LanguageCode,
}

impl CheckinDraft {
    fn validate(&self) -> Result<CheckinRequest, FollowUpError> {
        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(FollowUpError::MissingPhone);
        }
        let name = match self.name.trim() {
            "" => DEFAULT_PATIENT_NAME,
            name => name,
        };
        Ok(CheckinRequest {
            phone: phone.to_string(),
            name: name.to_string(),
            language: self.language,
        })
    }
}

/// Enrollment form fields as typed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentDraft {
    pub phone: String,
    pub name: String,
    pub language: LanguageCode,
    pub doctor_phone: String,
}

impl EnrollmentDraft {
    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate(&self) -> Result<EnrollmentRequest, FollowUpError> {
        let phone = self.phone.trim();
        let name = self.name.trim();
        if phone.is_empty() {
            return Err(FollowUpError::MissingPhone);
        }
        if name.is_empty() {
            return Err(FollowUpError::MissingName);
        }
        Ok(EnrollmentRequest {
            phone: phone.to_string(),
            name: name.to_string(),
            language: self.language,
            doctor_phone: self.doctor_phone.trim().to_string(),
        })
    }
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the `Pending` check-in state until an outcome is stored. Dropped
/// without one, the trigger goes back to `Idle` so it can be retried.
struct PendingCheckin<'a> {
    cell: &'a watch::Sender<CheckinState>,
    settled: bool,
}

impl<'a> PendingCheckin<'a> {
    fn start(cell: &'a watch::Sender<CheckinState>) -> Option<Self> {
        let started = cell.send_if_modified(|state| {
            if matches!(state, CheckinState::Pending) {
                false
            } else {
                *state = CheckinState::Pending;
                true
            }
        });
        started.then_some(PendingCheckin {
            cell,
            settled: false,
        })
    }

    fn settle(mut self, next: CheckinState) {
        self.cell.send_replace(next);
        self.settled = true;
    }
}

impl Drop for PendingCheckin<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Check-in abandoned before completion, trigger re-enabled");
            self.cell.send_replace(CheckinState::Idle);
        }
    }
}

pub struct FollowUpController {
    service: Arc<dyn AnalysisService>,
    checkin: watch::Sender<CheckinState>,
    enrollment: watch::Sender<EnrollmentState>,
    draft: Mutex<EnrollmentDraft>,
    enrolling: AtomicBool,
}

impl FollowUpController {
    /// Form language defaults to the UI language at construction.
    pub fn new(service: Arc<dyn AnalysisService>, ui_language: &LanguageSelector) -> Self {
        Self {
            service,
            checkin: watch::Sender::new(CheckinState::Idle),
            enrollment: watch::Sender::new(EnrollmentState::Idle),
            draft: Mutex::new(EnrollmentDraft {
                language: ui_language.get(),
                ..Default::default()
            }),
            enrolling: AtomicBool::new(false),
        }
    }

    pub fn checkin_state(&self) -> CheckinState {
        self.checkin.borrow().clone()
    }

    pub fn subscribe_checkin(&self) -> watch::Receiver<CheckinState> {
        self.checkin.subscribe()
    }

    pub fn enrollment_state(&self) -> EnrollmentState {
        self.enrollment.borrow().clone()
    }

    pub fn subscribe_enrollment(&self) -> watch::Receiver<EnrollmentState> {
        self.enrollment.subscribe()
    }

    /// Trigger a check-in message. Refused while one is already in flight.
    pub async fn send_checkin(&self, draft: &CheckinDraft) -> Result<CheckinState, FollowUpError> {
        let request = draft.validate()?;

        let pending = PendingCheckin::start(&self.checkin).ok_or(FollowUpError::AlreadyPending)?;

        info!(phone = %request.phone, language = %request.language, "Sending manual check-in");
        let next = match self.service.send_checkin(&request).await {
            Ok(receipt) => {
                if receipt.confirmation_id.is_none() {
                    info!(phone = %request.phone, "Check-in accepted without confirmation id (demo mode)");
                }
                CheckinState::Sent {
                    confirmation_id: receipt.confirmation_id,
                }
            }
            Err(e) => {
                warn!(phone = %request.phone, error = %e, "Check-in failed");
                CheckinState::Failed {
                    message: e.message(),
                }
            }
        };

        pending.settle(next.clone());
        Ok(next)
    }

    pub fn draft(&self) -> EnrollmentDraft {
        self.draft
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Edit the enrollment form in place.
    pub fn update_draft(&self, edit: impl FnOnce(&mut EnrollmentDraft)) {
        let mut draft = self.draft.lock().unwrap_or_else(PoisonError::into_inner);
        edit(&mut draft);
    }

    pub fn can_submit_enrollment(&self) -> bool {
        self.draft().can_submit() && !self.enrolling.load(Ordering::Acquire)
    }

    /// Submit the current draft. Invalid drafts are rejected before any call
    /// and leave the enrollment state untouched.
    pub async fn submit_enrollment(&self) -> Result<EnrollmentState, FollowUpError> {
        let request = self.draft().validate()?;
        let _guard = InFlight::acquire(&self.enrolling).ok_or(FollowUpError::AlreadyPending)?;

        info!(phone = %request.phone, name = %request.name, "Enrolling patient");
        let next = match self.service.enroll_patient(&request).await {
            Ok(receipt) if receipt.ok() => EnrollmentState::Submitted {
                ok: true,
                message: format!("Enrolled: {} ({})", request.name, request.phone),
            },
            Ok(receipt) => {
                let message = receipt
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                warn!(phone = %request.phone, error = %message, "Enrollment refused");
                EnrollmentState::Submitted { ok: false, message }
            }
            Err(e) => {
                warn!(phone = %request.phone, error = %e, "Enrollment failed");
                EnrollmentState::Submitted {
                    ok: false,
                    message: e.message(),
                }
            }
        };

        self.enrollment.send_replace(next.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::models::{CheckinReceipt, EnrollmentReceipt};
    use crate::testing::ScriptedService;

    fn controller(service: Arc<ScriptedService>) -> FollowUpController {
        FollowUpController::new(service, &LanguageSelector::new(LanguageCode::Te))
    }

    fn checkin_draft(phone: &str) -> CheckinDraft {
        CheckinDraft {
            phone: phone.to_string(),
            name: String::new(),
            language: LanguageCode::Hi,
        }
    }

    #[tokio::test]
    async fn checkin_with_confirmation_id() {
        let service = Arc::new(ScriptedService::new());
        service.push_checkin(Ok(CheckinReceipt {
            success: Some(true),
            confirmation_id: Some("SM42".to_string()),
            error: None,
        }));
        let followup = controller(service.clone());

        let state = followup.send_checkin(&checkin_draft("whatsapp:+919999999999")).await.unwrap();

        assert_eq!(
            state,
            CheckinState::Sent {
                confirmation_id: Some("SM42".to_string())
            }
        );
        assert_eq!(state.message().unwrap(), "Check-in sent! SID: SM42");
        let sent = &service.checkins()[0];
        assert_eq!(sent.name, DEFAULT_PATIENT_NAME);
        assert_eq!(sent.language, LanguageCode::Hi);
    }

    #[tokio::test]
    async fn checkin_without_confirmation_id_is_demo_success() {
        let service = Arc::new(ScriptedService::new());
        service.push_checkin(Ok(CheckinReceipt::default()));
        let followup = controller(service);

        let state = followup.send_checkin(&checkin_draft("+911234")).await.unwrap();

        assert!(state.is_demo_mode());
        assert_eq!(state.message().unwrap(), DEMO_MODE_MESSAGE);
        assert!(!matches!(state, CheckinState::Failed { .. }));
    }

    #[tokio::test]
    async fn checkin_rejection_message_is_exact() {
        let service = Arc::new(ScriptedService::new());
        service.push_checkin(Err(ServiceError::Rejected {
            status: 400,
            detail: "Twilio not configured".to_string(),
        }));
        let followup = controller(service);

        followup.send_checkin(&checkin_draft("+911234")).await.unwrap();

        assert_eq!(
            followup.checkin_state(),
            CheckinState::Failed {
                message: "Twilio not configured".to_string()
            }
        );
    }

    #[tokio::test]
    async fn overlapping_checkin_is_refused() {
        let service = Arc::new(ScriptedService::new());
        let release = service.push_checkin_gated(Ok(CheckinReceipt::default()));
        let followup = controller(service.clone());
        let mut states = followup.subscribe_checkin();

        let first_draft = checkin_draft("+911");
        let second_draft = checkin_draft("+912");
        let (first, _) = tokio::join!(followup.send_checkin(&first_draft), async {
            states.changed().await.unwrap();
            assert_eq!(*states.borrow_and_update(), CheckinState::Pending);
            assert_eq!(
                followup.send_checkin(&second_draft).await,
                Err(FollowUpError::AlreadyPending)
            );
            release.send(()).unwrap();
        });

        assert!(first.unwrap().is_demo_mode());
        assert_eq!(service.calls("send_checkin"), 1);
    }

    #[tokio::test]
    async fn abandoned_checkin_can_be_triggered_again() {
        let service = Arc::new(ScriptedService::new());
        let _release = service.push_checkin_gated(Ok(CheckinReceipt::default()));
        service.push_checkin(Ok(CheckinReceipt {
            success: Some(true),
            confirmation_id: Some("SM7".to_string()),
            error: None,
        }));
        let followup = controller(service.clone());
        let draft = checkin_draft("+911");

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            followup.send_checkin(&draft),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(followup.checkin_state(), CheckinState::Idle);

        let state = followup.send_checkin(&draft).await.unwrap();
        assert_eq!(
            state,
            CheckinState::Sent {
                confirmation_id: Some("SM7".to_string())
            }
        );
        assert_eq!(service.calls("send_checkin"), 2);
    }

    #[tokio::test]
    async fn checkin_requires_phone() {
        let service = Arc::new(ScriptedService::new());
        let followup = controller(service.clone());

        assert_eq!(
            followup.send_checkin(&checkin_draft("  ")).await,
            Err(FollowUpError::MissingPhone)
        );
        assert_eq!(followup.checkin_state(), CheckinState::Idle);
        assert_eq!(service.total_calls(), 0);
    }

    #[tokio::test]
    async fn enrollment_with_empty_phone_never_calls_service() {
        let service = Arc::new(ScriptedService::new());
        let followup = controller(service.clone());
        followup.update_draft(|d| d.name = "Lakshmi".to_string());

        assert!(!followup.can_submit_enrollment());
        assert_eq!(
            followup.submit_enrollment().await,
            Err(FollowUpError::MissingPhone)
        );
        assert_eq!(followup.enrollment_state(), EnrollmentState::Idle);
        assert_eq!(service.total_calls(), 0);

        followup.update_draft(|d| {
            d.phone = "+915550001".to_string();
            d.name = " ".to_string();
        });
        assert_eq!(
            followup.submit_enrollment().await,
            Err(FollowUpError::MissingName)
        );
    }

    #[tokio::test]
    async fn enrollment_reports_success_and_sends_trimmed_fields() {
        let service = Arc::new(ScriptedService::new());
        service.push_enroll(Ok(EnrollmentReceipt {
            success: true,
            error: None,
        }));
        let followup = controller(service.clone());
        assert_eq!(followup.draft().language, LanguageCode::Te);
        followup.update_draft(|d| {
            d.phone = " whatsapp:+915550001 ".to_string();
            d.name = "Lakshmi".to_string();
            d.doctor_phone = "+915550002".to_string();
        });

        let state = followup.submit_enrollment().await.unwrap();

        assert_eq!(
            state,
            EnrollmentState::Submitted {
                ok: true,
                message: "Enrolled: Lakshmi (whatsapp:+915550001)".to_string()
            }
        );
        let sent = &service.enrollments()[0];
        assert_eq!(sent.phone, "whatsapp:+915550001");
        assert_eq!(sent.language, LanguageCode::Te);
        assert_eq!(sent.doctor_phone, "+915550002");
    }

    #[tokio::test]
    async fn enrollment_failures_are_reported_not_raised() {
        let service = Arc::new(ScriptedService::new());
        service.push_enroll(Ok(EnrollmentReceipt {
            success: false,
            error: Some("database is locked".to_string()),
        }));
        let followup = controller(service.clone());
        followup.update_draft(|d| {
            d.phone = "+91".to_string();
            d.name = "Ravi".to_string();
        });

        assert_eq!(
            followup.submit_enrollment().await.unwrap(),
            EnrollmentState::Submitted {
                ok: false,
                message: "database is locked".to_string()
            }
        );

        // nothing queued: transport failure
        match followup.submit_enrollment().await.unwrap() {
            EnrollmentState::Submitted { ok, message } => {
                assert!(!ok);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_enrollment_submissions_call_once() {
        let service = Arc::new(ScriptedService::new());
        let release = service.push_enroll_gated(Ok(EnrollmentReceipt {
            success: true,
            error: None,
        }));
        let followup = controller(service.clone());
        followup.update_draft(|d| {
            d.phone = "+91".to_string();
            d.name = "Ravi".to_string();
        });

        let (first, second) = tokio::join!(followup.submit_enrollment(), async {
            let second = followup.submit_enrollment().await;
            release.send(()).unwrap();
            second
        });

        assert!(matches!(first, Ok(EnrollmentState::Submitted { ok: true, .. })));
        assert_eq!(second, Err(FollowUpError::AlreadyPending));
        assert_eq!(service.calls("enroll_patient"), 1);
        assert!(followup.can_submit_enrollment());
    }
}
