//! Best-effort dashboard snapshots.
//!
//! Each snapshot starts from built-in demo figures and is refreshed once per
//! page activation. A failed refresh keeps whatever is currently shown and is
//! never reported to the user.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::lenient_string;
use crate::service::AnalysisService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub lab_count: u32,
    #[serde(default)]
    pub rx_count: u32,
    #[serde(default)]
    pub alert_count: u32,
    #[serde(default)]
    pub recovery_day: u32,
}

impl Default for DashboardStats {
    fn default() -> Self {
        Self {
            lab_count: 24,
            rx_count: 4,
            alert_count: 3,
            recovery_day: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardAlert {
    #[serde(default, alias = "patient_phone", deserialize_with = "lenient_string")]
    pub patient: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: Option<String>,
    #[serde(default, alias = "alert_message", deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default, alias = "sent_at", deserialize_with = "lenient_string")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct AlertFeed {
    #[serde(default)]
    pub alerts: Vec<DashboardAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vital {
    #[serde(default, alias = "label")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub unit: Option<String>,
    #[serde(default, alias = "trend", deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

impl Vital {
    fn demo(name: &str, value: &str, unit: &str, status: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some(value.to_string()),
            unit: Some(unit.to_string()),
            status: Some(status.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySnapshot {
    #[serde(default)]
    pub current_day: u32,
    #[serde(default)]
    pub total_days: u32,
    #[serde(default)]
    pub vitals: Vec<Vital>,
}

impl Default for RecoverySnapshot {
    fn default() -> Self {
        Self {
            current_day: 5,
            total_days: 14,
            vitals: vec![
                Vital::demo("Pain level", "3", "/10", "improving"),
                Vital::demo("Temperature", "98.6", "°F", "stable"),
                Vital::demo("Blood pressure", "124/80", "mmHg", "stable"),
            ],
        }
    }
}

/// Demo alerts shown until the service answers.
pub fn default_alerts() -> Vec<DashboardAlert> {
    let alert = |patient: &str, severity: &str, message: &str, time: &str| DashboardAlert {
        patient: Some(patient.to_string()),
        severity: Some(severity.to_string()),
        message: Some(message.to_string()),
        time: Some(time.to_string()),
    };
    vec![
        alert(
            "+91 98480 22338",
            "CRITICAL",
            "Severe chest pain reported, pain level 9/10",
            "2 min ago",
        ),
        alert(
            "+91 90000 12345",
            "HIGH",
            "Fever above 102°F for two consecutive days",
            "1 hr ago",
        ),
        alert(
            "+91 99887 76655",
            "MODERATE",
            "Missed two evening doses of Metformin",
            "3 hr ago",
        ),
    ]
}

/// One recorded day of a patient's recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryEntry {
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: Option<String>,
    #[serde(default)]
    pub pain_level: Option<f64>,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryTimeline {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub timeline: Vec<RecoveryEntry>,
}

/// Alert raised to a doctor by the follow-up agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorAlert {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub patient_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub doctor_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub alert_message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sent_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message_sid: Option<String>,
}

impl DoctorAlert {
    pub fn sent_at_time(&self) -> Option<chrono::NaiveDateTime> {
        self.sent_at
            .as_deref()
            .and_then(|s| s.parse::<chrono::NaiveDateTime>().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub missing_env_vars: Vec<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Dashboard, alert feed and recovery figures shown on page activation.
pub struct SnapshotBoard {
    service: Arc<dyn AnalysisService>,
    stats: watch::Sender<DashboardStats>,
    alerts: watch::Sender<Vec<DashboardAlert>>,
    recovery: watch::Sender<RecoverySnapshot>,
}

impl SnapshotBoard {
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self {
            service,
            stats: watch::Sender::new(DashboardStats::default()),
            alerts: watch::Sender::new(default_alerts()),
            recovery: watch::Sender::new(RecoverySnapshot::default()),
        }
    }

    /// Attempt each snapshot once. Failures are swallowed.
    pub async fn activate(&self) {
        let (stats, alerts, recovery) = tokio::join!(
            self.service.dashboard_stats(),
            self.service.dashboard_alerts(),
            self.service.recovery_snapshot(),
        );

        let mut refreshed = 0;
        match stats {
            Ok(stats) => {
                self.stats.send_replace(stats);
                refreshed += 1;
            }
            Err(e) => debug!(error = %e, "Dashboard stats unavailable, keeping current figures"),
        }
        match alerts {
            Ok(alerts) => {
                self.alerts.send_replace(alerts);
                refreshed += 1;
            }
            Err(e) => debug!(error = %e, "Alert feed unavailable, keeping current list"),
        }
        match recovery {
            Ok(recovery) => {
                self.recovery.send_replace(recovery);
                refreshed += 1;
            }
            Err(e) => debug!(error = %e, "Recovery snapshot unavailable, keeping current data"),
        }

        info!(refreshed, "Dashboard snapshots activated");
    }

    pub fn stats(&self) -> DashboardStats {
        self.stats.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<DashboardAlert> {
        self.alerts.borrow().clone()
    }

    pub fn recovery(&self) -> RecoverySnapshot {
        self.recovery.borrow().clone()
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<DashboardStats> {
        self.stats.subscribe()
    }
}
