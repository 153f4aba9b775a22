//! Plain-text rendering for the dashboard and follow-up screens.

use medagent_core::snapshot::{
    DashboardAlert, DashboardStats, DoctorAlert, HealthStatus, RecoverySnapshot, RecoveryTimeline,
};
use medagent_core::{CheckinState, EnrollmentState};

pub fn chrome(title: &str, subtitle: &str) -> String {
    format!("== {title} ==\n{subtitle}\n")
}

pub fn dashboard(stats: &DashboardStats, recovery: &RecoverySnapshot) -> String {
    let vitals: String = recovery
        .vitals
        .iter()
        .map(|vital| {
            format!(
                "  {}: {}{} ({})\n",
                vital.name,
                vital.value.as_deref().unwrap_or("-"),
                vital.unit.as_deref().unwrap_or_default(),
                vital.status.as_deref().unwrap_or("n/a"),
            )
        })
        .collect();

    format!(
        "Lab reports analyzed:   {}\n\
         Prescriptions parsed:   {}\n\
         Active alerts:          {}\n\
         Recovery day:           {}\n\
         \n\
         Recovery progress: day {} of {}\n\
         {vitals}",
        stats.lab_count,
        stats.rx_count,
        stats.alert_count,
        stats.recovery_day,
        recovery.current_day,
        recovery.total_days,
    )
}

pub fn alert_feed(alerts: &[DashboardAlert]) -> String {
    if alerts.is_empty() {
        return "No active alerts.\n".to_string();
    }
    alerts
        .iter()
        .map(|alert| {
            format!(
                "[{:<8}] {} | {} | {}\n",
                alert.severity.as_deref().unwrap_or("INFO"),
                alert.patient.as_deref().unwrap_or("unknown patient"),
                alert.message.as_deref().unwrap_or_default(),
                alert.time.as_deref().unwrap_or_default(),
            )
        })
        .collect()
}

pub fn doctor_alerts(alerts: &[DoctorAlert]) -> String {
    if alerts.is_empty() {
        return "No doctor alerts sent.\n".to_string();
    }
    alerts
        .iter()
        .map(|alert| {
            let sent = alert
                .sent_at_time()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .or_else(|| alert.sent_at.clone())
                .unwrap_or_default();
            format!(
                "{sent} [{}] {} -> {}: {}\n",
                alert.severity.as_deref().unwrap_or("-"),
                alert.patient_phone.as_deref().unwrap_or("-"),
                alert.doctor_phone.as_deref().unwrap_or("-"),
                alert.alert_message.as_deref().unwrap_or_default(),
            )
        })
        .collect()
}

pub fn recovery_timeline(timeline: &RecoveryTimeline) -> String {
    let mut out = format!("Recovery timeline for {}\n", timeline.phone);
    if timeline.timeline.is_empty() {
        out.push_str("  No check-in responses recorded yet.\n");
        return out;
    }
    for entry in &timeline.timeline {
        let pain = entry
            .pain_level
            .map(|p| format!("{p:.0}/10"))
            .unwrap_or_else(|| "-".to_string());
        let symptoms = if entry.symptoms.is_empty() {
            "none".to_string()
        } else {
            entry.symptoms.join(", ")
        };
        out.push_str(&format!(
            "  {} severity={} pain={pain} symptoms={symptoms}\n",
            entry.date,
            entry.severity.as_deref().unwrap_or("-"),
        ));
    }
    out
}

pub fn health(status: &HealthStatus) -> String {
    if status.missing_env_vars.is_empty() {
        format!("Service status: {}\n", status.status)
    } else {
        format!(
            "Service status: {} (missing: {})\n",
            status.status,
            status.missing_env_vars.join(", ")
        )
    }
}

pub fn checkin(state: &CheckinState) -> String {
    state.message().unwrap_or_else(|| "No check-in sent.".to_string())
}

pub fn enrollment(state: &EnrollmentState) -> String {
    match state {
        EnrollmentState::Idle => "Not submitted.".to_string(),
        EnrollmentState::Submitted { message, .. } => message.clone(),
    }
}
