use std::sync::Arc;
use tracing::debug;

use crate::followup::FollowUpController;
use crate::language::{LanguageCode, LanguageSelector};
use crate::navigation::Page;
use crate::service::{AnalysisService, ClientConfig, HttpServiceClient};
use crate::snapshot::SnapshotBoard;
use crate::workflow::{DocumentWorkflow, LabReport, LabReportWorkflow, Prescription, PrescriptionWorkflow};

/// Everything one console session needs, wired to a single service handle.
pub struct Console {
    service: Arc<dyn AnalysisService>,
    ui_language: LanguageSelector,
    pub lab: LabReportWorkflow,
    pub prescription: PrescriptionWorkflow,
    pub followup: FollowUpController,
    pub snapshots: SnapshotBoard,
}

impl Console {
    pub fn new(service: Arc<dyn AnalysisService>, ui_language: LanguageSelector) -> Self {
        Self {
            lab: DocumentWorkflow::new(LabReport, service.clone(), &ui_language),
            prescription: DocumentWorkflow::new(Prescription, service.clone(), &ui_language),
            followup: FollowUpController::new(service.clone(), &ui_language),
            snapshots: SnapshotBoard::new(service.clone()),
            service,
            ui_language,
        }
    }

    pub fn over_http(config: ClientConfig, ui_language: LanguageCode) -> Self {
        Self::new(
            Arc::new(HttpServiceClient::new(config)),
            LanguageSelector::new(ui_language),
        )
    }

    pub fn service(&self) -> &Arc<dyn AnalysisService> {
        &self.service
    }

    pub fn ui_language(&self) -> &LanguageSelector {
        &self.ui_language
    }

    /// Changes chrome text only; workflow output languages are untouched.
    pub fn set_ui_language(&self, language: LanguageCode) -> bool {
        self.ui_language.set(language)
    }

    /// Title and subtitle for a page in the UI language.
    pub fn chrome(&self, page: Page) -> (&'static str, &'static str) {
        let language = self.ui_language.get();
        (page.title(language), page.subtitle(language))
    }

    /// Page activation hook: dashboard pages refresh their snapshots once.
    pub async fn activate(&self, page: Page) {
        debug!(?page, "Page activated");
        if matches!(page, Page::Home | Page::Alerts) {
            self.snapshots.activate().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DashboardStats;
    use crate::testing::ScriptedService;

    #[tokio::test]
    async fn ui_language_seeds_workflows_but_does_not_drive_them() {
        let console = Console::new(
            Arc::new(ScriptedService::offline()),
            LanguageSelector::new(LanguageCode::Te),
        );
        assert_eq!(console.lab.output_language(), LanguageCode::Te);
        assert_eq!(console.prescription.output_language(), LanguageCode::Te);

        console.set_ui_language(LanguageCode::Hi);
        console.lab.set_output_language(LanguageCode::En);

        assert_eq!(console.chrome(Page::LabReport).0, Page::LabReport.title(LanguageCode::Hi));
        assert_eq!(console.lab.output_language(), LanguageCode::En);
        assert_eq!(console.prescription.output_language(), LanguageCode::Te);
    }

    #[tokio::test]
    async fn dashboard_activation_degrades_silently() {
        let service = Arc::new(ScriptedService::offline());
        let console = Console::new(service.clone(), LanguageSelector::default());

        console.activate(Page::Home).await;
        assert_eq!(console.snapshots.stats(), DashboardStats::default());
        assert_eq!(service.calls("dashboard_stats"), 1);

        console.activate(Page::LabReport).await;
        assert_eq!(service.calls("dashboard_stats"), 1);
    }
}
