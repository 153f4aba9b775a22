use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use medagent_core::service::DEFAULT_RECOVERY_DAYS;
use medagent_core::{
    CheckinDraft, CheckinState, Console, DocumentFile, EnrollmentState, LanguageCode, Page,
    WorkflowState,
};
use tracing::{info, warn};

use crate::config::ConsoleConfig;
use crate::report;

#[derive(Debug, Parser)]
#[command(name = "medagent")]
#[command(about = "Operator console for the MedAgent 360 analysis service")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConsoleConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a blood test PDF
    Lab {
        /// Path to the report
        file: PathBuf,
        /// Output language (defaults to the UI language)
        #[arg(short, long)]
        language: Option<LanguageCode>,
        /// After a successful analysis, switch to this language and re-analyze
        #[arg(long)]
        reanalyze_in: Option<LanguageCode>,
    },

    /// Read medicines from a prescription photo
    Prescription {
        /// Path to the image
        file: PathBuf,
        /// Output language (defaults to the UI language)
        #[arg(short, long)]
        language: Option<LanguageCode>,
        /// Clear the result once it has been printed
        #[arg(long)]
        reset: bool,
    },

    /// Enroll a patient for daily WhatsApp check-ins
    Enroll {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        name: String,
        #[arg(short, long)]
        language: Option<LanguageCode>,
        /// Doctor notified on critical responses
        #[arg(long, default_value = "")]
        doctor_phone: String,
    },

    /// Send a check-in message now
    Checkin {
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(short, long)]
        language: Option<LanguageCode>,
    },

    /// Show dashboard figures and recovery progress
    Dashboard,

    /// Show the alert feed and alerts sent to doctors
    Alerts,

    /// Show a patient's recovery timeline
    Recovery {
        phone: String,
        #[arg(short, long, default_value_t = DEFAULT_RECOVERY_DAYS)]
        days: u32,
    },

    /// Check service configuration
    Health,
}

/// How a command ended, for the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
}

pub async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    info!(api_url = %cli.config.api_url, ui_language = %cli.config.ui_language, "Starting console");
    let console = Console::over_http(cli.config.client_config(), cli.config.ui_language);
    execute(&console, cli.command).await
}

pub async fn execute(console: &Console, command: Command) -> anyhow::Result<Outcome> {
    match command {
        Command::Lab {
            file,
            language,
            reanalyze_in,
        } => {
            show_chrome(console, Page::LabReport);
            if let Some(language) = language {
                console.lab.set_output_language(language);
            }
            let document = read_document(&file).await?;
            let state = console.lab.analyze(document).await;
            let mut outcome = show_workflow(&state, console.lab.view());

            if let (Outcome::Completed, Some(target)) = (outcome, reanalyze_in) {
                console.lab.set_output_language(target);
                if console.lab.view().is_some_and(|view| view.language_mismatch) {
                    println!("Results were produced in another language; re-analyzing in {target}.");
                }
                let state = console.lab.reanalyze().await?;
                outcome = show_workflow(&state, console.lab.view());
            }
            Ok(outcome)
        }

        Command::Prescription {
            file,
            language,
            reset,
        } => {
            show_chrome(console, Page::Prescription);
            if let Some(language) = language {
                console.prescription.set_output_language(language);
            }
            let document = read_document(&file).await?;
            let state = console.prescription.analyze(document).await;
            let outcome = show_workflow(&state, console.prescription.view());
            if reset {
                console.prescription.reset()?;
                info!("Prescription result cleared");
            }
            Ok(outcome)
        }

        Command::Enroll {
            phone,
            name,
            language,
            doctor_phone,
        } => {
            show_chrome(console, Page::FollowUp);
            console.followup.update_draft(|draft| {
                draft.phone = phone;
                draft.name = name;
                draft.doctor_phone = doctor_phone;
                if let Some(language) = language {
                    draft.language = language;
                }
            });
            let state = console.followup.submit_enrollment().await?;
            println!("{}", report::enrollment(&state));
            Ok(match state {
                EnrollmentState::Submitted { ok: true, .. } => Outcome::Completed,
                _ => Outcome::Failed,
            })
        }

        Command::Checkin {
            phone,
            name,
            language,
        } => {
            show_chrome(console, Page::FollowUp);
            let draft = CheckinDraft {
                phone,
                name,
                language: language.unwrap_or_else(|| console.ui_language().get()),
            };
            let state = console.followup.send_checkin(&draft).await?;
            println!("{}", report::checkin(&state));
            Ok(match state {
                CheckinState::Failed { .. } => Outcome::Failed,
                _ => Outcome::Completed,
            })
        }

        Command::Dashboard => {
            show_chrome(console, Page::Home);
            console.activate(Page::Home).await;
            print!(
                "{}",
                report::dashboard(&console.snapshots.stats(), &console.snapshots.recovery())
            );
            Ok(Outcome::Completed)
        }

        Command::Alerts => {
            show_chrome(console, Page::Alerts);
            console.activate(Page::Alerts).await;
            print!("{}", report::alert_feed(&console.snapshots.alerts()));
            println!();
            match console.service().doctor_alerts().await {
                Ok(alerts) => print!("{}", report::doctor_alerts(&alerts)),
                Err(e) => warn!(error = %e, "Doctor alert history unavailable"),
            }
            Ok(Outcome::Completed)
        }

        Command::Recovery { phone, days } => {
            show_chrome(console, Page::Alerts);
            match console.service().recovery_timeline(&phone, days).await {
                Ok(timeline) => {
                    print!("{}", report::recovery_timeline(&timeline));
                    Ok(Outcome::Completed)
                }
                Err(e) => {
                    eprintln!("{}", e.message());
                    Ok(Outcome::Failed)
                }
            }
        }

        Command::Health => match console.service().health().await {
            Ok(status) => {
                print!("{}", report::health(&status));
                Ok(Outcome::Completed)
            }
            Err(e) => {
                eprintln!("{}", e.message());
                Ok(Outcome::Failed)
            }
        },
    }
}

async fn read_document(path: &Path) -> anyhow::Result<DocumentFile> {
    DocumentFile::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn show_chrome(console: &Console, page: Page) {
    let (title, subtitle) = console.chrome(page);
    println!("{}", report::chrome(title, subtitle));
}

fn show_workflow<R, V: Display>(state: &WorkflowState<R>, view: Option<V>) -> Outcome {
    match (state, view) {
        (WorkflowState::Failed { message }, _) => {
            eprintln!("{message}");
            Outcome::Failed
        }
        (_, Some(view)) => {
            print!("{view}");
            Outcome::Completed
        }
        _ => Outcome::Completed,
    }
}
