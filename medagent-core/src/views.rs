//! Display models for analysis results.
//!
//! Views are rebuilt from a stored result and the current output language.
//! Labels follow the output language; service-generated text is shown as
//! returned and tagged with the language it was generated in.

use std::fmt;

use crate::language::LanguageCode;
use crate::models::{LabReportAnalysis, Medicine, PrescriptionAnalysis, Severity};

const MISSING: &str = "—";

/// Fixed UI strings of the result panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    TestResults,
    AiSummary,
    TotalTests,
    Normal,
    Abnormal,
    Patient,
    Age,
    Date,
    CriticalBanner,
    NoValuesDetected,
    MedicinesFound,
    OcrConfidence,
    Frequency,
    Timing,
    Duration,
    Notes,
    SeverityNormal,
    SeverityHigh,
    SeverityCritical,
}

impl Label {
    pub fn text(self, language: LanguageCode) -> &'static str {
        use LanguageCode::*;
        use Label::*;
        match (self, language) {
            (TestResults, En) => "Test Results",
            (TestResults, Te) => "పరీక్ష ఫలితాలు",
            (TestResults, Hi) => "जाँच परिणाम",
            (AiSummary, En) => "AI Summary",
            (AiSummary, Te) => "AI సారాంశం",
            (AiSummary, Hi) => "AI सारांश",
            (TotalTests, En) => "Total Tests",
            (TotalTests, Te) => "మొత్తం పరీక్షలు",
            (TotalTests, Hi) => "कुल जाँचें",
            (Normal, En) => "Normal",
            (Normal, Te) => "సాధారణం",
            (Normal, Hi) => "सामान्य",
            (Abnormal, En) => "Abnormal",
            (Abnormal, Te) => "అసాధారణం",
            (Abnormal, Hi) => "असामान्य",
            (Patient, En) => "Patient",
            (Patient, Te) => "రోగి",
            (Patient, Hi) => "मरीज़",
            (Age, En) => "Age",
            (Age, Te) => "వయస్సు",
            (Age, Hi) => "उम्र",
            (Date, En) => "Date",
            (Date, Te) => "తేదీ",
            (Date, Hi) => "तारीख",
            (CriticalBanner, En) => "CRITICAL values detected, please see a doctor immediately",
            (CriticalBanner, Te) => "ప్రమాదకర విలువలు గుర్తించబడ్డాయి, వెంటనే వైద్యుడిని సంప్రదించండి",
            (CriticalBanner, Hi) => "गंभीर मान पाए गए, कृपया तुरंत डॉक्टर से मिलें",
            (NoValuesDetected, En) => "No tabular lab values were detected in this document",
            (NoValuesDetected, Te) => "ఈ పత్రంలో ల్యాబ్ విలువలు కనుగొనబడలేదు",
            (NoValuesDetected, Hi) => "इस दस्तावेज़ में कोई लैब मान नहीं मिला",
            (MedicinesFound, En) => "Medicines Found",
            (MedicinesFound, Te) => "కనుగొన్న మందులు",
            (MedicinesFound, Hi) => "मिली दवाइयाँ",
            (OcrConfidence, En) => "OCR confidence",
            (OcrConfidence, Te) => "OCR నమ్మకం",
            (OcrConfidence, Hi) => "OCR विश्वसनीयता",
            (Frequency, En) => "Frequency",
            (Frequency, Te) => "ఎన్నిసార్లు",
            (Frequency, Hi) => "कितनी बार",
            (Timing, En) => "Timing",
            (Timing, Te) => "సమయం",
            (Timing, Hi) => "समय",
            (Duration, En) => "Duration",
            (Duration, Te) => "వ్యవధి",
            (Duration, Hi) => "अवधि",
            (Notes, En) => "Notes",
            (Notes, Te) => "గమనికలు",
            (Notes, Hi) => "टिप्पणी",
            (SeverityNormal, En) => "Normal",
            (SeverityNormal, Te) => "సాధారణం",
            (SeverityNormal, Hi) => "सामान्य",
            (SeverityHigh, En) => "Out of range",
            (SeverityHigh, Te) => "పరిధి దాటింది",
            (SeverityHigh, Hi) => "सीमा से बाहर",
            (SeverityCritical, En) => "Critical",
            (SeverityCritical, Te) => "ప్రమాదకరం",
            (SeverityCritical, Hi) => "गंभीर",
        }
    }
}

pub fn severity_label(severity: Severity, language: LanguageCode) -> &'static str {
    match severity {
        Severity::Normal => Label::SeverityNormal.text(language),
        Severity::High => Label::SeverityHigh.text(language),
        Severity::Critical => Label::SeverityCritical.text(language),
    }
}

/// Build a display model from a stored result.
pub trait RenderView {
    type View;

    /// `analyzed_in` is the language the result was requested in; `output` is
    /// the language currently selected for display.
    fn render(&self, analyzed_in: LanguageCode, output: LanguageCode) -> Self::View;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabRow {
    pub test: String,
    pub value: String,
    pub unit: String,
    pub range: Option<String>,
    pub severity: Severity,
    pub severity_label: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabReportView {
    pub output_language: LanguageCode,
    pub analyzed_in: LanguageCode,
    /// Output language differs from the content language; re-analyze to match.
    pub language_mismatch: bool,
    pub patient_line: Option<String>,
    pub stats_line: String,
    pub results_heading: &'static str,
    pub rows: Vec<LabRow>,
    pub empty_notice: Option<&'static str>,
    pub summary_heading: String,
    pub summary: Option<String>,
    pub critical_banner: Option<String>,
}

impl RenderView for LabReportAnalysis {
    type View = LabReportView;

    fn render(&self, analyzed_in: LanguageCode, output: LanguageCode) -> LabReportView {
        let patient_line = self.patient_info.as_ref().map(|info| {
            format!(
                "{}: {} | {}: {} | {}: {}",
                Label::Patient.text(output),
                info.name.as_deref().unwrap_or(MISSING),
                Label::Age.text(output),
                info.age.as_deref().unwrap_or(MISSING),
                Label::Date.text(output),
                info.date.as_deref().unwrap_or(MISSING),
            )
        });

        let stats = &self.summary_stats;
        let stats_line = format!(
            "{}: {} | {}: {} | {}: {}",
            Label::TotalTests.text(output),
            stats.total,
            Label::Normal.text(output),
            stats.normal,
            Label::Abnormal.text(output),
            stats.abnormal,
        );

        let rows: Vec<LabRow> = self
            .classified_values
            .iter()
            .map(|value| {
                let severity = value.severity();
                LabRow {
                    test: value.test.clone(),
                    value: value
                        .value
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| MISSING.to_string()),
                    unit: value.unit.clone().unwrap_or_default(),
                    range: match (value.benchmark_min, value.benchmark_max) {
                        (Some(min), Some(max)) => Some(format!("{min}–{max}")),
                        _ => None,
                    },
                    severity,
                    severity_label: severity_label(severity, output),
                }
            })
            .collect();

        let critical_banner = (!self.critical_flags.is_empty()).then(|| {
            let flags: Vec<&str> = self.critical_flags.iter().map(String::as_str).collect();
            format!("{}: {}", Label::CriticalBanner.text(output), flags.join(", "))
        });

        LabReportView {
            output_language: output,
            analyzed_in,
            language_mismatch: analyzed_in != output,
            patient_line,
            stats_line,
            results_heading: Label::TestResults.text(output),
            empty_notice: rows
                .is_empty()
                .then(|| Label::NoValuesDetected.text(output)),
            rows,
            summary_heading: format!(
                "{} ({})",
                Label::AiSummary.text(output),
                analyzed_in.native_name()
            ),
            summary: self.narrative_summary.clone(),
            critical_banner,
        }
    }
}

impl fmt::Display for LabReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(patient) = &self.patient_line {
            writeln!(f, "{patient}")?;
        }
        writeln!(f, "{}", self.stats_line)?;
        writeln!(f)?;
        writeln!(f, "{}", self.results_heading)?;
        if let Some(notice) = self.empty_notice {
            writeln!(f, "  {notice}")?;
        }
        for row in &self.rows {
            write!(f, "  [{:<8}] {}: {} {}", row.severity.as_str(), row.test, row.value, row.unit)?;
            if let Some(range) = &row.range {
                write!(f, " ({range})")?;
            }
            writeln!(f, "  {}", row.severity_label)?;
        }
        if let Some(summary) = &self.summary {
            writeln!(f)?;
            writeln!(f, "{}", self.summary_heading)?;
            writeln!(f, "{summary}")?;
        }
        if let Some(banner) = &self.critical_banner {
            writeln!(f)?;
            writeln!(f, "!! {banner}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedicineCard {
    pub title: String,
    pub fields: Vec<(&'static str, String)>,
    pub notes: Option<String>,
    /// Translated instruction with the language it is written in.
    pub translated: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrescriptionView {
    pub output_language: LanguageCode,
    pub analyzed_in: LanguageCode,
    pub language_mismatch: bool,
    pub header: String,
    pub cards: Vec<MedicineCard>,
    pub extracted_text: Option<String>,
}

fn or_missing(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| MISSING.to_string())
}

fn medicine_card(medicine: &Medicine, analyzed_in: LanguageCode, output: LanguageCode) -> MedicineCard {
    let name = if medicine.medicine_name.trim().is_empty() {
        "Medicine"
    } else {
        medicine.medicine_name.as_str()
    };
    let tag = medicine
        .language
        .as_deref()
        .and_then(LanguageCode::from_service_name)
        .unwrap_or(analyzed_in);

    MedicineCard {
        title: format!("{} ({})", name, or_missing(&medicine.dosage)),
        fields: vec![
            (Label::Frequency.text(output), or_missing(&medicine.frequency)),
            (Label::Timing.text(output), or_missing(&medicine.timing)),
            (Label::Duration.text(output), or_missing(&medicine.duration)),
        ],
        notes: medicine.special_notes.clone(),
        translated: medicine
            .translated_instruction
            .clone()
            .map(|text| (tag.native_name().to_string(), text)),
    }
}

impl RenderView for PrescriptionAnalysis {
    type View = PrescriptionView;

    fn render(&self, analyzed_in: LanguageCode, output: LanguageCode) -> PrescriptionView {
        let count = self.medicine_count.unwrap_or(self.medicines.len() as u32);
        let confidence = self
            .extraction_confidence
            .map(|c| format!("{:.1}%", c.clamp(0.0, 100.0)))
            .unwrap_or_else(|| MISSING.to_string());

        PrescriptionView {
            output_language: output,
            analyzed_in,
            language_mismatch: analyzed_in != output,
            header: format!(
                "{}: {} | {}: {}",
                Label::MedicinesFound.text(output),
                count,
                Label::OcrConfidence.text(output),
                confidence
            ),
            cards: self
                .medicines
                .iter()
                .map(|m| medicine_card(m, analyzed_in, output))
                .collect(),
            extracted_text: self.extracted_text.clone(),
        }
    }
}

impl fmt::Display for PrescriptionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for card in &self.cards {
            writeln!(f)?;
            writeln!(f, "* {}", card.title)?;
            for (label, value) in &card.fields {
                writeln!(f, "    {label}: {value}")?;
            }
            if let Some(notes) = &card.notes {
                writeln!(f, "    {}: {notes}", Label::Notes.text(self.output_language))?;
            }
            if let Some((tag, text)) = &card.translated {
                writeln!(f, "    {tag}: {text}")?;
            }
        }
        Ok(())
    }
}
