use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;

/// Display languages supported by the console and the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    #[default]
    En,
    Te,
    Hi,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 3] = [LanguageCode::En, LanguageCode::Te, LanguageCode::Hi];

    pub fn code(self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Te => "te",
            LanguageCode::Hi => "hi",
        }
    }

    /// Long-form name the service expects in the `language` field.
    pub fn service_name(self) -> &'static str {
        match self {
            LanguageCode::En => "English",
            LanguageCode::Te => "Telugu",
            LanguageCode::Hi => "Hindi",
        }
    }

    /// Name of the language written in that language, used by the selector strip.
    pub fn native_name(self) -> &'static str {
        match self {
            LanguageCode::En => "English",
            LanguageCode::Te => "తెలుగు",
            LanguageCode::Hi => "हिन्दी",
        }
    }

    pub fn from_service_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.service_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for LanguageCode {
    type Err = UnknownLanguage;

    /// Accepts the short code (`te`) or the long-form name (`Telugu`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(trimmed))
            .or_else(|| Self::from_service_name(trimmed))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Shared, observable language setting.
///
/// Cloning yields another handle onto the same value. The console holds one
/// for the UI chrome language; every document workflow owns a separate one for
/// its output language, seeded from the UI language when the workflow is built.
#[derive(Clone, Debug)]
pub struct LanguageSelector {
    current: Arc<watch::Sender<LanguageCode>>,
}

impl LanguageSelector {
    pub fn new(initial: LanguageCode) -> Self {
        Self {
            current: Arc::new(watch::Sender::new(initial)),
        }
    }

    /// A new, independent selector starting at this selector's current value.
    pub fn fork(&self) -> Self {
        Self::new(self.get())
    }

    pub fn get(&self) -> LanguageCode {
        *self.current.borrow()
    }

    /// Returns true when the value actually changed.
    pub fn set(&self, language: LanguageCode) -> bool {
        self.current.send_if_modified(|current| {
            if *current == language {
                false
            } else {
                *current = language;
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<LanguageCode> {
        self.current.subscribe()
    }
}

impl Default for LanguageSelector {
    fn default() -> Self {
        Self::new(LanguageCode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_and_service_names() {
        assert_eq!("te".parse::<LanguageCode>().unwrap(), LanguageCode::Te);
        assert_eq!("HI".parse::<LanguageCode>().unwrap(), LanguageCode::Hi);
        assert_eq!("Telugu".parse::<LanguageCode>().unwrap(), LanguageCode::Te);
        assert_eq!(" english ".parse::<LanguageCode>().unwrap(), LanguageCode::En);
        assert!("fr".parse::<LanguageCode>().is_err());
    }

    #[test]
    fn maps_to_service_names() {
        let names: Vec<_> = LanguageCode::ALL.iter().map(|l| l.service_name()).collect();
        assert_eq!(names, vec!["English", "Telugu", "Hindi"]);
    }

    #[test]
    fn forked_selector_diverges_from_its_origin() {
        let ui = LanguageSelector::new(LanguageCode::Te);
        let output = ui.fork();
        assert_eq!(output.get(), LanguageCode::Te);

        output.set(LanguageCode::Hi);
        assert_eq!(output.get(), LanguageCode::Hi);
        assert_eq!(ui.get(), LanguageCode::Te);

        // clones share state, forks do not
        let ui_handle = ui.clone();
        ui_handle.set(LanguageCode::En);
        assert_eq!(ui.get(), LanguageCode::En);
        assert_eq!(output.get(), LanguageCode::Hi);
    }

    #[tokio::test]
    async fn subscribers_see_changes_but_not_no_op_sets() {
        let selector = LanguageSelector::default();
        let mut rx = selector.subscribe();
        assert!(!selector.set(LanguageCode::En));
        assert!(!rx.has_changed().unwrap());

        assert!(selector.set(LanguageCode::Te));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), LanguageCode::Te);
    }
}
