//! Route → page mapping for the console chrome.

use crate::language::LanguageCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    LabReport,
    Prescription,
    FollowUp,
    Alerts,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::LabReport,
        Page::Prescription,
        Page::FollowUp,
        Page::Alerts,
    ];

    /// Unknown routes land on the home page.
    pub fn from_route(route: &str) -> Self {
        let path = route.split(['?', '#']).next().unwrap_or_default();
        let first = path.trim_matches('/').split('/').next().unwrap_or_default();
        match first {
            "lab-report" | "lab" => Page::LabReport,
            "prescription" | "rx" => Page::Prescription,
            "follow-up" | "followup" => Page::FollowUp,
            "alerts" => Page::Alerts,
            _ => Page::Home,
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::LabReport => "/lab-report",
            Page::Prescription => "/prescription",
            Page::FollowUp => "/follow-up",
            Page::Alerts => "/alerts",
        }
    }

    pub fn title(self, language: LanguageCode) -> &'static str {
        use LanguageCode::*;
        match (self, language) {
            (Page::Home, En) => "Dashboard",
            (Page::Home, Te) => "డాష్‌బోర్డ్",
            (Page::Home, Hi) => "डैशबोर्ड",
            (Page::LabReport, En) => "Lab Report Intelligence",
            (Page::LabReport, Te) => "ల్యాబ్ రిపోర్ట్ విశ్లేషణ",
            (Page::LabReport, Hi) => "लैब रिपोर्ट विश्लेषण",
            (Page::Prescription, En) => "Prescription Parser",
            (Page::Prescription, Te) => "ప్రిస్క్రిప్షన్ విశ్లేషణ",
            (Page::Prescription, Hi) => "पर्चा विश्लेषण",
            (Page::FollowUp, En) => "Follow-up Agent",
            (Page::FollowUp, Te) => "ఫాలో-అప్ ఏజెంట్",
            (Page::FollowUp, Hi) => "फॉलो-अप एजेंट",
            (Page::Alerts, En) => "Alerts & Recovery",
            (Page::Alerts, Te) => "హెచ్చరికలు & కోలుకోవడం",
            (Page::Alerts, Hi) => "अलर्ट और रिकवरी",
        }
    }

    pub fn subtitle(self, language: LanguageCode) -> &'static str {
        use LanguageCode::*;
        match (self, language) {
            (Page::Home, En) => "Autonomous healthcare assistant",
            (Page::Home, Te) => "స్వయంచాలక ఆరోగ్య సహాయకుడు",
            (Page::Home, Hi) => "स्वचालित स्वास्थ्य सहायक",
            (Page::LabReport, En) => "Upload a blood test PDF and read the results in your language",
            (Page::LabReport, Te) => "రక్త పరీక్ష PDF అప్‌లోడ్ చేసి మీ భాషలో ఫలితాలు చదవండి",
            (Page::LabReport, Hi) => "ब्लड टेस्ट PDF अपलोड करें और अपनी भाषा में परिणाम पढ़ें",
            (Page::Prescription, En) => "Scan a prescription photo to list medicines and instructions",
            (Page::Prescription, Te) => "మందులు మరియు సూచనల కోసం ప్రిస్క్రిప్షన్ ఫోటో స్కాన్ చేయండి",
            (Page::Prescription, Hi) => "दवाइयों और निर्देशों के लिए पर्चे की फ़ोटो स्कैन करें",
            (Page::FollowUp, En) => "Enroll patients and send WhatsApp check-ins",
            (Page::FollowUp, Te) => "రోగులను నమోదు చేసి WhatsApp చెక్-ఇన్‌లు పంపండి",
            (Page::FollowUp, Hi) => "मरीज़ों को जोड़ें और WhatsApp चेक-इन भेजें",
            (Page::Alerts, En) => "Doctor alerts and patient recovery timeline",
            (Page::Alerts, Te) => "వైద్యుల హెచ్చరికలు మరియు రోగి కోలుకునే క్రమం",
            (Page::Alerts, Hi) => "डॉक्टर अलर्ट और मरीज़ की रिकवरी टाइमलाइन",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_round_trip_and_unknown_falls_back_home() {
        for page in Page::ALL {
            assert_eq!(Page::from_route(page.route()), page);
        }
        assert_eq!(Page::from_route("/lab-report/results?tab=2"), Page::LabReport);
        assert_eq!(Page::from_route("/settings"), Page::Home);
        assert_eq!(Page::from_route(""), Page::Home);
    }

    #[test]
    fn titles_follow_ui_language() {
        assert_eq!(Page::Alerts.title(LanguageCode::En), "Alerts & Recovery");
        assert_ne!(
            Page::Alerts.title(LanguageCode::Hi),
            Page::Alerts.title(LanguageCode::En)
        );
    }
}
