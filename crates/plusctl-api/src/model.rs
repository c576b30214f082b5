// Switch model identification.
//
// The admin console never announces its model through a header or API --
// the only signal is the model name appearing somewhere in the served HTML.
// Detection scans for the most specific name first so that e.g. "GS316EPP"
// is never misread as "GS316EP".

use serde::{Deserialize, Serialize};

use crate::auth::ModelFamily;

/// A supported switch model.
///
/// `Gs30xEpx` is a placeholder, not hardware: unauthenticated root pages on
/// the 30x series sometimes only serve a redirect-to-login stub that hides
/// the specific model. The placeholder behaves like any other 30x model for
/// protocol purposes.
///
/// Parsing is strict -- an unrecognized model string is a `strum::ParseError`,
/// never a silently coerced default.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
pub enum Model {
    #[strum(serialize = "GS305EP")]
    #[serde(rename = "GS305EP")]
    Gs305Ep,
    #[strum(serialize = "GS305EPP")]
    #[serde(rename = "GS305EPP")]
    Gs305Epp,
    #[strum(serialize = "GS308EP")]
    #[serde(rename = "GS308EP")]
    Gs308Ep,
    #[strum(serialize = "GS308EPP")]
    #[serde(rename = "GS308EPP")]
    Gs308Epp,
    #[strum(serialize = "GS316EP")]
    #[serde(rename = "GS316EP")]
    Gs316Ep,
    #[strum(serialize = "GS316EPP")]
    #[serde(rename = "GS316EPP")]
    Gs316Epp,
    #[strum(serialize = "GS30xEPx")]
    #[serde(rename = "GS30xEPx")]
    Gs30xEpx,
}

impl Model {
    /// The authentication family this model belongs to.
    ///
    /// Every model maps to exactly one family; the wire protocol branches
    /// on the family alone after this point.
    pub fn family(self) -> ModelFamily {
        match self {
            Self::Gs316Ep | Self::Gs316Epp => ModelFamily::Gambit,
            Self::Gs305Ep | Self::Gs305Epp | Self::Gs308Ep | Self::Gs308Epp | Self::Gs30xEpx => {
                ModelFamily::Session
            }
        }
    }

    /// Whether this is a 30x-series device (or the 30x placeholder).
    pub fn is_30x_series(self) -> bool {
        self.family() == ModelFamily::Session
    }

    /// Whether this is a 316-series device.
    pub fn is_316_series(self) -> bool {
        self.family() == ModelFamily::Gambit
    }

    /// Whether this is the generic 30x placeholder rather than a
    /// concretely identified model.
    pub fn is_placeholder(self) -> bool {
        self == Self::Gs30xEpx
    }
}

/// Model-name substrings in detection order. "...PP" variants come before
/// their "...P" prefixes; matching the short name first would misclassify
/// the PP hardware.
const DETECTION_ORDER: [(&str, Model); 6] = [
    ("GS316EPP", Model::Gs316Epp),
    ("GS316EP", Model::Gs316Ep),
    ("GS305EPP", Model::Gs305Epp),
    ("GS305EP", Model::Gs305Ep),
    ("GS308EPP", Model::Gs308Epp),
    ("GS308EP", Model::Gs308Ep),
];

/// Markers of the unauthenticated redirect-to-login stub served by 30x
/// root pages that don't name their model.
const REDIRECT_MARKERS: [&str; 2] = ["Redirect to Login", "redirect"];

/// Detect the switch model from an HTML fragment.
///
/// Returns the placeholder [`Model::Gs30xEpx`] when the fragment only
/// exhibits redirect-to-login markers, and `None` when nothing matches.
/// Callers must treat `None` as a hard detection failure, not a default --
/// see [`Error::ModelNotDetected`](crate::Error::ModelNotDetected).
pub fn detect_model(html: &str) -> Option<Model> {
    for (needle, model) in DETECTION_ORDER {
        if html.contains(needle) {
            return Some(model);
        }
    }
    if REDIRECT_MARKERS.iter().any(|marker| html.contains(marker)) {
        return Some(Model::Gs30xEpx);
    }
    None
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn specific_model_wins_over_redirect_marker() {
        let html = r#"<html><title>Redirect to Login</title><body>GS308EPP</body></html>"#;
        assert_eq!(detect_model(html), Some(Model::Gs308Epp));
    }

    #[test]
    fn pp_variant_is_not_misread_as_its_prefix() {
        assert_eq!(detect_model("model: GS316EPP rev A"), Some(Model::Gs316Epp));
        assert_eq!(detect_model("model: GS305EPP"), Some(Model::Gs305Epp));
    }

    #[test]
    fn redirect_marker_alone_yields_placeholder() {
        let html = r#"<script>window.location.href = "/redirect.html";</script>"#;
        assert_eq!(detect_model(html), Some(Model::Gs30xEpx));
        assert_eq!(detect_model("<h1>Redirect to Login</h1>"), Some(Model::Gs30xEpx));
    }

    #[test]
    fn unrelated_html_yields_nothing() {
        assert_eq!(detect_model("<html><body>hello world</body></html>"), None);
        assert_eq!(detect_model(""), None);
    }

    #[test]
    fn model_strings_round_trip() {
        for model in Model::iter() {
            let s = model.to_string();
            assert_eq!(Model::from_str(&s).ok(), Some(model), "{s}");
        }
    }

    #[test]
    fn unknown_model_string_is_rejected() {
        assert!(Model::from_str("GS108E").is_err());
        assert!(Model::from_str("gs305ep").is_err());
        assert!(Model::from_str("").is_err());
    }

    #[test]
    fn family_split_matches_series() {
        assert!(Model::Gs305Ep.is_30x_series());
        assert!(Model::Gs308Epp.is_30x_series());
        assert!(Model::Gs30xEpx.is_30x_series());
        assert!(Model::Gs316Ep.is_316_series());
        assert!(Model::Gs316Epp.is_316_series());
    }
}
