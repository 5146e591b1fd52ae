use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::warn;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl Display for PrivacyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let privacy_status = match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Private => "private",
            PrivacyStatus::Unlisted => "unlisted",
        };
        write!(f, "{}", privacy_status)
    }
}

impl PrivacyStatus {
    /// Unknown values normalize to `Public` with a warning; metadata
    /// validation must never fail a job over a privacy typo.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "public" => PrivacyStatus::Public,
            "private" => PrivacyStatus::Private,
            "unlisted" => PrivacyStatus::Unlisted,
            other => {
                warn!(privacy_status = %other, "invalid privacy status; using public");
                PrivacyStatus::Public
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_statuses_pass_through() {
        assert_eq!(PrivacyStatus::parse_lenient("public"), PrivacyStatus::Public);
        assert_eq!(PrivacyStatus::parse_lenient("private"), PrivacyStatus::Private);
        assert_eq!(
            PrivacyStatus::parse_lenient("unlisted"),
            PrivacyStatus::Unlisted
        );
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(
            PrivacyStatus::parse_lenient(" Unlisted "),
            PrivacyStatus::Unlisted
        );
        assert_eq!(PrivacyStatus::parse_lenient("PUBLIC"), PrivacyStatus::Public);
    }

    #[test]
    fn unknown_status_normalizes_to_public() {
        assert_eq!(
            PrivacyStatus::parse_lenient("friends-only"),
            PrivacyStatus::Public
        );
        assert_eq!(PrivacyStatus::parse_lenient(""), PrivacyStatus::Public);
    }
}
