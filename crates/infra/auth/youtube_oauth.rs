use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

// Treat tokens expiring within this window as already expired.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// OAuth2 credential as an explicit value: loaded by the caller, passed
/// in, never read from ambient module state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_expiry: Option<DateTime<Utc>>,
}

impl StoredCredential {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid stored credential JSON")
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.token_expiry) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(_), Some(expiry)) => expiry - Duration::seconds(EXPIRY_LEEWAY_SECS) <= now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Refresh either yields a usable token or a distinguishable
/// "re-authentication required" condition; transport problems stay
/// ordinary errors.
#[derive(Debug)]
pub enum RefreshOutcome {
    Refreshed(AccessToken),
    ReauthRequired(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Produces a valid access token for the upload session, refreshing
/// through the token endpoint when the stored one is expired. Called
/// strictly before `upload()`; the uploader never re-authenticates
/// mid-transfer.
pub async fn obtain_access_token(
    client: &Client,
    stored: &StoredCredential,
) -> Result<RefreshOutcome> {
    let now = Utc::now();
    if !stored.is_expired(now) {
        let token = stored
            .access_token
            .clone()
            .expect("is_expired guarantees a token");
        return Ok(RefreshOutcome::Refreshed(AccessToken {
            token,
            expires_at: stored.token_expiry,
        }));
    }

    let Some(refresh_token) = stored.refresh_token.as_deref() else {
        return Ok(RefreshOutcome::ReauthRequired(
            "no refresh token stored".to_string(),
        ));
    };

    info!("access token expired; refreshing");
    let response = client
        .post(TOKEN_ENDPOINT)
        .form(&[
            ("client_id", stored.client_id.as_str()),
            ("client_secret", stored.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .context("token refresh request failed")?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.is_success() {
        let parsed: TokenResponse =
            serde_json::from_str(&body).context("token endpoint returned invalid JSON")?;
        let expires_at = parsed
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        info!("access token refreshed");
        return Ok(RefreshOutcome::Refreshed(AccessToken {
            token: parsed.access_token,
            expires_at,
        }));
    }

    if let Some(reason) = classify_refresh_failure(status.as_u16(), &body) {
        return Ok(RefreshOutcome::ReauthRequired(reason));
    }

    bail!("token refresh failed with status {}: {}", status, body);
}

/// 4xx answers mentioning a dead grant mean the refresh token itself is
/// no longer valid; anything else is treated as transient.
fn classify_refresh_failure(status: u16, body: &str) -> Option<String> {
    if (400..500).contains(&status) && body.contains("invalid_grant") {
        return Some("refresh token rejected (invalid_grant)".to_string());
    }
    if status == 401 {
        return Some("client credentials rejected".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(access: Option<&str>, expiry: Option<DateTime<Utc>>) -> StoredCredential {
        StoredCredential {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: Some("refresh".to_string()),
            access_token: access.map(str::to_string),
            token_expiry: expiry,
        }
    }

    #[test]
    fn missing_token_counts_as_expired() {
        assert!(credential(None, None).is_expired(Utc::now()));
    }

    #[test]
    fn future_expiry_is_not_expired() {
        let now = Utc::now();
        let cred = credential(Some("tok"), Some(now + Duration::hours(1)));
        assert!(!cred.is_expired(now));
    }

    #[test]
    fn expiry_within_leeway_counts_as_expired() {
        let now = Utc::now();
        let cred = credential(Some("tok"), Some(now + Duration::seconds(30)));
        assert!(cred.is_expired(now));
    }

    #[test]
    fn token_without_recorded_expiry_is_trusted() {
        assert!(!credential(Some("tok"), None).is_expired(Utc::now()));
    }

    #[test]
    fn invalid_grant_requires_reauth() {
        let reason = classify_refresh_failure(400, r#"{"error": "invalid_grant"}"#);
        assert!(reason.is_some());
    }

    #[test]
    fn server_errors_are_not_reauth() {
        assert!(classify_refresh_failure(503, "upstream down").is_none());
    }

    #[test]
    fn stored_credential_parses_minimal_json() {
        let cred = StoredCredential::from_json(
            r#"{"client_id": "c", "client_secret": "s", "refresh_token": "r"}"#,
        )
        .unwrap();
        assert_eq!(cred.client_id, "c");
        assert!(cred.access_token.is_none());
        assert!(cred.is_expired(Utc::now()));
    }
}
