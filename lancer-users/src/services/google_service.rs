use serde::Deserialize;
use uuid::Uuid;

use lancer_shared::clients::minio::MinioClient;
use lancer_shared::{AppError, AppResult, ErrorCode};

const TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<serde_json::Value>,
    name: Option<String>,
    picture: Option<String>,
}

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

fn oauth_error(message: impl Into<String>) -> AppError {
    AppError::new(ErrorCode::OAuthError, message)
}

impl TokenInfo {
    fn into_identity(self, expected_audience: &str) -> AppResult<GoogleIdentity> {
        if !expected_audience.is_empty() && self.aud != expected_audience {
            return Err(oauth_error("google token was issued for a different client"));
        }
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| oauth_error("invalid token: no email"))?;
        let email_verified = match self.email_verified {
            Some(serde_json::Value::Bool(b)) => b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        };
        Ok(GoogleIdentity {
            subject: self.sub,
            email: email.to_lowercase(),
            email_verified,
            name: self.name.filter(|n| !n.trim().is_empty()),
            picture: self.picture.filter(|p| !p.is_empty()),
        })
    }
}

/// Validates a Google ID token with Google's tokeninfo endpoint.
pub async fn verify_id_token(
    http: &reqwest::Client,
    credential: &str,
    expected_audience: &str,
) -> AppResult<GoogleIdentity> {
    let response = http
        .get(TOKENINFO_ENDPOINT)
        .query(&[("id_token", credential)])
        .send()
        .await
        .map_err(|e| oauth_error(format!("google token verification failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        tracing::info!(status = %status, "google rejected id token");
        return Err(oauth_error("invalid google credential"));
    }

    let info: TokenInfo = response
        .json()
        .await
        .map_err(|e| oauth_error(format!("invalid tokeninfo response: {e}")))?;
    info.into_identity(expected_audience)
}

/// First word becomes the first name, the rest the last name.
pub fn split_name(name: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(name) = name else {
        return (None, None);
    };
    let mut parts = name.split_whitespace();
    let first = parts.next().map(str::to_string);
    let rest: Vec<&str> = parts.collect();
    let last = (!rest.is_empty()).then(|| rest.join(" "));
    (first, last)
}

/// Copies a remote profile picture into object storage and returns its public URL.
pub async fn import_picture(
    http: &reqwest::Client,
    storage: &MinioClient,
    user_id: Uuid,
    url: &str,
) -> Result<String, String> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| format!("picture download failed: {e}"))?;
    if !response.status().is_success() {
        return Err(format!("picture download returned {}", response.status()));
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("picture download failed: {e}"))?;

    let key = format!("profiles/{user_id}/google.jpg");
    storage.upload(&key, bytes.to_vec(), &content_type).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(json: &str) -> TokenInfo {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_matching_audience_with_string_flag() {
        let identity = info(
            r#"{"aud":"client-1","sub":"123","email":"Jane@Example.com","email_verified":"true","name":"Jane Q Public"}"#,
        )
        .into_identity("client-1")
        .unwrap();
        assert_eq!(identity.email, "jane@example.com");
        assert!(identity.email_verified);
        assert_eq!(identity.picture, None);
    }

    #[test]
    fn rejects_foreign_audience() {
        let err = info(r#"{"aud":"other","sub":"1","email":"a@b.c"}"#)
            .into_identity("client-1")
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OAuthError));
    }

    #[test]
    fn requires_email() {
        assert!(info(r#"{"aud":"x","sub":"1"}"#).into_identity("").is_err());
    }

    #[test]
    fn unverified_by_default() {
        let identity = info(r#"{"aud":"x","sub":"1","email":"a@b.c","email_verified":false}"#)
            .into_identity("")
            .unwrap();
        assert!(!identity.email_verified);
    }

    #[test]
    fn name_splitting() {
        assert_eq!(
            split_name(Some("Jane Q Public")),
            (Some("Jane".into()), Some("Q Public".into()))
        );
        assert_eq!(split_name(Some("Cher")), (Some("Cher".into()), None));
        assert_eq!(split_name(None), (None, None));
    }
}
