//! Google Sheets REST v4 backend.
//!
//! Authentication uses the OAuth2 JWT bearer grant: a claim set signed with
//! the service account's RSA key is exchanged for a short-lived access token.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};

use crate::sync::credentials::ServiceAccountKey;
use crate::sync::sheets::{SheetsBackend, SheetsSession};
use crate::sync::types::{SheetsError, SheetsResult};

/// Default API endpoint.
pub const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Google Sheets backend over HTTPS.
#[derive(Debug, Clone)]
pub struct GoogleSheets {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleSheets {
    /// Create a backend whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> SheetsResult<Self> {
        Self::with_endpoint(SHEETS_ENDPOINT, timeout)
    }

    /// Create a backend against a custom endpoint.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> SheetsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SheetsError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Build the signed assertion for the token grant.
fn signed_assertion(key: &ServiceAccountKey, now: i64) -> SheetsResult<String> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SHEETS_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid.clone_from(&key.private_key_id);

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SheetsError::InvalidCredentials(format!("private_key: {e}")))?;

    encode(&header, &claims, &signing_key).map_err(|e| SheetsError::Auth(e.to_string()))
}

/// Turn a non-success response into `Api { status, body }`.
async fn check_status(response: Response) -> SheetsResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SheetsError::Api {
        status: status.as_u16(),
        body,
    })
}

impl SheetsBackend for GoogleSheets {
    type Session = GoogleSession;

    async fn authenticate(&self, key: &ServiceAccountKey) -> SheetsResult<GoogleSession> {
        let assertion = signed_assertion(key, Utc::now().timestamp())?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!("token grant rejected ({status}): {body}")));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(client_email = %key.client_email, "Obtained Sheets access token");

        Ok(GoogleSession {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            token: token.access_token,
        })
    }
}

/// An access token bound to an HTTP client.
pub struct GoogleSession {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<String>],
}

impl GoogleSession {
    /// `{endpoint}/v4/spreadsheets/{id}` followed by extra path segments.
    fn url(&self, spreadsheet_id: &str, extra: &[&str]) -> SheetsResult<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| SheetsError::Transport(format!("bad endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| SheetsError::Transport("endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id])
            .extend(extra);
        Ok(url)
    }
}

impl SheetsSession for GoogleSession {
    async fn list_tabs(&self, spreadsheet_id: &str) -> SheetsResult<Vec<String>> {
        let mut url = self.url(spreadsheet_id, &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self.client.get(url).bearer_auth(&self.token).send().await?;
        let meta: SpreadsheetMeta = check_status(response).await?.json().await?;

        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn clear_range(&self, spreadsheet_id: &str, range: &str) -> SheetsResult<()> {
        let url = self.url(spreadsheet_id, &["values", &format!("{range}:clear")])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn write_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
        interpret_types: bool,
    ) -> SheetsResult<()> {
        let mut url = self.url(spreadsheet_id, &["values", range])?;
        let input_option = if interpret_types { "USER_ENTERED" } else { "RAW" };
        url.query_pairs_mut()
            .append_pair("valueInputOption", input_option);

        let body = ValueRange {
            range,
            major_dimension: "ROWS",
            values,
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(endpoint: &str) -> GoogleSession {
        GoogleSession {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            token: "t".to_string(),
        }
    }

    #[test]
    fn test_url_encodes_ranges() {
        let s = session("https://sheets.googleapis.com");
        let url = s.url("abc123", &["values", "'Q1 Leads'!A1"]).unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc123/values/"));
        assert!(url.as_str().contains("Q1%20Leads"));

        let url = s.url("abc123", &["values", "'Sheet1'!A:H:clear"]).unwrap();
        assert!(url.path().ends_with("/values/'Sheet1'!A:H:clear"));
    }

    #[test]
    fn test_endpoint_trailing_slash_is_ignored() {
        let backend =
            GoogleSheets::with_endpoint("http://localhost:9000/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.endpoint, "http://localhost:9000");
    }

    #[test]
    fn test_unusable_private_key_cannot_sign() {
        let key = ServiceAccountKey::from_json(crate::sync::memory::TEST_KEY_JSON).unwrap();
        assert!(signed_assertion(&key, 0).is_err());
    }

    #[test]
    fn test_value_range_shape() {
        let values = vec![vec!["ID".to_string()], vec!["1".to_string()]];
        let body = ValueRange {
            range: "'Sheet1'!A1",
            major_dimension: "ROWS",
            values: &values,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "range": "'Sheet1'!A1",
                "majorDimension": "ROWS",
                "values": [["ID"], ["1"]]
            })
        );
    }
}
