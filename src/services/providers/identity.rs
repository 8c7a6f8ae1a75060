/// Identity provider (Identity Toolkit REST)
///
/// Sign-in, token minting and password reset all happen between the browser
/// and the provider directly; the server only ever verifies the id token a
/// request carries and reads the account fields off the lookup response.
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::UserInfo,
    services::providers::IdentityProvider,
};

#[derive(Clone)]
pub struct IdentityToolkit {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
}

impl IdentityToolkit {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[async_trait::async_trait]
impl IdentityProvider for IdentityToolkit {
    async fn verify(&self, id_token: &str) -> AppResult<UserInfo> {
        let url = format!("{}/accounts:lookup?key={}", self.api_url, self.api_key);

        let response = self
            .http_client
            .post(&url)
            .json(&json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("identity lookup failed: {}", e)))?;

        // The toolkit answers 400 for expired or forged tokens
        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            return Err(AppError::Unauthorized("invalid or expired token".to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "identity provider returned status {}: {}",
                status, body
            )));
        }

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("unreadable identity response: {}", e)))?;

        let user = lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Unauthorized("token matches no account".to_string()))?;

        tracing::debug!(uid = %user.local_id, provider = "identity_toolkit", "Token verified");

        Ok(UserInfo {
            uid: user.local_id,
            email: user.email.unwrap_or_default(),
            display_name: user.display_name.filter(|n| !n.is_empty()),
        })
    }
}
