//! HTTP client for the accounting API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use minefleet_common::{EarningsSnapshot, SyncError, WalletAddress};

use super::{AccountingApi, BalanceUpdate, Registration};

/// Referer sent with every request
pub const REFERER: &str = "https://minefleet.app/dashboard";

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("minefleet-agent/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationResponse {
    is_registered: bool,
    #[serde(default)]
    user_data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserData {
    #[serde(default)]
    referral_bonus: Option<f64>,
}

#[derive(Debug, Serialize)]
struct UpdateBalanceRequest<'a> {
    wallet: &'a str,
    earnings: &'a EarningsSnapshot,
}

/// JSON-over-HTTPS accounting client
#[derive(Debug, Clone)]
pub struct HttpAccountingClient {
    base_url: String,
    http_client: Client,
}

impl HttpAccountingClient {
    /// Create a client for `base_url` with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, SyncError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(reqwest::header::REFERER, HeaderValue::from_static(REFERER));

        let http_client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AccountingApi for HttpAccountingClient {
    async fn check_registration(&self, wallet: &WalletAddress) -> Result<Registration, SyncError> {
        let url = format!("{}/check-registration", self.base_url);
        debug!(wallet = %wallet, "Checking registration");

        let response = self
            .http_client
            .get(&url)
            .query(&[("wallet", wallet.as_str())])
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let body: RegistrationResponse = Self::decode(response).await?;
        Ok(Registration {
            is_registered: body.is_registered,
            referral_bonus: body.user_data.and_then(|u| u.referral_bonus),
        })
    }

    async fn update_balance(
        &self,
        wallet: &WalletAddress,
        earnings: &EarningsSnapshot,
    ) -> Result<BalanceUpdate, SyncError> {
        let url = format!("{}/update-balance", self.base_url);
        debug!(wallet = %wallet, %earnings, "Updating balance");

        let response = self
            .http_client
            .post(&url)
            .json(&UpdateBalanceRequest {
                wallet: wallet.as_str(),
                earnings,
            })
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const WALLET: &str = "0x00000000000000000000000000000000000000bb";

    fn wallet() -> WalletAddress {
        WalletAddress::parse(WALLET).unwrap()
    }

    #[tokio::test]
    async fn test_check_registration_with_bonus() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/check-registration"))
            .and(query_param("wallet", WALLET))
            .and(header("referer", REFERER))
            .and(header("user-agent", USER_AGENT))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isRegistered": true,
                "userData": { "referralBonus": 0.15 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpAccountingClient::new(server.uri()).unwrap();
        let registration = client.check_registration(&wallet()).await.unwrap();

        assert!(registration.is_registered);
        assert_eq!(registration.referral_bonus, Some(0.15));
    }

    #[tokio::test]
    async fn test_check_registration_without_user_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/check-registration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isRegistered": false
            })))
            .mount(&server)
            .await;

        let client = HttpAccountingClient::new(server.uri()).unwrap();
        let registration = client.check_registration(&wallet()).await.unwrap();

        assert_eq!(registration, Registration::default());
    }

    #[tokio::test]
    async fn test_update_balance_posts_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update-balance"))
            .and(body_json(json!({
                "wallet": WALLET,
                "earnings": { "total": 1.5, "pending": 0.5, "paid": 0.0 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "balance": 1.75
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpAccountingClient::new(format!("{}/", server.uri())).unwrap();
        let snapshot = EarningsSnapshot {
            total: 1.5,
            pending: 0.5,
            paid: 0.0,
        };
        let update = client.update_balance(&wallet(), &snapshot).await.unwrap();

        assert_eq!(update, BalanceUpdate { success: true, balance: 1.75 });
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update-balance"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = HttpAccountingClient::new(server.uri()).unwrap();
        let result = client
            .update_balance(&wallet(), &EarningsSnapshot::default())
            .await;

        assert_eq!(
            result,
            Err(SyncError::Status {
                status: 503,
                body: "maintenance".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/check-registration"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = HttpAccountingClient::new(server.uri()).unwrap();
        let result = client.check_registration(&wallet()).await;

        assert!(matches!(result, Err(SyncError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = HttpAccountingClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = client.check_registration(&wallet()).await;

        assert!(matches!(result, Err(SyncError::Transport(_))));
    }
}
