//! HTTP client for the complaints API

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use shared::{Complaint, ComplaintUpdate};

use crate::{ClientConfig, ClientError, ClientResult};

/// Complaints API boundary
///
/// Every call carries the caller's identity token; the server decides
/// which records that token may see or change.
#[async_trait]
pub trait ComplaintsApi: Send + Sync {
    /// `GET /complaints`
    async fn list_complaints(&self, token: &str) -> ClientResult<Vec<Complaint>>;

    /// `PUT /complaints/{complaintId}`
    ///
    /// Returns the updated record when the server echoes one back.
    async fn update_complaint(
        &self,
        token: &str,
        complaint_id: &str,
        update: &ComplaintUpdate,
    ) -> ClientResult<Option<Complaint>>;
}

/// Network complaints API client
#[derive(Debug, Clone)]
pub struct NetworkComplaintsApi {
    client: Client,
    base_url: String,
}

impl NetworkComplaintsApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> ClientResult<Url> {
        Url::parse(&format!("{}/complaints", self.base_url))
            .map_err(|e| ClientError::Validation(format!("Invalid API URL: {}", e)))
    }

    fn complaint_url(&self, complaint_id: &str) -> ClientResult<Url> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Validation("API URL cannot carry a path".into()))?
            .push(complaint_id);
        Ok(url)
    }

    fn auth_header(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Split off non-2xx responses, keeping status and body
    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, (StatusCode, String)> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %text, "Complaints API returned an error");
        Err((status, text))
    }

    /// A failed list is a network failure unless the session was refused
    fn list_error(status: StatusCode, body: String) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Auth(body),
            _ => ClientError::Network(format!(
                "GET /complaints returned {}: {}",
                status.as_u16(),
                body
            )),
        }
    }

    fn update_error(complaint_id: &str, status: StatusCode, body: String) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Auth(body),
            StatusCode::FORBIDDEN => ClientError::Authorization(body),
            StatusCode::NOT_FOUND => ClientError::NotFound(complaint_id.to_string()),
            _ => ClientError::Api {
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[async_trait]
impl ComplaintsApi for NetworkComplaintsApi {
    async fn list_complaints(&self, token: &str) -> ClientResult<Vec<Complaint>> {
        let url = self.collection_url()?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, Self::auth_header(token))
            .send()
            .await?;
        let response = Self::check_status(response)
            .await
            .map_err(|(status, body)| Self::list_error(status, body))?;
        Ok(response.json().await?)
    }

    async fn update_complaint(
        &self,
        token: &str,
        complaint_id: &str,
        update: &ComplaintUpdate,
    ) -> ClientResult<Option<Complaint>> {
        let url = self.complaint_url(complaint_id)?;
        let response = self
            .client
            .put(url)
            .header(reqwest::header::AUTHORIZATION, Self::auth_header(token))
            .json(update)
            .send()
            .await?;
        let response = Self::check_status(response)
            .await
            .map_err(|(status, body)| Self::update_error(complaint_id, status, body))?;

        // Some deployments answer with a status message instead of the record;
        // the caller re-fetches either way.
        let body = response.bytes().await?;
        match serde_json::from_slice::<Complaint>(&body) {
            Ok(complaint) => Ok(Some(complaint)),
            Err(e) => {
                tracing::debug!(complaint_id, error = %e, "Update response carried no complaint");
                Ok(None)
            }
        }
    }
}
