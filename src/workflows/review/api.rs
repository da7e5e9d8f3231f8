//! Client for the remote application and review service.

use std::future::Future;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::domain::{Application, ApplicationId, ReviewForm, ReviewId, ReviewRecord, ReviewType};
use crate::config::{ApiConfig, ConfigError};

pub const APPLICATIONS_PATH: &str = "/applications/";
pub const CREATE_REVIEW_PATH: &str = "/review_tool/application_review";

pub const UPDATE_REVIEW_PATH: &str = "/review_tool/update_review";

/// Update endpoint for one record; the id is appended as a single percent-encoded segment.
pub fn update_review_url(config: &ApiConfig, id: &ReviewId) -> Result<Url, ConfigError> {
    let mut url = config.endpoint(UPDATE_REVIEW_PATH)?;
    let scheme = url.scheme().to_string();
    url.path_segments_mut()
        .map_err(|()| ConfigError::UnsupportedScheme(scheme))?
        .pop_if_empty()
        .push(&id.0);
    Ok(url)
}

/// Body shared by the create and update review endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub data: ReviewRequestData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequestData {
    pub form: ReviewForm,
    pub review_type: ReviewType,
    pub reviewee_id: ApplicationId,
}

impl ReviewRequest {
    pub fn new(form: ReviewForm, review_type: ReviewType, reviewee_id: ApplicationId) -> Self {
        Self {
            data: ReviewRequestData {
                form,
                review_type,
                reviewee_id,
            },
        }
    }
}

/// Envelope the service wraps its responses in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse<T> {
    pub response_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub const SUCCESS: &'static str = "success";

    pub fn success(data: T) -> Self {
        Self {
            response_type: Self::SUCCESS.to_string(),
            description: None,
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.response_type.eq_ignore_ascii_case(Self::SUCCESS)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Endpoint(#[from] ConfigError),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with HTTP {status}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("unable to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("review service rejected the request: {0}")]
    Rejected(String),
    #[error("review service acknowledged without returning the review record")]
    MissingRecord,
}

/// Seam to the remote service so sessions can run against fakes.
pub trait ReviewApi: Send + Sync {
    fn fetch_applications(&self) -> impl Future<Output = Result<Vec<Application>, ApiError>> + Send;

    fn create_review(
        &self,
        request: &ReviewRequest,
    ) -> impl Future<Output = Result<ReviewRecord, ApiError>> + Send;

    fn update_review(
        &self,
        id: &ReviewId,
        request: &ReviewRequest,
    ) -> impl Future<Output = Result<ReviewRecord, ApiError>> + Send;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApplicationsPayload {
    Bare(Vec<Application>),
    Wrapped(ServiceResponse<Vec<Application>>),
}

/// `reqwest`-backed implementation of [`ReviewApi`].
#[derive(Debug, Clone)]
pub struct HttpReviewApi {
    client: Client,
    config: ApiConfig,
}

impl HttpReviewApi {
    pub fn new(config: ApiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: ApiConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn send<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let label = url.to_string();
        debug!(%method, url = %label, "calling review service");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: label.clone(),
            source,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|source| ApiError::Transport {
            url: label.clone(),
            source,
        })?;

        if !status.is_success() {
            warn!(
                url = %label,
                status = status.as_u16(),
                "review service returned an error status"
            );
            return Err(ApiError::Status {
                url: label,
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| ApiError::Decode { url: label, source })
    }

    async fn send_review(
        &self,
        method: Method,
        url: Url,
        request: &ReviewRequest,
    ) -> Result<ReviewRecord, ApiError> {
        let response: ServiceResponse<ReviewRecord> =
            self.send(method, url, Some(request)).await?;
        if !response.is_success() {
            return Err(ApiError::Rejected(
                response.description.unwrap_or(response.response_type),
            ));
        }
        response.data.ok_or(ApiError::MissingRecord)
    }
}

impl ReviewApi for HttpReviewApi {
    async fn fetch_applications(&self) -> Result<Vec<Application>, ApiError> {
        let url = self.config.endpoint(APPLICATIONS_PATH)?;
        let payload: ApplicationsPayload = self.send::<(), _>(Method::GET, url, None).await?;
        match payload {
            ApplicationsPayload::Bare(applications) => Ok(applications),
            ApplicationsPayload::Wrapped(response) if response.is_success() => {
                Ok(response.data.unwrap_or_default())
            }
            ApplicationsPayload::Wrapped(response) => Err(ApiError::Rejected(
                response.description.unwrap_or(response.response_type),
            )),
        }
    }

    async fn create_review(&self, request: &ReviewRequest) -> Result<ReviewRecord, ApiError> {
        let url = self.config.endpoint(CREATE_REVIEW_PATH)?;
        self.send_review(Method::POST, url, request).await
    }

    async fn update_review(
        &self,
        id: &ReviewId,
        request: &ReviewRequest,
    ) -> Result<ReviewRecord, ApiError> {
        let url = update_review_url(&self.config, id)?;
        self.send_review(Method::PATCH, url, request).await
    }
}
