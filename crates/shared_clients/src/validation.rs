use common::diag;
use common::error::diagnostics::DiagnosticMessage;
use components::{ConfigMap, ValidationReport};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationClientError {
    #[error("connectivity error: {context}")]
    FailedToConnect { context: DiagnosticMessage },
    #[error("request rejected: {context}")]
    BadRequest { context: DiagnosticMessage },
    #[error("connector not found: {context}")]
    NotFound { context: DiagnosticMessage },
    #[error("unexpected response: {context}")]
    UnexpectedError { context: DiagnosticMessage },
}

impl ValidationClientError {
    #[track_caller]
    pub fn failed_to_connect(message: impl Into<String>) -> Self {
        Self::FailedToConnect {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            context: DiagnosticMessage::new(message.into()),
        }
    }
}

impl From<reqwest::Error> for ValidationClientError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            ValidationClientError::failed_to_connect(err.to_string())
        } else if err.is_decode() {
            ValidationClientError::UnexpectedError {
                context: diag!("could not decode validation report: {}", err),
            }
        } else {
            ValidationClientError::UnexpectedError {
                context: diag!("Unexpected error trying to send validation request: {}", err),
            }
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for a running validator service.
#[derive(Debug, Clone)]
pub struct ValidationClient {
    base_url: String,
    http: Client,
}

impl ValidationClient {
    /// `base_url` includes the service base path, e.g.
    /// `http://localhost:8083/debezium`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Validates `config` as a connector of type `alias`.
    pub async fn validate_connection(
        &self,
        alias: &str,
        config: &ConfigMap,
    ) -> Result<ValidationReport, ValidationClientError> {
        let url = format!("{}/{}/validate/connection", self.base_url, alias);
        self.put_config(&url, config).await
    }

    /// Validates `config`, letting the service pick the connector type from
    /// its `connector.class`.
    pub async fn validate(
        &self,
        config: &ConfigMap,
    ) -> Result<ValidationReport, ValidationClientError> {
        let url = format!("{}/validate/connection", self.base_url);
        self.put_config(&url, config).await
    }

    async fn put_config(
        &self,
        url: &str,
        config: &ConfigMap,
    ) -> Result<ValidationReport, ValidationClientError> {
        tracing::debug!(url, properties = config.len(), "sending validation request");
        let resp = self.http.put(url).json(config).send().await?;
        let status = resp.status();

        if status == StatusCode::OK {
            return Ok(resp.json::<ValidationReport>().await?);
        }

        let fallback = format!("validation request failed with status {status}");
        let message = resp
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or(fallback);

        match status {
            StatusCode::BAD_REQUEST
            | StatusCode::UNSUPPORTED_MEDIA_TYPE
            | StatusCode::PAYLOAD_TOO_LARGE => Err(ValidationClientError::bad_request(message)),
            StatusCode::NOT_FOUND => Err(ValidationClientError::not_found(message)),
            _ => Err(ValidationClientError::UnexpectedError {
                context: diag!("{} (status {})", message, status.as_u16()),
            }),
        }
    }
}
