use reqwest::StatusCode;

use crate::ports::gateway::GatewayError;
use crate::ports::{GreetingSubmission, SubmissionAck};

/// Client for the relay's `POST /api/greet` endpoint.
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    url: String,
}

impl RelayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post a submission.
    ///
    /// A 500 carries the user-facing failure text; any other non-success
    /// status is surfaced with its raw body. A success body that is not a
    /// receipt still counts as accepted.
    pub async fn submit(
        &self,
        submission: &GreetingSubmission,
    ) -> Result<SubmissionAck, GatewayError> {
        let response = self
            .client
            .post(&self.url)
            .json(submission)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return Err(GatewayError::Server(body));
        }
        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(serde_json::from_str(&body).unwrap_or_default())
    }
}
