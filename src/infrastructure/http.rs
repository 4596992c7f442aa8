use crate::types::{Credentials, RealtimeError, RealtimeEvent, USER_ID_HEADER, error::Result};
use reqwest::RequestBuilder;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Posts outbound events for the SSE and polling transports
pub struct HttpSender {
    client: reqwest::Client,
    url: Url,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl HttpSender {
    pub fn new(
        client: reqwest::Client,
        url: Url,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url,
            credentials,
            timeout,
        }
    }

    /// Sends one event via HTTP POST
    pub async fn post(&self, event: &RealtimeEvent) -> Result<()> {
        let request = self
            .client
            .post(self.url.clone())
            .timeout(self.timeout)
            .header("Content-Type", "application/json")
            .json(event);

        let response = with_auth_headers(request, self.credentials.as_ref())
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(RealtimeError::Transport(format!(
                "HTTP send failed for event '{}' with status: {}",
                event.event_type,
                response.status()
            )));
        }

        tracing::debug!("Sent {} event via HTTP", event.event_type);
        Ok(())
    }
}

/// Adds `Authorization` and user id headers when credentials are configured
pub fn with_auth_headers(
    request: RequestBuilder,
    credentials: Option<&Credentials>,
) -> RequestBuilder {
    match credentials {
        Some(credentials) => request
            .bearer_auth(&credentials.token)
            .header(USER_ID_HEADER, &credentials.user_id),
        None => request,
    }
}

/// A request that ran past its deadline becomes [`RealtimeError::Timeout`]
pub fn request_error(error: reqwest::Error) -> RealtimeError {
    if error.is_timeout() {
        RealtimeError::Timeout
    } else {
        RealtimeError::Http(error)
    }
}

/// Times one GET round trip; non-success statuses count as failures
pub async fn measure_round_trip(
    client: &reqwest::Client,
    url: Url,
    timeout: Duration,
) -> Result<Duration> {
    let started = Instant::now();
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(request_error)?;

    if !response.status().is_success() {
        return Err(RealtimeError::Transport(format!(
            "Quality probe failed with status: {}",
            response.status()
        )));
    }

    Ok(started.elapsed())
}
