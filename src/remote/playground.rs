//! HTTP client for a Rust playground compatible execution sandbox.

use std::time::Duration;

use crate::core::traits::sandbox::{RemoteSandbox, SandboxError, SandboxRequest, SandboxResponse};

#[derive(Clone, Debug)]
pub struct HttpSandbox {
    client: reqwest::Client,
    url: String,
}

impl HttpSandbox {
    /// `request_timeout` bounds the whole exchange; an expired request is
    /// abandoned and reported as [`SandboxError::Timeout`].
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, SandboxError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SandboxError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

fn from_reqwest(e: reqwest::Error) -> SandboxError {
    if e.is_timeout() {
        SandboxError::Timeout
    } else {
        SandboxError::Http(e.to_string())
    }
}

#[async_trait::async_trait]
impl RemoteSandbox for HttpSandbox {
    #[tracing::instrument(skip(self, request), fields(url = %self.url))]
    async fn execute(&self, request: &SandboxRequest) -> Result<SandboxResponse, SandboxError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Sandbox answered with {}", status);
            return Err(SandboxError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&body).map_err(|e| SandboxError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn sandbox_for(server: &MockServer, request_timeout: Duration) -> HttpSandbox {
        HttpSandbox::new(&format!("{}/execute", server.uri()), request_timeout).unwrap()
    }

    #[tokio::test]
    async fn test_execute_posts_fixed_configuration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute"))
            .and(body_partial_json(json!({
                "channel": "stable",
                "mode": "debug",
                "edition": "2021",
                "crateType": "bin",
                "code": "fn main() {}",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "stdout": "",
                "stderr": "   Compiling playground v0.0.1 (/playground)\n",
            })))
            .expect(1)
            .mount(&server)
            .await;
        let sandbox = sandbox_for(&server, Duration::from_secs(5)).await;

        let response = sandbox
            .execute(&SandboxRequest::for_code("fn main() {}".to_string()))
            .await
            .unwrap();

        assert!(response.success);
        assert!(response.stderr.contains("Compiling playground"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let sandbox = sandbox_for(&server, Duration::from_secs(5)).await;

        let result = sandbox
            .execute(&SandboxRequest::for_code(String::new()))
            .await;

        assert_eq!(result, Err(SandboxError::Status(503)));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
            .mount(&server)
            .await;
        let sandbox = sandbox_for(&server, Duration::from_secs(5)).await;

        let result = sandbox
            .execute(&SandboxRequest::for_code(String::new()))
            .await;

        assert!(matches!(result, Err(SandboxError::Decode(_))));
    }

    #[tokio::test]
    async fn test_slow_sandbox_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
        let sandbox = sandbox_for(&server, Duration::from_millis(200)).await;

        let result = sandbox
            .execute(&SandboxRequest::for_code(String::new()))
            .await;

        assert_eq!(result, Err(SandboxError::Timeout));
    }
}
