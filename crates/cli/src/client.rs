//! Stepwright API HTTP Client

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use stepwright_common::{StepDetails, TestCase, TestSuite};

/// Client for communicating with the Stepwright web API
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(addr: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: addr.trim_end_matches('/').to_string(),
        }
    }

    /// Check if the API server is healthy
    pub async fn health_check(&self) -> bool {
        match self.http.get(format!("{}/health", self.base)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {}{}", self.base, path);
        let response = self
            .http
            .get(format!("{}{}", self.base, path))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Unwrap a success body, or surface the API's `{"error": …}` message.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body["error"].as_str().unwrap_or("unknown error");
        Err(anyhow!("{} ({})", message, status))
    }

    // Suite operations

    /// List all test suites
    pub async fn list_suites(&self) -> Result<Vec<TestSuite>> {
        self.get_json("/api/test-suites").await
    }

    /// Get a test suite by ID
    pub async fn get_suite(&self, id: i64) -> Result<TestSuite> {
        self.get_json(&format!("/api/test-suites/{}", id)).await
    }

    // Case operations

    /// List the test cases of a suite
    pub async fn list_cases(&self, suite_id: i64) -> Result<Vec<TestCase>> {
        self.get_json(&format!("/api/test-suites/{}/test-cases", suite_id))
            .await
    }

    // Step operations

    /// List the steps of a case, in execution order
    pub async fn list_steps(&self, case_id: i64) -> Result<Vec<StepDetails>> {
        self.get_json(&format!("/api/test-cases/{}/steps", case_id))
            .await
    }

    // Generation

    /// Compiled Playwright script text of a case
    pub async fn generate_script(&self, case_id: i64) -> Result<String> {
        let body: serde_json::Value = self
            .get_json(&format!("/api/test-cases/{}/generate", case_id))
            .await?;
        body["code"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow!("response is missing the generated code"))
    }
}
