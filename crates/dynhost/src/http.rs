use async_trait::async_trait;
use dyncore::{EngineError, ExecuteOptions, ExecutionEngine, Item, WorkflowDocument};
use serde::Serialize;
use serde_json::Value;

/// Body posted to the remote engine
#[derive(Serialize)]
struct ExecutionRequest<'a> {
    workflow: &'a WorkflowDocument,
    items: &'a [Item],
    options: &'a ExecuteOptions,
}

/// Execution engine reached over HTTP
///
/// Posts `{ workflow, items, options }` as JSON to `<base_url>/executions`
/// and returns the decoded response body. An empty body is reported as
/// "no value".
pub struct HttpExecutionEngine {
    client: reqwest::Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl HttpExecutionEngine {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/executions", base_url.as_ref().trim_end_matches('/')),
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExecutionEngine for HttpExecutionEngine {
    async fn execute_workflow(
        &self,
        document: &WorkflowDocument,
        items: Vec<Item>,
        options: ExecuteOptions,
    ) -> Result<Option<Value>, EngineError> {
        let body = ExecutionRequest {
            workflow: document,
            items: &items,
            options: &options,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!("POST {} ({} item(s))", self.endpoint, items.len());

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(EngineError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| EngineError::ExecutionFailed(format!("Response is not JSON: {}", e)))
    }
}
