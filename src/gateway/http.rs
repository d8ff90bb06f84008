/// REST implementation of the workflow gateway
///
/// Maps each gateway operation onto the `/api/workflows` routes served by the
/// reference backend. Status codes are folded into [`GatewayError`]:
/// 404 becomes `NotFound`, 400/422 become `Validation`, anything else `Transport`.

use crate::{
    config::GatewayConfig,
    gateway::{GatewayError, WorkflowGateway, TRACING_TARGET},
    workflow::types::{
        CreateWorkflow, ExecutionReport, PortableWorkflow, UpdateWorkflow, WorkflowDocument,
        WorkflowId, WorkflowSummary,
    },
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// HTTP client for the workflow service
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    /// Service root without trailing slash (e.g., "http://127.0.0.1:3004")
    base_url: String,
    /// Token handed over by the session store, sent as `Authorization: Bearer`
    bearer_token: Option<String>,
}

impl HttpGateway {
    /// Build a gateway from configuration
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    /// Replace the bearer token, e.g. after the session store re-authenticates
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/workflows{}", self.base_url, path);
        tracing::debug!(target: TRACING_TARGET, "➡️ {} {}", method, url);

        let builder = self.client.request(method, url);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, GatewayError> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(target: TRACING_TARGET, "❌ Request failed: {}", e);
            GatewayError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = error_detail(response).await;
        tracing::warn!(target: TRACING_TARGET, "❌ Workflow service answered {}: {}", status, detail);

        Err(match status {
            StatusCode::NOT_FOUND => GatewayError::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                GatewayError::Validation(detail)
            }
            _ => GatewayError::Transport(format!("{status}: {detail}")),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid response body: {e}")))
    }
}

/// Pull `{"detail": "..."}` out of an error body, falling back to the raw text
async fn error_detail(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => text,
        },
        _ => text,
    }
}

#[async_trait::async_trait]
impl WorkflowGateway for HttpGateway {
    async fn list(&self) -> Result<Vec<WorkflowSummary>, GatewayError> {
        self.send_json(self.request(Method::GET, "")).await
    }

    async fn get(&self, id: WorkflowId) -> Result<WorkflowDocument, GatewayError> {
        self.send_json(self.request(Method::GET, &format!("/{id}"))).await
    }

    async fn create(&self, request: CreateWorkflow) -> Result<WorkflowDocument, GatewayError> {
        self.send_json(self.request(Method::POST, "").json(&request)).await
    }

    async fn update(
        &self,
        id: WorkflowId,
        request: UpdateWorkflow,
    ) -> Result<WorkflowDocument, GatewayError> {
        self.send_json(self.request(Method::PUT, &format!("/{id}")).json(&request))
            .await
    }

    async fn delete(&self, id: WorkflowId) -> Result<(), GatewayError> {
        self.send(self.request(Method::DELETE, &format!("/{id}"))).await?;
        Ok(())
    }

    async fn activate(&self, id: WorkflowId) -> Result<(), GatewayError> {
        self.send(self.request(Method::POST, &format!("/{id}/activate"))).await?;
        Ok(())
    }

    async fn deactivate(&self, id: WorkflowId) -> Result<(), GatewayError> {
        self.send(self.request(Method::POST, &format!("/{id}/deactivate"))).await?;
        Ok(())
    }

    async fn execute(&self, id: WorkflowId) -> Result<ExecutionReport, GatewayError> {
        self.send_json(self.request(Method::POST, &format!("/{id}/execute"))).await
    }

    async fn export(&self, id: WorkflowId) -> Result<PortableWorkflow, GatewayError> {
        self.send_json(self.request(Method::GET, &format!("/{id}/export"))).await
    }

    async fn import(&self, document: PortableWorkflow) -> Result<WorkflowDocument, GatewayError> {
        self.send_json(self.request(Method::POST, "/import").json(&document))
            .await
    }
}
