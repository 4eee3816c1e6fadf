//! REST implementation of `GraphService` against the graph server.

use crate::client::schema::{SchemaElement, SchemaKind, SchemaSnapshot};
use crate::client::GraphService;
use crate::config::LoadOptions;
use crate::error::LoadError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// Helper function to map transport errors to LoadError
fn map_http_error(error: reqwest::Error) -> LoadError {
    if error.is_timeout() {
        LoadError::RemoteService(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        LoadError::RemoteService(format!("Connection error: {}", error))
    } else if let Some(status) = error.status() {
        LoadError::RemoteService(format!("Request failed with status {}: {}", status, error))
    } else {
        LoadError::RemoteService(format!("HTTP error: {}", error))
    }
}

/// Turn a non-success response into an error carrying the server's message
async fn error_from_response(action: &str, response: Response) -> LoadError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    failure_from_body(action, status, body)
}

fn failure_from_body(action: &str, status: StatusCode, body: String) -> LoadError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LoadError::RemoteService(format!("{}: authentication failed: {}", action, message))
        }
        _ => LoadError::RemoteService(format!("{} failed ({}): {}", action, status, message)),
    }
}

/// Only 404 means the element is absent; every other failure is reported.
fn is_missing(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND
}

pub struct HttpGraphService {
    client: Client,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl HttpGraphService {
    /// Build from run options; the request timeout is fixed at construction.
    pub fn new(options: &LoadOptions) -> Result<Self, LoadError> {
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(options.request_timeout())
            .build()
            .map_err(|e| LoadError::RemoteService(format!("Failed to create HTTP client: {}", e)))?;
        let credentials = match (&options.username, &options.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };
        let base_url = Url::parse(&options.base_url()).map_err(|e| {
            LoadError::Config(format!("Invalid server URL '{}': {}", options.base_url(), e))
        })?;
        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// `base/graphs/<graph>/<segments..>` with every segment percent-encoded.
    fn graph_url(&self, graph: &str, segments: &[&str]) -> Result<Url, LoadError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                LoadError::Config(format!("Server URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .push("graphs")
            .push(graph)
            .extend(segments);
        Ok(url)
    }

    fn schema_url(&self, graph: &str, kind: SchemaKind) -> Result<Url, LoadError> {
        self.graph_url(graph, &["schema", kind.path_segment()])
    }

    fn element_url(&self, graph: &str, kind: SchemaKind, name: &str) -> Result<Url, LoadError> {
        self.graph_url(graph, &["schema", kind.path_segment(), name])
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        }
    }

    async fn list_kind(&self, graph: &str, kind: SchemaKind) -> Result<Vec<SchemaElement>, LoadError> {
        let response = self
            .authorized(self.client.get(self.schema_url(graph, kind)?))
            .send()
            .await
            .map_err(map_http_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(&format!("List {}s", kind), response).await);
        }
        let mut body: Value = response
            .json()
            .await
            .map_err(|e| LoadError::RemoteService(format!("Failed to parse response: {}", e)))?;
        let items = match body.get_mut(kind.path_segment()).map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        items
            .into_iter()
            .map(|item| {
                SchemaElement::from_json(kind, item).map_err(|e| {
                    LoadError::RemoteService(format!("Failed to parse {}: {}", kind, e))
                })
            })
            .collect()
    }
}

#[async_trait]
impl GraphService for HttpGraphService {
    async fn clear_graph(&self, graph: &str, confirm_message: &str) -> Result<(), LoadError> {
        let url = self.graph_url(graph, &["clear"])?;
        let response = self
            .authorized(self.client.delete(url))
            .query(&[("confirm_message", confirm_message)])
            .send()
            .await
            .map_err(map_http_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(&format!("Clear graph '{}'", graph), response).await);
        }
        Ok(())
    }

    async fn create_schema(
        &self,
        graph: &str,
        element: &SchemaElement,
    ) -> Result<SchemaElement, LoadError> {
        let kind = element.kind();
        let response = self
            .authorized(self.client.post(self.schema_url(graph, kind)?))
            .json(&element.to_json())
            .send()
            .await
            .map_err(map_http_error)?;
        if !response.status().is_success() {
            let action = format!("Create {} '{}'", kind, element.name());
            return Err(error_from_response(&action, response).await);
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| LoadError::RemoteService(format!("Failed to parse response: {}", e)))?;
        // Index label creation answers with {"index_label": {...}, "task_id": ..}
        let body = match body.get("index_label") {
            Some(inner) => inner.clone(),
            None => body,
        };
        SchemaElement::from_json(kind, body)
            .map_err(|e| LoadError::RemoteService(format!("Failed to parse {}: {}", kind, e)))
    }

    async fn get_schema(
        &self,
        graph: &str,
        kind: SchemaKind,
        name: &str,
    ) -> Result<Option<SchemaElement>, LoadError> {
        let url = self.element_url(graph, kind, name)?;
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(map_http_error)?;
        if is_missing(response.status()) {
            return Ok(None);
        }
        if !response.status().is_success() {
            let action = format!("Get {} '{}'", kind, name);
            return Err(error_from_response(&action, response).await);
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| LoadError::RemoteService(format!("Failed to parse response: {}", e)))?;
        SchemaElement::from_json(kind, body)
            .map(Some)
            .map_err(|e| LoadError::RemoteService(format!("Failed to parse {}: {}", kind, e)))
    }

    async fn remove_schema(
        &self,
        graph: &str,
        kind: SchemaKind,
        name: &str,
    ) -> Result<(), LoadError> {
        let url = self.element_url(graph, kind, name)?;
        let response = self
            .authorized(self.client.delete(url))
            .send()
            .await
            .map_err(map_http_error)?;
        if !response.status().is_success() {
            let action = format!("Remove {} '{}'", kind, name);
            return Err(error_from_response(&action, response).await);
        }
        Ok(())
    }

    async fn list_schema(&self, graph: &str) -> Result<SchemaSnapshot, LoadError> {
        let (keys, vertices, edges, indexes) = futures::try_join!(
            self.list_kind(graph, SchemaKind::PropertyKey),
            self.list_kind(graph, SchemaKind::VertexLabel),
            self.list_kind(graph, SchemaKind::EdgeLabel),
            self.list_kind(graph, SchemaKind::IndexLabel),
        )?;
        let mut snapshot = SchemaSnapshot::default();
        for element in keys.into_iter().chain(vertices).chain(edges).chain(indexes) {
            snapshot.insert(element);
        }
        Ok(snapshot)
    }
}
