//! In-memory graph service
//!
//! Applies the same reference checks the server performs, so a schema script can be
//! validated without a running graph server.

use crate::client::schema::{BaseType, SchemaElement, SchemaKind, SchemaSnapshot};
use crate::client::{GraphService, CLEAR_CONFIRM_MESSAGE};
use crate::error::LoadError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryGraphService {
    graphs: RwLock<HashMap<String, SchemaSnapshot>>,
}

impl InMemoryGraphService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current schema of `graph` (empty if never touched)
    pub fn snapshot(&self, graph: &str) -> SchemaSnapshot {
        self.graphs.read().get(graph).cloned().unwrap_or_default()
    }

    fn check_references(snapshot: &SchemaSnapshot, element: &SchemaElement) -> Result<(), String> {
        let missing_keys = |keys: &[String]| -> Option<String> {
            keys.iter()
                .find(|k| !snapshot.contains(SchemaKind::PropertyKey, k))
                .cloned()
        };

        match element {
            SchemaElement::PropertyKey(_) => Ok(()),
            SchemaElement::VertexLabel(label) => {
                if let Some(key) = missing_keys(&label.properties) {
                    return Err(format!("Undefined property key: '{}'", key));
                }
                if let Some(key) = label
                    .primary_keys
                    .iter()
                    .chain(label.nullable_keys.iter())
                    .find(|k| !label.properties.contains(*k))
                {
                    return Err(format!(
                        "Key '{}' is not a property of vertex label '{}'",
                        key, label.name
                    ));
                }
                Ok(())
            }
            SchemaElement::EdgeLabel(label) => {
                for endpoint in [&label.source_label, &label.target_label] {
                    if !snapshot.contains(SchemaKind::VertexLabel, endpoint) {
                        return Err(format!("Undefined vertex label: '{}'", endpoint));
                    }
                }
                if let Some(key) = missing_keys(&label.properties) {
                    return Err(format!("Undefined property key: '{}'", key));
                }
                Ok(())
            }
            SchemaElement::IndexLabel(index) => {
                let base_properties = match index.base_type {
                    BaseType::VertexLabel => snapshot
                        .vertex_labels
                        .get(&index.base_value)
                        .map(|l| &l.properties),
                    BaseType::EdgeLabel => snapshot
                        .edge_labels
                        .get(&index.base_value)
                        .map(|l| &l.properties),
                };
                let properties = base_properties
                    .ok_or_else(|| format!("Undefined base label: '{}'", index.base_value))?;
                if index.fields.is_empty() {
                    return Err(format!("Index label '{}' has no fields", index.name));
                }
                if let Some(field) = index.fields.iter().find(|f| !properties.contains(*f)) {
                    return Err(format!(
                        "Field '{}' is not a property of '{}'",
                        field, index.base_value
                    ));
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl GraphService for InMemoryGraphService {
    async fn clear_graph(&self, graph: &str, confirm_message: &str) -> Result<(), LoadError> {
        if confirm_message != CLEAR_CONFIRM_MESSAGE {
            return Err(LoadError::RemoteService(format!(
                "Please take the message: {}",
                CLEAR_CONFIRM_MESSAGE
            )));
        }
        self.graphs.write().remove(graph);
        Ok(())
    }

    async fn create_schema(
        &self,
        graph: &str,
        element: &SchemaElement,
    ) -> Result<SchemaElement, LoadError> {
        let mut graphs = self.graphs.write();
        let snapshot = graphs.entry(graph.to_string()).or_default();
        if snapshot.contains(element.kind(), element.name()) {
            return Err(LoadError::RemoteService(format!(
                "The {} '{}' has existed",
                element.kind(),
                element.name()
            )));
        }
        Self::check_references(snapshot, element).map_err(LoadError::RemoteService)?;
        snapshot.insert(element.clone());
        Ok(element.clone())
    }

    async fn get_schema(
        &self,
        graph: &str,
        kind: SchemaKind,
        name: &str,
    ) -> Result<Option<SchemaElement>, LoadError> {
        Ok(self
            .graphs
            .read()
            .get(graph)
            .and_then(|snapshot| snapshot.get(kind, name)))
    }

    async fn remove_schema(
        &self,
        graph: &str,
        kind: SchemaKind,
        name: &str,
    ) -> Result<(), LoadError> {
        let mut graphs = self.graphs.write();
        let removed = graphs
            .get_mut(graph)
            .map(|snapshot| snapshot.remove(kind, name))
            .unwrap_or(false);
        if removed {
            Ok(())
        } else {
            Err(LoadError::RemoteService(format!(
                "Undefined {}: '{}'",
                kind, name
            )))
        }
    }

    async fn list_schema(&self, graph: &str) -> Result<SchemaSnapshot, LoadError> {
        Ok(self.snapshot(graph))
    }
}
