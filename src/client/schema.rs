//! Schema element model shared by the script runner, the REST client and the schema cache.
//!
//! Field names and enum spellings follow the graph server's REST payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchemaKind {
    PropertyKey,
    VertexLabel,
    EdgeLabel,
    IndexLabel,
}

impl SchemaKind {
    /// REST collection segment, e.g. `/schema/propertykeys`
    pub fn path_segment(self) -> &'static str {
        match self {
            SchemaKind::PropertyKey => "propertykeys",
            SchemaKind::VertexLabel => "vertexlabels",
            SchemaKind::EdgeLabel => "edgelabels",
            SchemaKind::IndexLabel => "indexlabels",
        }
    }

    pub fn all() -> [SchemaKind; 4] {
        [
            SchemaKind::PropertyKey,
            SchemaKind::VertexLabel,
            SchemaKind::EdgeLabel,
            SchemaKind::IndexLabel,
        ]
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaKind::PropertyKey => "property key",
            SchemaKind::VertexLabel => "vertex label",
            SchemaKind::EdgeLabel => "edge label",
            SchemaKind::IndexLabel => "index label",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    #[default]
    Text,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Date,
    Uuid,
    Blob,
    Byte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    #[default]
    Single,
    List,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdStrategy {
    #[default]
    Default,
    Automatic,
    PrimaryKey,
    CustomizeString,
    CustomizeNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    #[default]
    Single,
    Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseType {
    VertexLabel,
    EdgeLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    #[default]
    Secondary,
    Range,
    Search,
    Shard,
    Unique,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyKey {
    pub name: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexLabel {
    pub name: String,
    #[serde(default)]
    pub id_strategy: IdStrategy,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub nullable_keys: Vec<String>,
    #[serde(default = "default_true")]
    pub enable_label_index: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLabel {
    pub name: String,
    pub source_label: String,
    pub target_label: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub sort_keys: Vec<String>,
    #[serde(default)]
    pub nullable_keys: Vec<String>,
    #[serde(default = "default_true")]
    pub enable_label_index: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexLabel {
    pub name: String,
    pub base_type: BaseType,
    pub base_value: String,
    #[serde(default)]
    pub index_type: IndexType,
    #[serde(default)]
    pub fields: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Any schema element the loader can create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaElement {
    PropertyKey(PropertyKey),
    VertexLabel(VertexLabel),
    EdgeLabel(EdgeLabel),
    IndexLabel(IndexLabel),
}

impl SchemaElement {
    pub fn kind(&self) -> SchemaKind {
        match self {
            SchemaElement::PropertyKey(_) => SchemaKind::PropertyKey,
            SchemaElement::VertexLabel(_) => SchemaKind::VertexLabel,
            SchemaElement::EdgeLabel(_) => SchemaKind::EdgeLabel,
            SchemaElement::IndexLabel(_) => SchemaKind::IndexLabel,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SchemaElement::PropertyKey(e) => &e.name,
            SchemaElement::VertexLabel(e) => &e.name,
            SchemaElement::EdgeLabel(e) => &e.name,
            SchemaElement::IndexLabel(e) => &e.name,
        }
    }

    /// REST request body for this element
    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            SchemaElement::PropertyKey(e) => serde_json::to_value(e),
            SchemaElement::VertexLabel(e) => serde_json::to_value(e),
            SchemaElement::EdgeLabel(e) => serde_json::to_value(e),
            SchemaElement::IndexLabel(e) => serde_json::to_value(e),
        };
        // Plain data structs with string keys always serialize.
        value.unwrap_or(serde_json::Value::Null)
    }

    /// Parse a REST response body of the given kind
    pub fn from_json(kind: SchemaKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            SchemaKind::PropertyKey => SchemaElement::PropertyKey(serde_json::from_value(value)?),
            SchemaKind::VertexLabel => SchemaElement::VertexLabel(serde_json::from_value(value)?),
            SchemaKind::EdgeLabel => SchemaElement::EdgeLabel(serde_json::from_value(value)?),
            SchemaKind::IndexLabel => SchemaElement::IndexLabel(serde_json::from_value(value)?),
        })
    }
}

/// Local view of the remote schema, refreshed after mutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    pub property_keys: BTreeMap<String, PropertyKey>,
    pub vertex_labels: BTreeMap<String, VertexLabel>,
    pub edge_labels: BTreeMap<String, EdgeLabel>,
    pub index_labels: BTreeMap<String, IndexLabel>,
}

impl SchemaSnapshot {
    pub fn insert(&mut self, element: SchemaElement) {
        match element {
            SchemaElement::PropertyKey(e) => {
                self.property_keys.insert(e.name.clone(), e);
            }
            SchemaElement::VertexLabel(e) => {
                self.vertex_labels.insert(e.name.clone(), e);
            }
            SchemaElement::EdgeLabel(e) => {
                self.edge_labels.insert(e.name.clone(), e);
            }
            SchemaElement::IndexLabel(e) => {
                self.index_labels.insert(e.name.clone(), e);
            }
        }
    }

    pub fn remove(&mut self, kind: SchemaKind, name: &str) -> bool {
        match kind {
            SchemaKind::PropertyKey => self.property_keys.remove(name).is_some(),
            SchemaKind::VertexLabel => self.vertex_labels.remove(name).is_some(),
            SchemaKind::EdgeLabel => self.edge_labels.remove(name).is_some(),
            SchemaKind::IndexLabel => self.index_labels.remove(name).is_some(),
        }
    }

    pub fn get(&self, kind: SchemaKind, name: &str) -> Option<SchemaElement> {
        match kind {
            SchemaKind::PropertyKey => self
                .property_keys
                .get(name)
                .cloned()
                .map(SchemaElement::PropertyKey),
            SchemaKind::VertexLabel => self
                .vertex_labels
                .get(name)
                .cloned()
                .map(SchemaElement::VertexLabel),
            SchemaKind::EdgeLabel => self
                .edge_labels
                .get(name)
                .cloned()
                .map(SchemaElement::EdgeLabel),
            SchemaKind::IndexLabel => self
                .index_labels
                .get(name)
                .cloned()
                .map(SchemaElement::IndexLabel),
        }
    }

    pub fn contains(&self, kind: SchemaKind, name: &str) -> bool {
        match kind {
            SchemaKind::PropertyKey => self.property_keys.contains_key(name),
            SchemaKind::VertexLabel => self.vertex_labels.contains_key(name),
            SchemaKind::EdgeLabel => self.edge_labels.contains_key(name),
            SchemaKind::IndexLabel => self.index_labels.contains_key(name),
        }
    }

    pub fn count(&self, kind: SchemaKind) -> usize {
        match kind {
            SchemaKind::PropertyKey => self.property_keys.len(),
            SchemaKind::VertexLabel => self.vertex_labels.len(),
            SchemaKind::EdgeLabel => self.edge_labels.len(),
            SchemaKind::IndexLabel => self.index_labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        SchemaKind::all().iter().all(|kind| self.count(*kind) == 0)
    }

    pub fn clear(&mut self) {
        *self = SchemaSnapshot::default();
    }
}
