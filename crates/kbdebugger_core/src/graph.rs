use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cytoscape-shaped subgraph returned by `GET /api/graph/subgraph`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubgraphPayload {
    #[serde(default)]
    pub elements: GraphElements,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphElements {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub data: EdgeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl EdgeData {
    fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .as_ref()
            .and_then(|props| props.get(key))
            .filter(|value| !value.is_null())
    }

    fn property_text(&self, key: &str) -> Option<&str> {
        self.property(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Supporting sentence, preferring `sentence` over `original_sentence`.
    pub fn sentence(&self) -> Option<&str> {
        self.property_text("sentence")
            .or_else(|| self.property_text("original_sentence"))
    }

    /// Relation name: `label` property, then `relation`, then the edge label.
    pub fn relation(&self) -> Value {
        self.property_text("label")
            .or_else(|| self.property_text("relation"))
            .map(|text| Value::String(text.to_string()))
            .unwrap_or_else(|| Value::String(self.label.clone()))
    }
}

/// One exported row: a unique supporting sentence with its edge provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub sentence: String,
    pub source: Value,
    pub page_number: Value,
    pub relation: Value,
    pub created_at: Value,
    pub last_updated_at: Value,
}

/// Sentences of a keyword's subgraph, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceExport {
    pub keyword: String,
    pub sentences: Vec<SentenceRecord>,
}

impl SubgraphPayload {
    pub fn node_count(&self) -> usize {
        self.elements.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.elements.edges.len()
    }

    /// Edge sentences, unique by text, in first-seen order.
    pub fn sentence_records(&self) -> Vec<SentenceRecord> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for edge in &self.elements.edges {
            let data = &edge.data;
            let Some(sentence) = data.sentence() else {
                continue;
            };
            if !seen.insert(sentence.to_string()) {
                continue;
            }
            let copy = |key: &str| data.property(key).cloned().unwrap_or(Value::Null);
            records.push(SentenceRecord {
                sentence: sentence.to_string(),
                source: copy("source"),
                page_number: copy("page_number"),
                relation: data.relation(),
                created_at: copy("created_at"),
                last_updated_at: copy("last_updated_at"),
            });
        }
        records
    }
}
