use std::collections::BTreeMap;

use serde::Serialize;

use crate::layer::LayerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PropertyOp {
    Eq,
    Contains,
}

/// Property predicate, the subset of SDK filter expressions this crate emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyFilter {
    pub key: String,
    pub op: PropertyOp,
    pub value: String,
}

impl PropertyFilter {
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            op: PropertyOp::Eq,
            value: value.into(),
        }
    }

    pub fn matches(&self, properties: &BTreeMap<String, String>) -> bool {
        let Some(v) = properties.get(&self.key) else {
            return false;
        };
        match self.op {
            PropertyOp::Eq => *v == self.value,
            PropertyOp::Contains => v.contains(&self.value),
        }
    }
}

/// A feature as returned by the SDK's rendered-feature query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFeature {
    pub layer: LayerId,
    pub id: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl RenderedFeature {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
