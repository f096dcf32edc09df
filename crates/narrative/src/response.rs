use serde::Deserialize;
use survey::ClusterList;

use crate::error::NarrativeError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClusterNarrative {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub reasoning: String,
}

/// The JSON object the model is asked to answer with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NarrativeResponse {
    pub clusters: Vec<ClusterNarrative>,
}

impl NarrativeResponse {
    pub fn parse(content: &str) -> Result<Self, NarrativeError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Applies names and reasoning to a copy of `list`.
    ///
    /// Entries are matched by id when every entry has one, otherwise by
    /// position. Either way each cluster must receive exactly one narrative,
    /// or nothing is applied.
    pub fn merge_into(&self, list: &ClusterList) -> Result<ClusterList, NarrativeError> {
        if self.clusters.len() != list.len() {
            return Err(NarrativeError::Misaligned {
                expected: list.len(),
                got: self.clusters.len(),
            });
        }

        let mut out = list.clone();
        let keyed = self.clusters.iter().all(|c| c.id.is_some());
        if keyed {
            let mut seen = vec![false; out.len()];
            for narrative in &self.clusters {
                let id = narrative.id.as_deref().unwrap_or_default();
                let index = out
                    .list
                    .iter()
                    .position(|item| item.id == id)
                    .filter(|&i| !seen[i])
                    .ok_or_else(|| NarrativeError::UnknownId(id.to_string()))?;
                seen[index] = true;
                out.list[index].name = narrative.name.clone();
                out.list[index].reasoning = narrative.reasoning.clone();
            }
        } else {
            for (item, narrative) in out.list.iter_mut().zip(&self.clusters) {
                item.name = narrative.name.clone();
                item.reasoning = narrative.reasoning.clone();
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::NarrativeResponse;
    use crate::error::NarrativeError;
    use foundation::color::Hex;
    use foundation::ids::PageId;
    use pretty_assertions::assert_eq;
    use survey::{Centroid, ClusterList, ClusterShape};

    fn list(k: usize) -> ClusterList {
        ClusterList::empty(PageId::ALL[0]).rebuilt(&ClusterShape {
            centroids: (0..k)
                .map(|i| {
                    vec![Centroid {
                        name: "hpsa_score".to_string(),
                        value: i as f64,
                    }]
                })
                .collect(),
            colors: vec![Hex::rgb(0, 0, 0); k],
        })
    }

    #[test]
    fn positional_merge() {
        let response = NarrativeResponse::parse(
            r#"{"clusters": [
                {"name": "Shortage core", "reasoning": "high scores"},
                {"name": "Covered", "reasoning": "low scores"}
            ]}"#,
        )
        .unwrap();
        let merged = response.merge_into(&list(2)).unwrap();
        assert_eq!(merged.list[0].name, "Shortage core");
        assert_eq!(merged.list[1].reasoning, "low scores");
        assert_eq!(merged.list[1].id, "cluster1-2");
    }

    #[test]
    fn keyed_merge_ignores_order() {
        let response = NarrativeResponse::parse(
            r#"{"clusters": [
                {"id": "cluster1-2", "name": "B", "reasoning": "b"},
                {"id": "cluster1-1", "name": "A", "reasoning": "a"}
            ]}"#,
        )
        .unwrap();
        let merged = response.merge_into(&list(2)).unwrap();
        assert_eq!(merged.list[0].name, "A");
        assert_eq!(merged.list[1].name, "B");
    }

    #[test]
    fn mismatches_are_rejected() {
        let short = NarrativeResponse::parse(r#"{"clusters": [{"name": "A", "reasoning": "a"}]}"#)
            .unwrap();
        assert_eq!(
            short.merge_into(&list(2)).unwrap_err(),
            NarrativeError::Misaligned { expected: 2, got: 1 }
        );

        let duplicate = NarrativeResponse::parse(
            r#"{"clusters": [
                {"id": "cluster1-1", "name": "A", "reasoning": "a"},
                {"id": "cluster1-1", "name": "B", "reasoning": "b"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            duplicate.merge_into(&list(2)).unwrap_err(),
            NarrativeError::UnknownId("cluster1-1".to_string())
        );
    }

    #[test]
    fn missing_clusters_key_is_malformed() {
        let err = NarrativeResponse::parse(r#"{"groups": []}"#).unwrap_err();
        assert!(matches!(err, NarrativeError::Malformed(_)));
    }
}
