use serde::Serialize;
use survey::{Centroid, ClusterList};

/// One cluster as the model sees it. Prior names and reasoning are left out
/// so a retry is not anchored on the previous answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptCluster {
    pub id: String,
    pub name: String,
    pub centroids: Vec<Centroid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content: Vec<PromptCluster>,
}

impl Prompt {
    pub fn for_clusters(list: &ClusterList) -> Self {
        Self {
            kind: "cluster",
            content: list
                .list
                .iter()
                .map(|item| PromptCluster {
                    id: item.id.clone(),
                    name: String::new(),
                    centroids: item.centroids.clone(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::Prompt;
    use foundation::color::Hex;
    use foundation::ids::PageId;
    use serde_json::json;
    use survey::{Centroid, ClusterList, ClusterShape};

    #[test]
    fn prompt_carries_centroids_only() {
        let mut list = ClusterList::empty(PageId::ALL[1]).rebuilt(&ClusterShape {
            centroids: vec![vec![Centroid {
                name: "poverty_rate".to_string(),
                value: 0.25,
            }]],
            colors: vec![Hex::rgb(0, 0, 0)],
        });
        list.list[0].name = "High poverty".to_string();
        list.list[0].reasoning = "because".to_string();

        let value: serde_json::Value =
            serde_json::from_str(&Prompt::for_clusters(&list).to_json()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "cluster",
                "content": [{
                    "id": "cluster2-1",
                    "name": "",
                    "centroids": [{"name": "poverty_rate", "value": 0.25}]
                }]
            })
        );
    }
}
