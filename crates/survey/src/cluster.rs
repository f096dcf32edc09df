use foundation::color::Hex;
use foundation::ids::PageId;
use serde::{Deserialize, Serialize};

use crate::preference::AttributeName;

/// One centroid coordinate, keyed by attribute so it stays meaningful
/// whatever the column order of the clustering matrix was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub name: AttributeName,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCheckboxItem {
    pub id: String,
    pub name: String,
    pub checked: bool,
    pub color: Option<Hex>,
    pub centroids: Vec<Centroid>,
    pub reasoning: String,
}

impl ClusterCheckboxItem {
    pub fn placeholder(page: PageId, index: usize) -> Self {
        Self {
            id: format!("{}-{}", page.section_name(), index + 1),
            name: format!("Cluster {}", index + 1),
            checked: true,
            color: None,
            centroids: Vec::new(),
            reasoning: String::new(),
        }
    }
}

/// Narrative text for one cluster, addressed by [`ClusterCheckboxItem::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterNaming {
    pub id: String,
    pub name: String,
    pub reasoning: String,
}

/// Centroids and colors of a fresh k-means run, row `i` describing cluster `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterShape {
    pub centroids: Vec<Vec<Centroid>>,
    pub colors: Vec<Hex>,
}

impl ClusterShape {
    pub fn cluster_count(&self) -> usize {
        self.centroids.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterList {
    pub page: PageId,
    pub list: Vec<ClusterCheckboxItem>,
}

impl ClusterList {
    pub fn empty(page: PageId) -> Self {
        Self {
            page,
            list: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.page.section_name()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn checked(&self) -> impl Iterator<Item = (usize, &ClusterCheckboxItem)> {
        self.list.iter().enumerate().filter(|(_, item)| item.checked)
    }

    /// Per-cluster centroids, the run a narrative prompt is built from.
    pub fn centroid_basis(&self) -> Vec<Vec<Centroid>> {
        self.list.iter().map(|item| item.centroids.clone()).collect()
    }

    pub fn namings(&self) -> Vec<ClusterNaming> {
        self.list
            .iter()
            .map(|item| ClusterNaming {
                id: item.id.clone(),
                name: item.name.clone(),
                reasoning: item.reasoning.clone(),
            })
            .collect()
    }

    /// Applies a fresh k-means run. Existing items keep their identity,
    /// label, checked flag and reasoning; centroids and colors are replaced.
    /// The list is resized to the run's cluster count.
    pub fn rebuilt(&self, shape: &ClusterShape) -> Self {
        let list = (0..shape.cluster_count())
            .map(|i| {
                let mut item = self
                    .list
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| ClusterCheckboxItem::placeholder(self.page, i));
                item.centroids = shape.centroids[i].clone();
                item.color = shape.colors.get(i).copied();
                item
            })
            .collect();
        Self {
            page: self.page,
            list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Centroid, ClusterList, ClusterShape};
    use foundation::color::Hex;
    use foundation::ids::PageId;

    fn shape(k: usize) -> ClusterShape {
        ClusterShape {
            centroids: (0..k)
                .map(|i| {
                    vec![Centroid {
                        name: "uninsured_rate".to_string(),
                        value: i as f64,
                    }]
                })
                .collect(),
            colors: (0..k).map(|i| Hex::rgb(i as u8, 0, 0)).collect(),
        }
    }

    #[test]
    fn rebuild_creates_placeholders() {
        let page = PageId::new(2).unwrap();
        let list = ClusterList::empty(page).rebuilt(&shape(3));
        assert_eq!(list.len(), 3);
        assert_eq!(list.list[0].id, "cluster2-1");
        assert_eq!(list.list[2].name, "Cluster 3");
        assert!(list.list.iter().all(|i| i.checked));
        assert_eq!(list.list[1].centroids[0].value, 1.0);
        assert_eq!(list.list[1].color, Some(Hex::rgb(1, 0, 0)));
    }

    #[test]
    fn rebuild_keeps_user_state() {
        let page = PageId::new(1).unwrap();
        let mut list = ClusterList::empty(page).rebuilt(&shape(3));
        list.list[1].checked = false;
        list.list[1].name = "Dense, underinsured".to_string();
        list.list[1].reasoning = "High uninsured rate".to_string();

        let rebuilt = list.rebuilt(&shape(2));
        assert_eq!(rebuilt.len(), 2);
        assert!(!rebuilt.list[1].checked);
        assert_eq!(rebuilt.list[1].name, "Dense, underinsured");
        assert_eq!(rebuilt.list[1].reasoning, "High uninsured rate");
    }

    #[test]
    fn checked_skips_unchecked() {
        let page = PageId::new(1).unwrap();
        let mut list = ClusterList::empty(page).rebuilt(&shape(3));
        list.list[0].checked = false;
        let idx: Vec<usize> = list.checked().map(|(i, _)| i).collect();
        assert_eq!(idx, vec![1, 2]);
    }
}
