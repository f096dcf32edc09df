use serde::{Deserialize, Serialize};

/// Name of a numeric feature property, e.g. `uninsured_rate`.
pub type AttributeName = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub name: AttributeName,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub category: String,
    /// 1-based; always `position + 1` inside a [`PreferenceList`].
    #[serde(default)]
    pub rank: usize,
    #[serde(default)]
    pub selected: bool,
    pub sub_categories: Vec<SubCategory>,
}

impl Preference {
    pub fn new(category: impl Into<String>, sub_categories: Vec<SubCategory>) -> Self {
        Self {
            category: category.into(),
            rank: 0,
            selected: false,
            sub_categories,
        }
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.sub_categories.iter().map(|s| s.name.as_str())
    }
}

/// Rank-ordered site conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceList {
    pub list: Vec<Preference>,
}

impl PreferenceList {
    pub fn new(list: Vec<Preference>) -> Self {
        let mut out = Self { list };
        out.renumber();
        out
    }

    /// The healthcare-shortage site conditions in their default ranking.
    pub fn healthcare_defaults() -> Self {
        fn pref(category: &str, subs: &[(&str, &str)]) -> Preference {
            Preference::new(
                category,
                subs.iter()
                    .map(|(name, label)| SubCategory {
                        name: name.to_string(),
                        label: label.to_string(),
                    })
                    .collect(),
            )
        }

        let mut out = Self::new(vec![
            pref("provider shortage", &[("hpsa_score", "shortage area score")]),
            pref("insurance coverage", &[("uninsured_rate", "uninsured residents")]),
            pref("household income", &[("median_household_income", "median income")]),
            pref("poverty", &[("poverty_rate", "residents below poverty line")]),
            pref("older adults", &[("population_65_plus", "residents aged 65+")]),
            pref("chronic disease", &[("diabetes_prevalence", "diabetes prevalence")]),
            pref("transit access", &[("transit_stop_density", "transit stops per km²")]),
            pref("population density", &[("population_density", "residents per km²")]),
        ]);
        out.list[0].selected = true;
        out
    }

    /// Accepts either `{"list": [...]}` or a bare array; ranks are
    /// recomputed from order.
    pub fn from_json_str(payload: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Wrapped { list: Vec<Preference> },
            Bare(Vec<Preference>),
        }
        let list = match serde_json::from_str(payload)? {
            Repr::Wrapped { list } | Repr::Bare(list) => list,
        };
        Ok(Self::new(list))
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn selected(&self) -> Option<&Preference> {
        self.list.iter().find(|p| p.selected)
    }

    /// Drag-reorder: moves the entry at `from` so it ends up at `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), OutOfRange> {
        let len = self.list.len();
        if from >= len || to >= len {
            return Err(OutOfRange {
                index: from.max(to),
                len,
            });
        }
        let item = self.list.remove(from);
        self.list.insert(to, item);
        self.renumber();
        Ok(())
    }

    /// At most one preference is selected at a time.
    pub fn select(&mut self, index: usize) -> Result<(), OutOfRange> {
        let len = self.list.len();
        if index >= len {
            return Err(OutOfRange { index, len });
        }
        for (i, p) in self.list.iter_mut().enumerate() {
            p.selected = i == index;
        }
        Ok(())
    }

    fn renumber(&mut self) {
        for (i, p) in self.list.iter_mut().enumerate() {
            p.rank = i + 1;
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("index {index} out of range for list of length {len}")]
pub struct OutOfRange {
    pub index: usize,
    pub len: usize,
}

#[cfg(test)]
mod tests {
    use super::PreferenceList;
    use pretty_assertions::assert_eq;

    fn categories(list: &PreferenceList) -> Vec<&str> {
        list.list.iter().map(|p| p.category.as_str()).collect()
    }

    #[test]
    fn defaults_are_ranked() {
        let list = PreferenceList::healthcare_defaults();
        assert_eq!(list.len(), 8);
        for (i, p) in list.list.iter().enumerate() {
            assert_eq!(p.rank, i + 1);
        }
        assert_eq!(list.selected().unwrap().category, "provider shortage");
    }

    #[test]
    fn reorder_moves_and_renumbers() {
        let mut list = PreferenceList::healthcare_defaults();
        list.reorder(0, 2).unwrap();
        assert_eq!(
            &categories(&list)[..3],
            &["insurance coverage", "household income", "provider shortage"]
        );
        assert_eq!(list.list[2].rank, 3);

        list.reorder(2, 0).unwrap();
        assert_eq!(categories(&list)[0], "provider shortage");
        assert!(list.reorder(0, 8).is_err());
    }

    #[test]
    fn loads_ranking_from_json() {
        let payload = r#"[
            {"category": "poverty", "rank": 7, "sub_categories": [{"name": "poverty_rate", "label": "poverty"}]},
            {"category": "insurance", "rank": 1, "selected": true, "sub_categories": []}
        ]"#;
        let list = PreferenceList::from_json_str(payload).unwrap();
        assert_eq!(categories(&list), vec!["poverty", "insurance"]);
        assert_eq!(list.list[0].rank, 1);
        assert_eq!(list.list[1].rank, 2);

        let wrapped = format!(r#"{{"list": {payload}}}"#);
        assert_eq!(PreferenceList::from_json_str(&wrapped).unwrap(), list);
    }

    #[test]
    fn select_is_exclusive() {
        let mut list = PreferenceList::healthcare_defaults();
        list.select(3).unwrap();
        assert_eq!(list.list.iter().filter(|p| p.selected).count(), 1);
        assert_eq!(list.selected().unwrap().category, "poverty");
        assert!(list.select(9).is_err());
    }
}
