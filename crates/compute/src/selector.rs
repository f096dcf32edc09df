use foundation::ids::PageId;
use survey::{AttributeName, Preference, PreferenceList};

/// Preferences handed to each cluster page.
pub const CLUSTERING_SIZE: usize = 3;

/// The preferences page `page` clusters on: rank positions
/// `[slice_size * (p - 1), slice_size * p)`, clamped to the list.
pub fn page_slice(page: PageId, preferences: &PreferenceList, slice_size: usize) -> &[Preference] {
    let len = preferences.len();
    let start = (slice_size * page.index()).min(len);
    let end = (start + slice_size).min(len);
    &preferences.list[start..end]
}

/// Attribute names page `page` clusters on, in rank order.
///
/// Pages past the end of the list get nothing, which skips clustering.
pub fn select_attributes(
    page: PageId,
    preferences: &PreferenceList,
    slice_size: usize,
) -> Vec<AttributeName> {
    page_slice(page, preferences, slice_size)
        .iter()
        .flat_map(|p| p.attribute_names().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CLUSTERING_SIZE, page_slice, select_attributes};
    use foundation::ids::PageId;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use survey::{Preference, PreferenceList, SubCategory};

    fn prefs(n: usize, subs_each: usize) -> PreferenceList {
        PreferenceList::new(
            (0..n)
                .map(|i| {
                    Preference::new(
                        format!("pref{i}"),
                        (0..subs_each)
                            .map(|s| SubCategory {
                                name: format!("attr{i}_{s}"),
                                label: String::new(),
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn eight_preferences_split_three_ways() {
        let list = PreferenceList::healthcare_defaults();
        let pages: Vec<Vec<String>> = PageId::ALL
            .iter()
            .map(|&p| select_attributes(p, &list, CLUSTERING_SIZE))
            .collect();

        assert_eq!(
            pages[0],
            vec!["hpsa_score", "uninsured_rate", "median_household_income"]
        );
        assert_eq!(
            pages[1],
            vec!["poverty_rate", "population_65_plus", "diabetes_prevalence"]
        );
        assert_eq!(pages[2], vec!["transit_stop_density", "population_density"]);
    }

    #[test]
    fn follows_reordering() {
        let mut list = PreferenceList::healthcare_defaults();
        list.reorder(7, 0).unwrap();
        let page1 = select_attributes(PageId::ALL[0], &list, CLUSTERING_SIZE);
        assert_eq!(page1[0], "population_density");
    }

    #[test]
    fn short_list_leaves_later_pages_empty() {
        let list = prefs(2, 2);
        assert_eq!(
            select_attributes(PageId::ALL[0], &list, 3),
            vec!["attr0_0", "attr0_1", "attr1_0", "attr1_1"]
        );
        assert!(select_attributes(PageId::ALL[1], &list, 3).is_empty());
        assert!(select_attributes(PageId::ALL[2], &list, 3).is_empty());
    }

    proptest! {
        #[test]
        fn slices_are_disjoint_and_rank_ordered(
            n in 0usize..20,
            slice in 1usize..6,
            moves in proptest::collection::vec((0usize..20, 0usize..20), 0..10),
        ) {
            let mut list = prefs(n, 1);
            for (from, to) in moves {
                let _ = list.reorder(from, to);
            }

            let mut seen_ranks = Vec::new();
            for page in PageId::ALL {
                for p in page_slice(page, &list, slice) {
                    seen_ranks.push(p.rank);
                }
            }
            // Strictly increasing ranks across pages: disjoint and ordered.
            prop_assert!(seen_ranks.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(seen_ranks.len(), n.min(slice * PageId::COUNT));
            if let Some(&first) = seen_ranks.first() {
                prop_assert_eq!(first, 1);
            }
        }
    }
}
