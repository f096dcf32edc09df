use foundation::color::{Hex, Palette};
use foundation::ids::PageId;
use once_cell::sync::Lazy;

/// Route-level sections of the survey.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Section {
    Home,
    Explore,
    Cluster(PageId),
}

impl Section {
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_matches('/');
        match trimmed {
            "" => Some(Section::Home),
            "explore" => Some(Section::Explore),
            other => {
                let number = other.strip_prefix("cluster")?.trim_start_matches('/');
                let number = if number.is_empty() { "1" } else { number };
                number.parse().ok().and_then(PageId::new).map(Section::Cluster)
            }
        }
    }

    /// The section the "continue" button leads to.
    pub fn next(self) -> Self {
        match self {
            Section::Home => Section::Explore,
            Section::Explore => Section::Cluster(PageId::ALL[0]),
            Section::Cluster(page) => PageId::from_index(page.index() + 1)
                .map(Section::Cluster)
                .unwrap_or(Section::Home),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapSection {
    pub section: Section,
    /// Basemap layer whose features are hovered and clustered.
    pub parent_layer: &'static str,
    /// Categorical colors for cluster fills.
    pub categorized: Palette,
}

fn hexes(codes: &[&str]) -> Palette {
    Palette::new(
        codes
            .iter()
            .map(|c| Hex::parse(c).expect("section palette literal"))
            .collect(),
    )
}

static MAP_SECTIONS: Lazy<Vec<MapSection>> = Lazy::new(|| {
    vec![
        MapSection {
            section: Section::Home,
            parent_layer: "shortage-tracts",
            categorized: hexes(&["#c6dbef", "#6baed6", "#2171b5"]),
        },
        MapSection {
            section: Section::Explore,
            parent_layer: "shortage-tracts",
            categorized: hexes(&["#fdd0a2", "#fd8d3c", "#d94801"]),
        },
        MapSection {
            section: Section::Cluster(PageId::ALL[0]),
            parent_layer: "cluster1-tracts",
            categorized: hexes(&["#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#a65628"]),
        },
        MapSection {
            section: Section::Cluster(PageId::ALL[1]),
            parent_layer: "cluster2-tracts",
            categorized: hexes(&["#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02"]),
        },
        MapSection {
            section: Section::Cluster(PageId::ALL[2]),
            parent_layer: "cluster3-tracts",
            categorized: hexes(&["#8dd3c7", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69"]),
        },
    ]
});

pub fn map_sections() -> &'static [MapSection] {
    &MAP_SECTIONS
}

/// Panics when the section has no table entry; that is a wiring bug.
pub fn map_section(section: Section) -> &'static MapSection {
    map_sections()
        .iter()
        .find(|s| s.section == section)
        .unwrap_or_else(|| panic!("no map section configured for {section:?}"))
}

pub fn cluster_palette(page: PageId) -> &'static Palette {
    &map_section(Section::Cluster(page)).categorized
}
