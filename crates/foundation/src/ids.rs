/// One of the three cluster pages, numbered 1..=3 in the UI.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(u8);

impl PageId {
    pub const COUNT: usize = 3;
    pub const ALL: [PageId; Self::COUNT] = [PageId(1), PageId(2), PageId(3)];

    /// Returns `None` outside `1..=3`.
    pub fn new(number: u8) -> Option<Self> {
        (1..=Self::COUNT as u8).contains(&number).then_some(PageId(number))
    }

    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index + 1).ok().and_then(Self::new)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// 0-based position, used to index per-page tables.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Section name used for routing and list names (`cluster1` ..).
    pub fn section_name(self) -> &'static str {
        match self.0 {
            1 => "cluster1",
            2 => "cluster2",
            _ => "cluster3",
        }
    }

    pub fn from_section_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.section_name() == name)
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.section_name())
    }
}

impl serde::Serialize for PageId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.section_name())
    }
}

impl<'de> serde::Deserialize<'de> for PageId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PageId::from_section_name(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown cluster page: {s}")))
    }
}

/// Mount generation of a page. Bumped on every mount/unmount.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(pub u64);

impl Epoch {
    pub fn next(self) -> Self {
        Epoch(self.0.wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::{Epoch, PageId};

    #[test]
    fn page_ids_are_bounded() {
        assert!(PageId::new(0).is_none());
        assert!(PageId::new(4).is_none());
        assert_eq!(PageId::new(2).unwrap().index(), 1);
        assert_eq!(PageId::from_index(2), PageId::new(3));
        assert!(PageId::from_index(3).is_none());
    }

    #[test]
    fn section_names_round_trip() {
        for page in PageId::ALL {
            assert_eq!(PageId::from_section_name(page.section_name()), Some(page));
        }
        assert!(PageId::from_section_name("home").is_none());
    }

    #[test]
    fn serializes_as_section_name() {
        let page = PageId::new(3).unwrap();
        assert_eq!(serde_json::to_string(&page).unwrap(), "\"cluster3\"");
        let back: PageId = serde_json::from_str("\"cluster1\"").unwrap();
        assert_eq!(back.number(), 1);
        assert!(serde_json::from_str::<PageId>("\"home\"").is_err());
    }

    #[test]
    fn epoch_advances() {
        assert_eq!(Epoch::default().next(), Epoch(1));
    }
}
