use serde::{Deserialize, Serialize};

use crate::preference::OutOfRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoroughItem {
    pub id: String,
    pub name: String,
    pub checked: bool,
}

/// Boroughs the user wants to explore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoroughList {
    pub list: Vec<BoroughItem>,
}

impl BoroughList {
    pub fn new_york() -> Self {
        let list = [
            ("36005", "Bronx"),
            ("36047", "Brooklyn"),
            ("36061", "Manhattan"),
            ("36081", "Queens"),
            ("36085", "Staten Island"),
        ]
        .into_iter()
        .map(|(id, name)| BoroughItem {
            id: id.to_string(),
            name: name.to_string(),
            checked: true,
        })
        .collect();
        Self { list }
    }

    pub fn toggle(&mut self, index: usize, checked: bool) -> Result<(), OutOfRange> {
        let len = self.list.len();
        let item = self.list.get_mut(index).ok_or(OutOfRange { index, len })?;
        item.checked = checked;
        Ok(())
    }

    /// County FIPS prefixes of the checked boroughs.
    pub fn checked_ids(&self) -> impl Iterator<Item = &str> {
        self.list
            .iter()
            .filter(|b| b.checked)
            .map(|b| b.id.as_str())
    }
}
