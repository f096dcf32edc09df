use anyhow::Result;
use compute::page_slice;
use foundation::ids::PageId;
use pipeline::Config;

use crate::cli::Cli;

pub fn run(cli: &Cli) -> Result<()> {
    let store = super::survey_store(cli)?;
    let config = Config::from_env();
    let snapshot = store.snapshot();
    for page in PageId::ALL {
        let slice = page_slice(page, &snapshot.preference_list, config.slice_size);
        if slice.is_empty() {
            println!("{page}: (no attributes, clustering skipped)");
            continue;
        }
        let names: Vec<String> = slice
            .iter()
            .map(|p| {
                let attributes: Vec<&str> = p.attribute_names().collect();
                format!("{} [{}]", p.category, attributes.join(", "))
            })
            .collect();
        println!("{page}: {}", names.join("; "));
    }
    Ok(())
}

pub fn preferences(cli: &Cli) -> Result<()> {
    let store = super::survey_store(cli)?;
    for (i, pref) in store.snapshot().preference_list.list.iter().enumerate() {
        let marker = if pref.selected { '*' } else { ' ' };
        println!("{marker}{:>2}. {} (index {i})", pref.rank, pref.category);
        for sub in &pref.sub_categories {
            println!("      {:<24} {}", sub.name, sub.label);
        }
    }
    Ok(())
}
