pub mod cluster;
pub mod pages;

use anyhow::{Context, Result};
use survey::{BoroughList, PreferenceList, SurveyCommand, SurveyStore};

use crate::cli::Cli;

/// Builds the survey store from `--preferences` and applies every `--move`.
pub fn survey_store(cli: &Cli) -> Result<SurveyStore> {
    let preferences = match &cli.preferences {
        Some(path) => {
            let payload = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            PreferenceList::from_json_str(&payload)
                .with_context(|| format!("parse {}", path.display()))?
        }
        None => PreferenceList::healthcare_defaults(),
    };
    let mut store = SurveyStore::new(preferences, BoroughList::new_york());
    for &(from, to) in &cli.moves {
        store
            .dispatch(SurveyCommand::ReorderPreference { from, to })
            .with_context(|| format!("--move {from}:{to}"))?;
    }
    Ok(store)
}
