use std::path::PathBuf;

use compute::Normalization;

/// Site-selection clustering over census tracts
#[derive(clap::Parser, Debug)]
#[command(name = "sitesel", version, about, propagate_version = true)]
pub struct Cli {
    /// Ranked preference list as JSON (defaults to the healthcare ranking)
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub preferences: Option<PathBuf>,

    /// Move a preference before clustering, e.g. `--move 5:0` (repeatable)
    #[arg(long = "move", global = true, value_parser = parse_move)]
    pub moves: Vec<(usize, usize)>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Print the attributes each cluster page works on
    Pages,

    /// Print the ranked preference list
    Preferences,

    /// Cluster one page's tracts and print the resulting clusters
    Cluster(ClusterArgs),
}

#[derive(clap::Args, Debug)]
pub struct ClusterArgs {
    /// Cluster page, 1..=3
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub page: u8,

    /// GeoJSON URL or path (overrides SITESEL_GEOJSON)
    #[arg(long)]
    pub geojson: Option<String>,

    /// Number of clusters (overrides SITESEL_CLUSTER_COUNT)
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,

    /// none, minmax or zscore (overrides SITESEL_NORMALIZATION)
    #[arg(long)]
    pub normalization: Option<Normalization>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Ask the language model to name and explain the clusters
    #[arg(long)]
    pub narrate: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Write the tracts with `cluster` and `color` properties added
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub export: Option<PathBuf>,
}

fn parse_move(s: &str) -> Result<(usize, usize), String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got {s:?}"))?;
    let index = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|e| format!("bad index {v:?}: {e}"))
    };
    Ok((index(from)?, index(to)?))
}
