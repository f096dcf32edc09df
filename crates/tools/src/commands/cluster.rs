use std::sync::Arc;

use anyhow::{Context, Result, bail};
use compute::annotate;
use foundation::ids::PageId;
use layers::HeadlessMap;
use narrative::{Enricher, MessageLog, OpenAiClient};
use pipeline::{ClusterPage, Config, FeatureCache, Source, Stage};
use serde::Serialize;
use survey::ClusterList;
use tracing::warn;

use crate::cli::{Cli, ClusterArgs};

#[derive(Serialize)]
struct Report<'a> {
    page: PageId,
    stage: String,
    features: usize,
    attributes: &'a [String],
    sizes: Vec<usize>,
    clusters: &'a ClusterList,
    error: Option<&'a str>,
}

fn config(args: &ClusterArgs) -> Config {
    let mut config = Config::from_env();
    if let Some(geojson) = &args.geojson {
        config.geojson = geojson.clone();
    }
    if let Some(k) = args.clusters {
        config.cluster_count = k;
    }
    if let Some(normalization) = args.normalization {
        config.normalization = normalization;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config
}

pub async fn run(cli: &Cli, args: &ClusterArgs) -> Result<()> {
    let config = config(args);
    let page = PageId::new(args.page).context("page must be 1..=3")?;
    let enricher = if args.narrate {
        let Some(openai) = config.openai() else {
            bail!("--narrate needs SITESEL_LLM_API_KEY");
        };
        Some(Enricher::new(Arc::new(OpenAiClient::new(openai))).with_timeout(config.llm_timeout))
    } else {
        None
    };

    let mut store = super::survey_store(cli)?;
    let mut cache = FeatureCache::new(config.fetch_timeout);
    let features = cache.get(&Source::parse(&config.geojson)).await;
    if features.is_empty() {
        warn!(source = %config.geojson, "no features, nothing to cluster");
    }

    let mut map = HeadlessMap::loaded();
    let mut cluster_page = ClusterPage::new(page, &config, Arc::clone(&features));
    let stage = cluster_page
        .mount(&mut store, &mut map)
        .with_context(|| format!("cluster {page}"))?;

    let mut messages = MessageLog::new();
    if let Some(enricher) = &enricher
        && stage >= Stage::Clustered
    {
        // A failed narrative leaves the clusters as computed.
        if let Err(err) = cluster_page
            .retry_analysis(&mut store, enricher, &mut messages)
            .await
        {
            warn!("narratives unavailable: {err}");
        }
    }

    if let Some(path) = &args.export {
        let Some(layer) = cluster_page.layer() else {
            bail!("{page} produced no clusters to export");
        };
        let annotated = annotate(layer, &features).to_geojson_string_pretty()?;
        tokio::fs::write(path, annotated)
            .await
            .with_context(|| format!("write {}", path.display()))?;
    }

    let snapshot = store.snapshot();
    let report = Report {
        page,
        stage: format!("{:?}", cluster_page.stage()),
        features: features.len(),
        attributes: cluster_page.layer().map(|l| l.attributes()).unwrap_or(&[]),
        sizes: cluster_page
            .layer()
            .map(|l| l.cluster_sizes())
            .unwrap_or_default(),
        clusters: snapshot.cluster_list(page),
        error: cluster_page.last_error(),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }

    cluster_page.unmount(&mut store, &mut map);
    Ok(())
}

fn print_table(report: &Report<'_>) {
    println!(
        "{}: {} features on [{}], stage {}",
        report.page,
        report.features,
        report.attributes.join(", "),
        report.stage
    );
    for (i, item) in report.clusters.list.iter().enumerate() {
        let color = item.color.map(|c| c.to_string()).unwrap_or_default();
        let size = report.sizes.get(i).copied().unwrap_or(0);
        let centroids: Vec<String> = item
            .centroids
            .iter()
            .map(|c| format!("{}={:.3}", c.name, c.value))
            .collect();
        println!("  {:<10} {color:<8} {size:>6}  {}", item.name, centroids.join(" "));
        if !item.reasoning.is_empty() {
            println!("             {}", item.reasoning);
        }
    }
    if let Some(err) = report.error {
        println!("  last error: {err}");
    }
}
