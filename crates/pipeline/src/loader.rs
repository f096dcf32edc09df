use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use formats::{FeatureCollection, FeatureCollectionError};
use tracing::{error, info};

/// Where the tract FeatureCollection comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Source::Url(s.to_string())
        } else {
            Source::Path(PathBuf::from(s))
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] FeatureCollectionError),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

pub async fn try_load_features(
    client: &reqwest::Client,
    source: &Source,
    timeout: Duration,
) -> Result<FeatureCollection, LoadError> {
    let fetch = async {
        let bytes = match source {
            Source::Url(url) => {
                let resp = client.get(url).send().await?;
                if !resp.status().is_success() {
                    return Err(LoadError::Status(resp.status().as_u16()));
                }
                resp.bytes().await?.to_vec()
            }
            Source::Path(path) => tokio::fs::read(path).await?,
        };
        Ok::<_, LoadError>(FeatureCollection::from_geojson_slice(&bytes)?)
    };
    tokio::time::timeout(timeout, fetch)
        .await
        .unwrap_or(Err(LoadError::Timeout(timeout)))
}

/// Loads the FeatureCollection, degrading to an empty one on any failure.
pub async fn load_features(
    client: &reqwest::Client,
    source: &Source,
    timeout: Duration,
) -> Arc<FeatureCollection> {
    match try_load_features(client, source, timeout).await {
        Ok(features) => {
            info!(%source, features = features.len(), "features loaded");
            Arc::new(features)
        }
        Err(err) => {
            error!("feature load failed: {source} -> {err}");
            Arc::new(FeatureCollection::empty())
        }
    }
}

/// Session-wide memo of loaded collections. Failed loads are not cached, so a
/// later mount tries again.
pub struct FeatureCache {
    client: reqwest::Client,
    timeout: Duration,
    entries: HashMap<Source, Arc<FeatureCollection>>,
}

impl FeatureCache {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            entries: HashMap::new(),
        }
    }

    pub fn cached(&self, source: &Source) -> Option<Arc<FeatureCollection>> {
        self.entries.get(source).cloned()
    }

    pub async fn get(&mut self, source: &Source) -> Arc<FeatureCollection> {
        if let Some(hit) = self.cached(source) {
            return hit;
        }
        let features = load_features(&self.client, source, self.timeout).await;
        if !features.is_empty() {
            self.entries.insert(source.clone(), Arc::clone(&features));
        }
        features
    }
}
