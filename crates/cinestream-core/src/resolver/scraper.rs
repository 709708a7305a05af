//! HTTP scraper resolver
//!
//! Wire format:
//!
//! ```text
//! GET {endpoint}?title=..&type=movie|series[&season=N&episode=M]
//!
//! { "status": "success", "links": [{ "quality": "720", "url": "https://.." }] }
//! { "status": "error", "message": "Content not available" }
//! ```

use super::{ResolveRequest, StreamResolver};
use crate::{config::ResolverConfig, Error, Quality, Result, StreamCandidate};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

const DEFAULT_FAILURE: &str = "Failed to get stream links. The content might not be available.";

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    status: String,
    #[serde(default)]
    links: Option<Vec<RawLink>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    quality: RawQuality,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawQuality {
    Number(u32),
    Text(String),
}

impl RawQuality {
    fn parse(&self) -> Option<Quality> {
        match self {
            RawQuality::Number(n) => Some(Quality(*n)),
            RawQuality::Text(s) => Quality::parse(s),
        }
    }
}

/// Resolver backed by the scraper HTTP API
pub struct ScraperResolver {
    client: Client,
    config: ResolverConfig,
}

impl ScraperResolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: ResolverConfig) -> Self {
        Self { client, config }
    }

    fn query(request: &ResolveRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("title", request.title.clone()),
            ("type", request.kind.as_query_value().to_string()),
        ];
        if let Some((season, episode)) = request.episode_coordinates() {
            params.push(("season", season.to_string()));
            params.push(("episode", episode.to_string()));
        }
        params
    }

    /// Turn a decoded body into candidates, dropping malformed links
    fn candidates(response: ScrapeResponse) -> Result<Vec<StreamCandidate>> {
        if response.status != "success" {
            return Err(Error::resolver(
                response.message.unwrap_or_else(|| DEFAULT_FAILURE.to_string()),
            ));
        }

        let links = response.links.unwrap_or_default();
        if links.is_empty() {
            return Err(Error::NoCandidates);
        }

        let candidates: Vec<StreamCandidate> = links
            .into_iter()
            .filter_map(|link| {
                let Some(quality) = link.quality.parse() else {
                    warn!(quality = ?link.quality, "Dropping link with unparseable quality");
                    return None;
                };
                match Url::parse(&link.url) {
                    Ok(url) => Some(StreamCandidate { quality, url }),
                    Err(e) => {
                        warn!(url = %link.url, error = %e, "Dropping link with invalid URL");
                        None
                    }
                }
            })
            .collect();

        if candidates.is_empty() {
            return Err(Error::NoCandidates);
        }
        Ok(candidates)
    }
}

#[async_trait]
impl StreamResolver for ScraperResolver {
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    async fn resolve(&self, request: &ResolveRequest) -> Result<Vec<StreamCandidate>> {
        let mut builder = self
            .client
            .get(self.config.endpoint.clone())
            .query(&Self::query(request));
        for (name, value) in &self.config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ResolverStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let decoded: ScrapeResponse = serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, "Undecodable resolver response");
            Error::resolver("Scraper API returned an invalid response.")
        })?;

        Self::candidates(decoded)
    }
}
