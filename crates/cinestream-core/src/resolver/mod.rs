//! Stream candidate resolution
//!
//! A [`StreamResolver`] turns a title into an unordered set of stream
//! candidates; [`resolve_candidates`] normalizes that set into a
//! [`CandidateSet`] ranked by ascending quality.

#[cfg(feature = "scraper")]
mod scraper;

#[cfg(feature = "scraper")]
pub use scraper::ScraperResolver;

use crate::{Error, MediaDescriptor, MediaKind, Result, StreamCandidate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use url::Url;

/// Request sent to the resolver collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub title: String,
    pub kind: MediaKind,
    pub year: Option<u16>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ResolveRequest {
    /// Season/episode pair, only for series with both present
    pub fn episode_coordinates(&self) -> Option<(u32, u32)> {
        match (self.kind, self.season, self.episode) {
            (MediaKind::Series, Some(s), Some(e)) => Some((s, e)),
            _ => None,
        }
    }
}

impl From<&MediaDescriptor> for ResolveRequest {
    fn from(media: &MediaDescriptor) -> Self {
        Self {
            title: media.title.clone(),
            kind: media.kind,
            year: media.year,
            season: media.season,
            episode: media.episode,
        }
    }
}

/// External service resolving titles to stream candidates
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Fetch candidates; order is not significant
    async fn resolve(&self, request: &ResolveRequest) -> Result<Vec<StreamCandidate>>;
}

/// Candidates ranked by ascending quality, unique by URL, never empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSet {
    candidates: Vec<StreamCandidate>,
}

impl CandidateSet {
    /// Sort ascending by quality and drop repeated URLs
    pub fn rank(mut candidates: Vec<StreamCandidate>) -> Result<Self> {
        candidates.sort_by_key(|c| c.quality);

        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(c.url.clone()));

        if candidates.is_empty() {
            return Err(Error::NoCandidates);
        }
        Ok(Self { candidates })
    }

    /// Lowest quality candidate, bound first for a fast start
    pub fn lowest(&self) -> &StreamCandidate {
        &self.candidates[0]
    }

    pub fn highest(&self) -> &StreamCandidate {
        &self.candidates[self.candidates.len() - 1]
    }

    pub fn find(&self, url: &Url) -> Option<&StreamCandidate> {
        self.candidates.iter().find(|c| &c.url == url)
    }

    pub fn as_slice(&self) -> &[StreamCandidate] {
        &self.candidates
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamCandidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Resolve and rank candidates for `request`
///
/// Failures are not retried; the caller surfaces them.
#[instrument(skip(resolver))]
pub async fn resolve_candidates(
    resolver: &dyn StreamResolver,
    request: &ResolveRequest,
) -> Result<CandidateSet> {
    let raw = resolver.resolve(request).await?;
    debug!(count = raw.len(), "Resolver returned candidates");

    let set = CandidateSet::rank(raw)?;
    info!(
        count = set.len(),
        lowest = %set.lowest().quality,
        highest = %set.highest().quality,
        "Stream candidates ranked"
    );
    Ok(set)
}
