//! Orchestration of a discovery run.
//!
//! ```text
//! summarize ─▶ alternates ─▶ sample ─┬─▶ probe outlet 1 ─▶ collect ─┐
//!                                    ├─▶ probe outlet 2 ─▶ collect ─┼─▶ coherence filter
//!                                    └─▶ ...                        ┘
//! ```
//!
//! Outlets are probed through a `buffered` stream, so results stay in sample
//! order whatever the concurrency. Each outlet's URLs are collected as soon as
//! its probe finishes; when the optional deadline expires, the filter runs on
//! whatever articles were collected up to then. A URL accepted before the
//! deadline still counts as found even if its article was never fetched.

use super::coherence;
use super::collector::{MIN_ARTICLE_WORDS, collect};
use super::probe::{AcceptedUrls, Pacer, QueryProbe};
use super::resolver::alternates;
use super::sampler::sample;
use crate::collaborators::{Extractor, SearchProvider, Summarizer};
use crate::error::DiscoveryError;
use crate::models::{CandidateArticle, CoherentSet, DiscoveryRequest, SearchCandidate, ValidatedUrl};
use crate::reference::BiasReference;
use crate::similarity::{DocumentSimilarity, FuzzyMatcher};
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{info, instrument, warn};

/// Outlets sampled per alternate bias.
pub const DEFAULT_SAMPLE_SIZE: usize = 5;
/// Gap between search requests.
pub const DEFAULT_SEARCH_PAUSE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub sample_size: usize,
    /// Probes in flight at once; 1 probes outlets one after another.
    pub probe_concurrency: usize,
    pub search_pause: Duration,
    pub min_words: usize,
    /// Overall budget for a run. `None` waits for every probe.
    pub timeout: Option<Duration>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            probe_concurrency: 1,
            search_pause: DEFAULT_SEARCH_PAUSE,
            min_words: MIN_ARTICLE_WORDS,
            timeout: None,
        }
    }
}

/// Borrowed handles to every collaborator a run needs.
///
/// Production runs pass [`PartialRatio`](crate::similarity::PartialRatio) and
/// [`TfidfCosine`](crate::similarity::TfidfCosine) for `matcher` and `similarity`.
pub struct Collaborators<'a, S, E, Z, M, D> {
    pub search: &'a S,
    pub extractor: &'a E,
    pub summarizer: &'a Z,
    pub matcher: &'a M,
    pub similarity: &'a D,
}

/// Finds coverage of a story from outlets whose bias differs from the source's.
///
/// Holds the read-only reference table, the collaborators and one [`Pacer`]
/// shared by every search of a run.
///
/// # Errors
///
/// [`discover`](Self::discover) returns
/// - [`DiscoveryError::InsufficientSources`] when the table is too small for the sample size
/// - [`DiscoveryError::NoAlternativeArticlesFound`] when summarizing fails or no search result is accepted
/// - [`DiscoveryError::NoSimilarArticles`] when fewer than two collected articles agree on the topic
pub struct DiscoveryPipeline<'a, S, E, Z, M, D> {
    reference: &'a BiasReference,
    collaborators: Collaborators<'a, S, E, Z, M, D>,
    pacer: Pacer,
    settings: DiscoverySettings,
}

impl<'a, S, E, Z, M, D> DiscoveryPipeline<'a, S, E, Z, M, D>
where
    S: SearchProvider,
    E: Extractor,
    Z: Summarizer,
    M: FuzzyMatcher,
    D: DocumentSimilarity,
{
    pub fn new(
        reference: &'a BiasReference,
        collaborators: Collaborators<'a, S, E, Z, M, D>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            reference,
            collaborators,
            pacer: Pacer::new(settings.search_pause),
            settings,
        }
    }

    /// Find coverage of the request's story from outlets of the other two biases.
    #[instrument(level = "info", skip_all, fields(url = %request.original_url, bias = %request.original_bias))]
    pub async fn discover<R: Rng + ?Sized>(
        &self,
        request: &DiscoveryRequest,
        rng: &mut R,
    ) -> Result<CoherentSet, DiscoveryError> {
        let started = Instant::now();
        let deadline = self.settings.timeout.map(|t| started + t);

        let summary = match within(deadline, self.collaborators.summarizer.query_digest(&request.original_text)).await {
            Some(Ok(summary)) => summary,
            Some(Err(e)) => {
                warn!(error = %e, "Could not summarize source article");
                return Err(DiscoveryError::NoAlternativeArticlesFound);
            }
            None => {
                warn!("Deadline passed while summarizing source article");
                return Err(DiscoveryError::NoAlternativeArticlesFound);
            }
        };

        let biases = alternates(request.original_bias);
        let sampled = sample(self.reference, &biases, self.settings.sample_size, rng)?;
        let candidates: Vec<SearchCandidate> = sampled
            .iter()
            .map(|s| SearchCandidate::new(&summary, &request.original_date, s))
            .collect();
        info!(outlets = candidates.len(), query = %summary, "Probing sampled outlets");

        let (validated, articles, timed_out) = self.probe_and_collect(request, &candidates, deadline).await;

        if validated.is_empty() {
            warn!(timed_out, "No search result matched a sampled outlet");
            return Err(DiscoveryError::NoAlternativeArticlesFound);
        }
        info!(
            validated = validated.len(),
            collected = articles.len(),
            timed_out,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Probing finished"
        );

        coherence::filter(articles, self.collaborators.similarity)
    }

    async fn probe_and_collect(
        &self,
        request: &DiscoveryRequest,
        candidates: &[SearchCandidate],
        deadline: Option<Instant>,
    ) -> (Vec<ValidatedUrl>, Vec<CandidateArticle>, bool) {
        let accepted = AcceptedUrls::default();
        let probe = QueryProbe::new(
            self.collaborators.search,
            self.collaborators.matcher,
            &self.pacer,
        );
        let (accepted, probe) = (&accepted, &probe);

        let per_outlet = stream::iter(candidates)
            .map(|candidate| async move {
                let validated = probe.probe(&request.original_url, candidate, accepted).await;
                collect(self.collaborators.extractor, &validated, self.settings.min_words).await
            })
            .buffered(self.settings.probe_concurrency.max(1));
        let mut per_outlet = pin!(per_outlet);

        let mut articles = Vec::new();
        let mut timed_out = false;
        loop {
            match within(deadline, per_outlet.next()).await {
                Some(Some(collected)) => articles.extend(collected),
                Some(None) => break,
                None => {
                    warn!(collected = articles.len(), "Discovery deadline reached; using articles collected so far");
                    timed_out = true;
                    break;
                }
            }
        }

        // includes URLs whose outlet was cut off by the deadline before collection finished
        (accepted.snapshot(), articles, timed_out)
    }
}

/// Await `fut`, giving up with `None` once `deadline` passes.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}
