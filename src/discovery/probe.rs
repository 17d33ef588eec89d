//! One search per sampled outlet, with result validation.
//!
//! At most two results are pulled for each query. A result is rejected as a
//! duplicate when it was already accepted or when it fuzzy-matches the source
//! article's URL above [`MATCH_THRESHOLD`]. A surviving result is accepted only
//! when it fuzzy-matches the outlet's homepage above the same threshold.
//!
//! ```text
//! first ──duplicate?──yes──▶ second ──duplicate?──yes──▶ nothing
//!   │                                    │no
//!   │no                                  ▼
//!   ▼                              homepage? ──yes──▶ accept second
//! homepage? ──yes──▶ accept first        │no
//!   │no                                  ▼
//!   ▼                                 nothing
//! second ──duplicate?──yes──▶ nothing
//!   │no
//!   ▼
//! homepage? ──yes──▶ accept second, else nothing
//! ```
//!
//! The order of the two checks matters and must not be swapped.

use crate::collaborators::SearchProvider;
use crate::models::{SearchCandidate, ValidatedUrl};
use crate::similarity::FuzzyMatcher;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, instrument, warn};

/// Partial-ratio score a URL must exceed to count as a match.
pub const MATCH_THRESHOLD: u8 = 80;
/// Results pulled per query.
pub const MAX_RESULTS: usize = 2;

/// Enforces a minimum gap between consecutive search requests.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last: tokio::sync::Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: tokio::sync::Mutex::new(None),
        }
    }

    /// Wait until `min_interval` has passed since the previous `wait` finished,
    /// i.e. since the previous search was allowed to start.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// URLs accepted so far in a discovery run, with their outlet. Append-only.
///
/// An accepted URL stays here even if the run is cut short before its
/// article is fetched.
#[derive(Debug, Default)]
pub struct AcceptedUrls {
    urls: Mutex<Vec<ValidatedUrl>>,
}

impl AcceptedUrls {
    pub fn contains(&self, url: &str) -> bool {
        self.urls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .any(|v| v.url == url)
    }

    pub fn push(&self, validated: ValidatedUrl) {
        self.urls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(validated);
    }

    /// Every accepted URL, in acceptance order.
    pub fn snapshot(&self) -> Vec<ValidatedUrl> {
        self.urls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Runs the search for one [`SearchCandidate`] and validates the results.
///
/// Borrowed collaborators are shared by every probe of a run; the [`Pacer`]
/// spaces out their searches.
pub struct QueryProbe<'a, S, M> {
    search: &'a S,
    matcher: &'a M,
    pacer: &'a Pacer,
}

impl<'a, S: SearchProvider, M: FuzzyMatcher> QueryProbe<'a, S, M> {
    pub fn new(search: &'a S, matcher: &'a M, pacer: &'a Pacer) -> Self {
        Self {
            search,
            matcher,
            pacer,
        }
    }

    /// Search for `candidate` and return the validated result, if any.
    ///
    /// Search failures are logged and yield an empty list.
    #[instrument(level = "info", skip_all, fields(outlet = %candidate.target_outlet.name, bias = %candidate.target_bias))]
    pub async fn probe(
        &self,
        original_url: &str,
        candidate: &SearchCandidate,
        accepted: &AcceptedUrls,
    ) -> Vec<ValidatedUrl> {
        self.pacer.wait().await;
        let mut results = match self.search.search(&candidate.query, MAX_RESULTS).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, query = %candidate.query, "Search failed; skipping outlet");
                return Vec::new();
            }
        };

        let homepage = &candidate.target_outlet.homepage;
        match self.select(original_url, homepage, &mut results, accepted) {
            Some(url) => {
                debug!(%url, "Accepted search result");
                let validated = ValidatedUrl {
                    url,
                    outlet_name: candidate.target_outlet.name.clone(),
                    bias: candidate.target_bias,
                };
                accepted.push(validated.clone());
                vec![validated]
            }
            None => {
                debug!("No search result belongs to the outlet");
                Vec::new()
            }
        }
    }

    /// Apply the two-result retry policy to `results`.
    pub fn select(
        &self,
        original_url: &str,
        homepage: &str,
        results: &mut impl Iterator<Item = String>,
        accepted: &AcceptedUrls,
    ) -> Option<String> {
        let first = results.next()?;
        if !self.is_duplicate(&first, original_url, accepted) && self.belongs_to(&first, homepage) {
            return Some(first);
        }
        let second = results.next()?;
        if self.is_duplicate(&second, original_url, accepted) || !self.belongs_to(&second, homepage) {
            return None;
        }
        Some(second)
    }

    fn is_duplicate(&self, url: &str, original_url: &str, accepted: &AcceptedUrls) -> bool {
        accepted.contains(url) || self.matcher.partial_ratio(original_url, url) > MATCH_THRESHOLD
    }

    fn belongs_to(&self, url: &str, homepage: &str) -> bool {
        url.contains(homepage) || self.matcher.partial_ratio(homepage, url) > MATCH_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::SearchResults;
    use crate::error::CollaboratorError;
    use crate::models::{BiasLabel, OutletRecord};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scores looked up from a table in either argument order; unknown pairs score 0.
    #[derive(Default)]
    struct TableMatcher {
        scores: HashMap<(String, String), u8>,
    }

    impl TableMatcher {
        fn with(mut self, a: &str, b: &str, score: u8) -> Self {
            self.scores.insert((a.to_string(), b.to_string()), score);
            self
        }
    }

    impl FuzzyMatcher for TableMatcher {
        fn partial_ratio(&self, a: &str, b: &str) -> u8 {
            self.scores
                .get(&(a.to_string(), b.to_string()))
                .or_else(|| self.scores.get(&(b.to_string(), a.to_string())))
                .copied()
                .unwrap_or(0)
        }
    }

    /// Returns the same URLs for every query and records the queries seen.
    struct FixedSearch {
        urls: Vec<String>,
        fail: bool,
        queries: RefCell<Vec<(String, usize)>>,
    }

    impl FixedSearch {
        fn new(urls: &[&str]) -> Self {
            Self {
                urls: urls.iter().map(|u| u.to_string()).collect(),
                fail: false,
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl SearchProvider for FixedSearch {
        async fn search(&self, query: &str, max_results: usize) -> Result<SearchResults, CollaboratorError> {
            self.queries.borrow_mut().push((query.to_string(), max_results));
            if self.fail {
                return Err(CollaboratorError::Unparseable("search backend down".to_string()));
            }
            Ok(self.urls.iter().take(max_results).cloned().collect::<Vec<_>>().into())
        }
    }

    const ORIGINAL: &str = "https://www.foxnews.com/politics/budget-vote";
    const HOMEPAGE: &str = "theguardian";

    fn candidate() -> SearchCandidate {
        SearchCandidate {
            query: "budget vote article June 2021 The Guardian".to_string(),
            target_outlet: OutletRecord {
                name: "The Guardian".to_string(),
                homepage: HOMEPAGE.to_string(),
                bias: BiasLabel::Left,
            },
            target_bias: BiasLabel::Left,
        }
    }

    fn earlier(url: &str) -> ValidatedUrl {
        ValidatedUrl {
            url: url.to_string(),
            outlet_name: "The Guardian".to_string(),
            bias: BiasLabel::Left,
        }
    }

    async fn run(search: &FixedSearch, matcher: &TableMatcher, accepted: &AcceptedUrls) -> Vec<ValidatedUrl> {
        let pacer = Pacer::new(Duration::ZERO);
        QueryProbe::new(search, matcher, &pacer)
            .probe(ORIGINAL, &candidate(), accepted)
            .await
    }

    #[tokio::test]
    async fn test_first_result_accepted() {
        let search = FixedSearch::new(&["https://g.example/a", "https://g.example/b"]);
        let matcher = TableMatcher::default().with(HOMEPAGE, "https://g.example/a", 95);
        let accepted = AcceptedUrls::default();
        let found = run(&search, &matcher, &accepted).await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://g.example/a");
        assert_eq!(found[0].outlet_name, "The Guardian");
        assert_eq!(found[0].bias, BiasLabel::Left);
        assert_eq!(accepted.snapshot(), found);
        assert_eq!(
            search.queries.borrow().as_slice(),
            &[(candidate().query, MAX_RESULTS)]
        );
    }

    #[tokio::test]
    async fn test_self_match_falls_through_to_second() {
        let first = "https://mirror.example/budget-vote";
        let second = "https://g.example/budget";
        let search = FixedSearch::new(&[first, second]);
        let matcher = TableMatcher::default()
            .with(ORIGINAL, first, 85)
            .with(HOMEPAGE, first, 99)
            .with(HOMEPAGE, second, 90);
        let found = run(&search, &matcher, &AcceptedUrls::default()).await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, second);
    }

    #[tokio::test]
    async fn test_self_match_at_threshold_is_not_a_duplicate() {
        let url = "https://g.example/budget-vote";
        let search = FixedSearch::new(&[url]);
        let matcher = TableMatcher::default()
            .with(ORIGINAL, url, MATCH_THRESHOLD)
            .with(HOMEPAGE, url, 95);
        let found = run(&search, &matcher, &AcceptedUrls::default()).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, url);

        let search = FixedSearch::new(&[url]);
        let matcher = TableMatcher::default()
            .with(ORIGINAL, url, MATCH_THRESHOLD + 1)
            .with(HOMEPAGE, url, 95);
        assert!(run(&search, &matcher, &AcceptedUrls::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_neither_result_matches_homepage() {
        let search = FixedSearch::new(&["https://a.example/1", "https://b.example/2"]);
        let matcher = TableMatcher::default()
            .with(HOMEPAGE, "https://a.example/1", 80)
            .with(HOMEPAGE, "https://b.example/2", 40);
        let found = run(&search, &matcher, &AcceptedUrls::default()).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_first_misses_homepage_second_accepted() {
        let search = FixedSearch::new(&["https://a.example/1", "https://g.example/2"]);
        let matcher = TableMatcher::default().with(HOMEPAGE, "https://g.example/2", 81);
        let found = run(&search, &matcher, &AcceptedUrls::default()).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://g.example/2");
    }

    #[tokio::test]
    async fn test_first_misses_homepage_second_is_self_match() {
        let second = "https://g.example/budget-vote";
        let search = FixedSearch::new(&["https://a.example/1", second]);
        let matcher = TableMatcher::default()
            .with(HOMEPAGE, second, 95)
            .with(ORIGINAL, second, 90);
        let found = run(&search, &matcher, &AcceptedUrls::default()).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_already_accepted_urls_are_skipped() {
        let first = "https://g.example/a";
        let second = "https://g.example/b";
        let search = FixedSearch::new(&[first, second]);
        let matcher = TableMatcher::default()
            .with(HOMEPAGE, first, 95)
            .with(HOMEPAGE, second, 95);
        let accepted = AcceptedUrls::default();
        accepted.push(earlier(first));
        let found = run(&search, &matcher, &accepted).await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, second);
        assert_eq!(accepted.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_both_duplicates_yield_nothing() {
        let first = "https://g.example/a";
        let second = "https://g.example/b";
        let search = FixedSearch::new(&[first, second]);
        let matcher = TableMatcher::default()
            .with(HOMEPAGE, first, 95)
            .with(HOMEPAGE, second, 95)
            .with(ORIGINAL, second, 100);
        let accepted = AcceptedUrls::default();
        accepted.push(earlier(first));
        assert!(run(&search, &matcher, &accepted).await.is_empty());
    }

    #[tokio::test]
    async fn test_homepage_substring_is_a_match() {
        let url = "https://www.theguardian.com/us-news/2021/jun/21/budget";
        let search = FixedSearch::new(&[url]);
        let found = run(&search, &TableMatcher::default(), &AcceptedUrls::default()).await;
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_results_yield_nothing() {
        let search = FixedSearch::new(&["https://a.example/1"]);
        let found = run(&search, &TableMatcher::default(), &AcceptedUrls::default()).await;
        assert!(found.is_empty());

        let search = FixedSearch::new(&[]);
        let found = run(&search, &TableMatcher::default(), &AcceptedUrls::default()).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_yields_nothing() {
        let mut search = FixedSearch::new(&["https://www.theguardian.com/x"]);
        search.fail = true;
        let found = run(&search, &TableMatcher::default(), &AcceptedUrls::default()).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_pacer_spaces_calls() {
        let pacer = Pacer::new(Duration::from_millis(30));
        let started = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
