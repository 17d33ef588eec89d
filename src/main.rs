//! # Alt Bias News
//!
//! Classifies the political slant of a news article and looks for coverage of
//! the same story from outlets with a different bias.
//!
//! ## Usage
//!
//! ```sh
//! alt_bias_news --url https://www.foxnews.com/politics/... \
//!     --bias-table data/bias_reference.yaml --models models.json -j ./json
//! ```
//!
//! ## Architecture
//!
//! 1. **Extraction**: fetch the article and pull out text, title and publish period
//! 2. **Classification**: one-vs-rest models exclude a label, a one-vs-one model picks
//!    between the remaining two
//! 3. **Discovery**: summarize the article into a search query, sample outlets of the
//!    other two biases, search each one and keep the results that agree on the topic
//! 4. **Output**: classify the alternatives, digest them with the LLM and write a JSON report

use awful_aj::{config, config_dir, template};
use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod classifier;
mod cli;
mod collaborators;
mod context;
mod discovery;
mod error;
mod models;
mod outputs;
mod reference;
mod similarity;
mod utils;

use api::RetryPolicy;
use cli::Cli;
use collaborators::extract::HttpExtractor;
use collaborators::search::DuckDuckGoSearch;
use collaborators::summarize::LlmSummarizer;
use collaborators::{Extractor, Summarizer};
use context::AppContext;
use discovery::{Collaborators, DiscoveryPipeline, DiscoverySettings};
use error::DiscoveryError;
use models::{AlternativeArticle, CoherentSet, DiscoveryOutcome, DiscoveryReport, DiscoveryRequest};
use outputs::json;
use similarity::{PartialRatio, TfidfCosine};
use utils::{ensure_writable_dir, truncate_for_log};

const USER_AGENT: &str = concat!("alt_bias_news/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("alt_bias_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Err(e) = ensure_writable_dir(&args.json_output_dir).await {
        error!(
            path = %args.json_output_dir,
            error = %e,
            "JSON output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Reference table & models ----
    let ctx = AppContext::load(&args.bias_table, args.models.as_deref())?;
    if !ctx.classification_enabled() && args.bias.is_none() {
        error!("No model bundle and no --bias given; cannot assign a source bias");
        return Err(error::ClassificationError::Disabled.into());
    }

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let extractor = HttpExtractor::new(client.clone());

    // ---- Source article ----
    let source = extractor.extract(&args.url).await?;
    let text = source.text.clone().ok_or("source page has no article text")?;
    info!(
        words = collaborators::word_count(&text),
        title = ?source.title,
        publish_period = %source.publish_period,
        "Extracted source article"
    );

    let bias = ctx.source_bias(&text, args.bias)?;
    let mut report = DiscoveryReport {
        generated_at: Utc::now().to_rfc3339(),
        url: args.url.clone(),
        title: source.title.clone(),
        publish_period: source.publish_period.clone(),
        bias,
        outcome: DiscoveryOutcome::Skipped,
        alternatives: Vec::new(),
        summary: None,
    };

    if args.classify_only {
        info!("Classification only; skipping discovery");
        json::write_report(&report, &args.json_output_dir).await?;
        return Ok(());
    }

    // ---- Load templates & config ----
    let conf_file = match &args.config {
        Some(path) => PathBuf::from(path),
        None => config_dir()?.join("config.yaml"),
    };
    let config_path = conf_file.to_str().ok_or("Not a valid config filename")?;
    let config = config::load_config(config_path)?;
    info!(config_path, "Loaded configuration");
    let query_template = template::load_template(&args.query_template).await?;
    let digest_template = template::load_template(&args.digest_template).await?;
    info!(query = %args.query_template, digest = %args.digest_template, "Loaded templates");

    let summarizer = LlmSummarizer::new(config, query_template, digest_template, RetryPolicy::default());
    let search = DuckDuckGoSearch::new(client);

    // ---- Discovery ----
    let settings = DiscoverySettings {
        sample_size: args.sample_size,
        probe_concurrency: args.probe_concurrency,
        search_pause: args.search_pause(),
        min_words: args.min_words,
        timeout: args.timeout(),
    };
    let pipeline = DiscoveryPipeline::new(
        &ctx.reference,
        Collaborators {
            search: &search,
            extractor: &extractor,
            summarizer: &summarizer,
            matcher: &PartialRatio,
            similarity: &TfidfCosine,
        },
        settings,
    );
    let request = DiscoveryRequest {
        original_url: args.url.clone(),
        original_text: text,
        original_date: source.publish_period.clone(),
        original_bias: report.bias.label,
    };

    match pipeline.discover(&request, &mut rand::rng()).await {
        Ok(set) => {
            info!(articles = set.len(), "Found coverage from other outlets");
            report.outcome = DiscoveryOutcome::Found;
            report.alternatives = alternatives(&ctx, &set);
            if !args.skip_digest {
                report.summary = digest(&summarizer, &set).await;
            }
        }
        Err(DiscoveryError::NoAlternativeArticlesFound) => {
            warn!("No alternative articles found");
            report.outcome = DiscoveryOutcome::NoAlternativeArticlesFound;
        }
        Err(DiscoveryError::NoSimilarArticles) => {
            warn!("Alternative articles found, but none cover the same story");
            report.outcome = DiscoveryOutcome::NoSimilarArticles;
        }
        Err(e) => {
            error!(error = %e, "Discovery failed");
            return Err(e.into());
        }
    }

    let path = json::write_report(&report, &args.json_output_dir).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        outcome = ?report.outcome,
        alternatives = report.alternatives.len(),
        path = %path.display(),
        "Execution complete"
    );

    Ok(())
}

/// Report entries for a coherent set, each run through the classifier when enabled.
fn alternatives(ctx: &AppContext, set: &CoherentSet) -> Vec<AlternativeArticle> {
    set.members
        .iter()
        .map(|member| {
            let article = &member.article;
            let predicted_bias = ctx.predict(&article.text);
            info!(
                outlet = %article.outlet_name,
                outlet_bias = %article.bias,
                predicted = ?predicted_bias,
                url = %article.url,
                "Alternative article"
            );
            AlternativeArticle {
                title: article.title.clone(),
                url: article.url.clone(),
                outlet: article.outlet_name.clone(),
                outlet_bias: article.bias,
                predicted_bias,
                average_similarity: member.average_similarity,
            }
        })
        .collect()
}

async fn digest<Z: Summarizer>(summarizer: &Z, set: &CoherentSet) -> Option<String> {
    let texts: Vec<String> = set.articles().map(|a| a.text.clone()).collect();
    match summarizer.combined_digest(&texts).await {
        Ok(summary) => {
            info!(summary = %truncate_for_log(&summary, 300), "Built digest of alternatives");
            Some(summary)
        }
        Err(e) => {
            warn!(error = %e, "Could not digest alternative articles; continuing without summary");
            None
        }
    }
}
