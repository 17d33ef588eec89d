//! Outlet reference table: name → homepage → bias.
//!
//! Loaded once from a YAML list at startup and only read afterwards.
//!
//! ```yaml
//! - name: Reuters
//!   homepage: https://www.reuters.com
//!   bias: center
//! ```
//!
//! Homepages are normalized to a bare domain (no scheme, no `www.`, no path)
//! because the probe compares them against full result URLs.

use crate::error::LoadError;
use crate::models::{BiasLabel, OutletRecord};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

/// Outlet name, homepage and bias for every outlet the tool may search.
///
/// Names are unique and each homepage is stored as a bare lowercase host
/// without `www.`, so it can be matched against result URLs directly.
#[derive(Debug, Clone)]
pub struct BiasReference {
    outlets: Vec<OutletRecord>,
}

impl BiasReference {
    /// Build a table from records, normalizing homepages and rejecting duplicate names.
    pub fn new(records: Vec<OutletRecord>) -> Result<Self, LoadError> {
        let mut seen = HashSet::new();
        let mut outlets = Vec::with_capacity(records.len());
        for mut record in records {
            if !seen.insert(record.name.clone()) {
                return Err(LoadError::DuplicateOutlet(record.name));
            }
            record.homepage = normalize_homepage(&record.homepage)
                .ok_or_else(|| LoadError::EmptyHomepage(record.name.clone()))?;
            outlets.push(record);
        }
        Ok(Self { outlets })
    }

    /// Read a YAML list of `{name, homepage, bias}` records.
    ///
    /// # Returns
    ///
    /// The table, or a [`LoadError`] naming the file when it cannot be read,
    /// parsed or validated.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path_str = path.as_ref().display().to_string();
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|source| LoadError::Io {
            path: path_str.clone(),
            source,
        })?;
        let records: Vec<OutletRecord> =
            serde_yaml::from_str(&raw).map_err(|source| LoadError::Yaml {
                path: path_str,
                source,
            })?;
        let reference = Self::new(records)?;
        info!(
            outlets = reference.len(),
            center = reference.outlets(BiasLabel::Center).count(),
            left = reference.outlets(BiasLabel::Left).count(),
            right = reference.outlets(BiasLabel::Right).count(),
            "Loaded bias reference table"
        );
        Ok(reference)
    }

    /// Names of every outlet with the given bias, in table order.
    pub fn all(&self, bias: BiasLabel) -> Vec<&str> {
        self.outlets(bias).map(|o| o.name.as_str()).collect()
    }

    /// Homepage of the named outlet.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(|o| o.homepage.as_str())
    }

    /// Full record of the named outlet.
    pub fn get(&self, name: &str) -> Option<&OutletRecord> {
        self.outlets.iter().find(|o| o.name == name)
    }

    pub fn outlets(&self, bias: BiasLabel) -> impl Iterator<Item = &OutletRecord> {
        self.outlets.iter().filter(move |o| o.bias == bias)
    }

    pub fn len(&self) -> usize {
        self.outlets.len()
    }
}

/// Reduce `https://www.example.com/news/` or `www.example.com` to `example.com`.
pub fn normalize_homepage(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let host = Url::parse(&with_scheme).ok()?.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() { None } else { Some(host) }
}
