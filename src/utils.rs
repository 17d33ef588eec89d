//! Small helpers for logging, file naming and output directories.

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Longest slug used as a report file name.
pub const MAX_SLUG_LEN: usize = 80;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) and
/// get `"…(+N bytes)"` appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Convert a title to a file-name-safe slug.
///
/// Lowercases, keeps ASCII letters and digits, and joins the words with
/// single hyphens. The result is capped at [`MAX_SLUG_LEN`] characters.
///
/// ```ignore
/// assert_eq!(slugify_title("Hello World"), "hello-world");
/// assert_eq!(slugify_title("Test-Article!"), "test-article");
/// ```
pub fn slugify_title(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.len() <= MAX_SLUG_LEN {
        return slug;
    }
    slug[..MAX_SLUG_LEN].trim_end_matches('-').to_string()
}

/// Report file stem: the title's slug, or the URL's when the title is missing or has no usable characters.
pub fn report_slug(title: Option<&str>, url: &str) -> String {
    let from_title = title.map(slugify_title).unwrap_or_default();
    if !from_title.is_empty() {
        return from_title;
    }
    let from_url = slugify_title(url.trim_start_matches("https://").trim_start_matches("http://"));
    if from_url.is_empty() {
        "article".to_string()
    } else {
        from_url
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
