use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::ConfigError;

/// Location of the pipeline config relative to the repo root.
pub const CONFIG_RELATIVE_PATH: &str = "config/pipeline.json";

const DEFAULT_EXTENSIONS: &[&str] = &[
    ".html", ".htm", ".php", ".asp", ".aspx", ".jsp", ".pdf", ".txt", ".json", ".csv", ".xml",
    ".doc", ".docx", ".ppt", ".pptx", ".xls", ".xlsx", ".rtf", ".srt", ".vtt", ".jpg", ".jpeg",
    ".png", ".gif", ".svg", ".zip", ".tar", ".gz", ".mp3", ".mp4",
];

/// Crawl configuration, deserialized from `config/pipeline.json`.
///
/// Every key is optional; unknown keys are ignored. Defaults target the
/// BGSU campus crawl that this pipeline was built around.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub start_url: String,
    pub allowed_domains: Vec<String>,
    pub raw_output: PathBuf,
    pub max_pages: i64,
    /// Per-worker sleep (seconds) after each fetch. With N workers the
    /// effective spacing between requests to the site is delay/N.
    pub delay: f64,
    pub timeout: f64,
    /// Worker-pool size; non-positive means "use hardware concurrency".
    pub crawler_threads: i64,
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_url: "https://www.bgsu.edu".to_string(),
            allowed_domains: vec!["www.bgsu.edu".to_string(), "bgsu.edu".to_string()],
            raw_output: PathBuf::from("data/raw"),
            max_pages: -1,
            delay: 0.25,
            timeout: 20.0,
            crawler_threads: 0,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Number of workers to spawn, resolving the hardware-concurrency
    /// fallback for non-positive `crawler_threads`.
    pub fn worker_count(&self) -> usize {
        if self.crawler_threads > 0 {
            self.crawler_threads as usize
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    /// Allowed-domain set, lowercased for case-insensitive host matching.
    pub fn domain_set(&self) -> HashSet<String> {
        self.allowed_domains
            .iter()
            .map(|d| d.to_ascii_lowercase())
            .collect()
    }

    /// Allowed-extension set, each entry dot-prefixed and lowercased.
    pub fn extension_set(&self) -> HashSet<String> {
        self.extensions
            .iter()
            .map(|e| {
                let e = e.to_ascii_lowercase();
                if e.starts_with('.') {
                    e
                } else {
                    format!(".{e}")
                }
            })
            .collect()
    }

    fn normalize(&mut self, repo_root: &Path) {
        for d in &mut self.allowed_domains {
            *d = d.to_ascii_lowercase();
        }
        for e in &mut self.extensions {
            *e = e.to_ascii_lowercase();
            if !e.starts_with('.') {
                *e = format!(".{e}");
            }
        }
        if self.raw_output.is_relative() {
            self.raw_output = repo_root.join(&self.raw_output);
        }
    }
}

/// Walk upward from `start` looking for an ancestor that contains
/// `config/pipeline.json`. That ancestor anchors all relative output paths.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if d.join(CONFIG_RELATIVE_PATH).is_file() {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}

/// Load the config for a run rooted at `start_dir`.
///
/// A missing or unreadable file yields defaults (with a log line); a file
/// that exists but is not valid JSON is the one fatal condition.
pub fn load(start_dir: &Path) -> Result<Config, ConfigError> {
    let repo_root = match find_repo_root(start_dir) {
        Some(root) => root,
        None => {
            tracing::warn!(
                dir = %start_dir.display(),
                "no {CONFIG_RELATIVE_PATH} found in any ancestor; using defaults"
            );
            let mut config = Config::default();
            config.normalize(start_dir);
            return Ok(config);
        }
    };

    let path = repo_root.join(CONFIG_RELATIVE_PATH);
    let mut config = match fs::read_to_string(&path) {
        Ok(text) => {
            serde_json::from_str::<Config>(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "config unreadable; using defaults");
            Config::default()
        }
    };

    config.normalize(&repo_root);
    Ok(config)
}
