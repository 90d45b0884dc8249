use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{bail, Context, Result};
use reqwest::Client;
use tokio::task::JoinSet;

use crate::{
    config::Config,
    extract,
    frontier::Frontier,
    http,
    sink::{Classification, Sink},
    urlnorm,
};

/// How long an idle worker waits before re-checking the queue.
const IDLE_POLL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy)]
pub struct CrawlSummary {
    /// Successful fetches persisted to disk.
    pub pages_downloaded: u64,
    /// URLs claimed from the frontier, whatever the outcome.
    pub urls_visited: usize,
}

/// One crawl run: the frontier, the HTTP client, the sink, and the run-wide
/// counters all live on the instance, so independent crawls can coexist in
/// one process.
pub struct Crawler {
    config: Config,
    client: Client,
    frontier: Frontier,
    sink: Sink,
    pages_downloaded: AtomicU64,
    stop: AtomicBool,
}

impl Crawler {
    pub fn new(config: Config) -> Result<Self> {
        let domains = config.domain_set();
        let client = http::build_client(config.timeout, &domains)?;
        let sink = Sink::new(&config.raw_output)?;
        let frontier = Frontier::new(domains, config.extension_set());
        Ok(Self {
            config,
            client,
            frontier,
            sink,
            pages_downloaded: AtomicU64::new(0),
            stop: AtomicBool::new(false),
        })
    }

    /// Seed the frontier with `start_url` and drive the worker pool until
    /// the reachable set is exhausted or the page cap is hit.
    pub async fn run(self) -> Result<CrawlSummary> {
        let workers = self.config.worker_count();
        tracing::info!(start_url = %self.config.start_url, workers, "starting crawl");

        if !self.frontier.enqueue(&self.config.start_url) {
            tracing::warn!(
                start_url = %self.config.start_url,
                "start URL not admitted by the frontier; nothing to crawl"
            );
        }

        let this = Arc::new(self);
        let mut pool: JoinSet<Result<()>> = JoinSet::new();
        for id in 0..workers {
            let crawler = Arc::clone(&this);
            pool.spawn(async move { crawler.worker(id).await });
        }

        let mut failed = 0usize;
        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined.context("crawl worker panicked")? {
                failed += 1;
                tracing::warn!(%err, "worker exited with error");
            }
        }
        if failed == workers {
            bail!("all {workers} crawl workers failed");
        }

        let summary = CrawlSummary {
            pages_downloaded: this.pages_downloaded.load(Ordering::SeqCst),
            urls_visited: this.frontier.visited_count(),
        };
        tracing::info!(
            pages = summary.pages_downloaded,
            visited = summary.urls_visited,
            "crawl finished"
        );
        Ok(summary)
    }

    /// Page cap, applied whenever `max_pages` is non-negative; `max_pages`
    /// of zero therefore stops before the first fetch. Soft with N workers:
    /// up to N-1 fetches already in flight may still complete.
    fn cap_reached(&self) -> bool {
        self.config.max_pages >= 0
            && self.pages_downloaded.load(Ordering::SeqCst) as i64 >= self.config.max_pages
    }

    async fn worker(&self, id: usize) -> Result<()> {
        loop {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            let url = match self.frontier.claim() {
                Some(url) => url,
                None => {
                    if self.frontier.should_stop() {
                        self.stop.store(true, Ordering::SeqCst);
                        break;
                    }
                    tokio::time::sleep(IDLE_POLL).await;
                    continue;
                }
            };

            if self.cap_reached() {
                self.frontier.release();
                self.stop.store(true, Ordering::SeqCst);
                break;
            }

            // Release in every outcome, including a fatal disk error, so the
            // termination predicate stays reachable for surviving workers.
            let res = self.process(&url).await;
            self.frontier.release();
            res?;
        }
        tracing::debug!(worker = id, "worker exiting");
        Ok(())
    }

    /// Claim-to-release body for one URL: fetch, persist, extract, enqueue,
    /// count, then observe the politeness delay.
    async fn process(&self, url: &str) -> Result<()> {
        let parsed = match urlnorm::parse(url) {
            Some(p) => p,
            None => return Ok(()),
        };

        match http::fetch_page(&self.client, url).await {
            Ok(page) if page.body.is_empty() => {}
            Ok(page) => {
                let artifact = self.sink.persist(&parsed, &page.body, &page.content_type)?;
                if artifact.classification == Classification::Html {
                    let html = String::from_utf8_lossy(&page.body);
                    for link in extract::extract_links(&parsed, &html) {
                        self.frontier.enqueue(&link);
                    }
                }
                let done = self.pages_downloaded.fetch_add(1, Ordering::SeqCst) + 1;
                if self.config.max_pages >= 0 && done as i64 >= self.config.max_pages {
                    self.stop.store(true, Ordering::SeqCst);
                }
            }
            Err(err) => {
                // No retry and no metadata row; the URL stays visited.
                tracing::warn!(url, %err, "fetch failed; skipping");
            }
        }

        if self.config.delay > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(self.config.delay)).await;
        }
        Ok(())
    }
}
