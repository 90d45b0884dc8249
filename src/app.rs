use std::env;

use anyhow::{Context, Result};

use crate::{config, crawler::Crawler};

/// Process entry: discover the repo root from the working directory, load
/// the pipeline config, and run one crawl. All behavior is config-driven;
/// there is no flag surface.
pub async fn run() -> Result<()> {
    let cwd = env::current_dir().context("failed to determine working directory")?;
    let config = config::load(&cwd)?;

    let crawler = Crawler::new(config)?;
    crawler.run().await?;
    Ok(())
}
