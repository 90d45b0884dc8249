use std::{collections::HashSet, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::{header, redirect, Client};
use url::Url;

use crate::urlnorm;

pub const USER_AGENT: &str = "FalconGraphCrawler/1.0";

/// Upper bound on a single response body held in memory.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// A completed page fetch: the full body plus the trimmed `Content-Type`
/// header value (empty when the server sent none).
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Build the crawl client: fixed user agent, whole-response timeout, and a
/// redirect policy that follows at most 10 hops and only while the target
/// host stays on the domain allow-list. A redirect off the allow-list stops
/// there, so nothing outside `allowed_domains` is ever fetched.
pub fn build_client(timeout_secs: f64, allowed_domains: &HashSet<String>) -> Result<Client> {
    let allowed = Arc::new(allowed_domains.clone());

    let policy = redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= 10 {
            return attempt.stop();
        }
        if allowed.contains(&host_key(attempt.url())) {
            return attempt.follow();
        }
        attempt.stop()
    });

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs_f64(timeout_secs.max(0.0)))
        .redirect(policy)
        .brotli(true)
        .gzip(true)
        .deflate(true)
        .build()
        .context("failed to build HTTP client")?;
    Ok(client)
}

/// Single GET of a canonical URL, streaming the body into memory.
///
/// Any transport error, non-success status, or oversized body is an `Err`;
/// the worker turns that into a logged skip.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage> {
    let parsed = Url::parse(url).with_context(|| format!("invalid URL: {url}"))?;

    let resp = client
        .get(parsed)
        .send()
        .await
        .with_context(|| format!("request failed: {url}"))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("HTTP status {status} for {url}"));
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let mut stream = resp.bytes_stream();
    let mut buf = BytesMut::new();
    while let Some(item) = stream.next().await {
        let chunk = item.with_context(|| format!("failed while reading body: {url}"))?;
        if buf.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(anyhow!("response body too large (>{MAX_BODY_BYTES} bytes) for {url}"));
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(FetchedPage {
        body: buf.to_vec(),
        content_type,
    })
}

/// Host key used for allow-list matching: the authority of the URL as
/// serialized, split out exactly as `urlnorm::parse` does, so an explicit
/// `:port` matches the same way it does at frontier admission.
fn host_key(url: &Url) -> String {
    urlnorm::parse(url.as_str())
        .map(|u| u.host)
        .unwrap_or_default()
}
