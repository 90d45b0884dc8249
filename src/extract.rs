use std::sync::OnceLock;

use regex::Regex;

use crate::urlnorm::{self, CanonicalUrl};

fn href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Deliberately not an HTML parser: links inside comments or with exotic
    // quoting are out of scope for this crawl.
    RE.get_or_init(|| Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap())
}

/// Pull anchor targets out of an HTML body, resolved against `base`, in the
/// textual order the `href` attributes appear. Unresolvable hrefs (empty,
/// fragment-only, `mailto:`, `javascript:`) are dropped here; domain and
/// extension admission stay the frontier's job.
pub fn extract_links(base: &CanonicalUrl, html: &str) -> Vec<String> {
    let mut out = Vec::new();
    for caps in href_regex().captures_iter(html) {
        let raw = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or("");
        if let Some(resolved) = urlnorm::make_absolute(base, raw) {
            out.push(resolved);
        }
    }
    out
}
