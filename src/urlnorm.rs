use std::fmt;

/// A canonical URL split into its three identity-bearing parts.
///
/// Scheme and host are lowercase; the path (which keeps any query string)
/// is stored verbatim because URL paths are case-sensitive. The canonical
/// string form `scheme://host + path` is the dedup key everywhere else in
/// the crate, so equality here is byte-exact equality of that form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUrl {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)
    }
}

/// Parse `scheme://host[/path]` into canonical parts.
///
/// Only `http` and `https` are accepted. The host is the authority as
/// written between `://` and the first `/`, so an explicit `:port` stays
/// part of it. A missing path becomes `/`.
pub fn parse(s: &str) -> Option<CanonicalUrl> {
    let (scheme, rest) = s.split_once("://")?;
    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return None;
    }

    let (host, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    if host.is_empty() {
        return None;
    }

    Some(CanonicalUrl {
        scheme,
        host: host.to_ascii_lowercase(),
        path: path.to_string(),
    })
}

/// Truncate at the first `#`.
pub fn strip_fragment(s: &str) -> &str {
    match s.find('#') {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Resolve an `href` attribute value against a base URL.
///
/// Returns `None` for hrefs that cannot yield a fetchable URL: empty after
/// trimming and fragment removal, or `mailto:` / `javascript:` targets.
/// Absolute `http(s)` hrefs pass through untouched apart from the fragment;
/// everything else is rebuilt from the base's scheme, host, and directory.
pub fn make_absolute(base: &CanonicalUrl, href: &str) -> Option<String> {
    let href = strip_fragment(href.trim());
    if href.is_empty() {
        return None;
    }
    if href.starts_with("mailto:") || href.starts_with("javascript:") {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("{}://{}", base.scheme, rest));
    }
    if href.starts_with('/') {
        return Some(format!("{}://{}{}", base.scheme, base.host, href));
    }

    // Relative href: everything up to and including the last '/' of the base
    // path is the directory it resolves in.
    let dir = match base.path.rfind('/') {
        Some(i) => &base.path[..=i],
        None => "/",
    };
    Some(format!("{}://{}{}{}", base.scheme, base.host, dir, href))
}

/// Lowercased extension of the file part of the URL's path, query removed.
/// Empty when the last segment has no dot (or the URL does not parse).
pub fn extension(url: &str) -> String {
    let parsed = match parse(url) {
        Some(p) => p,
        None => return String::new(),
    };
    let path = match parsed.path.find('?') {
        Some(i) => &parsed.path[..i],
        None => parsed.path.as_str(),
    };
    let segment = match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    };
    match segment.rfind('.') {
        Some(i) => segment[i + 1..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Canonical string form of a raw URL: fragment stripped, scheme and host
/// lowercased, path verbatim. `None` when the input does not parse.
pub fn canonicalize(raw: &str) -> Option<String> {
    parse(strip_fragment(raw)).map(|u| u.to_string())
}
