use falconcrawl::urlnorm::{canonicalize, extension, make_absolute, parse, strip_fragment};

#[test]
fn parse_splits_scheme_host_path() {
    let u = parse("https://www.bgsu.edu/admissions/index.html").unwrap();
    assert_eq!(u.scheme, "https");
    assert_eq!(u.host, "www.bgsu.edu");
    assert_eq!(u.path, "/admissions/index.html");
}

#[test]
fn parse_defaults_missing_path_to_slash() {
    let u = parse("https://www.bgsu.edu").unwrap();
    assert_eq!(u.path, "/");
}

#[test]
fn parse_lowercases_scheme_and_host_only() {
    let u = parse("HTTPS://WWW.BGSU.EDU/About/Us").unwrap();
    assert_eq!(u.scheme, "https");
    assert_eq!(u.host, "www.bgsu.edu");
    assert_eq!(u.path, "/About/Us");
}

#[test]
fn parse_rejects_non_http_inputs() {
    assert!(parse("ftp://host/file").is_none());
    assert!(parse("mailto:someone@bgsu.edu").is_none());
    assert!(parse("no scheme at all").is_none());
    assert!(parse("http://").is_none());
}

#[test]
fn parse_round_trips_canonical_strings() {
    for s in [
        "http://t/",
        "https://www.bgsu.edu/a/b?q=1",
        "http://127.0.0.1:8080/x",
    ] {
        assert_eq!(parse(s).unwrap().to_string(), s);
    }
}

#[test]
fn strip_fragment_is_identity_without_hash() {
    assert_eq!(strip_fragment("http://t/a?q=1"), "http://t/a?q=1");
    assert_eq!(strip_fragment("http://t/a#sec"), "http://t/a");
    assert_eq!(strip_fragment("#sec"), "");
}

#[test]
fn make_absolute_drops_unfetchable_hrefs() {
    let base = parse("http://t/dir/page.html").unwrap();
    assert_eq!(make_absolute(&base, ""), None);
    assert_eq!(make_absolute(&base, "   "), None);
    assert_eq!(make_absolute(&base, "#section"), None);
    assert_eq!(make_absolute(&base, "mailto:admissions@bgsu.edu"), None);
    assert_eq!(make_absolute(&base, "javascript:void(0)"), None);
}

#[test]
fn make_absolute_passes_absolute_urls_through() {
    let base = parse("http://t/dir/page.html").unwrap();
    assert_eq!(
        make_absolute(&base, "https://other.example/X/Y#frag"),
        Some("https://other.example/X/Y".to_string())
    );
}

#[test]
fn make_absolute_resolves_protocol_relative() {
    let base = parse("https://t/dir/page.html").unwrap();
    assert_eq!(
        make_absolute(&base, "//cdn.example/lib.js"),
        Some("https://cdn.example/lib.js".to_string())
    );
}

#[test]
fn make_absolute_resolves_root_relative() {
    let base = parse("http://t/dir/page.html").unwrap();
    assert_eq!(
        make_absolute(&base, "/about"),
        Some("http://t/about".to_string())
    );
}

#[test]
fn make_absolute_resolves_against_base_directory() {
    let base = parse("http://t/dir/page.html").unwrap();
    assert_eq!(
        make_absolute(&base, "other.html"),
        Some("http://t/dir/other.html".to_string())
    );

    let root = parse("http://t").unwrap();
    assert_eq!(make_absolute(&root, "a"), Some("http://t/a".to_string()));
}

#[test]
fn make_absolute_is_idempotent_on_its_output() {
    let base = parse("http://t/dir/page.html").unwrap();
    for href in ["other.html", "/abs", "//h/x", "http://t/q?x=1#f"] {
        let once = make_absolute(&base, href).unwrap();
        assert_eq!(make_absolute(&base, &once), Some(once.clone()));
    }
}

#[test]
fn extension_is_lowercased_and_query_trimmed() {
    assert_eq!(extension("http://t/files/doc.PDF?download=1"), "pdf");
    assert_eq!(extension("http://t/files/archive.tar.gz"), "gz");
}

#[test]
fn extension_is_empty_without_a_dot_in_the_file_part() {
    assert_eq!(extension("http://t/about"), "");
    assert_eq!(extension("https://www.bgsu.edu"), "");
    assert_eq!(extension("http://t/a.b/c"), "");
    assert_eq!(extension("not a url"), "");
}

#[test]
fn canonicalize_lowercases_identity_and_drops_fragment() {
    assert_eq!(
        canonicalize("HTTP://WWW.BGSU.EDU/About#history"),
        Some("http://www.bgsu.edu/About".to_string())
    );
    assert_eq!(canonicalize("nonsense"), None);
}
