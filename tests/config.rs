use std::fs;

use falconcrawl::{
    config::{self, Config, CONFIG_RELATIVE_PATH},
    error::ConfigError,
};
use pretty_assertions::assert_eq;

fn write_config(root: &std::path::Path, body: &str) {
    let path = root.join(CONFIG_RELATIVE_PATH);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

#[test]
fn defaults_apply_when_no_config_exists() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config::load(tmp.path()).unwrap();

    assert_eq!(config.start_url, "https://www.bgsu.edu");
    assert_eq!(config.allowed_domains, vec!["www.bgsu.edu", "bgsu.edu"]);
    assert_eq!(config.max_pages, -1);
    assert_eq!(config.delay, 0.25);
    assert_eq!(config.timeout, 20.0);
    // Relative output resolves against the starting directory when no repo
    // root is found.
    assert_eq!(config.raw_output, tmp.path().join("data/raw"));
}

#[test]
fn repo_root_is_discovered_by_walking_upward() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path(), r#"{"start_url": "https://t/"}"#);
    let nested = tmp.path().join("scripts/jobs");
    fs::create_dir_all(&nested).unwrap();

    assert_eq!(config::find_repo_root(&nested), Some(tmp.path().to_path_buf()));

    let config = config::load(&nested).unwrap();
    assert_eq!(config.start_url, "https://t/");
    // Relative outputs anchor at the discovered root, not the nested cwd.
    assert_eq!(config.raw_output, tmp.path().join("data/raw"));
}

#[test]
fn recognized_keys_override_defaults_and_unknown_keys_are_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(
        tmp.path(),
        r#"{
            "start_url": "http://t/",
            "allowed_domains": ["T", "Sub.T"],
            "raw_output": "corpus",
            "max_pages": 50,
            "delay": 0.0,
            "timeout": 5,
            "crawler_threads": 3,
            "extensions": ["pdf", ".HTML"],
            "embedding_model": "ignored-by-the-crawler"
        }"#,
    );

    let config = config::load(tmp.path()).unwrap();
    assert_eq!(config.allowed_domains, vec!["t", "sub.t"]);
    assert_eq!(config.raw_output, tmp.path().join("corpus"));
    assert_eq!(config.max_pages, 50);
    assert_eq!(config.crawler_threads, 3);
    assert_eq!(config.worker_count(), 3);
    assert_eq!(config.extensions, vec![".pdf", ".html"]);
}

#[test]
fn broken_json_is_a_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path(), "{ not json");

    let err = config::load(tmp.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn nonpositive_thread_counts_fall_back_to_hardware_concurrency() {
    let mut config = Config::default();
    for n in [0, -1, -8] {
        config.crawler_threads = n;
        assert!(config.worker_count() >= 1);
    }
    config.crawler_threads = 5;
    assert_eq!(config.worker_count(), 5);
}

#[test]
fn extension_set_is_dotted_and_lowercase() {
    let config = Config {
        extensions: vec!["pdf".into(), ".HTM".into()],
        ..Config::default()
    };
    let set = config.extension_set();
    assert!(set.contains(".pdf"));
    assert!(set.contains(".htm"));
    assert_eq!(set.len(), 2);
}

#[test]
fn domain_set_is_lowercase() {
    let config = Config {
        allowed_domains: vec!["WWW.BGSU.EDU".into()],
        ..Config::default()
    };
    assert!(config.domain_set().contains("www.bgsu.edu"));
}
