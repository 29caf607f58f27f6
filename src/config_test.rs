use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn from_lookup_defaults() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.submit_timeout, Duration::from_secs(40));
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("JOBSUGGEST_BASE_URL", "https://jobs.example.test/"),
        ("JOBSUGGEST_SUBMIT_TIMEOUT_SECS", "5"),
        ("JOBSUGGEST_CONNECT_TIMEOUT_SECS", " 2 "),
        ("JOBSUGGEST_SPEECH_WPM", "240"),
    ]))
    .unwrap();
    assert_eq!(cfg.base_url, "https://jobs.example.test");
    assert_eq!(cfg.submit_timeout, Duration::from_secs(5));
    assert_eq!(cfg.connect_timeout, Duration::from_secs(2));
    assert_eq!(cfg.speech_wpm, 240);
}

#[test]
fn from_lookup_bad_numbers_fall_back() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("JOBSUGGEST_SUBMIT_TIMEOUT_SECS", "soon"),
        ("JOBSUGGEST_SPEECH_WPM", "-3"),
    ]))
    .unwrap();
    assert_eq!(cfg.submit_timeout, Duration::from_secs(DEFAULT_SUBMIT_TIMEOUT_SECS));
    assert_eq!(cfg.speech_wpm, DEFAULT_SPEECH_WPM);
}

#[test]
fn zero_wpm_is_clamped() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[("JOBSUGGEST_SPEECH_WPM", "0")])).unwrap();
    assert_eq!(cfg.speech_wpm, 1);
}

#[test]
fn empty_base_url_errors() {
    let err = ClientConfig::from_lookup(lookup_from(&[("JOBSUGGEST_BASE_URL", " / ")])).unwrap_err();
    assert_eq!(err, ConfigError::EmptyBaseUrl);
}

#[test]
fn non_http_base_url_errors() {
    let err = ClientConfig::default().with_base_url("ftp://files").unwrap_err();
    assert!(err.to_string().contains("http://"));
}

#[test]
fn with_base_url_trims_trailing_slashes() {
    let cfg = ClientConfig::default()
        .with_base_url("http://localhost:9000//")
        .unwrap();
    assert_eq!(cfg.base_url, "http://localhost:9000");
}
