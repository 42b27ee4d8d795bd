use std::time::Duration;
use std::time::Instant;

use pretty_assertions::assert_eq;

use super::LimitDecision;
use super::ScreenshotLimiter;
use super::parse_data_url;

#[test]
fn first_screenshot_allowed_second_within_a_second_rejected() {
    let limiter = ScreenshotLimiter::new();
    let t0 = Instant::now();
    assert_eq!(limiter.check_at("cli-1", t0), LimitDecision::Allowed);
    assert_eq!(
        limiter.check_at("cli-1", t0 + Duration::from_millis(500)),
        LimitDecision::RateLimited
    );
    // Third attempt just past the interval succeeds.
    assert_eq!(
        limiter.check_at("cli-1", t0 + Duration::from_millis(1010)),
        LimitDecision::Allowed
    );
}

#[test]
fn clients_are_limited_independently() {
    let limiter = ScreenshotLimiter::new();
    let t0 = Instant::now();
    assert_eq!(limiter.check_at("a", t0), LimitDecision::Allowed);
    assert_eq!(limiter.check_at("b", t0), LimitDecision::Allowed);
}

#[test]
fn data_url_parses_mime_and_payload() {
    let (mime, bytes) = parse_data_url("data:image/png;base64,aGVsbG8=").expect("valid");
    assert_eq!(mime, "image/png");
    assert_eq!(bytes, b"hello");
}

#[test]
fn data_url_without_base64_marker_is_rejected() {
    assert!(parse_data_url("data:image/png,plain").is_none());
    assert!(parse_data_url("http://not-a-data-url").is_none());
    assert!(parse_data_url("data:image/png;base64,!!!").is_none());
}

#[test]
fn empty_mime_defaults_to_png() {
    let (mime, _) = parse_data_url("data:;base64,aGVsbG8=").expect("valid");
    assert_eq!(mime, "image/png");
}
