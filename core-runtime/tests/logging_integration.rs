//! Integration tests for logging system

use bridge_traits::error::Result as SinkResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, redact_locator, strip_path, LogFormat, LoggingConfig,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LoggerSink for CollectingSink {
    fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// Only test in this binary allowed to install the global subscriber.
#[test]
fn test_logging_initialization_forwards_to_sink() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_filter("debug")
        .with_logger_sink(sink.clone());

    init_logging(config).expect("first initialization succeeds");

    tracing::debug!(target: "core_playback::controller", session = "abc", "entering Seeking");
    tracing::trace!("filtered out");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "entering Seeking");
        assert_eq!(entries[0].fields.get("session"), Some(&"abc".to_string()));
    }

    // A second initialization is rejected
    assert!(init_logging(LoggingConfig::default()).is_err());
}

#[test]
fn test_invalid_filter_rejected_before_install() {
    let config = LoggingConfig::default().with_filter("core_playback=[");
    assert!(init_logging(config).is_err());
}

#[test]
fn test_locator_redaction() {
    assert_eq!(
        redact_locator("https://cdn.example.com/dvr/index.m3u8?start=0&hdnea=exp~1"),
        "https://cdn.example.com/dvr/index.m3u8"
    );
    assert_eq!(redact_locator("file:///tmp/a.mp4"), "file:///tmp/a.mp4");
    assert_eq!(redact_locator("/home/user/Movies/a.mp4"), "a.mp4");
}

#[test]
fn test_sensitive_field_redaction() {
    assert_eq!(redact_if_sensitive("access_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("segment_id", "42"), "42");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/var/media/clip.mp4"), "clip.mp4");
    assert_eq!(strip_path("D:\\media\\clip.mp4"), "clip.mp4");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
