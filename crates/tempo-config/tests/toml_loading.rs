//! Integration tests for TOML and environment configuration loading.
//!
//! Uses figment::Jail for sandboxed file and env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use tempo_config::{ConfigError, TempoConfig};

fn layered() -> Figment {
    Figment::from(Serialized::defaults(TempoConfig::default()))
        .merge(Toml::file("config.toml"))
        .merge(Env::prefixed("TEMPO_").split("__"))
}

#[test]
fn loads_all_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[cache]
query_ttl_secs = 60

[queue]
capacity = 10
base_delay_ms = 250
max_delay_ms = 4000
max_rebase_attempts = 5
journal_path = "queue.jsonl"

[report]
late_counts_as_attended = true

[store]
path = ":memory:"
"#,
        )?;

        let config = TempoConfig::from_figment(layered()).expect("config loads");
        assert_eq!(config.cache.query_ttl_secs, 60);
        assert_eq!(config.queue.capacity, 10);
        assert_eq!(config.queue.base_delay_ms, 250);
        assert_eq!(config.queue.max_delay_ms, 4000);
        assert_eq!(config.queue.max_rebase_attempts, 5);
        assert_eq!(config.queue.journal_path, "queue.jsonl");
        assert!(config.report.late_counts_as_attended);
        assert_eq!(config.store.path, ":memory:");
        Ok(())
    });
}

#[test]
fn partial_toml_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[queue]\ncapacity = 3\n")?;

        let config = TempoConfig::from_figment(layered()).expect("config loads");
        assert_eq!(config.queue.capacity, 3);
        assert_eq!(config.queue.max_rebase_attempts, 3);
        assert_eq!(config.cache.query_ttl_secs, 300);
        Ok(())
    });
}

#[test]
fn env_beats_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[cache]\nquery_ttl_secs = 60\n")?;
        jail.set_env("TEMPO_CACHE__QUERY_TTL_SECS", "15");
        jail.set_env("TEMPO_REPORT__LATE_COUNTS_AS_ATTENDED", "true");

        let config = TempoConfig::from_figment(layered()).expect("config loads");
        assert_eq!(config.cache.query_ttl_secs, 15);
        assert!(config.report.late_counts_as_attended);
        Ok(())
    });
}

#[test]
fn inverted_backoff_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            "[queue]\nbase_delay_ms = 5000\nmax_delay_ms = 100\n",
        )?;

        let err = TempoConfig::from_figment(layered()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "queue.max_delay_ms"));
        Ok(())
    });
}

#[test]
fn default_figment_builds_without_files() {
    Jail::expect_with(|_jail| {
        let config = TempoConfig::load().expect("defaults load");
        assert_eq!(config.queue.capacity, 500);
        Ok(())
    });
}
