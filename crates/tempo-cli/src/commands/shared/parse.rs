use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tempo_core::dates::parse_session_date;

/// Parse a `YYYY-MM-DD` or `YYYYMMDD` date flag.
pub fn parse_date(raw: &str, field: &str) -> anyhow::Result<NaiveDate> {
    parse_session_date(raw).map_err(|error| anyhow::anyhow!("invalid {field}: {error}"))
}

/// Read and decode a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::{parse_date, read_json};

    #[test]
    fn accepts_both_date_shapes() {
        assert_eq!(
            parse_date("20250304", "date").unwrap(),
            parse_date("2025-03-04", "date").unwrap()
        );
    }

    #[test]
    fn names_the_field_on_error() {
        let err = parse_date("04/03/2025", "from").unwrap_err();
        assert!(err.to_string().starts_with("invalid from:"));
    }

    #[test]
    fn read_json_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = read_json::<Value>(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid JSON in"));
    }
}
