use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Get a required column value from a row, returning CorruptRow on failure.
pub fn get<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Get an optional column value.
pub fn get_opt<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<Option<T>, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Parse a JSON TEXT column into a typed value, returning CorruptRow on
/// parse failure.
pub fn parse_json<T: DeserializeOwned>(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: format!("invalid JSON: {e}"),
    })
}

/// Parse a string into an enum, returning CorruptRow on failure.
pub fn parse_enum<T: std::str::FromStr>(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    raw.parse().map_err(|_| StoreError::CorruptRow {
        table,
        column,
        detail: format!("unknown variant: {raw}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rostra_core::debate::DebateStatus;

    #[test]
    fn parse_enum_success() {
        let status: DebateStatus = parse_enum("live", "debates", "status").unwrap();
        assert_eq!(status, DebateStatus::Live);
    }

    #[test]
    fn parse_enum_failure() {
        let result: Result<DebateStatus, _> = parse_enum("INVALID", "debates", "status");
        assert!(matches!(
            result,
            Err(StoreError::CorruptRow { table: "debates", column: "status", .. })
        ));
    }

    #[test]
    fn parse_json_success() {
        let labels: Vec<String> = parse_json(r#"["a", "b"]"#, "turns", "citations").unwrap();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[test]
    fn parse_json_failure() {
        let result: Result<Vec<String>, _> = parse_json("not valid json", "turns", "citations");
        assert!(matches!(
            result,
            Err(StoreError::CorruptRow { table: "turns", column: "citations", .. })
        ));
    }
}
