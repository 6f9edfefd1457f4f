//! Tabular payload returned by the stats API and its decoder

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::error::Category;

use crate::error::AppError;

/// Decoded API response: the echoed request plus zero or more result sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularResponse {
    pub resource: String,
    /// Request parameters as echoed by the API. Opaque to the pipeline.
    #[serde(default)]
    pub parameters: Value,
    #[serde(rename = "resultSets")]
    pub result_sets: Vec<ResultSet>,
}

/// One named table. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub name: String,
    pub headers: Vec<String>,
    #[serde(rename = "rowSet")]
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of a header, case-sensitive.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn cell(&self, row: usize, header: &str) -> Option<&Value> {
        let column = self.column(header)?;
        self.rows.get(row)?.get(column)
    }
}

impl TabularResponse {
    pub fn total_rows(&self) -> usize {
        self.result_sets.iter().map(ResultSet::row_count).sum()
    }
}

/// Decodes a raw response body.
///
/// Either every result set decodes with consistent row widths or the whole
/// payload is rejected. An empty `resultSets` array is a valid response.
///
/// # Example
/// ```
/// use bball_etl::data_fetcher::models::decode;
///
/// let body = br#"{"resource":"x","parameters":{},"resultSets":[{"name":"A","headers":["H1","H2"],"rowSet":[[1,2],[3,4]]}]}"#;
/// let response = decode(body).unwrap();
/// assert_eq!(response.result_sets[0].rows.len(), 2);
/// ```
pub fn decode(body: &[u8]) -> Result<TabularResponse, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::decode("empty response body"));
    }

    let response: TabularResponse = serde_json::from_slice(body).map_err(|e| match e.classify() {
        Category::Syntax | Category::Eof => AppError::decode(format!("body is not valid JSON: {e}")),
        Category::Data => AppError::decode(format!("unexpected payload structure: {e}")),
        Category::Io => AppError::decode(format!("failed to read payload: {e}")),
    })?;

    for set in &response.result_sets {
        let width = set.headers.len();
        if let Some((index, row)) = set.rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(AppError::decode(format!(
                "result set '{}' row {index} has {} cells, expected {width}",
                set.name,
                row.len()
            )));
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"{"resource":"x","parameters":{},"resultSets":[{"name":"A","headers":["H1","H2"],"rowSet":[[1,2],[3,4]]}]}"#;

    fn decode_message(body: &str) -> String {
        match decode(body.as_bytes()) {
            Err(AppError::Decode { message }) => message,
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_sample_payload() {
        let response = decode(SAMPLE.as_bytes()).unwrap();

        assert_eq!(response.resource, "x");
        assert_eq!(response.parameters, json!({}));
        assert_eq!(response.result_sets.len(), 1);

        let set = &response.result_sets[0];
        assert_eq!(set.name, "A");
        assert_eq!(set.headers, ["H1", "H2"]);
        assert_eq!(set.rows, vec![vec![json!(1), json!(2)], vec![json!(3), json!(4)]]);
        assert_eq!(set.cell(1, "H2"), Some(&json!(4)));
        assert_eq!(response.total_rows(), 2);
    }

    #[test]
    fn test_decode_zero_result_sets_is_valid() {
        let response = decode(br#"{"resource":"leaguegamelog","resultSets":[]}"#).unwrap();
        assert!(response.result_sets.is_empty());
        assert_eq!(response.parameters, Value::Null);
        assert_eq!(response.total_rows(), 0);
    }

    #[test]
    fn test_decode_keeps_mixed_cell_types() {
        let body = r#"{"resource":"leaguegamelog","parameters":{"Season":"2024-25"},"resultSets":[
            {"name":"LeagueGameLog","headers":["GAME_ID","GAME_DATE","PTS","PLUS_MINUS"],
             "rowSet":[["0022400001","2024-10-22",110,null]]}]}"#;
        let response = decode(body.as_bytes()).unwrap();
        let set = &response.result_sets[0];
        assert_eq!(set.name, "LeagueGameLog");

        assert_eq!(set.cell(0, "GAME_ID"), Some(&json!("0022400001")));
        assert_eq!(set.cell(0, "PTS"), Some(&json!(110)));
        assert_eq!(set.cell(0, "PLUS_MINUS"), Some(&Value::Null));
        assert_eq!(set.cell(0, "MISSING"), None);
        assert_eq!(response.parameters["Season"], "2024-25");
    }

    #[test]
    fn test_decode_rejects_row_width_mismatch() {
        let message = decode_message(
            r#"{"resource":"x","resultSets":[{"name":"A","headers":["H1","H2"],"rowSet":[[1,2],[3]]}]}"#,
        );
        assert!(message.contains("row 1 has 1 cells, expected 2"), "{message}");
    }

    #[test]
    fn test_decode_error_kinds_are_distinguished() {
        assert_eq!(decode_message(""), "empty response body");
        assert_eq!(decode_message("  \n"), "empty response body");
        assert!(decode_message("<html>blocked</html>").starts_with("body is not valid JSON"));
        assert!(decode_message(r#"{"resource":"x","resultSets":[{"#).starts_with("body is not valid JSON"));
        assert!(decode_message(r#"{"resource":"x"}"#).starts_with("unexpected payload structure"));
        assert!(decode_message(r#"{"resource":"x","resultSets":{}}"#).starts_with("unexpected payload structure"));
        assert!(decode_message("[]").starts_with("unexpected payload structure"));
    }
}
