//! Normalizes a sandbox reply into a stable, renderable form.
//!
//! The sandbox's serializer is not contractually fixed: sequences may
//! arrive as keyed objects, records may disagree on their field sets,
//! and any part of the reply may be absent. All of that is flattened
//! here; rendering code only ever sees rectangular data.

use indexmap::IndexSet;
use serde_json::Value;

use super::{SeqOrMap, SimulationResponse};

/// Canonical view of one reconciled reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSimulation {
    pub status: String,
    pub body: String,
    pub log: Vec<String>,
    pub db: Option<DbTable>,
}

/// A rectangular table: every row has exactly one cell per header.
#[derive(Debug, Clone, PartialEq)]
pub struct DbTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn reconcile(response: SimulationResponse) -> RenderedSimulation {
    let status = match response.response.status {
        // Status zero only arises from a malformed reply and renders as
        // absent, matching the sandbox's own convention.
        Some(s) if s != 0 => s.to_string(),
        _ => "N/A".to_string(),
    };

    let body = match response.response.body {
        None => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    };

    let log = response.log.map(SeqOrMap::into_vec).unwrap_or_default();

    let db = response.db.and_then(|db| tabulate(db.into_vec()));

    RenderedSimulation { status, body, log, db }
}

/// Build the rectangular table for a record sequence, or `None` when the
/// sequence is empty (an empty table is never rendered). Headers are the
/// union of keys across every record in first-seen order; a field absent
/// on a record renders as an empty cell. Non-object rows are tolerated
/// and contribute no columns.
pub fn tabulate(records: Vec<Value>) -> Option<DbTable> {
    if records.is_empty() {
        return None;
    }

    let mut headers: IndexSet<String> = IndexSet::new();
    for record in &records {
        if let Value::Object(fields) = record {
            for key in fields.keys() {
                headers.insert(key.clone());
            }
        }
    }
    let headers: Vec<String> = headers.into_iter().collect();

    let rows = records
        .iter()
        .map(|record| {
            let fields = record.as_object();
            headers
                .iter()
                .map(|h| cell(fields.and_then(|f| f.get(h))))
                .collect()
        })
        .collect();

    Some(DbTable { headers, rows })
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(raw: &str) -> SimulationResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_status_rendered_when_present() {
        let out = reconcile(parse(r#"{"response":{"status":200,"body":"ok"}}"#));
        assert_eq!(out.status, "200");
        assert_eq!(out.body, "ok");
    }

    #[test]
    fn test_status_falls_back_when_absent() {
        let out = reconcile(parse(r#"{"response":{"body":"ok"}}"#));
        assert_eq!(out.status, "N/A");
    }

    #[test]
    fn test_status_zero_treated_as_absent() {
        let out = reconcile(parse(r#"{"response":{"status":0}}"#));
        assert_eq!(out.status, "N/A");
    }

    #[test]
    fn test_structured_body_pretty_printed() {
        let out = reconcile(parse(r#"{"response":{"body":{"ok":true}}}"#));
        assert!(out.body.contains("\"ok\": true"));
    }

    #[test]
    fn test_log_sequence_used_as_is() {
        let out = reconcile(parse(r#"{"log":["a","b"]}"#));
        assert_eq!(out.log, vec!["a", "b"]);
    }

    #[test]
    fn test_log_keyed_map_normalized() {
        let out = reconcile(parse(r#"{"log":{"0":"a","1":"b"}}"#));
        assert_eq!(out.log, vec!["a", "b"]);
    }

    #[test]
    fn test_log_absent_is_empty() {
        let out = reconcile(parse("{}"));
        assert!(out.log.is_empty());
    }

    #[test]
    fn test_db_union_headers_rectangular() {
        let out = reconcile(parse(r#"{"db":[{"a":1},{"b":2}]}"#));
        let table = out.db.unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1".to_string(), String::new()], vec![String::new(), "2".to_string()]]);
    }

    #[test]
    fn test_db_keyed_map_normalized() {
        let out = reconcile(parse(r#"{"db":{"1":{"id":1},"2":{"id":2}}}"#));
        let table = out.db.unwrap();
        assert_eq!(table.headers, vec!["id"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_empty_db_suppressed() {
        assert!(reconcile(parse(r#"{"db":[]}"#)).db.is_none());
        assert!(reconcile(parse(r#"{"db":{}}"#)).db.is_none());
        assert!(reconcile(parse("{}")).db.is_none());
    }

    #[test]
    fn test_null_and_missing_cells_render_empty() {
        let out = reconcile(parse(r#"{"db":[{"a":null,"b":"x"},{"b":"y"}]}"#));
        let table = out.db.unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows[0], vec![String::new(), "x".to_string()]);
        assert_eq!(table.rows[1], vec![String::new(), "y".to_string()]);
    }

    #[test]
    fn test_non_string_cells_coerced_for_display() {
        let out = reconcile(parse(r#"{"db":[{"n":3.5,"flag":true,"nested":{"k":1}}]}"#));
        let table = out.db.unwrap();
        assert_eq!(table.rows[0][0], "3.5");
        assert_eq!(table.rows[0][1], "true");
        assert_eq!(table.rows[0][2], json!({"k":1}).to_string());
    }

    #[test]
    fn test_non_object_rows_tolerated() {
        let out = reconcile(parse(r#"{"db":[42,{"a":1}]}"#));
        let table = out.db.unwrap();
        assert_eq!(table.headers, vec!["a"]);
        assert_eq!(table.rows[0], vec![String::new()]);
        assert_eq!(table.rows[1], vec!["1".to_string()]);
    }
}
