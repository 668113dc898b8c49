//! Text views for the details panel and the sidebar listing.

use serde_json::Value;

use crate::catalog::{group_docs, group_markdowns, EndpointDoc, MarkdownEntry};
use crate::simulate::reconcile::DbTable;
use crate::simulate::SimulationOutcome;

/// Aligned text table. Every row is rectangular by construction, so this
/// only pads and rules.
pub fn table(t: &DbTable) -> String {
    let mut widths: Vec<usize> = t.headers.iter().map(String::len).collect();
    for row in &t.rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let mut out = String::new();
    out.push_str(&render_row(&t.headers, &widths));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    for row in &t.rows {
        out.push('\n');
        out.push_str(&render_row(row, &widths));
    }
    out
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    padded.join(" | ").trim_end().to_string()
}

pub fn sidebar(docs: &[EndpointDoc], markdowns: &[MarkdownEntry]) -> String {
    let mut out = String::new();

    for (category, indices) in group_docs(docs) {
        out.push_str(&category.to_uppercase());
        out.push('\n');
        for i in indices {
            let doc = &docs[i];
            out.push_str(&format!("  [{}] {} {}", i + 1, doc.method, doc.endpoint));
            if doc.is_executable() {
                out.push_str(" [test]");
            }
            if doc.has_seed_data() {
                out.push_str(" [DB]");
            }
            if doc.has_markdown() {
                out.push_str(" [MD]");
            }
            out.push('\n');
        }
    }

    for (category, indices) in group_markdowns(markdowns) {
        out.push_str(&format!("[MD] {}\n", category.to_uppercase()));
        for i in indices {
            out.push_str(&format!("  [{}] {}\n", i + 1, markdowns[i].name));
        }
    }

    out.push_str("commands: docs | show N | md N | method M | headers JSON | body TEXT | send | quit");
    out
}

pub fn endpoint_detail(doc: &EndpointDoc) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", doc.method, doc.endpoint));
    if !doc.description.is_empty() {
        out.push_str(&format!("  {}\n", doc.description));
    }
    out.push_str(&format!("\nPermissions: {}\n", doc.permissions));
    out.push_str(&format!("Request Headers:\n{}\n", doc.headers));
    out.push_str(&format!("Request Body:\n{}\n", doc.body));

    if !doc.query_params.is_empty() {
        let t = DbTable {
            headers: vec!["name".to_string(), "value".to_string()],
            rows: doc
                .query_params
                .iter()
                .map(|q| vec![q.name.clone(), q.value.clone()])
                .collect(),
        };
        out.push_str(&format!("\nQuery Parameters:\n{}\n", table(&t)));
    }

    if !doc.res.is_empty() {
        out.push_str(&format!("\nResponse:\n{}\n", doc.res));
    }

    if !doc.errors.is_empty() {
        out.push_str("\nErrors:\n");
        for e in &doc.errors {
            out.push_str(&format!(
                "  {}: {} - {}\n",
                fmt_value(&e.code),
                e.message,
                e.description
            ));
        }
    }

    if let Some(seed) = doc.default_db.as_ref().filter(|db| !db.is_empty()) {
        let records: Vec<Value> = seed.iter().cloned().map(Value::Object).collect();
        if let Some(t) = crate::simulate::reconcile::tabulate(records) {
            out.push_str(&format!("\nSeed Data (defaultDB):\n{}\n", table(&t)));
        }
    }

    out.push_str("\nSimulator: edit with `method` / `headers` / `body`, then `send`.");
    out
}

pub fn markdown_view(title: &str, text: &str) -> String {
    format!("{}\n{}\n\n{}", title, "=".repeat(title.len()), text)
}

pub fn simulation_result(outcome: &SimulationOutcome) -> String {
    match outcome {
        SimulationOutcome::InvalidHeaders(err) => err.to_string(),
        SimulationOutcome::TransportFailed(err) => format!("Error: {}", err),
        SimulationOutcome::Reconciled(result) => {
            let mut out = String::new();
            out.push_str(&format!("Status: {}\n", result.status));
            out.push_str(&format!("Response:\n{}\n", result.body));
            out.push_str(&format!("Log:\n{}", result.log.join("\n")));
            if let Some(t) = &result.db {
                out.push_str(&format!("\n\nUpdated DB:\n{}", table(t)));
            }
            out
        }
    }
}

fn fmt_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
