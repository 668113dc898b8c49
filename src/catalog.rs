//! Documentation-server client and catalog wire types.
//!
//! The catalog endpoints are consumed as-is; field presence is not
//! guaranteed beyond `endpoint` and `method`, so everything else
//! deserializes with defaults rather than failing the whole catalog.

use std::time::Duration;

use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::state::{now_ms, Config};

/// One row of a seed or mutated dataset: field name → value.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct QueryParam {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDoc {
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointDoc {
    pub endpoint: String,
    pub method: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: String,
    #[serde(default)]
    pub headers: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub query_params: Vec<QueryParam>,
    #[serde(default)]
    pub res: String,
    #[serde(default)]
    pub errors: Vec<ErrorDoc>,
    #[serde(default, rename = "defaultDB")]
    pub default_db: Option<Vec<Record>>,
    #[serde(default)]
    pub markdown: Option<Vec<String>>,
    #[serde(default, rename = "luaFunc")]
    pub lua_func: Option<Value>,
}

impl EndpointDoc {
    /// The sandbox can execute this endpoint (drives the `test` badge).
    pub fn is_executable(&self) -> bool {
        matches!(&self.lua_func, Some(v) if !v.is_null())
    }

    pub fn has_seed_data(&self) -> bool {
        self.default_db.as_ref().map_or(false, |db| !db.is_empty())
    }

    pub fn has_markdown(&self) -> bool {
        self.markdown.as_ref().map_or(false, |md| !md.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownEntry {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub category: String,
}

impl MarkdownEntry {
    /// Underscore-prefixed files are internal and never listed.
    pub fn is_visible(&self) -> bool {
        !self.name.starts_with('_')
    }
}

/// Group catalog indices by category, first-seen category order, catalog
/// order within each category. Indices refer back into the input slice.
pub fn group_docs(docs: &[EndpointDoc]) -> Vec<(String, Vec<usize>)> {
    let mut grouped: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (i, doc) in docs.iter().enumerate() {
        grouped.entry(doc.category.clone()).or_default().push(i);
    }
    grouped.into_iter().collect()
}

/// Same grouping for markdown entries, with hidden files dropped. A
/// category whose every file is hidden disappears entirely.
pub fn group_markdowns(files: &[MarkdownEntry]) -> Vec<(String, Vec<usize>)> {
    let mut grouped: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (i, file) in files.iter().enumerate() {
        if !file.is_visible() {
            continue;
        }
        grouped.entry(file.category.clone()).or_default().push(i);
    }
    grouped.into_iter().collect()
}

#[derive(Clone)]
pub struct DocsClient {
    client: Client,
    base: String,
}

impl DocsClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base: cfg.docs_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, pairs: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base, path))?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(url)
    }

    pub async fn fetch_docs(&self) -> Result<Vec<EndpointDoc>> {
        let url = self.url("/api/docs", &[("_", &now_ms().to_string())])?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("docs fetch failed: {} - {}", status, body));
        }
        Ok(resp.json().await?)
    }

    pub async fn fetch_markdown_index(&self) -> Result<Vec<MarkdownEntry>> {
        let url = self.url("/api/markdowns", &[("_", &now_ms().to_string())])?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("markdown index fetch failed: {} - {}", status, body));
        }
        Ok(resp.json().await?)
    }

    /// Raw Markdown source; rendering stays plain text.
    pub async fn fetch_markdown(&self, path: &str) -> Result<String> {
        let url = self.url("/api/markdowns/view", &[("path", path)])?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("markdown view failed: {} - {}", status, body));
        }
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(endpoint: &str, category: &str) -> EndpointDoc {
        serde_json::from_value(serde_json::json!({
            "endpoint": endpoint,
            "method": "GET",
            "category": category,
        }))
        .unwrap()
    }

    #[test]
    fn test_doc_deserializes_with_sparse_fields() {
        let doc: EndpointDoc = serde_json::from_str(
            r#"{"endpoint":"/api/books","method":"POST"}"#,
        )
        .unwrap();
        assert_eq!(doc.endpoint, "/api/books");
        assert!(doc.description.is_empty());
        assert!(doc.query_params.is_empty());
        assert!(doc.default_db.is_none());
        assert!(!doc.is_executable());
        assert!(!doc.has_seed_data());
    }

    #[test]
    fn test_doc_badges() {
        let doc: EndpointDoc = serde_json::from_value(serde_json::json!({
            "endpoint": "/api/books/add",
            "method": "POST",
            "luaFunc": "books_add",
            "defaultDB": [{"id": 1}],
            "markdown": ["docs/api_books_add.md"],
        }))
        .unwrap();
        assert!(doc.is_executable());
        assert!(doc.has_seed_data());
        assert!(doc.has_markdown());
    }

    #[test]
    fn test_group_docs_preserves_order() {
        let docs = vec![
            doc("/a", "books"),
            doc("/b", "users"),
            doc("/c", "books"),
        ];
        let grouped = group_docs(&docs);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, "books");
        assert_eq!(grouped[0].1, vec![0, 2]);
        assert_eq!(grouped[1].0, "users");
        assert_eq!(grouped[1].1, vec![1]);
    }

    #[test]
    fn test_group_markdowns_hides_underscore_names() {
        let files = vec![
            MarkdownEntry { name: "_internal.md".into(), path: "p/_internal.md".into(), category: "guides".into() },
            MarkdownEntry { name: "setup.md".into(), path: "p/setup.md".into(), category: "guides".into() },
            MarkdownEntry { name: "_hidden.md".into(), path: "q/_hidden.md".into(), category: "private".into() },
        ];
        let grouped = group_markdowns(&files);
        // "private" holds only hidden files and disappears entirely
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].0, "guides");
        assert_eq!(grouped[0].1, vec![1]);
    }
}
