use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use docsim::catalog::{DocsClient, EndpointDoc, MarkdownEntry};
use docsim::logging::{json_log, obj, v_num, v_str};
use docsim::render;
use docsim::retry::{retry_async, RetryConfig};
use docsim::sandbox::{HttpSandbox, Sandbox};
use docsim::simulate::{self, Method};
use docsim::state::{Config, DetailPanel};

/// Pending simulator edits for the selected endpoint, seeded from the doc
/// and re-seeded on every `show`.
struct Editor {
    doc_index: usize,
    method: Method,
    headers: String,
    body: String,
}

impl Editor {
    fn for_doc(doc_index: usize, doc: &EndpointDoc) -> Self {
        Self {
            doc_index,
            method: Method::parse(&doc.method).unwrap_or(Method::Get),
            headers: doc.headers.clone(),
            body: doc.body.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let client = DocsClient::new(&cfg)?;
    let sandbox: Arc<dyn Sandbox> = Arc::new(HttpSandbox::new(&cfg)?);
    let panel = Arc::new(DetailPanel::new());
    let retry_cfg = RetryConfig::with_retries(cfg.fetch_retries);

    json_log(
        "system",
        obj(&[("msg", v_str("docsim starting")), ("docs_base", v_str(&cfg.docs_base))]),
    );

    let docs: Vec<EndpointDoc> =
        retry_async(&retry_cfg, "fetch_docs", || client.fetch_docs()).await?;
    // A missing markdown index degrades the sidebar, not the browser.
    let markdowns: Vec<MarkdownEntry> =
        match retry_async(&retry_cfg, "fetch_markdowns", || client.fetch_markdown_index()).await {
            Ok(files) => files,
            Err(err) => {
                json_log(
                    "markdown",
                    obj(&[("msg", v_str("index unavailable")), ("error", v_str(&err.to_string()))]),
                );
                Vec::new()
            }
        };
    json_log(
        "catalog",
        obj(&[
            ("docs", v_num(docs.len() as f64)),
            ("markdowns", v_num(markdowns.len() as f64)),
        ]),
    );

    println!("{}", render::sidebar(&docs, &markdowns));

    let mut editor: Option<Editor> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        match cmd {
            "" => {}
            "docs" | "ls" => println!("{}", render::sidebar(&docs, &markdowns)),
            "show" => match parse_index(rest, docs.len()) {
                Some(i) => {
                    editor = Some(Editor::for_doc(i, &docs[i]));
                    let invocation = panel.begin();
                    panel.publish(invocation, render::endpoint_detail(&docs[i]));
                }
                None => println!("usage: show N (1..{})", docs.len()),
            },
            "md" => match parse_index(rest, markdowns.len()) {
                Some(i) => {
                    let entry = markdowns[i].clone();
                    let client = client.clone();
                    let panel = panel.clone();
                    let invocation = panel.begin();
                    json_log(
                        "markdown",
                        obj(&[
                            ("invocation_id", v_num(invocation as f64)),
                            ("path", v_str(&entry.path)),
                        ]),
                    );
                    tokio::spawn(async move {
                        let content = match client.fetch_markdown(&entry.path).await {
                            Ok(text) => render::markdown_view(&entry.name, &text),
                            Err(err) => format!("Error: {}", err),
                        };
                        panel.publish(invocation, content);
                    });
                }
                None => println!("usage: md N (1..{})", markdowns.len()),
            },
            "method" => match (&mut editor, Method::parse(rest)) {
                (None, _) => println!("select an endpoint first: show N"),
                (_, None) => println!("method must be GET, POST, PUT or DELETE"),
                (Some(editor), Some(method)) => editor.method = method,
            },
            "headers" => match &mut editor {
                None => println!("select an endpoint first: show N"),
                Some(editor) => editor.headers = rest.to_string(),
            },
            "body" => match &mut editor {
                None => println!("select an endpoint first: show N"),
                Some(editor) => editor.body = rest.to_string(),
            },
            "send" => match &editor {
                None => println!("select an endpoint first: show N"),
                Some(editor) => {
                    let doc = docs[editor.doc_index].clone();
                    let method = editor.method;
                    let headers = editor.headers.clone();
                    let body = editor.body.clone();
                    let sandbox = sandbox.clone();
                    let panel = panel.clone();
                    let invocation = panel.begin();
                    println!("Sending request to sandbox...");
                    tokio::spawn(async move {
                        let outcome =
                            simulate::run(sandbox.as_ref(), &doc, method, &headers, &body, invocation)
                                .await;
                        panel.publish(invocation, render::simulation_result(&outcome));
                    });
                }
            },
            "quit" | "exit" => break,
            _ => println!(
                "commands: docs | show N | md N | method M | headers JSON | body TEXT | send | quit"
            ),
        }
        prompt()?;
    }

    json_log("system", obj(&[("msg", v_str("docsim exiting"))]));
    Ok(())
}

fn prompt() -> Result<()> {
    print!("docsim> ");
    std::io::stdout().flush()?;
    Ok(())
}

fn parse_index(raw: &str, len: usize) -> Option<usize> {
    raw.parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}
