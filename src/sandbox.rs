//! The execution sandbox collaborator: runs a simulated request against
//! the documented logic and seed data, somewhere else.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::simulate::{SimulationRequest, SimulationResponse};
use crate::state::Config;

#[async_trait]
pub trait Sandbox: Send + Sync {
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse>;
}

pub struct HttpSandbox {
    client: Client,
    base: String,
}

impl HttpSandbox {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base: cfg.docs_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Sandbox for HttpSandbox {
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse> {
        let url = format!("{}/api/simulate", self.base);
        let resp = self.client.post(&url).json(request).send().await?;
        // The sandbox reports execution errors inside a JSON body with its
        // own status field, so HTTP status is not checked here; only a
        // non-JSON reply is a transport failure.
        Ok(resp.json().await?)
    }
}

/// Canned reply with an optional artificial latency, for driving the
/// simulation workflow without a live sandbox.
pub struct ScriptedReply {
    pub delay_ms: u64,
    pub reply: Result<SimulationResponse, String>,
}

impl ScriptedReply {
    pub fn ok(raw: &str) -> Self {
        Self { delay_ms: 0, reply: Ok(serde_json::from_str(raw).expect("scripted reply JSON")) }
    }

    pub fn ok_after(delay_ms: u64, raw: &str) -> Self {
        Self { delay_ms, ..Self::ok(raw) }
    }

    pub fn failing(message: &str) -> Self {
        Self { delay_ms: 0, reply: Err(message.to_string()) }
    }
}

// Stub collaborator to make integration explicit.
pub struct ScriptedSandbox {
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: std::sync::atomic::AtomicU64,
}

impl ScriptedSandbox {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Sandbox for ScriptedSandbox {
    async fn simulate(&self, _request: &SimulationRequest) -> Result<SimulationResponse> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let scripted = self
            .replies
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .ok_or_else(|| anyhow!("scripted sandbox exhausted"))?;
        if scripted.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(scripted.delay_ms)).await;
        }
        scripted.reply.map_err(|msg| anyhow!(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::Method;
    use indexmap::IndexMap;

    fn request() -> SimulationRequest {
        SimulationRequest {
            endpoint: "/api/ping".to_string(),
            method: Method::Get,
            headers: IndexMap::new(),
            body: String::new(),
            default_db: vec![],
        }
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let sandbox = ScriptedSandbox::new(vec![
            ScriptedReply::ok(r#"{"response":{"status":200}}"#),
            ScriptedReply::failing("boom"),
        ]);

        let first = sandbox.simulate(&request()).await.unwrap();
        assert_eq!(first.response.status, Some(200));

        let second = sandbox.simulate(&request()).await;
        assert_eq!(second.unwrap_err().to_string(), "boom");

        assert_eq!(sandbox.calls(), 2);
    }

    #[tokio::test]
    async fn test_scripted_exhaustion_is_an_error() {
        let sandbox = ScriptedSandbox::new(vec![]);
        assert!(sandbox.simulate(&request()).await.is_err());
    }
}
