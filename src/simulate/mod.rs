//! Request simulation: building wire requests for the execution sandbox,
//! the per-invocation phase machine, and reconciliation of the sandbox's
//! loosely-shaped replies into a renderable form.

pub mod builder;
pub mod phase;
pub mod reconcile;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{EndpointDoc, Record};
use crate::logging::{json_log, obj, params_hash, v_num, v_str};
use crate::sandbox::Sandbox;

use self::phase::{apply_event, Phase, PhaseEvent};
use self::reconcile::RenderedSimulation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The wire request sent to the sandbox. Built fresh on every send; the
/// seed dataset is a deep copy, never a view of the catalog's records.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRequest {
    pub endpoint: String,
    pub method: Method,
    pub headers: IndexMap<String, String>,
    pub body: String,
    #[serde(rename = "defaultDB")]
    pub default_db: Vec<Record>,
}

/// A collection the sandbox may serialize either as a JSON array or as a
/// keyed object (e.g. `{"1": {...}, "2": {...}}`). Resolved into a plain
/// ordered sequence exactly once, at this boundary; nothing downstream
/// ever sees the ambiguity.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeqOrMap<T> {
    Seq(Vec<T>),
    Keyed(IndexMap<String, T>),
}

impl<T> SeqOrMap<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            SeqOrMap::Seq(items) => items,
            // Keyed maps normalize to their values in insertion order,
            // not sorted by key.
            SeqOrMap::Keyed(map) => map.into_values().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// The sandbox's reply. Every field may be missing or differently shaped;
/// only outright non-JSON counts as a failure.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationResponse {
    #[serde(default)]
    pub response: ResponseEnvelope,
    #[serde(default)]
    pub log: Option<SeqOrMap<String>>,
    #[serde(default)]
    pub db: Option<SeqOrMap<Value>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulateError {
    /// User-edited header text did not parse as a flat string-to-string
    /// JSON object. Nothing was sent.
    #[error("Invalid headers JSON")]
    InvalidHeaders(#[source] serde_json::Error),
}

/// Terminal outcome of one simulation invocation.
#[derive(Debug)]
pub enum SimulationOutcome {
    /// Header validation failed; no network call was made.
    InvalidHeaders(SimulateError),
    /// The sandbox replied and the reply was reconciled.
    Reconciled(RenderedSimulation),
    /// The exchange itself failed (unreachable sandbox or non-JSON reply).
    TransportFailed(String),
}

/// Drive one invocation through its phase machine: validate and build,
/// submit, reconcile. Exactly one network attempt; a failed or malformed
/// exchange is surfaced once and the user re-invokes manually.
pub async fn run(
    sandbox: &dyn Sandbox,
    doc: &EndpointDoc,
    method: Method,
    headers_text: &str,
    body_text: &str,
    invocation: u64,
) -> SimulationOutcome {
    let mut current = Phase::Idle;
    step(&mut current, PhaseEvent::Build, invocation);

    let request = match builder::build(doc, method, headers_text, body_text) {
        Ok(request) => request,
        Err(err) => {
            step(&mut current, PhaseEvent::HeadersRejected, invocation);
            return SimulationOutcome::InvalidHeaders(err);
        }
    };

    json_log(
        "simulate",
        obj(&[
            ("invocation_id", v_num(invocation as f64)),
            ("endpoint", v_str(&request.endpoint)),
            ("method", v_str(request.method.as_str())),
            ("body_hash", v_str(&params_hash(&request.body))),
            ("seed_records", v_num(request.default_db.len() as f64)),
        ]),
    );
    step(&mut current, PhaseEvent::Submit, invocation);

    match sandbox.simulate(&request).await {
        Ok(response) => {
            step(&mut current, PhaseEvent::Reply, invocation);
            SimulationOutcome::Reconciled(reconcile::reconcile(response))
        }
        Err(err) => {
            step(&mut current, PhaseEvent::TransportError, invocation);
            SimulationOutcome::TransportFailed(err.to_string())
        }
    }
}

fn step(current: &mut Phase, event: PhaseEvent, invocation: u64) {
    if let Ok((prev, next)) = apply_event(current, event) {
        json_log(
            "simulate_phase",
            obj(&[
                ("invocation_id", v_num(invocation as f64)),
                ("prev_phase", v_str(&format!("{:?}", prev))),
                ("new_phase", v_str(&format!("{:?}", next))),
            ]),
        );
    }
}
