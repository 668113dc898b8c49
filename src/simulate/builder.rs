//! Constructs the wire request from the selected doc and the user's edits.

use indexmap::IndexMap;

use crate::catalog::EndpointDoc;

use super::{Method, SimulateError, SimulationRequest};

/// Build a request for one send. Header text is the single validation
/// gate: it must parse as a flat string-to-string JSON object, otherwise
/// the error is returned and the caller makes no network call. The body
/// is opaque payload and passes through verbatim.
pub fn build(
    doc: &EndpointDoc,
    method: Method,
    raw_headers_text: &str,
    raw_body_text: &str,
) -> Result<SimulationRequest, SimulateError> {
    let headers: IndexMap<String, String> =
        serde_json::from_str(raw_headers_text).map_err(SimulateError::InvalidHeaders)?;

    // Record-by-record copy so repeated sends always start from the
    // catalog's pristine seed, never a previous simulation's mutation.
    let default_db = doc
        .default_db
        .as_ref()
        .map(|records| records.iter().cloned().collect())
        .unwrap_or_default();

    Ok(SimulationRequest {
        endpoint: doc.endpoint.clone(),
        method,
        headers,
        body: raw_body_text.to_string(),
        default_db,
    })
}
