//! Parsing `terraform output -json`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use vmm_domain::{Error, Result};

#[derive(Debug, Deserialize)]
struct OutputValue {
    value: Value,
}

/// Extract `key` from the output document as a list of strings.
pub fn addresses(raw: &[u8], key: &str) -> Result<Vec<String>> {
    let outputs: HashMap<String, OutputValue> = serde_json::from_slice(raw)
        .map_err(|e| Error::provisioning("output", format!("invalid output JSON: {e}")))?;

    let output = outputs
        .get(key)
        .ok_or_else(|| Error::provisioning("output", format!("output '{key}' not found")))?;

    let Value::Array(items) = &output.value else {
        return Err(Error::provisioning(
            "output",
            format!("output '{key}' is not a list"),
        ));
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(Error::provisioning(
                "output",
                format!("output '{key}' contains non-string value {other}"),
            )),
        })
        .collect()
}
