//! Conversion between nested JSON documents and flat path maps.
//!
//! Upstream sources deliver tree-shaped documents; the store addresses
//! leaves by dot-separated path. `flatten` bridges inbound payloads,
//! `unflatten_for_write` prepares outbound attribute writes.

use crate::error::{AdapterError, Result};
use crate::model::{DataMap, Value};
use crate::path::Path;

/// Flatten a JSON value into `path -> leaf` entries rooted at `prefix`.
///
/// Objects are walked recursively, every key extending the path by one
/// segment. Scalars, arrays and `null` are leaves. An empty object
/// contributes nothing.
pub fn flatten(prefix: &str, node: &Value) -> DataMap {
    let mut out = DataMap::new();
    flatten_into(&Path::new(prefix), node, &mut out);
    out
}

fn flatten_into(prefix: &Path, node: &Value, out: &mut DataMap) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(&prefix.join(key), child, out);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf.clone());
        }
    }
}

/// Parse a JSON document and flatten it under `prefix`.
pub fn flatten_json(prefix: &str, bytes: &[u8]) -> Result<DataMap> {
    let node: Value = serde_json::from_slice(bytes)?;
    Ok(flatten(prefix, &node))
}

/// Strip `required_prefix` from every path of an outbound write.
///
/// The remainder is kept as a single key ("a.b" stays "a.b"); no nesting
/// is rebuilt. The whole batch fails on the first path outside the prefix,
/// so callers never send a partial write.
pub fn unflatten_for_write(data: &DataMap, required_prefix: &str) -> Result<DataMap> {
    let prefix = Path::new(required_prefix);
    let mut out = DataMap::with_capacity(data.len());

    for (path, value) in data {
        let key = Path::new(path)
            .strip_prefix(&prefix)
            .ok_or_else(|| AdapterError::UnsupportedPath(path.clone()))?;
        out.insert(key, value.clone());
    }

    Ok(out)
}
