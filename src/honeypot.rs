// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Hidden trap field detection.

use crate::submission::Fields;
use serde_json::Value;
use tracing::debug;

/// True when the configured honeypot field carries a non-blank value.
///
/// Arrays trigger if any element would.
pub fn triggered(honeypot_field: Option<&str>, fields: &Fields) -> bool {
    let name = match honeypot_field {
        Some(name) if !name.is_empty() => name,
        _ => return false,
    };

    let hit = fields.get(name).is_some_and(has_content);
    if hit {
        debug!(field = %name, "Honeypot field filled");
    }
    hit
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => items.iter().any(has_content),
        Value::Object(map) => map.values().any(has_content),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
