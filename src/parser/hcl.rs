//! Terraform document parsing.
//!
//! `.tf` files are parsed with `hcl-rs` and lowered into a nested JSON-like
//! mapping; `.tf.json` files already are one. Either way the graph builder
//! only sees [`Document`] values.
//!
//! Lowering rules:
//! - attributes become `key: value`
//! - a block becomes `identifier -> label... -> body`
//! - sibling blocks sharing a path merge at the label levels; identical
//!   paths (e.g. two unlabeled `ingress` blocks) collect into a list
//! - literals stay literals, anything else (references, calls, templates)
//!   becomes its HCL source text

use crate::error::{Result, ResultExt, TfScopeError};
use crate::types::ModuleCall;
use hcl::{Body, Expression, Structure};
use serde_json::{Map, Value};
use std::path::Path;

/// A parsed Terraform file as a nested mapping.
pub type Document = Value;

/// Read and parse one Terraform file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, `HclParse` on syntax errors.
pub fn parse_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).with_path(path)?;
    parse_document_str(&content, path)
}

/// Parse file content, choosing the syntax from the file name.
///
/// # Errors
///
/// Returns `HclParse` on syntax errors.
pub fn parse_document_str(content: &str, path: &Path) -> Result<Document> {
    if is_json_document(path) {
        serde_json::from_str(content)
            .map_err(|e| TfScopeError::hcl_parse(path, e.to_string(), file!(), line!()))
    } else {
        let body: Body = hcl::parse(content)
            .map_err(|e| TfScopeError::hcl_parse(path, e.to_string(), file!(), line!()))?;
        Ok(body_to_value(&body))
    }
}

/// True for Terraform JSON syntax files (`*.tf.json`).
#[must_use]
pub fn is_json_document(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".tf.json")
}

fn body_to_value(body: &Body) -> Value {
    let mut map = Map::new();

    for structure in body.iter() {
        match structure {
            Structure::Attribute(attr) => {
                map.insert(attr.key.as_str().to_string(), expression_to_value(&attr.expr));
            }
            Structure::Block(block) => {
                let mut value = body_to_value(&block.body);
                for label in block.labels.iter().rev() {
                    let mut wrapper = Map::new();
                    wrapper.insert(label.as_str().to_string(), value);
                    value = Value::Object(wrapper);
                }
                merge_block(&mut map, block.identifier.as_str(), value, block.labels.len());
            }
        }
    }

    Value::Object(map)
}

/// Insert a lowered block, merging through `label_depth` levels of labels.
fn merge_block(map: &mut Map<String, Value>, key: &str, value: Value, label_depth: usize) {
    match map.get_mut(key) {
        None => {
            map.insert(key.to_string(), value);
        }
        Some(Value::Object(existing)) if label_depth > 0 => {
            if let Value::Object(incoming) = value {
                for (label, inner) in incoming {
                    merge_block(existing, &label, inner, label_depth - 1);
                }
            }
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

fn expression_to_value(expr: &Expression) -> Value {
    match expr {
        Expression::Null => Value::Null,
        Expression::Bool(b) => Value::Bool(*b),
        Expression::Number(n) => n
            .as_i64()
            .map(Value::from)
            .or_else(|| n.as_u64().map(Value::from))
            .or_else(|| n.as_f64().and_then(serde_json::Number::from_f64).map(Value::Number))
            .unwrap_or(Value::Null),
        Expression::String(s) => Value::String(s.clone()),
        Expression::Array(items) => Value::Array(items.iter().map(expression_to_value).collect()),
        Expression::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, value)| (key.to_string(), expression_to_value(value)))
                .collect(),
        ),
        Expression::TemplateExpr(template) => Value::String(template.to_string()),
        other => Value::String(other.to_string()),
    }
}

/// Extract `module` calls from a parsed document, in document order.
///
/// Accepts both encodings of the top-level `module` entry: a mapping of
/// `name -> config`, or a list of such mappings. A module's config may
/// itself be a mapping or a list of mappings (Terraform JSON allows both).
#[must_use]
pub fn extract_module_calls(document: &Document) -> Vec<ModuleCall> {
    let Some(modules) = document.get("module") else {
        return Vec::new();
    };

    let groups: Vec<&Map<String, Value>> = match modules {
        Value::Object(map) => vec![map],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    };

    let mut calls = Vec::new();
    for group in groups {
        for (name, config) in group {
            match module_source(config) {
                Some(source) => calls.push(ModuleCall {
                    name: name.clone(),
                    source: source.to_string(),
                }),
                None => tracing::debug!(module = %name, "Module block without a string source"),
            }
        }
    }
    calls
}

fn module_source(config: &Value) -> Option<&str> {
    match config {
        Value::Object(map) => map.get("source").and_then(Value::as_str),
        Value::Array(items) => items.iter().find_map(module_source),
        _ => None,
    }
}
