//! Batch file reading and structural validation.
//!
//! A batch is a JSON object with a `bikes` and/or `parts` array. The whole document is
//! checked before anything is deserialized, and every problem found is reported in one
//! [`CatalogError::Validation`] so a malformed file never reaches a loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CatalogError, CatalogResult};
use crate::models::{RawBikeEntry, RawPartEntry};

/// Problems listed in a validation message before the rest are summarized.
const MAX_LISTED_PROBLEMS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bikes: Option<Vec<RawBikeEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<RawPartEntry>>,
}

impl RawBatch {
    pub fn bikes(&self) -> &[RawBikeEntry] {
        self.bikes.as_deref().unwrap_or_default()
    }

    pub fn parts(&self) -> &[RawPartEntry] {
        self.parts.as_deref().unwrap_or_default()
    }

    pub fn component_count(&self) -> usize {
        self.bikes().iter().map(|b| b.components.len()).sum()
    }
}

pub fn read_batch_file(path: &Path) -> CatalogResult<RawBatch> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CatalogError::Validation(format!("cannot read batch file {}: {e}", path.display()))
    })?;
    parse_batch(&text)
}

pub fn parse_batch(text: &str) -> CatalogResult<RawBatch> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CatalogError::Validation(format!("batch is not valid JSON: {e}")))?;
    batch_from_value(value)
}

pub fn batch_from_value(value: Value) -> CatalogResult<RawBatch> {
    validate_structure(&value)?;
    Ok(serde_json::from_value(value)?)
}

pub fn validate_structure(value: &Value) -> CatalogResult<()> {
    let mut problems = Problems::default();
    match value.as_object() {
        None => problems.push("$", "batch must be a JSON object"),
        Some(root) => {
            if !root.contains_key("bikes") && !root.contains_key("parts") {
                problems.push("$", "batch needs a \"bikes\" or \"parts\" array");
            }
            if let Some(bikes) = root.get("bikes") {
                check_array(&mut problems, "bikes", bikes, check_bike);
            }
            if let Some(parts) = root.get("parts") {
                check_array(&mut problems, "parts", parts, check_part);
            }
        }
    }
    problems.into_result()
}

#[derive(Default)]
struct Problems(Vec<String>);

impl Problems {
    fn push(&mut self, path: &str, message: impl AsRef<str>) {
        self.0.push(format!("{path}: {}", message.as_ref()));
    }

    fn into_result(self) -> CatalogResult<()> {
        if self.0.is_empty() {
            return Ok(());
        }
        let total = self.0.len();
        let mut listed: Vec<String> = self.0.into_iter().take(MAX_LISTED_PROBLEMS).collect();
        if total > MAX_LISTED_PROBLEMS {
            listed.push(format!("... and {} more", total - MAX_LISTED_PROBLEMS));
        }
        Err(CatalogError::Validation(format!(
            "{total} problem(s) in batch: {}",
            listed.join("; ")
        )))
    }
}

fn check_array(
    problems: &mut Problems,
    path: &str,
    value: &Value,
    check_entry: fn(&mut Problems, &str, &Map<String, Value>),
) {
    let Some(items) = value.as_array() else {
        problems.push(path, "expected an array");
        return;
    };
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{i}]");
        match item.as_object() {
            Some(obj) => check_entry(problems, &item_path, obj),
            None => problems.push(&item_path, "expected an object"),
        }
    }
}

fn check_required_text(problems: &mut Problems, path: &str, obj: &Map<String, Value>, key: &str) {
    match obj.get(key) {
        Some(Value::String(_)) => {}
        Some(_) => problems.push(&format!("{path}.{key}"), "expected a string"),
        None => problems.push(&format!("{path}.{key}"), "is required"),
    }
}

fn check_optional(
    problems: &mut Problems,
    path: &str,
    obj: &Map<String, Value>,
    key: &str,
    expected: &str,
    ok: fn(&Value) -> bool,
) {
    if let Some(v) = obj.get(key) {
        if !v.is_null() && !ok(v) {
            problems.push(&format!("{path}.{key}"), format!("expected {expected}"));
        }
    }
}

fn check_category(problems: &mut Problems, path: &str, obj: &Map<String, Value>) {
    let key = if obj.contains_key("category") {
        "category"
    } else if obj.contains_key("rawCategory") {
        "rawCategory"
    } else {
        problems.push(&format!("{path}.category"), "is required");
        return;
    };
    check_required_text(problems, path, obj, key);
}

fn check_product_fields(problems: &mut Problems, path: &str, obj: &Map<String, Value>) {
    check_required_text(problems, path, obj, "brand");
    check_required_text(problems, path, obj, "model");
    check_category(problems, path, obj);
    check_optional(problems, path, obj, "description", "a string", Value::is_string);
    check_optional(problems, path, obj, "imageUrl", "a string", Value::is_string);
    check_optional(problems, path, obj, "specifications", "an object", |v| {
        v.is_object() || v.is_array()
    });
}

fn check_bike(problems: &mut Problems, path: &str, obj: &Map<String, Value>) {
    check_product_fields(problems, path, obj);
    check_optional(problems, path, obj, "year", "an integer year", |v| {
        v.as_i64().is_some_and(|y| i32::try_from(y).is_ok())
    });
    match obj.get("components") {
        None => {}
        Some(components) => {
            check_array(problems, &format!("{path}.components"), components, check_component)
        }
    }
}

fn check_component(problems: &mut Problems, path: &str, obj: &Map<String, Value>) {
    check_required_text(problems, path, obj, "name");
    check_required_text(problems, path, obj, "category");
    check_required_text(problems, path, obj, "value");
    check_optional(
        problems,
        path,
        obj,
        "expectedDistance",
        "a non-negative integer (km)",
        |v| v.as_u64().is_some_and(|km| u32::try_from(km).is_ok()),
    );
}

fn check_part(problems: &mut Problems, path: &str, obj: &Map<String, Value>) {
    check_product_fields(problems, path, obj);
    let Some(price) = obj.get("price").filter(|p| !p.is_null()) else {
        return;
    };
    let price_path = format!("{path}.price");
    let Some(price) = price.as_object() else {
        problems.push(&price_path, "expected an object");
        return;
    };
    match price.get("amount") {
        Some(Value::Number(_)) => {}
        Some(Value::String(s)) if s.trim().parse::<f64>().is_ok() => {}
        Some(_) => problems.push(&format!("{price_path}.amount"), "expected a decimal amount"),
        None => problems.push(&format!("{price_path}.amount"), "is required"),
    }
    if price.get("currency").is_some_and(|c| !c.is_string()) {
        problems.push(&format!("{price_path}.currency"), "expected a string");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn accepts_a_well_formed_batch() {
        let batch = parse_batch(
            r#"{
                "bikes": [{
                    "brand": "Cube", "model": "Stereo 150", "category": "Fully", "year": 2023,
                    "specifications": {"travel": "150mm"},
                    "components": [{"name": "Fork", "category": "Gabel", "value": "Fox 36", "expectedDistance": 5000}]
                }],
                "parts": [{"brand": "Fox", "model": "36", "rawCategory": "fork", "price": {"amount": "999.00"}}]
            }"#,
        )
        .expect("valid batch");
        assert_eq!(batch.bikes().len(), 1);
        assert_eq!(batch.component_count(), 1);
        assert_eq!(batch.parts()[0].raw_category, "fork");
        assert_eq!(batch.parts()[0].price.as_ref().expect("price").currency, "EUR");
    }

    #[test]
    fn collects_every_problem_with_its_path() {
        let err = validate_structure(&json!({
            "bikes": [
                {"brand": "Cube", "model": 7, "category": "MTB"},
                {"brand": "Cube", "model": "Attention", "category": "MTB",
                 "components": [{"name": "Chain", "value": "KMC X12", "expectedDistance": -5}]},
                "not an object"
            ],
            "parts": {"brand": "nope"}
        }))
        .expect_err("invalid");
        let CatalogError::Validation(message) = err else {
            panic!("expected a validation error");
        };
        assert!(message.starts_with("5 problem(s)"), "{message}");
        assert!(message.contains("bikes[0].model: expected a string"));
        assert!(message.contains("bikes[1].components[0].category: is required"));
        assert!(message.contains("bikes[1].components[0].expectedDistance"));
        assert!(message.contains("bikes[2]: expected an object"));
        assert!(message.contains("parts: expected an array"));
    }

    #[test]
    fn rejects_empty_object_and_bad_json() {
        assert!(matches!(
            parse_batch("{}"),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            parse_batch("{\"bikes\": [}"),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            parse_batch("[]"),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn reads_from_disk_and_reports_missing_files() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"parts": []}}"#).expect("write");
        let batch = read_batch_file(file.path()).expect("batch");
        assert!(batch.parts().is_empty());
        assert!(batch.bikes.is_none());

        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.json");
        let err = read_batch_file(&missing).expect_err("missing");
        assert_eq!(err.kind(), "validation");
    }
}
