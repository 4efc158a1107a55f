//! `attrcodec test`: run golden test fixture files.
//!
//! Fixture format (JSON):
//! ```json
//! {
//!   "description": "Order row with exact prices",
//!   "kind": "auto",
//!   "workers": 4,
//!   "tagPolicy": "first_match",
//!   "plans": { "pk": { "kind": "integer", "strip_prefix": "ORDER#" } },
//!   "item": {
//!     "pk":    { "S": "ORDER#1042" },
//!     "price": { "N": "19.990" },
//!     "qty":   { "N": "99999999999999999999" }
//!   },
//!   "expectedFields": {
//!     "pk":    1042,
//!     "price": { "type": "decimal", "value": "19.990" },
//!     "qty":   "99999999999999999999"
//!   }
//! }
//! ```
//!
//! An expected value is one of: `{"error": "<kind>"}`, a serialized
//! `{"type": .., "value": ..}` native value, `null`, or a plain JSON scalar
//! compared against the decoded value's display form.

use anyhow::Result;
use attrcodec_batch::{BatchConfig, BatchEngine, BatchRequest};
use attrcodec_core::{DecodeOutcome, DecodeResult, FieldPlan, ScalarKind, TagPolicy};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    description: Option<String>,
    #[serde(default)]
    kind: ScalarKind,
    #[serde(default)]
    workers: Option<usize>,
    #[serde(default)]
    tag_policy: TagPolicy,
    #[serde(default)]
    plans: IndexMap<String, FieldPlan>,
    item: Value,
    expected_fields: Map<String, Value>,
}

pub fn run(fixtures_dir: &str, show: bool) -> Result<()> {
    let dir = Path::new(fixtures_dir);
    if !dir.exists() {
        println!("Fixtures directory '{}' not found, skipping", fixtures_dir);
        return Ok(());
    }

    let mut passed = 0usize;
    let mut failed = 0usize;

    let fixture_paths = collect_json_files(dir);

    for path in &fixture_paths {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("  ✗ {}: read error: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        let fixture: Fixture = match serde_json::from_str(&content) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("  ✗ {}: parse error: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        let name = path.display().to_string();
        let desc = fixture.description.as_deref().unwrap_or(&name);

        let decoded = match decode_fixture(&fixture) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("  ✗ {}: {}", desc, e);
                failed += 1;
                continue;
            }
        };

        let mut errors: Vec<String> = Vec::new();
        for (field, expected) in &fixture.expected_fields {
            match decoded.get(field) {
                None => errors.push(format!("missing field '{}'", field)),
                Some(actual) => {
                    if let Some(mismatch) = compare(actual, expected) {
                        errors.push(format!("field '{}': {}", field, mismatch));
                    }
                }
            }
        }

        if errors.is_empty() {
            println!("  ✓ {}", desc);
            if show {
                for (k, v) in decoded.iter() {
                    match v {
                        Ok(native) => println!("      {}: {}", k, native),
                        Err(e) => println!("      {}: ✗ {}", k, e),
                    }
                }
            }
            passed += 1;
        } else {
            eprintln!("  ✗ {}", desc);
            for e in &errors {
                eprintln!("      {}", e);
            }
            failed += 1;
        }
    }

    println!();
    println!(
        "Results: {} passed, {} failed  (total fixtures: {})",
        passed,
        failed,
        fixture_paths.len()
    );

    if failed > 0 {
        anyhow::bail!("{} fixture(s) failed", failed);
    }
    Ok(())
}

fn decode_fixture(fixture: &Fixture) -> Result<DecodeResult> {
    let config = BatchConfig {
        tag_policy: fixture.tag_policy,
        ..BatchConfig::default()
    };
    let record = config
        .parse_record(&fixture.item)
        .ok_or_else(|| anyhow::anyhow!("'item' is not a JSON object"))?;

    let engine = BatchEngine::on_global_pool(config);
    let mut request = BatchRequest::single(record).kind(fixture.kind);
    if let Some(workers) = fixture.workers {
        request = request.workers(workers);
    }
    for (field, plan) in &fixture.plans {
        request = request.plan(field.clone(), plan.clone());
    }

    let mut results = engine.execute(request)?;
    Ok(results.pop().unwrap_or_default())
}

/// `None` when `actual` satisfies `expected`, otherwise a description of
/// the mismatch.
fn compare(actual: &DecodeOutcome, expected: &Value) -> Option<String> {
    let expected_error = expected
        .as_object()
        .filter(|o| o.len() == 1)
        .and_then(|o| o.get("error"))
        .and_then(Value::as_str);

    match (actual, expected_error) {
        (Err(e), Some(kind)) if e.kind().as_str() == kind => None,
        (Err(e), Some(kind)) => Some(format!(
            "got error '{}', want error '{}'",
            e.kind().as_str(),
            kind
        )),
        (Err(e), None) => Some(format!("got error '{}', want {}", e, expected)),
        (Ok(native), Some(kind)) => Some(format!("got '{}', want error '{}'", native, kind)),
        (Ok(native), None) => {
            let matches = match expected {
                Value::Null => native.is_null(),
                Value::Object(_) => serde_json::to_value(native).ok().as_ref() == Some(expected),
                other => native.to_string() == json_value_to_string(other),
            };
            (!matches).then(|| format!("got '{}', want {}", native, expected))
        }
    }
}

fn json_value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn collect_json_files(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
        .map(|e| e.into_path())
        .collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrcodec_core::{DecodeError, NativeValue};
    use serde_json::json;

    #[test]
    fn error_expectations_match_by_kind() {
        let actual: DecodeOutcome = Err(DecodeError::Overflow {
            target: "integer",
            input: "1e30".into(),
        });
        assert!(compare(&actual, &json!({"error": "overflow"})).is_none());
        assert!(compare(&actual, &json!({"error": "invalid_format"})).is_some());
        assert!(compare(&actual, &json!(5)).is_some());
    }

    #[test]
    fn value_expectations() {
        let int: DecodeOutcome = Ok(NativeValue::Integer(42));
        assert!(compare(&int, &json!(42)).is_none());
        assert!(compare(&int, &json!("42")).is_none());
        assert!(compare(&int, &json!({"type": "integer", "value": 42})).is_none());
        assert!(compare(&int, &json!({"type": "decimal", "value": "42"})).is_some());
        assert!(compare(&int, &json!({"error": "overflow"})).is_some());

        let null: DecodeOutcome = Ok(NativeValue::Null);
        assert!(compare(&null, &Value::Null).is_none());
        assert!(compare(&int, &Value::Null).is_some());
    }

    #[test]
    fn fixture_deserializes_with_defaults() {
        let fixture: Fixture = serde_json::from_value(json!({
            "item": {"a": {"N": "1"}},
            "expectedFields": {"a": 1}
        }))
        .unwrap();
        assert_eq!(fixture.kind, ScalarKind::Auto);
        assert_eq!(fixture.tag_policy, TagPolicy::FirstMatch);
        assert!(fixture.plans.is_empty());

        let decoded = decode_fixture(&fixture).unwrap();
        assert_eq!(decoded.get("a"), Some(&Ok(NativeValue::Integer(1))));
    }

    #[test]
    fn fixture_tag_policy_is_applied() {
        let fixture: Fixture = serde_json::from_value(json!({
            "tagPolicy": "strict",
            "item": {"v": {"S": "a", "N": "1"}},
            "expectedFields": {"v": {"error": "unsupported_type"}}
        }))
        .unwrap();
        let decoded = decode_fixture(&fixture).unwrap();
        let outcome = decoded.get("v").unwrap();
        assert!(compare(outcome, &fixture.expected_fields["v"]).is_none());
    }
}
