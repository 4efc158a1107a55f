//! `attrcodec decode`: batch-decode records read from a file or stdin.
//!
//! Accepted input shapes:
//! ```json
//! {"id": {"N": "7"}, "name": {"S": "widget"}}
//! [{"id": {"N": "7"}}, {"id": {"N": "8"}}]
//! {"Items": [{"id": {"N": "7"}}], "Count": 1}
//! {"Item": {"id": {"N": "7"}}}
//! ```

use anyhow::{anyhow, Context, Result};
use attrcodec_batch::{BatchConfig, BatchEngine, BatchRequest};
use attrcodec_core::{BatchSummary, DecodeResult, FieldPlan, Record, ScalarKind, TagPolicy};
use attrcodec_observability::DecodeMetrics;
use serde_json::{json, Value};
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

pub struct DecodeArgs {
    pub input: String,
    pub kind: Option<ScalarKind>,
    pub workers: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub config: Option<PathBuf>,
    pub strict_tags: bool,
    pub plans: Vec<(String, FieldPlan)>,
    pub json: bool,
}

pub fn run(args: DecodeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::from_file(path)
            .with_context(|| format!("loading config '{}'", path.display()))?,
        None => BatchConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.timeout_ms.is_some() {
        config.timeout_ms = args.timeout_ms;
    }
    if args.strict_tags {
        config.tag_policy = TagPolicy::Strict;
    }
    let kind = args.kind.unwrap_or(config.scalar_kind);

    let document = read_input(&args.input)?;
    let records = load_records(&document, &config)?;
    debug!(records = records.len(), input = %args.input, "decode: input loaded");

    let engine = BatchEngine::new(config)?;
    let mut request = BatchRequest::new(records).kind(kind);
    for (field, plan) in args.plans {
        request = request.plan(field, plan);
    }

    let metrics = DecodeMetrics::global();
    let started = Instant::now();
    let results = match engine.execute(request) {
        Ok(results) => results,
        Err(e) => {
            metrics.record_failure(&e);
            return Err(anyhow!("batch decode failed: {e}"));
        }
    };
    let summary = BatchSummary::of(&results);
    metrics.record_batch(&summary, kind, started.elapsed().as_secs_f64() * 1_000.0);

    if args.json {
        let rendered: Vec<Value> = results.iter().map(result_to_json).collect();
        let out = match rendered.as_slice() {
            [single] => single.clone(),
            _ => Value::Array(rendered),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_results(&results, &summary);
    }
    Ok(())
}

fn read_input(input: &str) -> Result<Value> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading '{input}'"))?
    };
    serde_json::from_str(&content).with_context(|| format!("'{input}' is not valid JSON"))
}

/// Turn any accepted input shape into records, classified under
/// `config.tag_policy`.
pub fn load_records(document: &Value, config: &BatchConfig) -> Result<Vec<Record>> {
    let items: Vec<&Value> = match document {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match (map.get("Items"), map.get("Item")) {
            (Some(Value::Array(items)), _) => items.iter().collect(),
            (None, Some(item @ Value::Object(_))) if map.len() == 1 => vec![item],
            _ => vec![document],
        },
        other => return Err(anyhow!("expected a JSON object or array, got {other}")),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            config
                .parse_record(item)
                .ok_or_else(|| anyhow!("item {i} is not a JSON object"))
        })
        .collect()
}

/// Field → `{"type": .., "value": ..}` or `{"error": {"kind": .., ..}}`.
fn result_to_json(result: &DecodeResult) -> Value {
    let fields = result
        .iter()
        .map(|(name, outcome)| {
            let rendered = match outcome {
                Ok(native) => serde_json::to_value(native).unwrap_or(Value::Null),
                Err(e) => json!({ "error": e }),
            };
            (name.clone(), rendered)
        })
        .collect();
    Value::Object(fields)
}

fn print_results(results: &[DecodeResult], summary: &BatchSummary) {
    for (i, result) in results.iter().enumerate() {
        if results.len() > 1 {
            println!("Record {}:", i);
        }
        let width = result.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        for (name, outcome) in result.iter() {
            match outcome {
                Ok(native) => println!("  {:width$}  {}", name, native, width = width),
                Err(e) => println!("  {:width$}  ✗ {}", name, e, width = width),
            }
        }
    }
    println!();
    println!(
        "{} fields: {} values, {} nulls, {} errors",
        summary.total,
        summary.values,
        summary.nulls,
        summary.error_count()
    );
}
