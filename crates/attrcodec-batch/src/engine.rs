//! `BatchEngine`: sharded, concurrent decoding of whole records.
//!
//! A call runs in four steps:
//!
//! 1. Flatten every (field, value) pair into one immutable `Arc<[Entry]>`.
//! 2. Split it into contiguous index ranges, one per shard.
//! 3. Decode each shard into a buffer owned by the thread that runs it.
//!    Every shard is queued on the pool; the calling thread then runs any
//!    shard the pool has not picked up yet, and waits on a channel for the
//!    rest. Each shard is claimed exactly once.
//! 4. Merge the buffers in shard order.
//!
//! Workers only ever read shared data, so no lock is involved.
//!
//! The deadline and cancellation are checked between fields. A timed-out or
//! panicked batch sets a cancel flag, so shards still running stop after
//! their current field instead of holding pool threads.

use crate::{config::BatchConfig, request::BatchRequest, shard::shard_ranges};
use attrcodec_core::{
    AttributeDecoder, AttributeValue, BatchSummary, ConfigError, DecodeError, DecodeOutcome,
    DecodeResult, FieldDecoder, FieldPlan, Record, ScalarKind,
};
use indexmap::IndexMap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    ops::Range,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    time::Instant,
};
use tracing::{debug, info, warn};

/// Default worker (and shard) count.
pub const DEFAULT_WORKERS: usize = 4;

/// One field of the frozen input list.
struct Entry {
    record: usize,
    name: String,
    value: AttributeValue,
}

/// Batch decode engine.
///
/// Owns a fixed-size worker pool that is reused across calls and holds no
/// per-call state.
pub struct BatchEngine {
    config: BatchConfig,
    /// `None` runs shards on rayon's global pool
    pool: Option<Arc<ThreadPool>>,
    decoder: Arc<dyn FieldDecoder>,
}

impl BatchEngine {
    /// Build an engine with its own pool of `config.workers` threads.
    pub fn new(config: BatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let prefix = config.thread_name.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(move |i| format!("{prefix}-{i}"))
            .build()
            .map_err(|e| ConfigError::PoolBuild(e.to_string()))?;
        Ok(Self {
            config,
            pool: Some(Arc::new(pool)),
            decoder: Arc::new(AttributeDecoder),
        })
    }

    /// Build an engine that schedules shards on rayon's global pool.
    pub fn on_global_pool(config: BatchConfig) -> Self {
        Self {
            config,
            pool: None,
            decoder: Arc::new(AttributeDecoder),
        }
    }

    /// Replace the per-field decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn FieldDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Decode every field of one record.
    pub fn decode(&self, record: &Record, kind: ScalarKind) -> Result<DecodeResult, DecodeError> {
        let mut results = self.execute(BatchRequest::single(record.clone()).kind(kind))?;
        Ok(results.pop().unwrap_or_default())
    }

    /// Decode a collection of records as one batch. Shards may span record
    /// boundaries; results come back one per record, in input order.
    pub fn decode_many(
        &self,
        records: &[Record],
        kind: ScalarKind,
    ) -> Result<Vec<DecodeResult>, DecodeError> {
        self.execute(BatchRequest::new(records.to_vec()).kind(kind))
    }

    /// Execute a batch decode request.
    ///
    /// Per-field failures are returned inside the results. `Err` is reserved
    /// for batch-level failures (timeout, worker panic), in which case no
    /// partial output is returned.
    pub fn execute(&self, req: BatchRequest) -> Result<Vec<DecodeResult>, DecodeError> {
        let kind = req.kind.unwrap_or(self.config.scalar_kind);
        let workers = req.workers.unwrap_or(self.config.workers);
        let record_count = req.records.len();
        let started = Instant::now();

        info!(
            records = record_count,
            fields = req.field_count(),
            workers,
            kind = %kind,
            "BatchEngine: decoding"
        );

        let entries: Arc<[Entry]> = req
            .records
            .into_iter()
            .enumerate()
            .flat_map(|(record, fields)| {
                fields
                    .into_iter()
                    .map(move |(name, value)| Entry { record, name, value })
            })
            .collect();
        let plans = Arc::new(req.plans);
        let ranges = shard_ranges(entries.len(), workers);

        let buffers = self.run_shards(Arc::clone(&entries), plans, kind, ranges.clone())?;

        let mut results: Vec<DecodeResult> =
            (0..record_count).map(|_| DecodeResult::new()).collect();
        for (range, outcomes) in ranges.iter().zip(buffers) {
            for (entry, outcome) in entries[range.clone()].iter().zip(outcomes) {
                results[entry.record].insert(entry.name.clone(), outcome);
            }
        }

        let summary = BatchSummary::of(&results);
        info!(
            fields = summary.total,
            values = summary.values,
            nulls = summary.nulls,
            errors = summary.error_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "BatchEngine: complete"
        );

        Ok(results)
    }

    fn run_shards(
        &self,
        entries: Arc<[Entry]>,
        plans: Arc<IndexMap<String, FieldPlan>>,
        kind: ScalarKind,
        ranges: Vec<Range<usize>>,
    ) -> Result<Vec<Vec<DecodeOutcome>>, DecodeError> {
        let shards = ranges.len();
        let batch = Arc::new(ShardSet {
            entries,
            plans,
            kind,
            decoder: Arc::clone(&self.decoder),
            claimed: (0..shards).map(|_| AtomicBool::new(false)).collect(),
            ranges,
            cancelled: AtomicBool::new(false),
            deadline: self.config.timeout().map(|t| Instant::now() + t),
        });
        let (tx, rx) = mpsc::channel::<(usize, ShardOutput)>();

        for shard in 0..shards {
            let tx = tx.clone();
            let batch = Arc::clone(&batch);
            self.spawn(move || {
                if batch.claim(shard) {
                    // Receiver is gone once the batch has failed
                    let _ = tx.send((shard, batch.run(shard)));
                }
            });
        }
        drop(tx);

        let mut buffers: Vec<Option<Vec<DecodeOutcome>>> = (0..shards).map(|_| None).collect();

        // Run whatever the pool has not started yet, last shard first.
        let mut pending = shards;
        for shard in (0..shards).rev() {
            if batch.claim(shard) {
                pending -= 1;
                let output = batch.run(shard);
                self.settle(&batch, shard, output, &mut buffers)?;
            }
        }

        for _ in 0..pending {
            let message = match batch.deadline {
                Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match message {
                Ok((shard, output)) => self.settle(&batch, shard, output, &mut buffers)?,
                Err(RecvTimeoutError::Timeout) => return Err(self.timed_out(&batch)),
                Err(RecvTimeoutError::Disconnected) => {
                    batch.cancel();
                    let shard = buffers.iter().position(Option::is_none).unwrap_or_default();
                    warn!(shard, "BatchEngine: worker exited without reporting");
                    return Err(DecodeError::WorkerPanicked { shard });
                }
            }
        }

        Ok(buffers.into_iter().flatten().collect())
    }

    /// Store a finished shard, or turn a failed one into the batch error.
    fn settle(
        &self,
        batch: &ShardSet,
        shard: usize,
        output: ShardOutput,
        buffers: &mut [Option<Vec<DecodeOutcome>>],
    ) -> Result<(), DecodeError> {
        match output {
            ShardOutput::Done(outcomes) => {
                buffers[shard] = Some(outcomes);
                Ok(())
            }
            ShardOutput::Stopped => Err(self.timed_out(batch)),
            ShardOutput::Panicked => {
                batch.cancel();
                warn!(shard, "BatchEngine: worker panicked, discarding batch");
                Err(DecodeError::WorkerPanicked { shard })
            }
        }
    }

    fn timed_out(&self, batch: &ShardSet) -> DecodeError {
        batch.cancel();
        let ms = self.config.timeout_ms.unwrap_or_default();
        warn!(timeout_ms = ms, "BatchEngine: deadline exceeded, discarding batch");
        DecodeError::Timeout { ms }
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
    }
}

/// How a shard run ended.
enum ShardOutput {
    Done(Vec<DecodeOutcome>),
    /// Cancelled or past the deadline before its last field
    Stopped,
    Panicked,
}

/// Per-call state shared by the caller and the pool jobs.
struct ShardSet {
    entries: Arc<[Entry]>,
    plans: Arc<IndexMap<String, FieldPlan>>,
    kind: ScalarKind,
    decoder: Arc<dyn FieldDecoder>,
    ranges: Vec<Range<usize>>,
    /// Set by whichever thread runs the shard; each shard runs once
    claimed: Vec<AtomicBool>,
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

impl ShardSet {
    fn claim(&self, shard: usize) -> bool {
        !self.claimed[shard].swap(true, Ordering::AcqRel)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    fn should_stop(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.deadline.map_or(false, |at| Instant::now() >= at)
    }

    fn run(&self, shard: usize) -> ShardOutput {
        let started = Instant::now();
        let range = self.ranges[shard].clone();
        let fields = range.len();
        let output = panic::catch_unwind(AssertUnwindSafe(|| self.decode_range(range)));
        debug!(
            shard,
            fields,
            elapsed_us = started.elapsed().as_micros() as u64,
            "shard finished"
        );
        match output {
            Ok(Some(outcomes)) => ShardOutput::Done(outcomes),
            Ok(None) => ShardOutput::Stopped,
            Err(_) => ShardOutput::Panicked,
        }
    }

    /// `None` if the batch was cancelled or ran out of time between fields.
    fn decode_range(&self, range: Range<usize>) -> Option<Vec<DecodeOutcome>> {
        let mut out = Vec::with_capacity(range.len());
        for e in &self.entries[range] {
            if self.should_stop() {
                return None;
            }
            let plan = self.plans.get(&e.name);
            out.push(self.decoder.decode_field(&e.name, &e.value, self.kind, plan));
        }
        Some(out)
    }
}

/// Decode one record on rayon's global pool with `workers` shards.
///
/// A `workers` of 0 is treated as 1.
pub fn decode_batch(
    record: &Record,
    kind: ScalarKind,
    workers: usize,
) -> Result<DecodeResult, DecodeError> {
    BatchEngine::on_global_pool(BatchConfig::with_workers(workers.max(1))).decode(record, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrcodec_core::NativeValue;

    fn record(pairs: &[(&str, AttributeValue)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn empty_record_decodes_to_empty_result() {
        let engine = BatchEngine::new(BatchConfig::default()).unwrap();
        let out = engine.decode(&Record::new(), ScalarKind::Auto).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn zero_workers_rejected_at_construction() {
        let err = BatchEngine::new(BatchConfig::with_workers(0)).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidWorkerCount));
    }

    #[test]
    fn preserves_field_order_across_shards() {
        let rec: Record = (0..17)
            .map(|i| (format!("f{i:02}"), AttributeValue::Number(i.to_string())))
            .collect();
        let out = decode_batch(&rec, ScalarKind::Integer, 4).unwrap();
        let keys: Vec<_> = out.iter().map(|(k, _)| k.clone()).collect();
        let expected: Vec<_> = rec.keys().cloned().collect();
        assert_eq!(keys, expected);
        assert_eq!(out.get("f16").unwrap().as_ref().unwrap(), &NativeValue::Integer(16));
    }

    #[test]
    fn request_plans_apply_in_every_record() {
        let engine = BatchEngine::new(BatchConfig::with_workers(2)).unwrap();
        let a = record(&[("pk", AttributeValue::String("USER#1".into()))]);
        let b = record(&[("pk", AttributeValue::String("USER#2".into()))]);
        let plan = attrcodec_core::FieldPlan::new(attrcodec_core::FieldKind::Integer)
            .strip_prefix("USER#");
        let out = engine
            .execute(BatchRequest::new(vec![a, b]).plan("pk", plan))
            .unwrap();
        assert_eq!(out[0].get("pk").unwrap(), &Ok(NativeValue::Integer(1)));
        assert_eq!(out[1].get("pk").unwrap(), &Ok(NativeValue::Integer(2)));
    }
}
