//! In-memory batch backend for tests.
//!
//! [`RecordingBackend`] answers each parameter set through a responder
//! closure, records every batch it receives, and can shuffle, corrupt or
//! fail its output to exercise the executor's regrouping and error paths.

use std::sync::Mutex;

use async_trait::async_trait;
use dataset::RawRow;
use ocean_common::{OceanError, OceanResult};
use storage::{Batch, ParamSet, QueryBackend, TaggedRow};

type Responder = dyn Fn(usize, &ParamSet) -> Vec<RawRow> + Send + Sync;

/// One batch as seen by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    pub template: String,
    /// Template SQL with parameters left as `:name` placeholders.
    pub sql: String,
    pub param_sets: Vec<ParamSet>,
}

impl RecordedBatch {
    /// Value of parameter `name` in every parameter set, in order.
    pub fn values(&self, name: &str) -> Vec<Option<storage::ParamValue>> {
        self.param_sets.iter().map(|s| s.get(name).cloned()).collect()
    }
}

/// A scripted [`QueryBackend`].
pub struct RecordingBackend {
    responder: Box<Responder>,
    interleave: bool,
    failure: Option<String>,
    stray_index: Option<usize>,
    batches: Mutex<Vec<RecordedBatch>>,
}

impl RecordingBackend {
    /// Backend answering parameter set `i` with `responder(i, set)`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(usize, &ParamSet) -> Vec<RawRow> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            interleave: false,
            failure: None,
            stray_index: None,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Backend that matches nothing.
    pub fn empty() -> Self {
        Self::new(|_, _| Vec::new())
    }

    /// Backend that fails every batch with a database error.
    pub fn failing(message: impl Into<String>) -> Self {
        let mut backend = Self::empty();
        backend.failure = Some(message.into());
        backend
    }

    /// Emit rows round-robin across parameter sets, last set first, instead
    /// of grouped by set. Per-set order is kept.
    pub fn interleaved(mut self) -> Self {
        self.interleave = true;
        self
    }

    /// Append one row tagged with an index outside the batch.
    pub fn with_stray_row(mut self, index: usize) -> Self {
        self.stray_index = Some(index);
        self
    }

    /// Every batch received so far.
    pub fn batches(&self) -> Vec<RecordedBatch> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    /// Number of round trips made so far.
    pub fn call_count(&self) -> usize {
        self.batches.lock().map(|b| b.len()).unwrap_or_default()
    }

    /// The most recent batch.
    pub fn last_batch(&self) -> Option<RecordedBatch> {
        self.batches
            .lock()
            .ok()
            .and_then(|b| b.last().cloned())
    }
}

#[async_trait]
impl QueryBackend for RecordingBackend {
    async fn execute_tagged(&self, batch: &Batch<'_>) -> OceanResult<Vec<TaggedRow>> {
        let recorded = RecordedBatch {
            template: batch.template().name().to_string(),
            sql: batch.template().render(|name| format!(":{}", name)),
            param_sets: batch.param_sets().to_vec(),
        };
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(recorded);
        }

        if let Some(message) = &self.failure {
            return Err(OceanError::DatabaseError(message.clone()));
        }

        let per_set: Vec<Vec<RawRow>> = batch
            .param_sets()
            .iter()
            .enumerate()
            .map(|(i, set)| (self.responder)(i, set))
            .collect();

        let mut tagged = if self.interleave {
            interleave(per_set)
        } else {
            per_set
                .into_iter()
                .enumerate()
                .flat_map(|(i, rows)| rows.into_iter().map(move |r| (i, r)))
                .collect()
        };

        if let Some(index) = self.stray_index {
            tagged.push((index, RawRow::new().with("stray", true)));
        }
        Ok(tagged)
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn interleave(per_set: Vec<Vec<RawRow>>) -> Vec<TaggedRow> {
    let mut queues: Vec<std::vec::IntoIter<RawRow>> =
        per_set.into_iter().map(Vec::into_iter).collect();
    let mut out = Vec::new();
    loop {
        let mut emitted = false;
        for (i, queue) in queues.iter_mut().enumerate().rev() {
            if let Some(row) = queue.next() {
                out.push((i, row));
                emitted = true;
            }
        }
        if !emitted {
            return out;
        }
    }
}
