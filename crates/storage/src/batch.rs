//! Order-preserving batch execution.
//!
//! N parameter sets go to the store in one round trip; the store tags every
//! produced row with the index of the parameter set that produced it. The
//! executor regroups tagged rows into exactly N slots, one per parameter
//! set, so callers always get one result per query point in input order.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dataset::RawRow;
use metrics::{counter, histogram};
use ocean_common::{OceanError, OceanResult};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::template::{Batch, ParamSet, QueryTemplate};

/// A result row tagged with the index of its parameter set.
pub type TaggedRow = (usize, RawRow);

/// A store that can evaluate a template once per parameter set in a single
/// round trip.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Evaluate `batch` and return every produced row tagged with its
    /// parameter-set index. Rows of one parameter set must keep the order
    /// the store produced them in; rows of different sets may interleave.
    async fn execute_tagged(&self, batch: &Batch<'_>) -> OceanResult<Vec<TaggedRow>>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Runs templates against a [`QueryBackend`].
#[derive(Clone)]
pub struct BatchExecutor {
    backend: Arc<dyn QueryBackend>,
}

impl BatchExecutor {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn QueryBackend> {
        &self.backend
    }

    /// Run `template` once per entry of `params`.
    ///
    /// All parameter sets are validated before the round trip. The result
    /// has exactly `params.len()` slots; a slot is `None` when its parameter
    /// set matched no rows. Any store error fails the whole batch.
    #[instrument(
        skip(self, template, params),
        fields(
            batch_id = %Uuid::new_v4(),
            template = %template.name(),
            size = params.len(),
            backend = self.backend.name()
        )
    )]
    pub async fn execute(
        &self,
        template: &QueryTemplate,
        params: &[ParamSet],
    ) -> OceanResult<BatchResults> {
        let batch = template.bind(params)?;
        if batch.is_empty() {
            return Ok(BatchResults::from_slots(Vec::new()));
        }

        let start = Instant::now();
        let tagged = match self.backend.execute_tagged(&batch).await {
            Ok(rows) => rows,
            Err(e) => {
                counter!("oceandb_batch_errors_total").increment(1);
                warn!(error = %e, "Batch execution failed");
                return Err(e);
            }
        };
        let elapsed = start.elapsed();

        let row_count = tagged.len();
        let slots = regroup(tagged, batch.len())?;
        let empty = slots.iter().filter(|s| s.is_none()).count();

        counter!("oceandb_batches_total").increment(1);
        counter!("oceandb_batch_statements_total").increment(batch.len() as u64);
        counter!("oceandb_batch_rows_total").increment(row_count as u64);
        counter!("oceandb_batch_empty_slots_total").increment(empty as u64);
        histogram!("oceandb_batch_duration_ms").record(elapsed.as_secs_f64() * 1000.0);

        debug!(
            rows = row_count,
            empty_slots = empty,
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch executed"
        );

        Ok(BatchResults::from_slots(slots))
    }
}

/// Group tagged rows into `n` slots, keeping per-slot row order.
pub fn regroup(tagged: Vec<TaggedRow>, n: usize) -> OceanResult<Vec<Option<Vec<RawRow>>>> {
    let mut slots: Vec<Vec<RawRow>> = vec![Vec::new(); n];
    for (index, row) in tagged {
        let slot = slots.get_mut(index).ok_or_else(|| {
            OceanError::BatchMisaligned(format!(
                "row tagged with parameter set {} in a batch of {}",
                index, n
            ))
        })?;
        slot.push(row);
    }
    Ok(slots
        .into_iter()
        .map(|rows| if rows.is_empty() { None } else { Some(rows) })
        .collect())
}

/// Per-parameter-set results of one batch, consumed front to back.
#[derive(Debug)]
pub struct BatchResults {
    slots: std::vec::IntoIter<Option<Vec<RawRow>>>,
}

impl BatchResults {
    pub fn from_slots(slots: Vec<Option<Vec<RawRow>>>) -> Self {
        Self {
            slots: slots.into_iter(),
        }
    }
}

impl Iterator for BatchResults {
    type Item = Option<Vec<RawRow>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl ExactSizeIterator for BatchResults {}
