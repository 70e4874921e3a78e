//! Bulk operation driver
//!
//! Runs one operation over many elements. The elements are processed in
//! physical sub-batches of [`BulkOptions::batch_size`]; failures are
//! collected in one [`MultipleErrors`] keyed by the element's position in
//! the whole call. A non-fatal failure does not stop the call. A fatal one
//! stops it immediately and the aggregate is returned as is.

use std::time::Instant;

use ormrt_core_types::BatchId;
use serde::Deserialize;

use crate::batch::MultipleErrors;
use crate::errors::{OrmError, Result};
use crate::{log_op_end, log_op_error, log_op_start};

/// Environment variable overriding the sub-batch size
pub const ENV_BATCH_SIZE: &str = "ORMRT_BULK_BATCH_SIZE";

const DEFAULT_BATCH_SIZE: usize = 256;

/// Configuration of bulk operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BulkOptions {
    /// Number of elements sent to the database at once
    pub batch_size: usize,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl BulkOptions {
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero batch size.
    pub fn new(batch_size: usize) -> Result<Self> {
        let options = Self { batch_size };
        options.validate()?;
        Ok(options)
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero batch size.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(OrmError::InvalidInput {
                reason: "bulk batch size must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Defaults, overridden by `ORMRT_BULK_BATCH_SIZE` when set
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the variable is not a positive integer.
    pub fn from_env() -> Result<Self> {
        match std::env::var(ENV_BATCH_SIZE) {
            Ok(raw) => {
                let batch_size = raw.trim().parse::<usize>().map_err(|e| {
                    OrmError::InvalidInput {
                        reason: format!("{}={:?}: {}", ENV_BATCH_SIZE, raw, e),
                    }
                })?;
                Self::new(batch_size)
            }
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Run `op` on every element
///
/// # Errors
///
/// Returns `InvalidInput` for invalid options, otherwise `Multiple` when at
/// least one element failed. The aggregate is fatal if any failure was.
pub fn run<I, F>(
    op_name: &'static str,
    options: &BulkOptions,
    elements: I,
    mut op: F,
) -> Result<()>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<()>,
{
    options.validate()?;

    let start = Instant::now();
    let batch_id = BatchId::new();
    log_op_start!(op_name, batch_id = %batch_id, batch_size = options.batch_size);

    let mut errors = MultipleErrors::new();
    let mut in_batch = 0;

    for element in elements {
        if in_batch == options.batch_size {
            errors.set_attempted(in_batch);
            errors.advance_delta(in_batch);
            in_batch = 0;
        }

        errors.set_current(in_batch);
        in_batch += 1;

        if let Err(err) = op(element) {
            let fatal = err.is_batch_fatal();
            tracing::debug!(
                component = module_path!(),
                op = op_name,
                batch_id = %batch_id,
                position = errors.delta() + errors.current(),
                fatal = fatal,
                error = %err,
            );
            errors.insert(err, fatal);

            if fatal {
                errors.set_attempted(in_batch);
                return Err(finish(op_name, &batch_id, start, errors));
            }
        }
    }
    errors.set_attempted(in_batch);

    if errors.is_empty() {
        log_op_end!(
            op_name,
            duration_ms = start.elapsed().as_millis() as u64,
            batch_id = %batch_id,
            attempted = errors.attempted()
        );
        return Ok(());
    }
    Err(finish(op_name, &batch_id, start, errors))
}

fn finish(
    op_name: &'static str,
    batch_id: &BatchId,
    start: Instant,
    errors: MultipleErrors,
) -> OrmError {
    let err = errors.into_error();
    if let OrmError::Multiple(me) = &err {
        log_op_error!(
            op_name,
            &err,
            duration_ms = start.elapsed().as_millis() as u64,
            batch_id = %batch_id,
            attempted = me.attempted(),
            failed = me.size(),
            fatal = me.fatal()
        );
    }
    err
}
