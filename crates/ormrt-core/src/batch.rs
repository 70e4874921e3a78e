//! Batch failure aggregation
//!
//! A bulk operation does not stop at the first failing element. Instead each
//! failure is recorded in a [`MultipleErrors`] at the element's position and
//! the operation moves on, unless the failure is fatal. Once the operation is
//! over the aggregate is prepared (its summary rendered) and handed to the
//! caller as an [`OrmError::Multiple`].
//!
//! ## Severity
//!
//! If [`MultipleErrors::fatal`] returns `true`, some failure invalidated the
//! whole batch: elements that did not fail are not durably applied either and
//! the transaction must be aborted. Otherwise the elements without a failure
//! have succeeded; the caller may commit and re-attempt only the failed
//! positions.
//!
//! ## Positions
//!
//! A logical bulk call may be executed as several physical sub-batches. The
//! `delta` offset is the position of the current sub-batch within the logical
//! call, so callers always insert sub-batch-relative positions.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::errors::OrmError;

/// Aggregated per-position failures of one bulk operation
#[derive(Debug, Clone, Default)]
pub struct MultipleErrors {
    records: BTreeMap<usize, Arc<OrmError>>,
    fatal: bool,
    attempted: usize,
    delta: usize,
    current: usize,
    message: String,
}

impl MultipleErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure at `position` within the current sub-batch
    ///
    /// A nested aggregate is spliced in: each of its records lands at its own
    /// position shifted by the current delta, and its severity is merged.
    /// Spliced records never displace a record already at their position.
    ///
    /// A direct insert at an occupied position replaces the earlier error.
    /// This is a deliberate choice over keeping the first record; callers
    /// that need the first failure must not insert twice.
    pub fn insert_at(&mut self, position: usize, error: OrmError, fatal: bool) {
        match error {
            OrmError::Multiple(nested) => {
                for (p, e) in &nested.records {
                    self.records
                        .entry(self.delta + p)
                        .or_insert_with(|| Arc::clone(e));
                }
                self.fatal = self.fatal || nested.fatal || fatal;
            }
            error => {
                self.put(self.delta + position, Arc::new(error));
                self.fatal = self.fatal || fatal;
            }
        }
    }

    /// Record a failure at the cursor position
    pub fn insert(&mut self, error: OrmError, fatal: bool) {
        self.insert_at(self.current, error, fatal);
    }

    fn put(&mut self, position: usize, error: Arc<OrmError>) {
        if let Some(previous) = self.records.insert(position, error) {
            tracing::warn!(
                component = module_path!(),
                op = "batch_insert",
                position = position,
                overwritten = %previous,
                "batch position recorded twice, keeping the later error"
            );
        }
    }

    /// Look up the failure at `position` within the current sub-batch
    pub fn lookup(&self, position: usize) -> Option<&OrmError> {
        self.records.get(&(position + self.delta)).map(Arc::as_ref)
    }

    /// Ascending `(position, error)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, &OrmError)> + '_ {
        self.records.iter().map(|(p, e)| (*p, e.as_ref()))
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any recorded or spliced failure was fatal
    pub fn fatal(&self) -> bool {
        self.fatal
    }

    /// Upgrade the severity; a fatal aggregate never becomes non-fatal again
    pub fn mark_fatal(&mut self, fatal: bool) {
        self.fatal = self.fatal || fatal;
    }

    /// Number of elements for which the operation was attempted
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Set the attempted count to `delta + n`
    pub fn set_attempted(&mut self, n: usize) {
        self.attempted = self.delta + n;
    }

    /// Move on to the next sub-batch, `d` positions further
    pub fn advance_delta(&mut self, d: usize) {
        self.delta += d;
        self.current = 0;
    }

    pub fn delta(&self) -> usize {
        self.delta
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn set_current(&mut self, position: usize) {
        self.current = position;
    }

    /// Render the summary message
    ///
    /// Resets the cursor and the delta, so lookups afterwards use absolute
    /// positions.
    pub fn prepare(&mut self) {
        self.current = 0;
        self.delta = 0;

        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "multiple errors, {} element{} attempted, {} failed{}:",
            self.attempted,
            if self.attempted != 1 { "s" } else { "" },
            self.records.len(),
            if self.fatal { ", fatal" } else { "" },
        );

        let mut newline = true;
        for (position, error) in &self.records {
            let text = error.to_string();
            if newline {
                out.push('\n');
            }
            let _ = write!(out, "[{}] {}", position, text);
            newline = !text.ends_with('\n');
        }

        self.message = out;
    }

    /// The summary built by [`prepare`](Self::prepare); empty before that
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prepare and wrap as an error value
    pub fn into_error(mut self) -> OrmError {
        self.prepare();
        OrmError::Multiple(self)
    }
}

impl std::fmt::Display for MultipleErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
