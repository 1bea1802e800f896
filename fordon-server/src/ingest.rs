//! Reconciliation engine
//!
//! Applies one parsed line against the store: insert a new natural key,
//! overwrite an existing record whose raw line changed, or do nothing when
//! the line is byte-identical to what is already stored. Batch ingestion
//! is the ordered application of this per-line step.

use fordon_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db;
use crate::parser::parse_line;

/// Per-line reconciliation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// New (identitet, chassinummer) pair inserted
    Inserted,
    /// Existing record overwritten because the raw line changed
    Updated,
    /// Raw line identical to the stored one, no write performed
    Unchanged,
    /// Line failed parsing/validation, or lost an insert race
    Rejected,
}

/// Counts returned to the caller after a batch run.
///
/// `inserted + updated + skipped + errors == total_processed` always
/// holds; `total_processed` counts the non-blank lines fed to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
    pub total_processed: u64,
}

impl BatchSummary {
    fn record(&mut self, outcome: Outcome) {
        self.total_processed += 1;
        match outcome {
            Outcome::Inserted => self.inserted += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.skipped += 1,
            Outcome::Rejected => self.errors += 1,
        }
    }
}

/// Reconcile a single line against the store.
///
/// Per-line failures (parse, validation, insert race) come back as
/// `Ok(Outcome::Rejected)`; an `Err` means the store itself failed and
/// the batch must abort.
pub async fn reconcile_line(pool: &SqlitePool, line: &str) -> Result<Outcome> {
    let parsed = match parse_line(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Rejected line: {}", e);
            return Ok(Outcome::Rejected);
        }
    };

    let existing = db::find_by_key(pool, &parsed.identitet, &parsed.chassinummer).await?;

    match existing {
        None => match db::insert_vehicle(pool, &parsed).await {
            Ok(()) => Ok(Outcome::Inserted),
            // Lost an insert race to a concurrent upload; count, don't abort
            Err(Error::ConstraintViolation(msg)) => {
                warn!(
                    "Insert race on ({}, {}): {}",
                    parsed.identitet, parsed.chassinummer, msg
                );
                Ok(Outcome::Rejected)
            }
            Err(e) => Err(e),
        },
        Some(stored) if stored.raw_line == parsed.raw_line => {
            debug!(
                "Unchanged: ({}, {})",
                parsed.identitet, parsed.chassinummer
            );
            Ok(Outcome::Unchanged)
        }
        Some(_) => {
            db::update_vehicle(pool, &parsed).await?;
            Ok(Outcome::Updated)
        }
    }
}

/// Ingest a whole uploaded file.
///
/// The text is split on newlines; trailing `\r` is stripped per line and
/// blank/whitespace-only lines are discarded before they count. Lines are
/// reconciled strictly in file order, so a later line with the same key
/// observes the effect of an earlier one in the same upload.
pub async fn ingest_text(pool: &SqlitePool, text: &str) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let outcome = reconcile_line(pool, line).await?;
        summary.record(outcome);
    }

    info!(
        "Batch complete: {} inserted, {} updated, {} skipped, {} errors ({} lines)",
        summary.inserted, summary.updated, summary.skipped, summary.errors,
        summary.total_processed
    );

    Ok(summary)
}
