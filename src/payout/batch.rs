use crate::core::cycle::PayoutCycle;
use crate::core::member::{ReferralCode, UserId};
use crate::core::payout::{BatchId, ExclusionReason, PayoutStatus};
use crate::network::directory::DirectoryError;
use crate::network::tree::TreeError;
use crate::payout::record::PayoutRecord;
use chrono::{DateTime, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use thiserror::Error;
use uuid::Uuid;

/// Errors arising from payout generation and settlement.
#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("payouts for cycle {0} are already being generated")]
    CycleInProgress(PayoutCycle),
    #[error("cycle {cycle} has {settled} settled payouts and cannot be regenerated")]
    CycleSettled { cycle: PayoutCycle, settled: usize },
    #[error("no payouts have been generated for cycle {0}")]
    NoBatch(PayoutCycle),
    #[error("payout {0} not found")]
    PayoutNotFound(Uuid),
    #[error("payout {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: PayoutStatus,
        to: PayoutStatus,
    },
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// A member left out of a batch, with the reason shown to admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exclusion {
    pub user_id: UserId,
    pub referral_code: ReferralCode,
    pub reason: ExclusionReason,
}

/// The complete set of payouts generated for one cycle by one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutBatch {
    pub id: BatchId,
    pub cycle: PayoutCycle,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<PayoutRecord>,
    pub exclusions: Vec<Exclusion>,
    /// Eligible members that earned nothing this cycle.
    pub skipped_zero_income: usize,
}

impl PayoutBatch {
    pub fn new(id: BatchId, cycle: PayoutCycle) -> Self {
        Self {
            id,
            cycle,
            generated_at: Utc::now(),
            records: Vec::new(),
            exclusions: Vec::new(),
            skipped_zero_income: 0,
        }
    }

    /// Add a record, stamping it with this batch's id and cycle.
    pub fn push_record(&mut self, mut record: PayoutRecord) {
        record.batch_id = Some(self.id);
        record.payout_cycle = self.cycle;
        self.records.push(record);
    }

    pub fn record(&self, id: Uuid) -> Option<&PayoutRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn record_for(&self, user_id: &UserId) -> Option<&PayoutRecord> {
        self.records.iter().find(|r| &r.user_id == user_id)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn total_income(&self) -> Decimal {
        self.records.iter().map(|r| r.total_income).sum()
    }

    pub fn total_deduction(&self) -> Decimal {
        self.records.iter().map(|r| r.deduction).sum()
    }

    pub fn total_payout(&self) -> Decimal {
        self.records.iter().map(|r| r.payout_amount).sum()
    }

    /// Records that have reached a terminal status.
    pub fn settled_count(&self) -> usize {
        self.records.iter().filter(|r| r.status.is_terminal()).count()
    }
}

impl fmt::Display for PayoutBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Payout Batch {} (cycle {}) ===", self.id, self.cycle)?;
        writeln!(f, "Records:        {}", self.record_count())?;
        writeln!(f, "Total income:   {}", self.total_income())?;
        writeln!(f, "Deductions:     {}", self.total_deduction())?;
        writeln!(f, "Total payout:   {}", self.total_payout())?;
        writeln!(f, "Zero income:    {}", self.skipped_zero_income)?;

        if !self.records.is_empty() {
            writeln!(f, "\nPayouts:")?;
            for record in &self.records {
                writeln!(f, "  {}", record)?;
            }
        }
        if !self.exclusions.is_empty() {
            writeln!(f, "\nExcluded:")?;
            for exclusion in &self.exclusions {
                writeln!(
                    f,
                    "  {:<12} {:<12} {}",
                    exclusion.user_id, exclusion.referral_code, exclusion.reason
                )?;
            }
        }
        Ok(())
    }
}

/// Published payout batches, at most one per cycle.
///
/// Generation for a cycle is single-writer: a second run for the same
/// cycle is refused while the first is in flight. A new batch is built
/// off to the side and swapped in whole, so readers see either the
/// previous batch or the new one and a failed run leaves the previous
/// batch untouched.
#[derive(Debug, Default)]
pub struct PayoutBook {
    last_batch_id: AtomicU64,
    batches: RwLock<HashMap<PayoutCycle, Arc<PayoutBatch>>>,
    in_progress: Mutex<HashSet<PayoutCycle>>,
}

/// Releases a cycle claim when generation ends, successfully or not.
struct CycleClaim<'a> {
    book: &'a PayoutBook,
    cycle: PayoutCycle,
}

impl Drop for CycleClaim<'_> {
    fn drop(&mut self) {
        lock(&self.book.in_progress).remove(&self.cycle);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PayoutBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the batch for `cycle` with the one produced by `build`.
    ///
    /// `build` receives the id of the new run. Ids increase with every
    /// run, including failed ones.
    ///
    /// # Errors
    ///
    /// [`PayoutError::CycleInProgress`] if another run holds the cycle,
    /// [`PayoutError::CycleSettled`] if the current batch already has
    /// completed or rejected payouts, or whatever `build` returns.
    pub fn regenerate<F>(&self, cycle: PayoutCycle, build: F) -> Result<Arc<PayoutBatch>, PayoutError>
    where
        F: FnOnce(BatchId) -> Result<PayoutBatch, PayoutError>,
    {
        let _claim = self.claim(cycle)?;

        if let Some(current) = self.current(cycle) {
            let settled = current.settled_count();
            if settled > 0 {
                return Err(PayoutError::CycleSettled { cycle, settled });
            }
        }

        let id = BatchId::new(self.last_batch_id.fetch_add(1, Ordering::SeqCst) + 1);
        info!("generating payout batch {} for cycle {}", id, cycle);

        let batch = match build(id) {
            Ok(batch) => Arc::new(batch),
            Err(e) => {
                warn!("payout batch {} for cycle {} failed: {}", id, cycle, e);
                return Err(e);
            }
        };

        let replaced = self
            .batches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cycle, Arc::clone(&batch));
        if let Some(old) = replaced {
            info!("batch {} replaced batch {} for cycle {}", id, old.id, cycle);
        }
        Ok(batch)
    }

    /// The published batch for `cycle`, if any.
    pub fn current(&self, cycle: PayoutCycle) -> Option<Arc<PayoutBatch>> {
        self.batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&cycle)
            .cloned()
    }

    /// All published batches, oldest cycle first.
    pub fn batches(&self) -> Vec<Arc<PayoutBatch>> {
        let mut batches: Vec<Arc<PayoutBatch>> = self
            .batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        batches.sort_by_key(|b| b.cycle);
        batches
    }

    pub fn is_in_progress(&self, cycle: PayoutCycle) -> bool {
        lock(&self.in_progress).contains(&cycle)
    }

    /// Settle a payout: pending to completed or rejected.
    ///
    /// Refused while the cycle is being regenerated.
    pub fn update_status(
        &self,
        cycle: PayoutCycle,
        payout_id: Uuid,
        status: PayoutStatus,
    ) -> Result<PayoutRecord, PayoutError> {
        let in_progress = lock(&self.in_progress);
        if in_progress.contains(&cycle) {
            return Err(PayoutError::CycleInProgress(cycle));
        }

        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);
        let batch = batches.get_mut(&cycle).ok_or(PayoutError::NoBatch(cycle))?;
        let current = batch
            .record(payout_id)
            .ok_or(PayoutError::PayoutNotFound(payout_id))?;
        if !current.status.can_transition_to(status) {
            return Err(PayoutError::InvalidTransition {
                id: payout_id,
                from: current.status,
                to: status,
            });
        }

        let batch = Arc::make_mut(batch);
        let record = batch
            .records
            .iter_mut()
            .find(|r| r.id == payout_id)
            .ok_or(PayoutError::PayoutNotFound(payout_id))?;
        record.status = status;
        info!("payout {} for {} marked {}", payout_id, record.user_id, status);
        Ok(record.clone())
    }

    fn claim(&self, cycle: PayoutCycle) -> Result<CycleClaim<'_>, PayoutError> {
        if !lock(&self.in_progress).insert(cycle) {
            return Err(PayoutError::CycleInProgress(cycle));
        }
        Ok(CycleClaim { book: self, cycle })
    }
}
