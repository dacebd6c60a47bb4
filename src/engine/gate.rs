//! Reconciliation gate.
//!
//! A one-way latch deciding which source is authoritative for the
//! session. Starts `Live`; the first manual import moves it to
//! `ManualLocked`, where it stays until the session ends.

use tracing::info;

use crate::types::Phase;

#[derive(Debug)]
pub struct ReconciliationGate {
    phase: Phase,
}

impl Default for ReconciliationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationGate {
    pub fn new() -> Self {
        Self { phase: Phase::Live }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.phase == Phase::ManualLocked
    }

    /// Close the gate. Returns `true` only for the call that performed the
    /// transition; later calls are no-ops.
    pub fn lock(&mut self) -> bool {
        match self.phase {
            Phase::Live => {
                self.phase = Phase::ManualLocked;
                info!("Reconciliation gate locked: manual snapshot is authoritative");
                true
            }
            Phase::ManualLocked => false,
        }
    }
}
