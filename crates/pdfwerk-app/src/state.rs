// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation state for the presentation layer.
//
// Each operation kind has one status. Starting an operation hands out a
// `BusyGuard`; while it lives, a second start of the same kind is refused.
// Dropping the guard without finishing it (an early `?` return or a panic)
// records the operation as failed, so the control is never left disabled.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::{JobId, OperationKind, OperationStatus};
use tracing::{debug, warn};

/// Status of every operation, shared between the runners and whatever shows
/// them.
#[derive(Debug, Clone, Default)]
pub struct ControlPanel {
    statuses: Arc<Mutex<HashMap<OperationKind, OperationStatus>>>,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OperationKind, OperationStatus>> {
        self.statuses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self, kind: OperationKind) -> OperationStatus {
        self.lock().get(&kind).cloned().unwrap_or(OperationStatus::Idle)
    }

    /// Whether the control for `kind` accepts a new start.
    pub fn is_enabled(&self, kind: OperationKind) -> bool {
        !self.status(kind).is_running()
    }

    /// Mark `kind` as running. Fails with `busy_message` if it already is.
    pub fn begin(&self, kind: OperationKind, busy_message: &str) -> Result<BusyGuard> {
        let mut statuses = self.lock();
        if statuses.get(&kind).is_some_and(OperationStatus::is_running) {
            return Err(PdfwerkError::InputValidation(busy_message.to_string()));
        }
        let job_id = JobId::new();
        statuses.insert(
            kind,
            OperationStatus::Running {
                job_id,
                started_at: Utc::now(),
            },
        );
        debug!(?kind, %job_id, "Operation started");
        Ok(BusyGuard {
            panel: self.clone(),
            kind,
            job_id,
            settled: false,
        })
    }

    fn settle(&self, kind: OperationKind, status: OperationStatus) {
        self.lock().insert(kind, status);
    }
}

/// Holds an operation in the running state until finished or dropped.
#[must_use = "dropping the guard immediately ends the operation"]
#[derive(Debug)]
pub struct BusyGuard {
    panel: ControlPanel,
    kind: OperationKind,
    job_id: JobId,
    settled: bool,
}

impl BusyGuard {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn succeed(mut self) {
        self.settled = true;
        self.panel.settle(
            self.kind,
            OperationStatus::Succeeded {
                job_id: self.job_id,
                finished_at: Utc::now(),
            },
        );
    }

    pub fn fail(mut self, message: impl Into<String>) {
        self.settled = true;
        self.panel.settle(
            self.kind,
            OperationStatus::Failed {
                job_id: self.job_id,
                message: message.into(),
            },
        );
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!(kind = ?self.kind, job_id = %self.job_id, "Operation ended without a result");
        self.panel.settle(
            self.kind,
            OperationStatus::Failed {
                job_id: self.job_id,
                message: "interrupted".into(),
            },
        );
    }
}
