//! # src/services/batch_watcher.rs
//!
//! Automatische Aktualisierung der Zeitleiste: ruft den Resolver in festen Abständen
//! erneut auf, bis die Charge zugestellt ist oder der Aufrufer abbricht.

use crate::ledger::LedgerGateway;
use crate::models::batch::ResolvedBatch;
use crate::models::identifier::ObjectId;
use crate::services::status_resolver::{BatchStatusResolver, ResolveError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Warum das Polling beendet wurde.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome {
    /// Die Charge hat den Endzustand erreicht; enthält die letzte Zeitleiste.
    Delivered(ResolvedBatch),
    /// Das Abbruchsignal wurde gesetzt (oder sein Sender verworfen).
    Cancelled,
}

/// Kürzester Polling-Abstand; `tokio::time::interval` lehnt eine Periode von null ab.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct BatchWatcher<G: LedgerGateway + ?Sized> {
    resolver: BatchStatusResolver<G>,
    interval: Duration,
}

impl<G: LedgerGateway + ?Sized> BatchWatcher<G> {
    /// Abstände unter `MIN_INTERVAL` werden auf `MIN_INTERVAL` angehoben.
    pub fn new(resolver: BatchStatusResolver<G>, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            warn!(?interval, "Polling interval too short, using {:?}", MIN_INTERVAL);
        }
        Self {
            resolver,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Pollt die Charge `id`, bis sie zugestellt ist oder `shutdown` auf `true` wechselt.
    ///
    /// `on_update` erhält jede erfolgreich aufgelöste Zeitleiste. Vorübergehende
    /// Ledger-Fehler und `BatchNotFound` werden protokolliert und beim nächsten Takt
    /// erneut versucht; alle anderen Fehler beenden das Polling sofort.
    pub async fn watch<F>(
        &self,
        id: &ObjectId,
        mut shutdown: watch::Receiver<bool>,
        mut on_update: F,
    ) -> Result<WatchOutcome, ResolveError>
    where
        F: FnMut(&ResolvedBatch),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                info!(batch_id = %id, "Batch watch cancelled");
                return Ok(WatchOutcome::Cancelled);
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(batch_id = %id, "Batch watch cancelled");
                        return Ok(WatchOutcome::Cancelled);
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            match self.resolver.resolve_id(id).await {
                Ok(resolved) => {
                    on_update(&resolved);
                    if resolved.current_status.is_terminal() {
                        info!(batch_id = %id, "Batch delivered, stopping watch");
                        return Ok(WatchOutcome::Delivered(resolved));
                    }
                    debug!(batch_id = %id, status = %resolved.current_status, "Batch not yet delivered");
                }
                Err(e) if e.is_retryable() => {
                    warn!(batch_id = %id, error = %e, "Transient error while watching batch");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
