//! # Order reconciliation engine
//!
//! Orders are submitted as `NEW` and stay unresolved until the external accrual authority delivers a final verdict.
//! Nothing triggers reconciliation directly. Instead, a background pipeline polls storage:
//!
//! ```text
//!  BatchDiscoverer ──(every poll interval)──> bounded job queue ──> N workers ──> AccrualService
//!                                                                      │
//!                                                                      └──> LedgerUpdater ──> LedgerDatabase
//! ```
//!
//! * The [`BatchDiscoverer`] lists every `NEW`/`PROCESSING` order on each tick and pushes the numbers onto the queue,
//!   suspending while the queue is full. It also warns about orders that have been unresolved for too long.
//! * Each worker takes one job at a time and asks the authority for the order's status. A rate-limit reply pauses
//!   *that* worker for the requested period; the order itself is re-offered by a later discovery.
//! * The [`LedgerUpdater`] turns the reply into a [`Verdict`](loyalty_engine::db_types::Verdict) and applies it in a
//!   single storage transaction, retrying storage faults a bounded number of times.
//!
//! Every failure short of a committed verdict leaves the order unresolved, so the next discovery cycle retries it.
//! The [`Reconciler`] owns all the tasks and provides an explicit start/shutdown lifecycle.
mod discoverer;
mod dispatcher;
mod ledger_updater;
mod worker;

pub use discoverer::BatchDiscoverer;
pub use dispatcher::Reconciler;
pub use ledger_updater::{LedgerUpdater, UpdateOutcome};
