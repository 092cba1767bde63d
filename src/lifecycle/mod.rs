//! Lifecycle reconciliation: decides whether finished results should
//! auto-advance a tournament.

pub mod reconciler;

pub use reconciler::{ReconcileAction, decide};
