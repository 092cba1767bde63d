//! Scheduling orchestration: the use-case layer that ties the pure
//! components to storage, locking, caching and notification.

pub mod errors;
pub mod manager;

pub use errors::{ErrorKind, SchedulingError, SchedulingResult};
pub use manager::{DEFAULT_LOCK_TIMEOUT, SchedulingManager};
