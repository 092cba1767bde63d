//! Pure fixture generation: round robin, knockout brackets and group
//! partitioning.
//!
//! Nothing in this module performs I/O. Generators take team lists and
//! configuration values and return ready-to-persist [`Match`](crate::matches::Match)
//! records; all randomness comes in through a caller-supplied [`rand::Rng`]
//! so draws are reproducible under test.

pub mod errors;
pub mod groups;
pub mod knockout;
pub mod round_robin;

pub use errors::{FixtureError, FixtureResult};
