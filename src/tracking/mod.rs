//! Mined-earnings tracking: infers self-mined value from polled snapshots.

pub mod dedup;
pub mod rate;
pub mod reconcile;
pub mod session;
pub mod snapshot;
pub mod window;

pub use reconcile::TrackingState;
pub use session::{Earnings, Session};
pub use snapshot::{Balance, Snapshot, Transaction};
