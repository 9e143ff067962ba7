//! Lease-based leader election.
//!
//! At most one controller process runs the reconciliation loop. Candidates
//! compete for a shared [`LeaseLock`]; the holder renews it every retry
//! period and a follower takes over only after the lease has gone unrenewed
//! for its full duration, measured on the follower's own clock.

mod elector;
mod lock;
mod memory;


pub use self::elector::LeaderElector;
pub use self::lock::{LeaseLock, LeaseRecord, VersionedRecord};
pub use self::memory::MemoryLeaseLock;
