pub mod aggregation;
pub mod clock;
pub mod database;

pub use aggregation::{MergeOutcome, decide_drop, first_write, merge};
pub use clock::{Clock, ManualClock, SystemClock};
pub use database::{ProductStore, SqliteProductStore};
