pub mod product;
pub mod snapshot;
pub mod price_drop;

// Re-exports for convenience
pub use product::*;
pub use snapshot::*;
pub use price_drop::*;
