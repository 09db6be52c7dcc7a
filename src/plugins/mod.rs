pub mod traits;
pub mod manager;
pub mod notifiers;

pub use manager::NotifierRegistry;
pub use traits::NotificationSink;
