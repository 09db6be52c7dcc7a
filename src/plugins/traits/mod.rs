pub mod notifier;

pub use notifier::NotificationSink;
