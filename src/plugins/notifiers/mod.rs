// Notification sink implementations
pub mod log;
pub mod discord;

pub use log::LogNotifier;
pub use discord::DiscordNotifier;
