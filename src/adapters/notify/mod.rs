//! Notification Adapters - Outbound Alert Delivery

pub mod telegram;

pub use telegram::TelegramNotifier;
