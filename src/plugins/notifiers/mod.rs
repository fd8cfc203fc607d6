// Notifier plugin implementations
pub mod console;
pub mod discord;
pub mod telegram;

pub use console::ConsoleNotifier;
pub use discord::DiscordNotifier;
pub use telegram::TelegramNotifier;
