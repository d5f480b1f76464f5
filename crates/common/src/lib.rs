pub mod config;
pub mod error;
pub mod exchange;
pub mod types;

pub use config::{Config, EmailConfig, TelegramConfig};
pub use error::{Error, Result};
pub use exchange::MarketDataSource;
pub use types::*;
