pub mod catalog;
pub mod coordinator;
pub mod kraken;
pub mod scanner;

pub use catalog::CatalogResolver;
pub use coordinator::BatchCoordinator;
pub use kraken::KrakenClient;
pub use scanner::Scanner;
