pub mod rest;

pub use rest::KrakenClient;
