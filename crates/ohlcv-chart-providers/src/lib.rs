pub mod cryptowatch;
pub mod error;
pub mod provider;
