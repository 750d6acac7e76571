//! Yahoo Finance data provider.

pub mod provider;

pub use provider::YahooProvider;
