#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/roster/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod membership;
pub mod memory;
pub mod source;
pub mod yahoo;

pub use error::{DataError, Result};
pub use memory::InMemorySource;
pub use membership::{MembershipRecord, parse_date, read_membership, read_membership_csv};
pub use source::{AssetClass, Country, DailyChange, Instrument, MarketDataSource};
pub use yahoo::YahooProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
