//! Per-label fetchers. Each call returns a [`FetchOutcome`]; nothing here
//! propagates an error to the caller.
//!
//! [`FetchOutcome`]: crate::models::FetchOutcome

pub mod news;
pub mod price;

#[cfg(test)]
pub mod testing;

pub use self::news::NewsFetcher;
pub use self::price::PriceFetcher;
