mod fixture;
mod yahoo;

pub use fixture::FixtureMarketData;
pub use yahoo::{YahooAdapter, YahooAuthManager, YahooConfig};
