//! Market data: provider seam, Yahoo client, CSV import, synthetic bars.

pub mod circuit_breaker;
pub mod csv_import;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use provider::{DataError, DataProvider, DataSource, FetchResult};
pub use yahoo::YahooProvider;
