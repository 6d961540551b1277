//! Grid provider: fetches carbon-intensity and system-price forecasts for
//! a planning window, concurrently, with a deterministic synthetic
//! fallback on any upstream failure.

pub mod agent;
pub mod error;
pub mod fallback;
pub mod source;

pub use agent::GridAgent;
pub use error::{GridError, GridResult};
pub use source::{BmrsPriceClient, CarbonIntensityClient, GridDataSource, HttpGridDataSource};
