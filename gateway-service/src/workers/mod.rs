pub mod price_update;

pub use price_update::PriceUpdateWorker;
