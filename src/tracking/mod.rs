pub mod config;
pub mod distance;
pub mod filter;
pub mod pace;

pub use config::TrackingConfig;
pub use distance::{accumulate, haversine_km, DistanceAccumulator};
pub use filter::PositionFilter;
pub use pace::{PaceEstimator, PaceReading};
