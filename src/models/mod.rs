pub mod fix;
pub mod run;
pub mod snapshot;

pub use fix::{RawFix, SmoothedFix};
pub use run::{Run, TrackSegment};
pub use snapshot::SessionSnapshot;
