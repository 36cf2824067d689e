pub use crate::frame::{EciVector, GeodeticVector, HeightUnit};
pub use crate::outcome::{Failure, FailureKind, ResolutionOutcome};
pub use crate::position::Position;
pub use crate::record::ElementRecord;
pub use crate::time::UtcTimestamp;
