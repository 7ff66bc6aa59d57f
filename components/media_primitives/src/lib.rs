mod kind;
mod progress;

pub use kind::{KindError, MediaKind, QualityTier};
pub use progress::{JobOutcome, ProgressEvent};
