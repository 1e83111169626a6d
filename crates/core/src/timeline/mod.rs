//! Timeline construction and the composition plan.
//!
//! Converts the ordered scene results plus narration clips and a background
//! track into an explicit plan with absolute start/end offsets for every
//! element, regardless of which provider produced which clip or how long
//! any generation took.

mod builder;
mod types;

pub use builder::build;
pub use types::{
    CompositionPlan, DurationDiscrepancy, EntryKind, NarrationClip, SubtitleEntry, Timeline,
    TimelineEntry,
};
