mod group;
mod model;
mod region;

pub use group::{classify_all, filter, group, ClassifiedGroup, Selection, ALL};
pub use model::{format_age, format_count, Meta, RadarData, RadarMarker, Source};
pub use region::{classify, Region, RegionSet, UNKNOWN};
