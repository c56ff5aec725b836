//! Album folders on disk and the metadata of the tracks inside them.

pub mod metadata;
mod model;
mod scan;

pub use metadata::load_track_info;
pub use model::TrackInfo;
pub use scan::MediaSource;

#[cfg(test)]
mod tests;
