//! Tag, duration and artwork extraction.
//!
//! Every failure here degrades to a default value: a file with no readable
//! tags still plays, titled after its file name.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::tag::{Accessor, ItemKey};
use tracing::debug;

use super::model::TrackInfo;

/// Build the [`TrackInfo`] for `path`.
///
/// `decoded` is the duration reported by the decoder that will play the
/// file; it wins over whatever the container headers claim.
pub fn load_track_info(path: &Path, decoded: Option<Duration>) -> TrackInfo {
    let default_title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let mut info = TrackInfo::new(
        path.to_path_buf(),
        default_title,
        decoded.unwrap_or_default(),
    );

    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            debug!(path = %path.display(), "no readable tags: {e}");
            return info;
        }
    };

    if decoded.is_none() {
        info.duration_ms = tagged.properties().duration().as_millis() as u64;
    }

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(title) = non_empty(tag.title().as_deref()) {
            info.title = title;
        }
        info.artist = non_empty(tag.artist().as_deref());
        info.album = non_empty(tag.album().as_deref());
        info.track_number = parse_index(tag.get_string(&ItemKey::TrackNumber));
        info.disc_number = parse_index(tag.get_string(&ItemKey::DiscNumber));
    }

    info
}

/// Parse a track or disc number tag.
///
/// Accepts `"N"`, `"N/M"` and `"N-M"`, keeping `N`. A missing value is 1, and
/// so is anything unparsable: a broken tag never stops a track from playing.
pub fn parse_index(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return 1;
    };
    let head = raw.split(['/', '-']).next().unwrap_or(raw).trim();
    match head.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            debug!("unparsable index tag {raw:?}, using 1");
            1
        }
    }
}

/// Embedded cover art, front cover preferred.
pub(crate) fn load_artwork(path: &Path) -> Option<Arc<[u8]>> {
    let tagged = lofty::read_from_path(path).ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
    let pictures = tag.pictures();
    let picture = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())?;
    Some(Arc::from(picture.data()))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
