//! mime.types format parser.
//!
//! Each data line is a media type followed by tab-separated fields of
//! space-separated extensions:
//!
//! ```text
//! # comment
//! application/pdf				pdf
//! image/jpeg					jpeg jpg jpe
//! ```

use mimegen_shared::OverrideMap;

/// Lines starting with this are ignored.
const COMMENT_MARKER: char = '#';

/// Parse mime.types content into extension → media type.
///
/// A later line claiming an extension overwrites an earlier one.
pub fn parse_overrides(content: &str) -> OverrideMap {
    let mut map = OverrideMap::new();

    for line in content.lines() {
        if line.starts_with(COMMENT_MARKER) {
            continue;
        }

        let mut fields = line.split('\t');
        let Some(media_type) = fields.next() else {
            continue;
        };

        for ext in fields.flat_map(|f| f.split(' ')).filter(|e| !e.is_empty()) {
            map.insert(ext.to_string(), media_type.to_string());
        }
    }

    map
}
