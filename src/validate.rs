//! Pre-publish validation of candidate file records.
//!
//! Runs immediately before tree creation. Every rule produces a skip, never
//! an abort; the publisher fails the whole operation only when nothing
//! survives.

use tracing::warn;

use crate::types::FileRecord;

/// Characters never allowed in a published path, besides control characters.
const INVALID_PATH_CHARS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

/// Filter and normalize a candidate file list.
///
/// Rules, in order, each producing a skip:
/// 1. empty or whitespace-only content
/// 2. empty path
/// 3. path containing control characters or `< > : " | ? *`
///
/// Surviving paths are normalized: backslashes become forward slashes and
/// surrounding whitespace is trimmed.
pub fn validate_files(files: &[FileRecord]) -> Vec<FileRecord> {
    let mut valid = Vec::with_capacity(files.len());

    for file in files {
        if file.content.trim().is_empty() {
            warn!(path = %file.path, "skipping file with empty content");
            continue;
        }

        let trimmed = file.path.trim();
        if trimmed.is_empty() {
            warn!("skipping file with empty path");
            continue;
        }

        if trimmed
            .chars()
            .any(|c| c.is_control() || INVALID_PATH_CHARS.contains(&c))
        {
            warn!(path = %file.path, "skipping file with invalid characters in path");
            continue;
        }

        valid.push(FileRecord {
            path: trimmed.replace('\\', "/"),
            content: file.content.clone(),
        });
    }

    valid
}
