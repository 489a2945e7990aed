//! Identifier helpers.

use crate::core::StageKind;
use uuid::Uuid;

/// Generates a new UUID v7 (time-ordered).
#[must_use]
pub fn generate_uuid_v7() -> Uuid {
    Uuid::now_v7()
}

/// Returns a fresh artifact file name `<stage>_<uuid>.<ext>`.
///
/// Time-ordered ids keep a stage's artifacts sorted by creation in a
/// directory listing.
#[must_use]
pub fn artifact_file_name(stage: StageKind, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    format!("{stage}_{}.{extension}", generate_uuid_v7().simple())
}
