//! Utility functions for identifiers and timestamps.

mod ids;
pub mod timestamps;

pub use ids::{artifact_file_name, generate_uuid_v7};
pub use timestamps::iso_timestamp;
