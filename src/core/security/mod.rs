// Security module for path validation
//
// Tool ids and asset paths come from URLs and descriptor files; these helpers
// keep every file system lookup inside the configured tool and static roots.

pub mod path_validator;

pub use path_validator::{PathSecurityError, confine_path, is_descending, validate_segment};
