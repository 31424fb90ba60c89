//! Filenames for stored images.
//!
//! Uploads are stored under a generated name: the upload time in unix
//! milliseconds followed by the client's original extension. Transform
//! outputs live next to their source under a prefixed name:
//!
//! ```text
//! photo.JPG          (client)  → 1729350000123.JPG
//! 1729350000123.JPG  (resize)  → resized-1729350000123.JPG
//! 1729350000123.JPG  (crop)    → cropped-1729350000123.JPG
//! ```
//!
//! Names arriving from clients are checked with [`is_safe_name`] before
//! they are joined onto the upload directory.

use std::path::Path;

/// Transform whose output gets a prefixed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Resize,
    Compress,
    Rotate,
    Crop,
}

impl Operation {
    pub fn prefix(self) -> &'static str {
        match self {
            Operation::Resize => "resized",
            Operation::Compress => "compressed",
            Operation::Rotate => "rotated",
            Operation::Crop => "cropped",
        }
    }
}

/// Extension of a client filename, including the dot, if it is plain ASCII
/// alphanumeric. Anything else is dropped rather than sanitized.
pub fn upload_extension(original: &str) -> Option<String> {
    let ext = Path::new(original).extension()?.to_str()?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext))
}

/// Generated storage name: `<millis><.ext>`.
pub fn stored_name(original: &str, millis: u128) -> String {
    match upload_extension(original) {
        Some(ext) => format!("{}{}", millis, ext),
        None => millis.to_string(),
    }
}

/// Output name for `op` applied to the stored file `name`.
pub fn derived_name(op: Operation, name: &str) -> String {
    format!("{}-{}", op.prefix(), name)
}

/// Whether a client-supplied name refers to a plain file directly inside
/// the upload directory.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
