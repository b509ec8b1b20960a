pub mod attach;
pub mod csv;
pub mod library;
pub mod writer;

pub use crate::error::ExportError;
pub use attach::{attach_library_to_project, AttachReport};
pub use self::csv::export_layer_csv;
pub use library::{create_library, LibraryReport};

use std::io::Write;
use std::path::Path;

/// Writes through a sibling temp file and renames it over `path`, so a failed
/// write never leaves a truncated target behind.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let mut file = std::fs::File::create(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}
