//! Artifact archive extraction
//!
//! Artifact archives mirror the install-tree layout of their component, so
//! extraction is a direct overlay onto the install prefix. Extraction is
//! idempotent: unpacking the same archive twice leaves the prefix in the
//! same final state.

use crate::error::{PrebakeError, PrebakeResult};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Extract a gzip-compressed tar archive onto the install prefix.
///
/// Existing files are overwritten; nothing else in the prefix is touched.
pub fn extract_overlay(archive_path: &Path, install_dir: &Path) -> PrebakeResult<()> {
    let file = File::open(archive_path)
        .map_err(|e| PrebakeError::extraction(archive_path, format!("open failed: {}", e)))?;

    fs::create_dir_all(install_dir)
        .map_err(|e| PrebakeError::io(format!("creating {}", install_dir.display()), e))?;

    let decoder = GzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);
    // Re-extraction must be safe to repeat over prior contents
    archive.set_overwrite(true);

    let entries = archive
        .entries()
        .map_err(|e| PrebakeError::extraction(archive_path, e.to_string()))?;

    let mut count = 0usize;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| PrebakeError::extraction(archive_path, e.to_string()))?;

        let path = entry
            .path()
            .map_err(|e| PrebakeError::extraction(archive_path, e.to_string()))?
            .into_owned();

        if path.as_os_str().is_empty() {
            continue;
        }

        // unpack_in refuses entries whose path would escape the prefix
        let unpacked = entry.unpack_in(install_dir).map_err(|e| {
            PrebakeError::extraction(
                archive_path,
                format!("unpacking {}: {}", path.display(), e),
            )
        })?;
        if !unpacked {
            debug!("Skipped unsafe archive entry {}", path.display());
            continue;
        }
        count += 1;
    }

    debug!(
        "Extracted {} entries from {} into {}",
        count,
        archive_path.display(),
        install_dir.display()
    );
    Ok(())
}
