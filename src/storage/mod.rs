pub mod files;
pub mod freshness;

pub use self::files::ArtifactStore;
pub use self::freshness::FreshnessStore;

use crate::error::FetchError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write `path` via a sibling temp file + rename, so readers only ever see
/// the old document or the complete new one.
pub(crate) fn replace_file<F>(path: &Path, write: F) -> Result<(), FetchError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FetchError::persistence(parent, e))?;
    }

    let tmp = temp_path(path);
    let result = (|| {
        let mut w = BufWriter::new(File::create(&tmp)?);
        write(&mut w)?;
        w.flush()?;
        w.get_ref().sync_all()?;
        drop(w);
        std::fs::rename(&tmp, path)
    })();

    result.map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        FetchError::persistence(path, e)
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
