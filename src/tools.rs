//! Small filesystem helpers shared by the catalog store.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Error};

/// Atomically replace the contents of `path` with `data`.
///
/// Writes to a sibling `<path>.tmp` file, flushes it to disk, then renames
/// it over `path`. A reader of `path` therefore either sees the old content
/// or the new content in full, never a partial write, regardless of when a
/// crash happens relative to the write.
pub fn atomic_write<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<(), Error> {
    let path = path.as_ref();

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = Path::new(&tmp_path);

    let write_result = (|| -> Result<(), Error> {
        let mut file = File::create(tmp_path)
            .with_context(|| format!("unable to create {:?}", tmp_path))?;
        file.write_all(data)
            .with_context(|| format!("unable to write {:?}", tmp_path))?;
        file.sync_all()
            .with_context(|| format!("unable to sync {:?}", tmp_path))?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(tmp_path);
        return Err(err);
    }

    fs::rename(tmp_path, path)
        .with_context(|| format!("atomic rename failed for {:?}", path))?;

    Ok(())
}
