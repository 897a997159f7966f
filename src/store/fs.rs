use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

const PRIVATE_DIR_MODE: u32 = 0o700;
const PRIVATE_FILE_MODE: u32 = 0o600;

/// Create `dir` (and parents) and restrict it to the owner.
pub fn ensure_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create directory {:?}", dir))?;
    set_mode(dir, PRIVATE_DIR_MODE)
}

/// Restrict an existing file to the owner.
pub fn restrict_file(path: &Path) -> Result<()> {
    set_mode(path, PRIVATE_FILE_MODE)
}

/// Replace `path` with `data`: write a sibling temp file, then rename it over
/// the target so readers never observe a partial document.
pub fn write_private_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("{:?} has no file name", path))?
        .to_string_lossy();
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

    let written = open_private(&tmp_path, false)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .with_context(|| format!("failed to write {:?}", tmp_path));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("failed to move {:?} into place", path));
    }
    restrict_file(path)
}

/// Write `data` to `path` only if nothing exists there yet.
///
/// Returns `false` when the file was already present.
pub fn create_private_new(path: &Path, data: &[u8]) -> Result<bool> {
    match open_private(path, true) {
        Ok(mut file) => {
            file.write_all(data)
                .with_context(|| format!("failed to write {:?}", path))?;
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err).with_context(|| format!("failed to create {:?}", path)),
    }
}

fn open_private(path: &Path, create_new: bool) -> io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true);
    if create_new {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_FILE_MODE);
    }
    options.open(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("failed to set permissions on {:?}", path))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
