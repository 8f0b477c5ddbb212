//! File persistence for envelopes and unsealed secrets.
//!
//! Envelopes are replaced atomically: the new bytes go to a temporary file
//! in the same directory, which is renamed over the old one only after a
//! complete write. Every file is created owner-only before data lands in it.

use crate::envelope::SealedEnvelope;
use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read an envelope in either binary or hex form.
///
/// Returns the envelope and whether it was stored as hex.
pub fn read_envelope(path: &Path) -> Result<(SealedEnvelope, bool)> {
    let data = std::fs::read(path)?;
    let is_hex = SealedEnvelope::peek_version(&data).is_err();
    Ok((SealedEnvelope::from_stored(&data)?, is_hex))
}

/// Write an envelope, atomically replacing any existing file at `path`.
pub fn write_envelope(path: &Path, envelope: &SealedEnvelope, hex: bool) -> Result<()> {
    let data = if hex {
        let mut text = envelope.to_hex()?;
        text.push('\n');
        text.into_bytes()
    } else {
        envelope.to_bytes()?
    };
    replace_file(path, |file| file.write_all(&data))
}

/// Write an unsealed secret to a new owner-only file.
///
/// Refuses to overwrite an existing file.
pub fn write_secret(path: &Path, secret: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(secret.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

/// Replace `path` with whatever `write` produces.
///
/// If `write` fails, the temporary file is removed and `path` is untouched.
pub(crate) fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    // NamedTempFile creates the file 0600 on unix.
    let mut tmp = NamedTempFile::new_in(parent)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
