//! Change Detector (C3) — compare rendered bytes to on-disk bytes by
//! content hash; write with mode 0644 when different.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChangeDetectError {
    #[error("writing {path}: {source}")]
    Write { path: String, #[source] source: std::io::Error },
    #[error("setting permissions on {path}: {source}")]
    Permissions { path: String, #[source] source: std::io::Error },
}

/// Compare `rendered` against the current contents of `dst`. Writes
/// `rendered` to `dst` iff the content hashes differ, returning whether a
/// write occurred.
///
/// MD5 is used for the hash, as in the original source — this is an
/// idempotence check, not a security property (spec §4.3).
pub fn write_if_changed(dst: &std::path::Path, rendered: &[u8]) -> Result<bool, ChangeDetectError> {
    let existing = std::fs::read(dst).unwrap_or_default();

    if md5::compute(&existing).0 == md5::compute(rendered).0 {
        return Ok(false);
    }

    std::fs::write(dst, rendered).map_err(|source| ChangeDetectError::Write {
        path: dst.display().to_string(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dst, std::fs::Permissions::from_mode(0o644)).map_err(|source| {
            ChangeDetectError::Permissions { path: dst.display().to_string(), source }
        })?;
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_when_dst_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out.conf");
        let changed = write_if_changed(&dst, b"hello").unwrap();
        assert!(changed);
        assert_eq!(std::fs::read(&dst).unwrap(), b"hello");
    }

    #[test]
    fn no_write_when_content_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out.conf");
        std::fs::write(&dst, b"hello").unwrap();
        let changed = write_if_changed(&dst, b"hello").unwrap();
        assert!(!changed);
    }

    #[test]
    fn writes_when_content_differs() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out.conf");
        std::fs::write(&dst, b"old").unwrap();
        let changed = write_if_changed(&dst, b"new").unwrap();
        assert!(changed);
        assert_eq!(std::fs::read(&dst).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn sets_mode_0644() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out.conf");
        write_if_changed(&dst, b"hello").unwrap();
        let mode = std::fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}
