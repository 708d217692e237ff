/// Content hashing of resolved module files, used to invalidate cached resolutions.
use std::path::Path;

use sha2::{Digest as _, Sha256};

use crate::error::Error;
use crate::types::ContentHash;

/// Hash raw file contents.
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    let hash = Sha256::digest(bytes);
    return ContentHash(format!("{hash:x}"));
}

/// Hash the current contents of a file on disk.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<ContentHash, Error> {
    let bytes = std::fs::read(path)?;
    return Ok(hash_bytes(&bytes));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        let hash = hash_bytes(b"abc");
        assert_eq!(hash.0, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn file_hash_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts");
        std::fs::write(&path, "export const a = 1;").unwrap();
        let before = hash_file(&path).unwrap();
        std::fs::write(&path, "export const a = 2;").unwrap();
        assert_ne!(before, hash_file(&path).unwrap());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(hash_file(&dir.path().join("gone.ts")).is_err());
    }
}
