//! Key file loading

use std::{fs, path::Path};

use sealstream_crypto::{KEY_LEN, Key};
use zeroize::Zeroize;

use crate::CliError;

/// Load a stream key from `path`.
///
/// Accepts exactly [`KEY_LEN`] raw bytes, or `2 * KEY_LEN` hex characters
/// with optional surrounding whitespace. Intermediate buffers are zeroized.
///
/// # Errors
///
/// - `KeyFileUnreadable` if the file cannot be read
/// - `InvalidKeyFile` if the contents match neither format
pub fn load_key(path: &Path) -> Result<Key, CliError> {
    let mut contents = fs::read(path)
        .map_err(|source| CliError::KeyFileUnreadable { path: path.to_path_buf(), source })?;

    let key = parse_key(&contents);
    contents.zeroize();

    key.ok_or_else(|| CliError::InvalidKeyFile { path: path.to_path_buf() })
}

fn parse_key(contents: &[u8]) -> Option<Key> {
    if contents.len() == KEY_LEN {
        return Key::from_slice(contents).ok();
    }

    let text = contents.trim_ascii();
    if text.len() != 2 * KEY_LEN {
        return None;
    }

    let mut bytes = [0u8; KEY_LEN];
    let key = hex::decode_to_slice(text, &mut bytes).ok().map(|()| Key::from_bytes(bytes));
    bytes.zeroize();
    key
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn key_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn raw_key_file() {
        let file = key_file(&[0x42; KEY_LEN]);
        let key = load_key(file.path()).unwrap();
        assert!(key.ct_eq(&Key::from_bytes([0x42; KEY_LEN])));
    }

    #[test]
    fn hex_key_file_with_newline() {
        let hex = format!("{}\n", "ab".repeat(KEY_LEN));
        let file = key_file(hex.as_bytes());
        let key = load_key(file.path()).unwrap();
        assert!(key.ct_eq(&Key::from_bytes([0xAB; KEY_LEN])));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let file = key_file(&[0u8; 16]);
        assert!(matches!(load_key(file.path()), Err(CliError::InvalidKeyFile { .. })));
    }

    #[test]
    fn bad_hex_is_rejected() {
        let file = key_file("zz".repeat(KEY_LEN).as_bytes());
        assert!(matches!(load_key(file.path()), Err(CliError::InvalidKeyFile { .. })));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_key(&dir.path().join("absent.key"));
        assert!(matches!(result, Err(CliError::KeyFileUnreadable { .. })));
    }
}
