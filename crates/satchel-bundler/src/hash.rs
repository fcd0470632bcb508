//! Content hashes embedded in file names.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`, truncated to `len` characters.
pub fn content_hash(bytes: &[u8], len: usize) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(len.min(64));
    hex
}

/// Insert `hash` before the extension: `js/main.js` → `js/main.<hash>.js`.
pub fn hashed_name(name: &str, hash: &str) -> String {
    let (dir, file) = match name.rfind('/') {
        Some(i) => (&name[..=i], &name[i + 1..]),
        None => ("", name),
    };
    match file.rfind('.') {
        Some(dot) if dot > 0 => format!("{dir}{}.{hash}{}", &file[..dot], &file[dot..]),
        _ => format!("{dir}{file}.{hash}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_truncated_hex() {
        let hash = content_hash(b"hello", 20);
        assert_eq!(hash, "2cf24dba5fb0a30e26e8");
        assert_eq!(content_hash(b"hello", 100).len(), 64);
    }

    #[test]
    fn hashed_name_goes_before_extension() {
        assert_eq!(hashed_name("js/main.js", "abc"), "js/main.abc.js");
        assert_eq!(hashed_name("img/logo.png", "abc"), "img/logo.abc.png");
        assert_eq!(hashed_name("LICENSE", "abc"), "LICENSE.abc");
        assert_eq!(hashed_name("dir.v2/.env", "abc"), "dir.v2/.env.abc");
    }
}
