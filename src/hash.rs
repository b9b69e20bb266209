//! BLAKE3 content digests used to decide whether a file on the drive
//! already matches the bundle

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use blake3::{Hash, Hasher};

/// Hash prefix for displayed digests
pub const HASH_PREFIX: &str = "blake3:";

/// Calculate the BLAKE3 digest of a file's full contents
pub fn digest_file(path: &Path) -> io::Result<Hash> {
    let file = File::open(path)?;

    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Format a digest for display
pub fn display_digest(hash: &Hash) -> String {
    format!("{}{}", HASH_PREFIX, hash.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_digest_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("code.py");
        std::fs::write(&file_path, "print('hello')").unwrap();

        let hash = digest_file(&file_path).unwrap();
        assert_eq!(hash, blake3::hash(b"print('hello')"));
        assert!(display_digest(&hash).starts_with(HASH_PREFIX));
    }

    #[test]
    fn test_digest_file_not_found() {
        let result = digest_file(Path::new("/nonexistent/file.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_digest_large_file_spans_buffers() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("big.mpy");
        let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&file_path, &content).unwrap();

        assert_eq!(digest_file(&file_path).unwrap(), blake3::hash(&content));
    }

    #[test]
    fn test_identical_files_share_digest() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.py");
        let b = temp.path().join("b.py");
        let c = temp.path().join("c.py");
        std::fs::write(&a, "x = 1\n").unwrap();
        std::fs::write(&b, "x = 1\n").unwrap();
        std::fs::write(&c, "x = 2\n").unwrap();

        assert_eq!(digest_file(&a).unwrap(), digest_file(&b).unwrap());
        assert_ne!(digest_file(&a).unwrap(), digest_file(&c).unwrap());
    }

    #[test]
    fn test_same_size_different_content() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.txt");
        std::fs::write(&a, "abcd").unwrap();
        std::fs::write(&b, "abce").unwrap();

        assert_ne!(digest_file(&a).unwrap(), digest_file(&b).unwrap());
    }
}
