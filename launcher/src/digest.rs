//! SHA-256 integrity checks for the cached sidecar executable.
//!
//! Digests are rendered as 64 lowercase hex characters. Reference digests
//! bundled with the launcher may carry surrounding whitespace or uppercase
//! hex; [`Sha256Digest::parse_reference`] normalises both before comparison.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// A validated, lowercase hex-encoded SHA-256 digest.
///
/// # Examples
///
/// ```
/// use tagsheet_launcher::digest::Sha256Digest;
///
/// let reference = format!("  {}\n", "AB".repeat(32));
/// let digest = Sha256Digest::parse_reference(&reference)?;
/// assert_eq!(digest.as_str(), "ab".repeat(32));
/// # Ok::<(), tagsheet_launcher::digest::DigestError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

/// A reference digest that is not a 64-character hex string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid SHA-256 digest: {reason}")]
pub struct DigestError {
    reason: String,
}

impl Sha256Digest {
    /// Parse a bundled reference digest.
    ///
    /// Surrounding whitespace is trimmed and hex letters are lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] when the trimmed text is not exactly 64 hex
    /// characters.
    pub fn parse_reference(text: &str) -> Result<Self, DigestError> {
        let trimmed = text.trim();
        if trimmed.len() != DIGEST_HEX_LEN {
            return Err(DigestError {
                reason: format!(
                    "expected {DIGEST_HEX_LEN} hex characters, got {}",
                    trimmed.len()
                ),
            });
        }
        if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(DigestError {
                reason: format!("non-hex character '{bad}'"),
            });
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    fn from_hasher(hasher: Sha256) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the SHA-256 digest of the file at `path`.
///
/// Reads the file in chunks; only the byte content contributes, so metadata
/// such as timestamps and permissions never changes the result.
///
/// # Errors
///
/// Returns any I/O error from opening or reading the file.
pub fn compute_sha256(path: &Path) -> io::Result<Sha256Digest> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Sha256Digest::from_hasher(hasher))
}

/// Compute the SHA-256 digest of an in-memory buffer.
#[must_use]
pub fn digest_bytes(bytes: &[u8]) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Sha256Digest::from_hasher(hasher)
}

/// Return whether the file at `path` hashes to `reference`.
///
/// A missing file does not match.
///
/// # Errors
///
/// Returns I/O errors other than "not found" from reading the file.
pub fn matches(path: &Path, reference: &Sha256Digest) -> io::Result<bool> {
    match compute_sha256(path) {
        Ok(actual) => Ok(&actual == reference),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// SHA-256 of the ASCII bytes `hello world`.
    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn file_digest_matches_known_vector() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello world").expect("write");

        let digest = compute_sha256(&path).expect("digest");
        assert_eq!(digest.as_str(), HELLO_WORLD);
    }

    #[rstest]
    #[case::read_only(0o444)]
    #[case::executable(0o755)]
    fn digest_ignores_file_metadata(#[case] mode: u32) {
        let dir = tempfile::tempdir().expect("temp dir");
        let original = dir.path().join("original.bin");
        let copy = dir.path().join("copy.bin");
        fs::write(&original, b"hello world").expect("write original");
        fs::write(&copy, b"hello world").expect("write copy");

        let long_ago = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(86_400);
        fs::File::options()
            .write(true)
            .open(&copy)
            .and_then(|file| file.set_modified(long_ago))
            .expect("backdate copy");
        let mut permissions = fs::metadata(&copy).expect("metadata").permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            permissions.set_mode(mode);
        }
        #[cfg(not(unix))]
        permissions.set_readonly(mode & 0o200 == 0);
        fs::set_permissions(&copy, permissions).expect("change permissions");

        assert_ne!(
            fs::metadata(&original).expect("metadata").modified().expect("mtime"),
            fs::metadata(&copy).expect("metadata").modified().expect("mtime"),
        );
        assert_eq!(
            compute_sha256(&original).expect("digest"),
            compute_sha256(&copy).expect("digest")
        );
        assert_eq!(compute_sha256(&copy).expect("digest").as_str(), HELLO_WORLD);
    }

    #[test]
    fn buffer_digest_matches_file_digest() {
        assert_eq!(digest_bytes(b"hello world").as_str(), HELLO_WORLD);
    }

    #[test]
    fn large_files_hash_across_chunk_boundaries() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("large.bin");
        let content: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &content).expect("write");

        assert_eq!(
            compute_sha256(&path).expect("digest"),
            digest_bytes(&content)
        );
    }

    #[rstest]
    #[case::exact(HELLO_WORLD.to_owned())]
    #[case::uppercase(HELLO_WORLD.to_ascii_uppercase())]
    #[case::surrounding_whitespace(format!("\t{HELLO_WORLD} \r\n"))]
    fn reference_matches_case_insensitively(#[case] reference: String) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello world").expect("write");

        let reference = Sha256Digest::parse_reference(&reference).expect("valid reference");
        assert!(matches(&path, &reference).expect("readable"));
    }

    #[test]
    fn modified_file_does_not_match() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello world!").expect("write");

        let reference = Sha256Digest::parse_reference(HELLO_WORLD).expect("valid reference");
        assert!(!matches(&path, &reference).expect("readable"));
    }

    #[test]
    fn missing_file_does_not_match() {
        let dir = tempfile::tempdir().expect("temp dir");
        let reference = Sha256Digest::parse_reference(HELLO_WORLD).expect("valid reference");
        assert!(!matches(&dir.path().join("absent"), &reference).expect("not found is a mismatch"));
    }

    #[rstest]
    #[case::empty(String::new())]
    #[case::whitespace_only("   \n".to_owned())]
    #[case::too_short("abcdef".to_owned())]
    #[case::non_hex(format!("{}g", "a".repeat(63)))]
    fn rejects_malformed_references(#[case] text: String) {
        assert!(Sha256Digest::parse_reference(&text).is_err());
    }
}
