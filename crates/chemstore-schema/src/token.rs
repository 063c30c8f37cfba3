//! Deterministic, filesystem-safe directory tokens.
//!
//! Long identifiers (InChI strings, basis set names with `*` and `+`) cannot go
//! into a directory name as-is. Schemas compress them with one of two stable
//! hashes:
//!
//! - [`letter_block`]: uppercase letters drawn from a SHA-256 digest. Used
//!   where collisions must be practically impossible (species identity).
//! - [`short_code`]: a few base32 characters of an FNV-1a 64-bit hash. Used for
//!   small, human-curated vocabularies (method and basis names).
//!
//! Neither uses a seeded hasher, so tokens are identical on every host and
//! in every process.

use sha2::{Digest, Sha256};

/// Crockford base32 alphabet, lowercase.
const BASE32_ALPHABET: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";

/// FNV-1a 64-bit hash.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x00000100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for b in bytes {
        hash ^= (*b) as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// `len` base32 characters of the FNV-1a hash of `text`, lowest bits first.
///
/// `len` is capped at 12 (60 bits).
pub fn short_code(text: &str, len: usize) -> String {
    let mut hash = fnv1a64(text.as_bytes());
    let mut out = String::with_capacity(len);
    for _ in 0..len.min(12) {
        out.push(BASE32_ALPHABET[(hash & 0x1f) as usize] as char);
        hash >>= 5;
    }
    out
}

/// `len` uppercase letters derived from the SHA-256 digest of `text`.
///
/// `len` is capped at 32, one letter per digest byte.
pub fn letter_block(text: &str, len: usize) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest
        .iter()
        .take(len)
        .map(|b| (b'A' + b % 26) as char)
        .collect()
}

/// Check that `segment` can be used verbatim as a single directory name.
pub fn check_segment(segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err("empty directory segment".to_string());
    }
    if segment == "." || segment == ".." {
        return Err(format!("reserved directory segment `{segment}`"));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| *c == '/' || *c == '\\' || *c == '\0')
    {
        return Err(format!("directory segment `{segment}` contains {c:?}"));
    }
    Ok(())
}

/// Check that a caller-supplied name only uses `[A-Za-z0-9._-]`.
///
/// Applied to values that land in directory names without hashing (job
/// names, conformer ids) so they stay portable across filesystems.
pub fn check_plain_name(what: &str, name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{what} is empty"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!("{what} `{name}` contains unsupported character {c:?}"));
    }
    check_segment(name)
}
