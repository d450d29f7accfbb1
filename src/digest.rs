use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use log::debug;
use sha2::{Sha224, Sha256, Sha384, Sha512};

/// Hash families accepted in a rule's digest list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Length in bytes of a digest of this type.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `(algorithm, expected bytes)` pair from a policy rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Digest {
    pub algorithm: DigestAlgorithm,
    pub expected: Vec<u8>,
}

impl Digest {
    pub fn new(algorithm: DigestAlgorithm, expected: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            expected: expected.into(),
        }
    }
}

/// Verify the file against the rule's digest list.
///
/// An empty list means integrity is not required and is vacuously true.
/// Otherwise any matching entry is enough. A file that cannot be read
/// fails: integrity cannot be verified, so the match must not succeed.
pub(crate) fn digest_matches(fd: Option<&File>, path: &str, digests: &[Digest]) -> bool {
    if digests.is_empty() {
        return true;
    }
    for digest in digests {
        if digest.expected.len() != digest.algorithm.digest_len() {
            debug!(
                "{path}: bad {} digest length {}",
                digest.algorithm,
                digest.expected.len()
            );
            continue;
        }
        match file_digest(fd, path, digest.algorithm) {
            Ok(sum) if sum == digest.expected => return true,
            Ok(_) => debug!("{path}: {} digest mismatch", digest.algorithm),
            Err(err) => debug!("{path}: unable to digest: {err}"),
        }
    }
    false
}

/// Digest the file's bytes, preferring the already-open descriptor so
/// the bytes verified are the bytes that will be executed.
fn file_digest(fd: Option<&File>, path: &str, algorithm: DigestAlgorithm) -> io::Result<Vec<u8>> {
    let mut file = match fd {
        Some(file) => {
            let mut dup = file.try_clone()?;
            dup.seek(SeekFrom::Start(0))?;
            dup
        }
        None => File::open(path)?,
    };
    match algorithm {
        DigestAlgorithm::Sha224 => hash_file::<Sha224>(&mut file),
        DigestAlgorithm::Sha256 => hash_file::<Sha256>(&mut file),
        DigestAlgorithm::Sha384 => hash_file::<Sha384>(&mut file),
        DigestAlgorithm::Sha512 => hash_file::<Sha512>(&mut file),
    }
}

fn hash_file<D: sha2::Digest>(file: &mut File) -> io::Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buf = [0u8; 32 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_vec())
}
