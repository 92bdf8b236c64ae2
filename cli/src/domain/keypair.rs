//! Ed25519 key pair generation and the OpenSSH private key container.
//!
//! The container layout is read back by `ssh`, `ssh-keygen` and russh, so the
//! byte order below must not drift:
//!
//! ```text
//! "openssh-key-v1\0"
//! string  cipher ("none")
//! string  kdf ("none")
//! string  kdf options ("")
//! uint32  number of keys (1)
//! string  public key block
//! string  private key block (check, check, type, pub, priv||pub, comment, pad)
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::SigningKey;
use rand::RngCore as _;
use rand::rngs::OsRng;

use crate::domain::error::ApplianceError;

/// Key algorithm name used in every encoded block.
pub const KEY_ALGORITHM: &str = "ssh-ed25519";

const AUTH_MAGIC: &[u8] = b"openssh-key-v1\0";
const PEM_LABEL: &str = "OPENSSH PRIVATE KEY";
const CIPHER_NONE: &str = "none";
const KDF_NONE: &str = "none";
/// Block size used to pad the private section when no cipher is applied.
const CIPHER_BLOCK_SIZE: usize = 8;
/// OpenSSH wraps the base64 body at 70 columns.
const PEM_LINE_WIDTH: usize = 70;

/// A freshly generated appliance credential.
#[derive(Clone)]
pub struct KeyPair {
    private_key_pem: Vec<u8>,
    authorized_key: String,
}

impl KeyPair {
    /// Generates a new Ed25519 key pair from the OS random source.
    ///
    /// # Errors
    ///
    /// Returns `ApplianceError::Encoding` if the random source is unavailable.
    pub fn generate() -> Result<Self, ApplianceError> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| ApplianceError::Encoding(format!("random source unavailable: {e}")))?;
        let mut check = [0u8; 4];
        OsRng
            .try_fill_bytes(&mut check)
            .map_err(|e| ApplianceError::Encoding(format!("random source unavailable: {e}")))?;
        Ok(Self::from_seed(&seed, u32::from_le_bytes(check)))
    }

    /// Builds the key pair for a fixed seed and check integer.
    #[must_use]
    pub fn from_seed(seed: &[u8; 32], check: u32) -> Self {
        let signing = SigningKey::from_bytes(seed);
        let public = signing.verifying_key().to_bytes();
        Self {
            private_key_pem: encode_private_key(seed, &public, check),
            authorized_key: authorized_key_line(&public),
        }
    }

    /// PEM-encoded `OPENSSH PRIVATE KEY` container.
    #[must_use]
    pub fn private_key_pem(&self) -> &[u8] {
        &self.private_key_pem
    }

    /// `ssh-ed25519 <base64>` line, newline terminated.
    #[must_use]
    pub fn authorized_key(&self) -> &str {
        &self.authorized_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("authorized_key", &self.authorized_key.trim_end())
            .finish_non_exhaustive()
    }
}

/// Prefixes `b` with its length as a 4-byte big-endian integer.
#[must_use]
pub fn encode_length_prefix(b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + b.len());
    put_string(&mut out, b);
    out
}

/// Wire encoding of the public key: algorithm name then raw key bytes.
#[must_use]
pub fn encode_public_key(public: &[u8; 32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + KEY_ALGORITHM.len() + 4 + public.len());
    put_string(&mut out, KEY_ALGORITHM.as_bytes());
    put_string(&mut out, public);
    out
}

/// Serializes an unencrypted Ed25519 key into the PEM container.
#[must_use]
pub fn encode_private_key(seed: &[u8; 32], public: &[u8; 32], check: u32) -> Vec<u8> {
    let mut private_block = Vec::new();
    private_block.extend_from_slice(&check.to_be_bytes());
    private_block.extend_from_slice(&check.to_be_bytes());
    put_string(&mut private_block, KEY_ALGORITHM.as_bytes());
    put_string(&mut private_block, public);
    let mut secret = Vec::with_capacity(64);
    secret.extend_from_slice(seed);
    secret.extend_from_slice(public);
    put_string(&mut private_block, &secret);
    put_string(&mut private_block, b"");
    let pad = CIPHER_BLOCK_SIZE - private_block.len() % CIPHER_BLOCK_SIZE;
    if pad < CIPHER_BLOCK_SIZE {
        private_block.extend((1..=pad).map(|i| u8::try_from(i).unwrap_or(u8::MAX)));
    }

    let mut payload = AUTH_MAGIC.to_vec();
    put_string(&mut payload, CIPHER_NONE.as_bytes());
    put_string(&mut payload, KDF_NONE.as_bytes());
    put_string(&mut payload, b"");
    payload.extend_from_slice(&1u32.to_be_bytes());
    put_string(&mut payload, &encode_public_key(public));
    put_string(&mut payload, &private_block);

    pem_encode(PEM_LABEL, &payload)
}

fn authorized_key_line(public: &[u8; 32]) -> String {
    format!(
        "{KEY_ALGORITHM} {}\n",
        STANDARD.encode(encode_public_key(public))
    )
}

fn put_string(out: &mut Vec<u8>, b: &[u8]) {
    let len = u32::try_from(b.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(b);
}

fn pem_encode(label: &str, der: &[u8]) -> Vec<u8> {
    let body = STANDARD.encode(der);
    let mut out = format!("-----BEGIN {label}-----\n");
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out.push_str(&format!("-----END {label}-----\n"));
    out.into_bytes()
}
