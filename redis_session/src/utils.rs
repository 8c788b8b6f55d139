use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

const ALPHANUMERIC: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// Largest multiple of 62 that fits in a byte; bytes at or above it are
// rejected so every character is equally likely.
const ACCEPT_BELOW: u8 = 248;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),
}

/// Random string drawn uniformly from `[A-Za-z0-9]`.
pub fn gen_random_alphanumeric(len: usize) -> Result<String, UtilError> {
    let rng = SystemRandom::new();
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];
    while out.len() < len {
        rng.fill(&mut buf)
            .map_err(|_| UtilError::Crypto("Failed to generate random string".to_string()))?;
        for b in buf.into_iter().filter(|b| *b < ACCEPT_BELOW) {
            if out.len() == len {
                break;
            }
            out.push(ALPHANUMERIC[usize::from(b % 62)] as char);
        }
    }
    Ok(out)
}

/// Source of candidate session ids.
pub trait IdGenerator: Send + Sync {
    fn generate(&self, len: usize) -> Result<String, UtilError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlphanumericIdGenerator;

impl IdGenerator for AlphanumericIdGenerator {
    fn generate(&self, len: usize) -> Result<String, UtilError> {
        gen_random_alphanumeric(len)
    }
}
