//! AES-256-GCM field encryption for PHI columns.
//!
//! Every call draws a fresh 12-byte nonce. The stored form is three lowercase
//! hex segments joined by colons: `iv:authTag:ciphertext`.

use std::fmt;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use thiserror::Error;

/// Nonce size for AES-256-GCM (12 bytes).
const NONCE_SIZE: usize = 12;
/// AES-256 key size (32 bytes).
const KEY_SIZE: usize = 32;
/// GCM tag size (16 bytes).
const TAG_SIZE: usize = 16;
/// Segment separator in the stored form.
const SEPARATOR: char = ':';

/// Field encryption errors.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// The stored value is not `iv:tag:ciphertext` with valid hex and sizes.
    #[error("Malformed encrypted field: {0}")]
    Format(String),

    /// Tag verification failed: the value was altered or the key is wrong.
    #[error("Encrypted field failed authentication")]
    Tampered,

    #[error("Encryption failed: {0}")]
    Encrypt(String),
}

/// Encrypts and decrypts PHI fields with a process-wide key.
///
/// Cheap to clone; build it once at startup and share it.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    /// Build a cipher from a 64-character hex key (32 bytes).
    pub fn from_hex_key(key_hex: &str) -> Result<Self, EncryptionError> {
        let key_hex = key_hex.trim();
        if key_hex.len() != KEY_SIZE * 2 {
            return Err(EncryptionError::InvalidKey(format!(
                "expected {} hex characters, got {}",
                KEY_SIZE * 2,
                key_hex.len()
            )));
        }
        let key_bytes = hex::decode(key_hex)
            .map_err(|e| EncryptionError::InvalidKey(format!("not hex: {e}")))?;
        Self::from_key_bytes(&key_bytes)
    }

    /// Build a cipher from raw key bytes (must be 32 bytes).
    pub fn from_key_bytes(key: &[u8]) -> Result<Self, EncryptionError> {
        if key.len() != KEY_SIZE {
            return Err(EncryptionError::InvalidKey(format!(
                "expected {KEY_SIZE} bytes, got {}",
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| EncryptionError::InvalidKey(format!("key init failed: {e}")))?;
        Ok(Self { cipher })
    }

    /// Encrypt `plaintext`, returning `ivHex:tagHex:ciphertextHex`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // aes-gcm appends the tag to the ciphertext.
        let mut sealed = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| EncryptionError::Encrypt(e.to_string()))?;
        let tag = sealed.split_off(sealed.len() - TAG_SIZE);

        Ok(format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            hex::encode(nonce_bytes),
            hex::encode(tag),
            hex::encode(sealed)
        ))
    }

    /// Decrypt a value produced by [`FieldCipher::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<String, EncryptionError> {
        let parts: Vec<&str> = encoded.split(SEPARATOR).collect();
        let [iv_hex, tag_hex, ct_hex] = parts.as_slice() else {
            return Err(EncryptionError::Format(format!(
                "expected 3 segments, got {}",
                parts.len()
            )));
        };

        let iv = decode_segment("iv", iv_hex)?;
        if iv.len() != NONCE_SIZE {
            return Err(EncryptionError::Format(format!(
                "iv must be {NONCE_SIZE} bytes, got {}",
                iv.len()
            )));
        }
        let tag = decode_segment("auth tag", tag_hex)?;
        if tag.len() != TAG_SIZE {
            return Err(EncryptionError::Format(format!(
                "auth tag must be {TAG_SIZE} bytes, got {}",
                tag.len()
            )));
        }
        let mut sealed = decode_segment("ciphertext", ct_hex)?;
        sealed.extend_from_slice(&tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&iv), sealed.as_slice())
            .map_err(|_| EncryptionError::Tampered)?;

        String::from_utf8(plaintext)
            .map_err(|e| EncryptionError::Format(format!("plaintext is not UTF-8: {e}")))
    }

    /// Encrypt an optional field. `None` stays `None`.
    pub fn encrypt_opt(&self, plaintext: Option<&str>) -> Result<Option<String>, EncryptionError> {
        plaintext.map(|p| self.encrypt(p)).transpose()
    }

    /// Decrypt an optional field. `None` stays `None`; a present but invalid
    /// value is an error, never `None`.
    pub fn decrypt_opt(&self, encoded: Option<&str>) -> Result<Option<String>, EncryptionError> {
        encoded.map(|e| self.decrypt(e)).transpose()
    }
}

impl fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, EncryptionError> {
    hex::decode(segment).map_err(|e| EncryptionError::Format(format!("{name} is not hex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn cipher() -> FieldCipher {
        FieldCipher::from_hex_key(KEY).unwrap()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let c = cipher();
        for plaintext in ["F41.1 Generalized anxiety disorder", "+55 11 91234-5678", "ü ∑ 日本"] {
            let encrypted = c.encrypt(plaintext).unwrap();
            assert_eq!(c.decrypt(&encrypted).unwrap(), plaintext);
        }
    }

    #[test]
    fn empty_plaintext() {
        let c = cipher();
        let encrypted = c.encrypt("").unwrap();
        assert!(encrypted.ends_with(':'));
        assert_eq!(c.decrypt(&encrypted).unwrap(), "");
    }

    #[test]
    fn wire_format_segment_sizes() {
        let encrypted = cipher().encrypt("abc").unwrap();
        let parts: Vec<&str> = encrypted.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 24);
        assert_eq!(parts[1].len(), 32);
        assert_eq!(parts[2].len(), 6);
        assert!(encrypted.chars().all(|c| c == ':' || c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let c = cipher();
        let a = c.encrypt("same").unwrap();
        let b = c.encrypt("same").unwrap();
        assert_ne!(a, b);
        assert_ne!(a.split(':').next(), b.split(':').next());
        assert_eq!(c.decrypt(&a).unwrap(), "same");
        assert_eq!(c.decrypt(&b).unwrap(), "same");
    }

    #[test]
    fn any_tag_flip_is_rejected() {
        let c = cipher();
        let encrypted = c.encrypt("diagnosis").unwrap();
        let parts: Vec<&str> = encrypted.split(':').collect();
        for i in 0..parts[1].len() {
            let mut tag: Vec<char> = parts[1].chars().collect();
            tag[i] = if tag[i] == '0' { '1' } else { '0' };
            let tag: String = tag.into_iter().collect();
            let tampered = format!("{}:{}:{}", parts[0], tag, parts[2]);
            assert!(
                matches!(c.decrypt(&tampered), Err(EncryptionError::Tampered)),
                "flip at {i} was accepted"
            );
        }
    }

    #[test]
    fn ciphertext_and_iv_flips_are_rejected() {
        let c = cipher();
        let encrypted = c.encrypt("clinical context").unwrap();
        let parts: Vec<&str> = encrypted.split(':').collect();

        let mut ct: Vec<char> = parts[2].chars().collect();
        ct[0] = if ct[0] == 'a' { 'b' } else { 'a' };
        let ct: String = ct.into_iter().collect();
        let tampered = format!("{}:{}:{}", parts[0], parts[1], ct);
        assert!(matches!(c.decrypt(&tampered), Err(EncryptionError::Tampered)));

        let mut iv: Vec<char> = parts[0].chars().collect();
        iv[5] = if iv[5] == 'f' { 'e' } else { 'f' };
        let iv: String = iv.into_iter().collect();
        let tampered = format!("{}:{}:{}", iv, parts[1], parts[2]);
        assert!(matches!(c.decrypt(&tampered), Err(EncryptionError::Tampered)));
    }

    #[test]
    fn wrong_segment_count_is_format_error() {
        let c = cipher();
        let encrypted = c.encrypt("x").unwrap();
        let parts: Vec<&str> = encrypted.split(':').collect();
        let two = format!("{}:{}", parts[0], parts[1]);
        let four = format!("{encrypted}:00");
        for bad in ["", "plain text", two.as_str(), four.as_str()] {
            assert!(
                matches!(c.decrypt(bad), Err(EncryptionError::Format(_))),
                "{bad:?} was not a format error"
            );
        }
    }

    #[test]
    fn bad_hex_and_sizes_are_format_errors() {
        let c = cipher();
        let tag = "00".repeat(16);
        let iv = "00".repeat(12);
        assert!(matches!(
            c.decrypt(&format!("zz{}:{tag}:00", "00".repeat(11))),
            Err(EncryptionError::Format(_))
        ));
        assert!(matches!(
            c.decrypt(&format!("{}:{tag}:00", "00".repeat(8))),
            Err(EncryptionError::Format(_))
        ));
        assert!(matches!(
            c.decrypt(&format!("{iv}:{}:00", "00".repeat(12))),
            Err(EncryptionError::Format(_))
        ));
    }

    #[test]
    fn wrong_key_fails() {
        let encrypted = cipher().encrypt("secret").unwrap();
        let other = FieldCipher::from_hex_key(&"ab".repeat(32)).unwrap();
        assert!(matches!(other.decrypt(&encrypted), Err(EncryptionError::Tampered)));
    }

    #[test]
    fn key_must_be_64_hex_chars() {
        assert!(FieldCipher::from_hex_key("").is_err());
        assert!(FieldCipher::from_hex_key(&"a".repeat(63)).is_err());
        assert!(FieldCipher::from_hex_key(&"a".repeat(66)).is_err());
        assert!(FieldCipher::from_hex_key(&"g".repeat(64)).is_err());
        assert!(FieldCipher::from_hex_key(&"A".repeat(64)).is_ok());
    }

    #[test]
    fn optional_fields_keep_absence_distinct() {
        let c = cipher();
        assert_eq!(c.encrypt_opt(None).unwrap(), None);
        assert_eq!(c.decrypt_opt(None).unwrap(), None);
        let stored = c.encrypt_opt(Some("555-0100")).unwrap();
        assert_eq!(
            c.decrypt_opt(stored.as_deref()).unwrap().as_deref(),
            Some("555-0100")
        );
        assert!(c.decrypt_opt(Some("garbage")).is_err());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let rendered = format!("{:?}", cipher());
        assert!(!rendered.contains("0001020304"));
    }
}
