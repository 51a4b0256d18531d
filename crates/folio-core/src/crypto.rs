//! 브로커 접근 토큰 봉인.
//!
//! 세션 저장소는 접근 토큰을 평문으로 저장하지 않습니다. AES-256-GCM으로
//! 봉인한 암호문과 nonce(12바이트)를 별도 컬럼에 저장합니다.
//! 마스터 키는 `FOLIO__ENCRYPTION__MASTER_KEY` (Base64, 32바이트)에서 로드합니다.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::Engine;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// AES-256-GCM nonce 크기 (바이트)
pub const NONCE_SIZE: usize = 12;

/// AES-256 키 크기 (바이트)
pub const KEY_SIZE: usize = 32;

/// 봉인/개봉 에러
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Master key is not valid base64: {0}")]
    KeyEncoding(#[from] base64::DecodeError),

    #[error("Master key must be {KEY_SIZE} bytes, got {0}")]
    KeyLength(usize),

    #[error("Stored nonce must be {NONCE_SIZE} bytes, got {0}")]
    NonceLength(usize),

    #[error("Failed to seal credential")]
    Seal,

    #[error("Failed to open sealed credential (wrong key or corrupted data)")]
    Open,
}

/// 저장 가능한 봉인 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// 접근 토큰 봉인기.
pub struct CredentialEncryptor {
    cipher: Aes256Gcm,
}

impl CredentialEncryptor {
    /// Base64 마스터 키로 생성.
    pub fn new(master_key: &str) -> Result<Self, CryptoError> {
        let key = base64::engine::general_purpose::STANDARD.decode(master_key.trim())?;
        if key.len() != KEY_SIZE {
            return Err(CryptoError::KeyLength(key.len()));
        }
        Ok(Self::from_key(Key::<Aes256Gcm>::from_slice(&key)))
    }

    /// 프로세스 수명 동안만 유효한 임시 키로 생성.
    ///
    /// 재시작 후에는 기존 세션을 개봉할 수 없습니다.
    pub fn ephemeral() -> Self {
        Self::from_key(&Aes256Gcm::generate_key(OsRng))
    }

    fn from_key(key: &Key<Aes256Gcm>) -> Self {
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// 접근 토큰 봉인. 호출마다 새 nonce를 사용합니다.
    pub fn seal(&self, secret: &SecretString) -> Result<SealedSecret, CryptoError> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), secret.expose_secret().as_bytes())
            .map_err(|_| CryptoError::Seal)?;

        Ok(SealedSecret {
            ciphertext,
            nonce: nonce.to_vec(),
        })
    }

    /// 봉인된 접근 토큰 개봉.
    pub fn open(&self, sealed: &SealedSecret) -> Result<SecretString, CryptoError> {
        if sealed.nonce.len() != NONCE_SIZE {
            return Err(CryptoError::NonceLength(sealed.nonce.len()));
        }

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .map_err(|_| CryptoError::Open)?;
        let token = String::from_utf8(plaintext).map_err(|_| CryptoError::Open)?;

        Ok(SecretString::new(token.into()))
    }
}

/// 새 마스터 키 생성 (초기 설정용)
///
/// ```
/// let key = folio_core::crypto::generate_master_key();
/// assert!(folio_core::CredentialEncryptor::new(&key).is_ok());
/// ```
pub fn generate_master_key() -> String {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    base64::engine::general_purpose::STANDARD.encode(key)
}
