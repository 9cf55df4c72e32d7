use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use tracing::info;

use crate::error::{AppError, AppResult};

const VERSION_PREFIX: &str = "v1:";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 120_000;

/// Encrypts session secrets with a per-install master secret kept in a
/// sidecar file next to the local database.
#[derive(Clone, Debug)]
pub struct CryptoVault {
    secret_path: PathBuf,
}

impl CryptoVault {
    pub fn from_database_path(path: &Path) -> Self {
        let mut secret_path = path.as_os_str().to_owned();
        secret_path.push(".key");
        Self {
            secret_path: PathBuf::from(secret_path),
        }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> AppResult<String> {
        let master = self.load_or_create_master_secret()?;
        encrypt_with_master(&master, plaintext)
    }

    pub fn decrypt(&self, ciphertext: &str) -> AppResult<Vec<u8>> {
        let master = self.load_or_create_master_secret()?;
        decrypt_with_master(&master, ciphertext)
    }

    fn load_or_create_master_secret(&self) -> AppResult<Vec<u8>> {
        if self.secret_path.exists() {
            let encoded = fs::read_to_string(&self.secret_path)?;
            return decode_master_secret(encoded.trim());
        }

        let mut secret = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut secret);
        fs::write(&self.secret_path, Base64.encode(&secret))?;
        restrict_permissions(&self.secret_path)?;
        info!(target: "app::db", path = %self.secret_path.display(), "created vault master secret");
        Ok(secret)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> AppResult<()> {
    Ok(())
}

pub(crate) fn encrypt_with_master(master_secret: &[u8], plaintext: &[u8]) -> AppResult<String> {
    if master_secret.len() != KEY_LEN {
        return Err(AppError::other("invalid master secret length"));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = derive_key(master_secret, &salt);
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|_| AppError::other("cipher init failed"))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| AppError::other("encryption failed"))?;

    let mut payload = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);

    Ok(format!("{VERSION_PREFIX}{}", Base64.encode(payload)))
}

pub(crate) fn decrypt_with_master(master_secret: &[u8], ciphertext: &str) -> AppResult<Vec<u8>> {
    if master_secret.len() != KEY_LEN {
        return Err(AppError::other("invalid master secret length"));
    }

    let encoded = ciphertext
        .strip_prefix(VERSION_PREFIX)
        .ok_or_else(|| AppError::other("unsupported ciphertext format"))?;

    let decoded = Base64
        .decode(encoded.as_bytes())
        .map_err(|_| AppError::other("ciphertext is not valid base64"))?;

    if decoded.len() <= SALT_LEN + NONCE_LEN {
        return Err(AppError::other("ciphertext too short"));
    }

    let (salt, rest) = decoded.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext_bytes) = rest.split_at(NONCE_LEN);

    let key = derive_key(master_secret, salt);
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|_| AppError::other("cipher init failed"))?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext_bytes)
        .map_err(|_| AppError::other("decryption failed"))
}

fn derive_key(master: &[u8], salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(master, salt, PBKDF2_ITERATIONS, &mut key);
    key
}

fn decode_master_secret(encoded: &str) -> AppResult<Vec<u8>> {
    let secret = Base64
        .decode(encoded.as_bytes())
        .map_err(|_| AppError::other("vault master secret is corrupted"))?;
    if secret.len() != KEY_LEN {
        return Err(AppError::other("vault master secret has invalid length"));
    }
    Ok(secret)
}
