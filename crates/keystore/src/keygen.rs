//! Operator key generation.
//!
//! Produces a fresh Ed25519 pair as two PEM documents: a PKCS#8 private key
//! for the signing host and an SPKI public key for distribution. Both are
//! directly loadable by [`KeyStore`](crate::KeyStore).

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use ed25519_dalek::{
    SigningKey, VerifyingKey,
    pkcs8::{EncodePrivateKey, EncodePublicKey, spki::der::pem::LineEnding},
};
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::{
    error::{KeyStoreError, Result},
    kid::validate_kid,
    source::KEY_FILE_EXTENSION,
};

/// A freshly generated key pair, PEM-encoded.
pub struct GeneratedKeyPair {
    kid: String,
    private_pem: Zeroizing<String>,
    public_pem: String,
    verifying_key: VerifyingKey,
}

impl GeneratedKeyPair {
    /// Generates a new Ed25519 pair for `kid` from the OS random source.
    ///
    /// # Errors
    ///
    /// - [`KeyStoreError::InvalidKeyId`] if `kid` is not a valid identifier
    /// - [`KeyStoreError::KeyGeneration`] if PEM encoding fails
    #[tracing::instrument]
    pub fn generate(kid: &str) -> Result<Self> {
        validate_kid(kid)?;

        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        let private_pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyStoreError::key_generation(format!("private key encoding: {e}")))?;
        let public_pem = verifying_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyStoreError::key_generation(format!("public key encoding: {e}")))?;

        tracing::debug!("generated Ed25519 key pair");
        Ok(Self { kid: kid.to_owned(), private_pem, public_pem, verifying_key })
    }

    /// The key identifier the pair was generated for.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The PKCS#8 private key PEM.
    #[must_use]
    pub fn private_pem(&self) -> &str {
        &self.private_pem
    }

    /// The SPKI public key PEM.
    #[must_use]
    pub fn public_pem(&self) -> &str {
        &self.public_pem
    }

    /// The raw verification key.
    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// `<kid>.pem`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{KEY_FILE_EXTENSION}", self.kid)
    }

    /// Writes the private half to `private_path` and the public half to
    /// `public_path`.
    ///
    /// Missing parent directories are created. Existing files are never
    /// overwritten. On unix the private file is created with mode `0600`.
    /// If the public write fails, the private file just written is removed.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::KeyWrite`] naming the path that failed.
    pub fn write(&self, private_path: &Path, public_path: &Path) -> Result<()> {
        write_new_file(private_path, self.private_pem.as_bytes(), true)?;
        if let Err(e) = write_new_file(public_path, self.public_pem.as_bytes(), false) {
            let _ = fs::remove_file(private_path);
            return Err(e);
        }

        tracing::info!(
            kid = %self.kid,
            private = %private_path.display(),
            public = %public_path.display(),
            "wrote key pair"
        );
        Ok(())
    }

    /// Writes `<keys_dir>/<kid>.pem` and `<public_dir>/<kid>.pem`, returning
    /// both paths.
    ///
    /// # Errors
    ///
    /// See [`GeneratedKeyPair::write`].
    pub fn write_to_dirs(&self, keys_dir: &Path, public_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let name = self.file_name();
        let private_path = keys_dir.join(&name);
        let public_path = public_dir.join(&name);
        self.write(&private_path, &public_path)?;
        Ok((private_path, public_path))
    }
}

impl std::fmt::Debug for GeneratedKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKeyPair")
            .field("kid", &self.kid)
            .field("public_pem", &self.public_pem)
            .field("private_pem", &"[REDACTED]")
            .finish()
    }
}

fn write_new_file(path: &Path, contents: &[u8], private: bool) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| KeyStoreError::key_write(parent, e))?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    if private {
        owner_only(&mut options);
    }

    let mut file = options.open(path).map_err(|e| KeyStoreError::key_write(path, e))?;
    file.write_all(contents).map_err(|e| KeyStoreError::key_write(path, e))?;
    file.sync_all().map_err(|e| KeyStoreError::key_write(path, e))
}

#[cfg(unix)]
fn owner_only(options: &mut fs::OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
}

#[cfg(not(unix))]
fn owner_only(_options: &mut fs::OpenOptions) {}
