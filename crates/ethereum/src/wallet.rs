//! Transaction sender keystores

use std::path::Path;

use dropper_common::{Error, Result};
use ethers::signers::{LocalWallet, Signer};
use tracing::debug;

/// Decrypt the keystore at `path`.
///
/// Prompts for the password on the terminal when `password` is `None`.
pub fn load_keystore(path: &Path, password: Option<&str>) -> Result<LocalWallet> {
    if !path.is_file() {
        return Err(Error::config(format!("Keystore file does not exist: {}", path.display())));
    }

    let password = match password {
        Some(password) => password.to_string(),
        None => rpassword::prompt_password(format!("Password for {}: ", path.display()))?,
    };

    let wallet = LocalWallet::decrypt_keystore(path, password)
        .map_err(|e| Error::authorization(format!("Failed to decrypt keystore {}: {}", path.display(), e)))?;
    debug!(address = ?wallet.address(), "Loaded sender keystore");
    Ok(wallet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::core::rand::thread_rng;
    use tempfile::tempdir;

    #[test]
    fn test_load_keystore_with_password() {
        let dir = tempdir().unwrap();
        let (wallet, _) =
            LocalWallet::new_keystore(dir.path(), &mut thread_rng(), "hunter2", Some("sender.json")).unwrap();

        let path = dir.path().join("sender.json");
        let loaded = load_keystore(&path, Some("hunter2")).unwrap();
        assert_eq!(loaded.address(), wallet.address());
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let dir = tempdir().unwrap();
        LocalWallet::new_keystore(dir.path(), &mut thread_rng(), "hunter2", Some("sender.json")).unwrap();

        let result = load_keystore(&dir.path().join("sender.json"), Some("wrong"));
        assert!(matches!(result, Err(Error::Authorization(_))));
    }

    #[test]
    fn test_missing_keystore() {
        let dir = tempdir().unwrap();
        let result = load_keystore(&dir.path().join("absent.json"), Some("x"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
