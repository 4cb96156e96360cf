//! Access token persistence via OS keyring
//!
//! This module stores the backend access token in the operating system's
//! native credential store (Keychain on macOS, Secret Service on Linux,
//! Windows Credential Manager on Windows). The keyring is stateless;
//! [`TokenStore`] is a zero-field struct that acts as a namespaced
//! accessor.
//!
//! The `DOCENT_TOKEN` environment variable overrides the keyring, which
//! keeps scripted and containerized runs away from the credential store.

use crate::error::{DocentError, Result};

/// Keyring service name under which the token is filed
const SERVICE: &str = "docent";

/// Keyring account name for the access token entry
const ACCOUNT: &str = "access-token";

// ---------------------------------------------------------------------------
// TokenStore
// ---------------------------------------------------------------------------

/// Stateless accessor for the OS native keyring.
///
/// # Examples
///
/// ```no_run
/// use docent::auth::TokenStore;
///
/// # fn example() -> docent::error::Result<()> {
/// let store = TokenStore;
/// store.save("my_access_token")?;
/// assert!(store.load()?.is_some());
/// store.delete()?;
/// # Ok(())
/// # }
/// ```
pub struct TokenStore;

impl TokenStore {
    fn entry() -> Result<keyring::Entry> {
        keyring::Entry::new(SERVICE, ACCOUNT)
            .map_err(|e| DocentError::Keyring(e).into())
    }

    /// Persists the access token in the OS keyring.
    ///
    /// # Errors
    ///
    /// Returns [`DocentError::Keyring`] if the OS credential store rejects
    /// the write.
    pub fn save(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .map_err(DocentError::Keyring)?;
        Ok(())
    }

    /// Loads the stored access token.
    ///
    /// Returns `Ok(None)` when no token has been saved, allowing callers to
    /// distinguish between "not logged in yet" and a genuine keyring error.
    pub fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(DocentError::Keyring(e).into()),
        }
    }

    /// Deletes the stored access token.
    ///
    /// This is a no-op when no token exists, so it is safe to call even when
    /// the caller is not sure whether a login happened.
    pub fn delete(&self) -> Result<()> {
        match Self::entry()?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(DocentError::Keyring(e).into()),
        }
    }

    /// Resolves the token the client should use for this run.
    ///
    /// `DOCENT_TOKEN` wins over the keyring when set and non-empty.
    pub fn resolve(&self) -> Result<Option<String>> {
        if let Ok(token) = std::env::var("DOCENT_TOKEN") {
            if !token.is_empty() {
                tracing::debug!("Using access token from DOCENT_TOKEN");
                return Ok(Some(token));
            }
        }
        self.load()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
