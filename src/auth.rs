//! Actor authentication.
//!
//! Commands that mutate or read issues run on behalf of a registered user.
//! The credential is an actor reference (email, username, or numeric id)
//! taken from `--actor`, `IDB_ACTOR`, or the `actor` config key.

use tracing::debug;

use crate::error::{IssueDbError, Result};
use crate::model::User;
use crate::storage::SqliteStorage;

/// Resolves a credential to a user identity.
pub trait Authenticator {
    /// # Errors
    ///
    /// Returns `Auth` when the credential is missing or not recognised.
    fn authenticate(&self, credential: Option<&str>) -> Result<User>;
}

/// Authenticates against the users table.
pub struct StoreAuthenticator<'a> {
    storage: &'a SqliteStorage,
}

impl<'a> StoreAuthenticator<'a> {
    #[must_use]
    pub const fn new(storage: &'a SqliteStorage) -> Self {
        Self { storage }
    }
}

impl Authenticator for StoreAuthenticator<'_> {
    fn authenticate(&self, credential: Option<&str>) -> Result<User> {
        let reference = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| IssueDbError::Auth {
                reason: "no actor given".to_string(),
            })?;

        let user = self
            .storage
            .find_user(reference)?
            .ok_or_else(|| IssueDbError::Auth {
                reason: format!("unknown actor '{reference}'"),
            })?;

        debug!(user_id = user.id, username = %user.username, "Authenticated actor");
        Ok(user)
    }
}
