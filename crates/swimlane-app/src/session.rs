//! Session identity used to scope board subscriptions.
//!
//! The board never reads ambient global state: the signed-in user is
//! resolved here and passed explicitly into
//! [`BoardStore::load_for_user`](crate::board::BoardStore::load_for_user).
//! Sign-in-state changes are observed through a watch channel so a user
//! change can tear the old subscription down before the new one starts.

use std::env;

use anyhow::{Context, Result};
use swimlane_core::User;
use swimlane_core::id::UserId;
use tokio::sync::watch;

/// Environment variable checked first for the user identifier.
pub const ENV_USER_ID: &str = "SWIMLANE_USER_ID";
/// Environment variable checked first for the sign-in email.
pub const ENV_USER_EMAIL: &str = "SWIMLANE_USER_EMAIL";
/// Environment variable checked first for the display name.
pub const ENV_USER_NAME: &str = "SWIMLANE_USER_NAME";
/// Fallback default display name when no data can be resolved.
pub const DEFAULT_USER_NAME: &str = "swimlane";
/// Fallback default email when no data can be resolved.
pub const DEFAULT_USER_EMAIL: &str = "swimlane@example.invalid";

const USER_NAME_ENV: &str = "USER";

/// Resolve the signed-in user purely from environment variables.
///
/// # Errors
/// Returns an error when `SWIMLANE_USER_ID` is missing or not a UUID.
pub fn user_from_env() -> Result<User> {
    let mut fetch = |key: &'static str| env::var(key).ok();
    user_from_env_with(&mut fetch)
}

/// Resolve the signed-in user with defaults when the environment is bare.
///
/// Missing email or display name fall back to fixed defaults; a missing
/// identifier falls back to the nil identifier, which stands for the
/// single local user.
#[must_use]
pub fn default_user() -> User {
    let mut fetch = |key: &'static str| env::var(key).ok();
    default_user_with_env(&mut fetch)
}

fn default_user_with_env(fetch: &mut impl FnMut(&'static str) -> Option<String>) -> User {
    user_from_env_with(fetch).unwrap_or_else(|_| User {
        id: UserId::default(),
        email: DEFAULT_USER_EMAIL.to_owned(),
        display_name: env_value_with(&[ENV_USER_NAME, USER_NAME_ENV], fetch)
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_owned()),
    })
}

fn env_value_with(
    candidates: &[&'static str],
    fetch: &mut impl FnMut(&'static str) -> Option<String>,
) -> Option<String> {
    candidates.iter().find_map(|key| {
        fetch(key).and_then(|value| {
            if value.trim().is_empty() {
                None
            } else {
                Some(value)
            }
        })
    })
}

fn user_from_env_with(fetch: &mut impl FnMut(&'static str) -> Option<String>) -> Result<User> {
    let id = env_value_with(&[ENV_USER_ID], fetch)
        .context("environment does not include a user id")?;
    let id: UserId = id.parse().context("user id is not a UUID")?;
    let email = env_value_with(&[ENV_USER_EMAIL], fetch)
        .unwrap_or_else(|| DEFAULT_USER_EMAIL.to_owned());
    let display_name = env_value_with(&[ENV_USER_NAME, USER_NAME_ENV], fetch)
        .unwrap_or_else(|| DEFAULT_USER_NAME.to_owned());
    Ok(User {
        id,
        email,
        display_name,
    })
}

/// Create a linked controller/watch pair for sign-in state.
#[must_use]
pub fn session_channel(initial: Option<User>) -> (SessionController, SessionWatch) {
    let (tx, rx) = watch::channel(initial);
    (SessionController { tx }, SessionWatch { rx })
}

/// Write side of the sign-in state, held by the auth collaborator.
#[derive(Debug)]
pub struct SessionController {
    tx: watch::Sender<Option<User>>,
}

impl SessionController {
    /// Record a successful sign-in.
    pub fn sign_in(&self, user: User) {
        let _ = self.tx.send(Some(user));
    }

    /// Record a sign-out.
    pub fn sign_out(&self) {
        let _ = self.tx.send(None);
    }
}

/// Read side of the sign-in state.
#[derive(Debug, Clone)]
pub struct SessionWatch {
    rx: watch::Receiver<Option<User>>,
}

impl SessionWatch {
    /// Current signed-in user, if any.
    #[must_use]
    pub fn current(&self) -> Option<User> {
        self.rx.borrow().clone()
    }

    /// Identifier of the current user, if signed in.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.rx.borrow().as_ref().map(|user| user.id)
    }

    /// Wait for the next sign-in-state change.
    ///
    /// # Errors
    /// Returns an error once the controller side is gone.
    pub async fn changed(&mut self) -> Result<()> {
        self.rx
            .changed()
            .await
            .context("session controller dropped")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_resolution_prefers_explicit_environment() -> Result<()> {
        let id = UserId::new().to_string();
        let mut fetch = |key: &'static str| match key {
            ENV_USER_ID => Some(id.clone()),
            ENV_USER_EMAIL => Some("env@example.invalid".into()),
            ENV_USER_NAME => Some("env-name".into()),
            _ => None,
        };
        let user = user_from_env_with(&mut fetch)?;
        assert_eq!(user.id.to_string(), id);
        assert_eq!(user.email, "env@example.invalid");
        assert_eq!(user.display_name, "env-name");
        Ok(())
    }

    #[test]
    fn user_resolution_rejects_malformed_ids() {
        let mut fetch = |key: &'static str| match key {
            ENV_USER_ID => Some("not-a-uuid".into()),
            _ => None,
        };
        assert!(user_from_env_with(&mut fetch).is_err());
    }

    #[test]
    fn default_user_falls_back_to_the_local_identity() {
        let mut fetch = |_: &'static str| None;
        let user = default_user_with_env(&mut fetch);
        assert_eq!(user.id, UserId::default());
        assert_eq!(user.email, DEFAULT_USER_EMAIL);
        assert_eq!(user.display_name, DEFAULT_USER_NAME);
    }

    #[tokio::test]
    async fn watch_observes_sign_in_and_sign_out() -> Result<()> {
        let (controller, mut watch) = session_channel(None);
        assert!(watch.current().is_none());

        let user = User {
            id: UserId::new(),
            email: "alice@example.invalid".into(),
            display_name: "Alice".into(),
        };
        controller.sign_in(user.clone());
        watch.changed().await?;
        assert_eq!(watch.user_id(), Some(user.id));

        controller.sign_out();
        watch.changed().await?;
        assert!(watch.current().is_none());
        Ok(())
    }
}
