use std::sync::Arc;

use quiz_api::IdentityApi;
use quiz_core::model::{CurrentUser, UserId};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::error::IdentityError;

/// Single owner of "who is signed in".
///
/// Readers subscribe to a `watch` channel; only the store writes to it.
pub struct IdentityStore {
    api: Arc<dyn IdentityApi>,
    policy: RetryPolicy,
    current: watch::Sender<Option<CurrentUser>>,
}

impl IdentityStore {
    #[must_use]
    pub fn new(api: Arc<dyn IdentityApi>, policy: RetryPolicy) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            api,
            policy,
            current,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.current.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> Option<CurrentUser> {
        self.current.borrow().clone()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.current.borrow().as_ref().map(|user| user.id)
    }

    /// Fetch the signed-in user and publish it.
    ///
    /// Transport failures and 5xx responses are retried after a fixed delay
    /// up to the policy's attempt count. A rejected token is never retried
    /// and signs the user out.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Unauthorized` on 401/403 and
    /// `IdentityError::Unavailable` when the attempts run out or the
    /// failure is not worth retrying.
    pub async fn refresh(&self) -> Result<CurrentUser, IdentityError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.api.current_user().await {
                Ok(user) => {
                    info!(user_id = %user.id, "signed in");
                    self.current.send_replace(Some(user.clone()));
                    return Ok(user);
                }
                Err(err) if err.is_unauthorized() => {
                    warn!(error = %err, "credentials rejected");
                    self.logout();
                    return Err(IdentityError::Unauthorized(err));
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    debug!(attempt, max_attempts, error = %err, "retrying current user fetch");
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "current user unavailable");
                    return Err(IdentityError::Unavailable {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    pub fn logout(&self) {
        if self.current.send_replace(None).is_some() {
            info!("signed out");
        }
    }
}
