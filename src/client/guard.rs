//! Route guard with proactive token refresh

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::database::PublicUser;

use super::session::SessionManager;

/// Gates access to protected views and keeps the credential fresh
///
/// While the guard is alive a background task refreshes the session on a
/// fixed interval, well under the access token lifetime. The task stops when
/// the session ends and is aborted when the guard is dropped.
pub struct RouteGuard {
    session: Arc<SessionManager>,
    refresh_task: JoinHandle<()>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionManager>, refresh_interval: Duration) -> Self {
        let task_session = session.clone();
        let refresh_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; skip it.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if task_session.get_access_token().await.is_none() {
                    break;
                }
                // A failed refresh signs the session out; the next tick exits.
                let _ = task_session.refresh_session().await;
            }
        });

        Self {
            session,
            refresh_task,
        }
    }

    /// The current identity, or None when the caller must redirect to login
    pub async fn identity(&self) -> Option<PublicUser> {
        self.session.current_user().await
    }

    /// Whether navigation to the guarded view is permitted
    pub async fn allows(&self) -> bool {
        self.identity().await.is_some()
    }
}

impl Drop for RouteGuard {
    fn drop(&mut self) {
        self.refresh_task.abort();
    }
}
