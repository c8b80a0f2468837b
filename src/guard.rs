//! Navigation gate for views that need a signed-in user

use std::sync::Arc;

use tracing::debug;

use crate::session::SessionStore;

pub const LOGIN_PATH: &str = "/login";
pub const TODOS_PATH: &str = "/todos";
pub const TRASH_PATH: &str = "/trash";

/// Outcome of a guarded navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Send the user to `path`, remembering where they wanted to go
    Redirect { path: String, return_url: String },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }

    /// `/login?returnUrl=...` for a redirect, `None` when allowed
    pub fn redirect_url(&self) -> Option<String> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::Redirect { path, return_url } => Some(format!(
                "{}?returnUrl={}",
                path,
                urlencoding::encode(return_url)
            )),
        }
    }
}

/// Lets navigation through only when a user is signed in
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Decide on navigation to `requested_path`.
    ///
    /// Waits for the session store's first value if it has none yet, and
    /// looks at that value only.
    pub async fn can_activate(&self, requested_path: &str) -> GuardDecision {
        match self.session.first_identity().await {
            Some(_) => GuardDecision::Allow,
            None => {
                debug!(requested_path, "not signed in, redirecting to login");
                GuardDecision::Redirect {
                    path: LOGIN_PATH.to_string(),
                    return_url: requested_path.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_url_encodes_return_target() {
        let decision = GuardDecision::Redirect {
            path: LOGIN_PATH.to_string(),
            return_url: "/todos?filter=pinned".to_string(),
        };
        assert_eq!(
            decision.redirect_url().as_deref(),
            Some("/login?returnUrl=%2Ftodos%3Ffilter%3Dpinned")
        );
        assert!(!decision.is_allowed());
        assert_eq!(GuardDecision::Allow.redirect_url(), None);
    }
}
