use std::sync::Arc;

use repairdesk_types::Role;
use tokio::sync::watch;

use crate::{dto::CurrentUser, error::ClientError, traits::DashboardApi};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been checked against the backend yet.
    #[default]
    Unknown,
    Anonymous,
    Authenticated(CurrentUser),
}

impl SessionState {
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub const fn user(&self) -> Option<&CurrentUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unknown | Self::Anonymous => None,
        }
    }
}

/// Shared view of whether the current session is signed in.
///
/// Clones share the same state. Only [`check`](Self::check), [`login`](Self::login),
/// [`logout`](Self::logout) and [`mark_unauthorized`](Self::mark_unauthorized) change it.
#[derive(Clone)]
pub struct SessionContext {
    api: Arc<dyn DashboardApi>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionContext {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            api,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.state.borrow().user().cloned()
    }

    /// Asks the backend who is signed in. A rejected session resolves to `Anonymous`;
    /// any other failure also drops to `Anonymous` and is returned.
    pub async fn check(&self) -> Result<SessionState, ClientError> {
        match self.api.current_user().await {
            Ok(user) => {
                tracing::debug!(username = %user.username, role = %user.role, "Session is authenticated");
                Ok(self.set(SessionState::Authenticated(user)))
            }
            Err(err) if is_rejection(&err) => Ok(self.set(SessionState::Anonymous)),
            Err(err) => {
                self.set(SessionState::Anonymous);
                Err(err)
            }
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<CurrentUser, ClientError> {
        self.api.login(username, password).await?;
        match self.check().await? {
            SessionState::Authenticated(user) => {
                tracing::info!(username = %user.username, "Signed in");
                Ok(user)
            }
            SessionState::Unknown | SessionState::Anonymous => Err(ClientError::Unauthorized),
        }
    }

    /// Signs out. The local state only changes once the backend confirms.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.api.logout().await?;
        self.set(SessionState::Anonymous);
        tracing::info!("Signed out");
        Ok(())
    }

    /// Called when any request came back `401` after the refresh attempt.
    pub fn mark_unauthorized(&self) {
        if self.state.borrow().is_authenticated() {
            tracing::warn!("Session expired, signing out");
        }
        self.set(SessionState::Anonymous);
    }

    /// Returns the signed-in user when their role covers `required`.
    pub fn require_role(&self, required: Role) -> Result<CurrentUser, ClientError> {
        match self.current_user() {
            Some(user) if user.role.satisfies(required) => Ok(user),
            Some(_) => Err(ClientError::Forbidden { required }),
            None => Err(ClientError::Unauthorized),
        }
    }

    fn set(&self, next: SessionState) -> SessionState {
        self.state.send_replace(next.clone());
        next
    }
}

fn is_rejection(err: &ClientError) -> bool {
    match err {
        ClientError::Unauthorized => true,
        ClientError::StatusError(status) => {
            *status == reqwest::StatusCode::UNAUTHORIZED || *status == reqwest::StatusCode::FORBIDDEN
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::dto::AggregatePayload;

    /// Backend double that accepts one user/password pair.
    struct FakeApi {
        user: CurrentUser,
        signed_in: Mutex<bool>,
    }

    impl FakeApi {
        fn new(role: Role) -> Self {
            Self {
                user: CurrentUser {
                    username: "asha".to_string(),
                    role,
                },
                signed_in: Mutex::new(false),
            }
        }
    }

    #[async_trait::async_trait]
    impl DashboardApi for FakeApi {
        async fn get_dashboard(&self) -> Result<AggregatePayload, ClientError> {
            Ok(AggregatePayload::fallback())
        }

        async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
            if username == self.user.username && password == "secret" {
                *self.signed_in.lock().unwrap() = true;
                Ok(())
            } else {
                Err(ClientError::LoginRejected {
                    message: "Invalid credentials".to_string(),
                    resolution: None,
                })
            }
        }

        async fn logout(&self) -> Result<(), ClientError> {
            *self.signed_in.lock().unwrap() = false;
            Ok(())
        }

        async fn current_user(&self) -> Result<CurrentUser, ClientError> {
            if *self.signed_in.lock().unwrap() {
                Ok(self.user.clone())
            } else {
                Err(ClientError::Unauthorized)
            }
        }
    }

    fn context(role: Role) -> SessionContext {
        SessionContext::new(Arc::new(FakeApi::new(role)))
    }

    #[tokio::test]
    async fn test_session_starts_unknown_then_resolves_anonymous() {
        let session = context(Role::User);
        assert_eq!(session.state(), SessionState::Unknown);

        let state = session.check().await.unwrap();
        assert_eq!(state, SessionState::Anonymous);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_logout_transitions() {
        let session = context(Role::User);
        let mut rx = session.subscribe();

        let user = session.login("asha", "secret").await.unwrap();
        assert_eq!(user.username, "asha");
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        session.logout().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_state() {
        let session = context(Role::User);
        let err = session.login("asha", "wrong").await.unwrap_err();
        assert!(matches!(err, ClientError::LoginRejected { .. }));
        assert_eq!(session.state(), SessionState::Unknown);
    }

    #[tokio::test]
    async fn test_mark_unauthorized_signs_out_every_clone() {
        let session = context(Role::User);
        let other = session.clone();
        session.login("asha", "secret").await.unwrap();
        assert!(other.is_authenticated());

        other.mark_unauthorized();
        assert!(!session.is_authenticated());
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_require_role() {
        let session = context(Role::User);
        assert!(matches!(
            session.require_role(Role::User),
            Err(ClientError::Unauthorized)
        ));

        session.login("asha", "secret").await.unwrap();
        assert!(session.require_role(Role::User).is_ok());
        assert!(matches!(
            session.require_role(Role::Admin),
            Err(ClientError::Forbidden { required: Role::Admin })
        ));

        let admin = context(Role::Admin);
        admin.login("asha", "secret").await.unwrap();
        assert!(admin.require_role(Role::User).is_ok());
        assert!(admin.require_role(Role::Admin).is_ok());
    }
}
