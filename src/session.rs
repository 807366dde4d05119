// Auth provider: current user and token, persisted through LocalStorage

use parking_lot::RwLock;

use crate::api_client::ApiClient;
use crate::api_client::models::{AuthResponse, User};
use crate::error::Result;
use crate::services::{AuthService, UserService};

#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub loading: bool,
    pub user: Option<User>,
    pub token: Option<String>,
}

impl AuthState {
    fn initial() -> Self {
        AuthState {
            loading: true,
            user: None,
            token: None,
        }
    }

    fn unauthenticated() -> Self {
        AuthState {
            loading: false,
            user: None,
            token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Scoped session context. Starts in the loading state until [`Session::init`] runs.
#[derive(Debug)]
pub struct Session {
    client: ApiClient,
    state: RwLock<AuthState>,
}

impl Session {
    pub fn new(client: ApiClient) -> Self {
        Session {
            client,
            state: RwLock::new(AuthState::initial()),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// Restore the session from the stored token. A token the backend no longer
    /// accepts is discarded.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn init(&self) -> AuthState {
        let token = match self.client.storage().token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored token");
                None
            }
        };
        let Some(token) = token else {
            *self.state.write() = AuthState::unauthenticated();
            return self.state();
        };

        match UserService::new(&self.client).me().await {
            Ok(user) => {
                tracing::info!(user = %user.username, "session restored");
                *self.state.write() = AuthState {
                    loading: false,
                    user: Some(user),
                    token: Some(token),
                };
            }
            Err(e) => {
                tracing::info!(error = %e, "stored token rejected, clearing session");
                if let Err(e) = self.client.storage().clear_token() {
                    tracing::warn!(error = %e, "could not clear stored token");
                }
                *self.state.write() = AuthState::unauthenticated();
            }
        }
        self.state()
    }

    #[tracing::instrument(level = "debug", skip(self, password))]
    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<User> {
        self.state.write().loading = true;
        let res = AuthService::new(&self.client)
            .login(username_or_email, password)
            .await;
        self.finish_auth(res)
    }

    #[tracing::instrument(level = "debug", skip(self, password))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        self.state.write().loading = true;
        let res = AuthService::new(&self.client)
            .register(username, email, password)
            .await;
        self.finish_auth(res)
    }

    // Last completed login/register wins; concurrent calls are not serialized.
    fn finish_auth(&self, res: Result<AuthResponse>) -> Result<User> {
        let auth = match res {
            Ok(auth) => auth,
            Err(e) => {
                self.state.write().loading = false;
                return Err(e);
            }
        };
        if let Err(e) = self.client.storage().set_token(&auth.token) {
            self.state.write().loading = false;
            return Err(e);
        }
        tracing::info!(user = %auth.user.username, "logged in");
        *self.state.write() = AuthState {
            loading: false,
            user: Some(auth.user.clone()),
            token: Some(auth.token),
        };
        Ok(auth.user)
    }

    /// Drop user and token regardless of the current state.
    pub fn logout(&self) -> Result<()> {
        *self.state.write() = AuthState::unauthenticated();
        tracing::info!("logged out");
        self.client.storage().clear_token()
    }

    /// Replace the cached user, e.g. after a profile update.
    pub fn set_user(&self, user: User) {
        self.state.write().user = Some(user);
    }
}
