use std::sync::Arc;

use garde::Validate;

use crate::models::account::{Credentials, LoginResponse, User};
use crate::services::api_client::{ApiClient, ApiError};
use crate::services::dashboard::Dashboard;
use crate::services::events::{ClientEvent, EventBus};
use crate::services::poller::JobPoller;
use crate::services::validation::ValidationError;

/// Register, log in and log out. Logging in stores the bearer credential in
/// the session; logging out clears it and tears down session state.
pub struct AccountService {
    api: Arc<ApiClient>,
    events: EventBus,
    dashboard: Arc<Dashboard>,
    poller: Arc<JobPoller>,
}

impl AccountService {
    pub fn new(
        api: Arc<ApiClient>,
        events: EventBus,
        dashboard: Arc<Dashboard>,
        poller: Arc<JobPoller>,
    ) -> Self {
        Self {
            api,
            events,
            dashboard,
            poller,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(), AccountError> {
        let credentials = credentials(email, password)?;
        self.api
            .post("/api/auth/register", &credentials)
            .await
            .map_err(|source| self.rejected("Register", source))?;

        tracing::info!(email = %credentials.email, "Account registered");
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let credentials = credentials(email, password)?;
        let login: LoginResponse = self
            .api
            .post("/api/auth/login", &credentials)
            .await
            .map_err(|source| self.rejected("Login", source))?
            .json()
            .map_err(AccountError::Protocol)?;

        self.api.session().set_credential(login.token);
        tracing::info!(email = %login.user.email, "Logged in");
        self.events.emit(ClientEvent::LoggedIn {
            email: login.user.email.clone(),
        });
        self.dashboard.refresh_all().await;
        Ok(login.user)
    }

    /// Always succeeds locally; a failed server-side logout is only logged.
    pub async fn logout(&self) {
        if self.api.session().is_authenticated() {
            if let Err(e) = self.api.post_empty("/api/auth/logout").await {
                tracing::warn!(error = %e, "Server-side logout failed");
            }
        }

        self.poller.stop();
        self.api.session().clear();
        self.dashboard.clear();
        tracing::info!("Logged out");
        self.events.emit(ClientEvent::LoggedOut);
    }

    fn rejected(&self, operation: &'static str, source: ApiError) -> AccountError {
        let message = source.user_message("Unknown error");
        self.events.emit(ClientEvent::WorkflowFailed {
            operation: operation.to_string(),
            message: message.clone(),
        });
        AccountError::Rejected {
            operation,
            message,
            source,
        }
    }
}

fn credentials(email: &str, password: &str) -> Result<Credentials, ValidationError> {
    let credentials = Credentials {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    credentials.validate()?;
    Ok(credentials)
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{operation} failed: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("unexpected response from the service: {0}")]
    Protocol(#[source] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_trim_email() {
        let c = credentials("  ana@example.com ", "pw").unwrap();
        assert_eq!(c.email, "ana@example.com");
    }

    #[test]
    fn test_blank_credentials_rejected() {
        assert!(matches!(
            credentials("", "pw"),
            Err(ValidationError::Invalid(_))
        ));
        assert!(credentials("ana@example.com", "").is_err());
    }
}
