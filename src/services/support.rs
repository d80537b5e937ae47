use std::sync::Arc;

use garde::Validate;

use crate::models::account::{SupportTicketCreated, SupportTicketRequest};
use crate::models::order::OrderId;
use crate::services::api_client::{ApiClient, ApiError};
use crate::services::dashboard::Dashboard;
use crate::services::events::{ClientEvent, EventBus};
use crate::services::validation::{require_session, ValidationError};

pub struct SupportService {
    api: Arc<ApiClient>,
    events: EventBus,
    dashboard: Arc<Dashboard>,
    require_login: bool,
}

impl SupportService {
    pub fn new(
        api: Arc<ApiClient>,
        events: EventBus,
        dashboard: Arc<Dashboard>,
        require_login: bool,
    ) -> Self {
        Self {
            api,
            events,
            dashboard,
            require_login,
        }
    }

    /// Open a support ticket, optionally about a specific order.
    pub async fn create_ticket(
        &self,
        email: &str,
        order_id: Option<OrderId>,
        message: &str,
    ) -> Result<SupportTicketCreated, SupportError> {
        require_session(self.api.session(), self.require_login)?;

        let request = SupportTicketRequest {
            email: email.trim().to_string(),
            order_id,
            message: message.trim().to_string(),
        };
        request.validate().map_err(ValidationError::from)?;

        let ticket: SupportTicketCreated = match self.api.post("/api/support", &request).await {
            Ok(response) => response.json().map_err(SupportError::Protocol)?,
            Err(source) => {
                let message = source.user_message("Unknown error");
                self.events.emit(ClientEvent::WorkflowFailed {
                    operation: "Support".to_string(),
                    message: message.clone(),
                });
                return Err(SupportError::Rejected { message, source });
            }
        };

        tracing::info!(ticket_id = ticket.id, order_id = ?order_id, "Support ticket created");
        self.events.emit(ClientEvent::SupportTicketCreated {
            ticket_id: ticket.id,
        });
        self.dashboard.refresh_all().await;
        Ok(ticket)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SupportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Support failed: {message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("unexpected response from the service: {0}")]
    Protocol(#[source] ApiError),
}
