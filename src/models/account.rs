use garde::Validate;
use serde::{Deserialize, Serialize};

use super::order::OrderId;

/// Body of `POST /api/auth/register` and `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Credentials {
    #[garde(length(min = 3, max = 254))]
    pub email: String,

    #[garde(length(min = 1, max = 256))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Body of `POST /api/support`.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicketRequest {
    #[garde(length(min = 1, max = 254))]
    pub email: String,

    #[garde(skip)]
    pub order_id: Option<OrderId>,

    #[garde(length(min = 1, max = 5000))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SupportTicketCreated {
    pub id: i64,
    #[serde(default)]
    pub message: String,
}

/// Counters served by `GET /api/metrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub orders: u64,
    pub jobs: u64,
    pub completed_jobs: u64,
    pub support_tickets: u64,
    #[serde(default)]
    pub estimated_conversion_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_request_requires_message() {
        let request = SupportTicketRequest {
            email: "ana@example.com".to_string(),
            order_id: None,
            message: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_support_request_serializes_camel_case() {
        let request = SupportTicketRequest {
            email: "ana@example.com".to_string(),
            order_id: Some(7),
            message: "Wrong background".to_string(),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["orderId"], 7);
    }

    #[test]
    fn test_metrics_decode() {
        let metrics: DashboardMetrics = serde_json::from_value(serde_json::json!({
            "orders": 3, "jobs": 4, "completedJobs": 2, "supportTickets": 1,
            "estimatedConversionRate": 75.0
        }))
        .unwrap();
        assert_eq!(metrics.completed_jobs, 2);
    }
}
