use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

pub type OrderId = i64;

pub const MIN_TEAM_SIZE: u32 = 1;
pub const MAX_TEAM_SIZE: u32 = 50;

/// Number of people an order covers, always within 1..=50.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TeamSize(u32);

impl TeamSize {
    pub const SOLO: TeamSize = TeamSize(MIN_TEAM_SIZE);

    /// Clamp any integer into the allowed range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(MIN_TEAM_SIZE as i64, MAX_TEAM_SIZE as i64) as u32)
    }

    /// Lenient form-field parse: the leading integer is used, anything
    /// without one yields a team of 1.
    pub fn parse_lenient(input: &str) -> Self {
        let trimmed = input.trim_start();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return Self::SOLO;
        }
        // Anything too long to fit is far above the cap anyway.
        let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
        Self::clamped(if negative { -magnitude } else { magnitude })
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for TeamSize {
    fn default() -> Self {
        Self::SOLO
    }
}

impl std::fmt::Display for TeamSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order as listed by `GET /api/orders` and returned by `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub plan: String,
    pub team_size: u32,
    pub amount_cents: u64,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub rerun_credits: u32,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[garde(length(min = 1, max = 64))]
    pub plan: String,

    #[garde(range(min = 1, max = 50))]
    pub team_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderList {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_size_clamps() {
        assert_eq!(TeamSize::clamped(0).get(), 1);
        assert_eq!(TeamSize::clamped(-3).get(), 1);
        assert_eq!(TeamSize::clamped(51).get(), 50);
        assert_eq!(TeamSize::clamped(12).get(), 12);
    }

    #[test]
    fn test_team_size_lenient_parse() {
        assert_eq!(TeamSize::parse_lenient("3").get(), 3);
        assert_eq!(TeamSize::parse_lenient("  7 people").get(), 7);
        assert_eq!(TeamSize::parse_lenient("abc").get(), 1);
        assert_eq!(TeamSize::parse_lenient("").get(), 1);
        assert_eq!(TeamSize::parse_lenient("-4").get(), 1);
        assert_eq!(TeamSize::parse_lenient("999").get(), 50);
        assert_eq!(TeamSize::parse_lenient("99999999999999999999999").get(), 50);
    }

    #[test]
    fn test_order_decodes_server_payload() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 501,
            "plan": "basic",
            "teamSize": 3,
            "rerunCredits": 1,
            "amountCents": 7830,
            "paymentStatus": "paid",
            "createdAt": 1_700_000_000
        }))
        .unwrap();
        assert_eq!(order.id, 501);
        assert_eq!(order.amount_cents, 7830);
        assert_eq!(order.created_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_create_order_request_bounds() {
        let request = CreateOrderRequest {
            plan: "basic".to_string(),
            team_size: 51,
        };
        assert!(request.validate().is_err());
    }
}
