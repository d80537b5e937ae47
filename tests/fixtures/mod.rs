//! Canned service payloads and upload batches

#![allow(dead_code)]

use serde_json::{json, Value};

use headshot_client::models::upload::UploadCandidate;

/// `n` valid 2 MB JPEG selfies.
pub fn selfies(n: usize) -> Vec<UploadCandidate> {
    (0..n)
        .map(|i| UploadCandidate::new(format!("selfie_{i}.jpg"), 2 * 1024 * 1024, "image/jpeg"))
        .collect()
}

pub fn catalog_body() -> Value {
    json!({
        "packages": {
            "basic": {
                "name": "Basic",
                "priceCents": 2900,
                "headshotCount": 40,
                "delivery": "24h"
            },
            "pro": {
                "name": "Pro",
                "priceCents": 15000,
                "headshotCount": 100,
                "delivery": "3h"
            },
            "team": {
                "name": "Team",
                "priceCents": 20000,
                "headshotCount": 200,
                "delivery": "48h"
            }
        }
    })
}

pub fn order_body(id: i64, plan: &str, team_size: u32, amount_cents: u64) -> Value {
    json!({
        "id": id,
        "plan": plan,
        "teamSize": team_size,
        "amountCents": amount_cents,
        "paymentStatus": "paid",
        "rerunCredits": 2,
        "createdAt": 1_760_000_000
    })
}

pub fn job_created_body(id: i64, order_id: i64, source_job_id: Option<i64>) -> Value {
    json!({
        "id": id,
        "orderId": order_id,
        "sourceJobId": source_job_id,
        "status": "queued",
        "secondsRemaining": 14
    })
}

pub fn job_status_body(id: i64, status: &str, seconds_remaining: u64) -> Value {
    json!({
        "id": id,
        "status": status,
        "secondsRemaining": seconds_remaining
    })
}

pub fn job_body(id: i64, order_id: Option<i64>, status: &str) -> Value {
    json!({
        "id": id,
        "orderId": order_id,
        "plan": "basic",
        "style": "corporate",
        "background": "office",
        "outfit": "business",
        "uploadCount": 8,
        "status": status,
        "secondsRemaining": 0
    })
}
