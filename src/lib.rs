//! HeadShot client
//!
//! This library provides the client side of the HeadShot AI headshot
//! service: package pricing, selfie validation, order and job submission,
//! job status polling, reruns and asset retrieval. A presentation layer
//! subscribes to [`services::events::ClientEvent`]s and otherwise stays
//! decoupled from the workflows.

pub mod app_state;
pub mod config;
pub mod models;
pub mod services;
