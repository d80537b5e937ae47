pub mod account;
pub mod api_client;
pub mod assets;
pub mod catalog;
pub mod dashboard;
pub mod events;
pub mod poller;
pub mod pricing;
pub mod rerun;
pub mod retry;
pub mod session;
pub mod submission;
pub mod support;
pub mod upload_validation;
pub mod validation;
