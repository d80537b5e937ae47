pub mod account;
pub mod asset;
pub mod job;
pub mod order;
pub mod package;
pub mod upload;
