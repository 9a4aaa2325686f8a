pub mod account;
pub mod config;
pub mod error;
pub mod payment;
