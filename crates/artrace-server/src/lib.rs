pub mod access;
pub mod app;
pub mod auth;
pub mod error;
pub mod mailer;
pub mod paystack;
pub mod routes;
pub mod state;
