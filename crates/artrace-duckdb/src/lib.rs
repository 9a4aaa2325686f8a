pub mod account;
pub mod auth;
pub mod backend;
pub mod schema;
pub mod store;
pub mod subscription;

pub use backend::DuckDbBackend;
