pub mod access;
pub mod checkout;
pub mod gate;
pub mod health;
pub mod profile;
