pub mod access_tokens;
pub mod activities;
pub mod addresses;
pub mod auth;
pub mod cart;
pub mod commodities;
pub mod orders;
