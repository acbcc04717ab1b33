pub mod access_token_service;
pub mod activity_service;
pub mod address_service;
pub mod auth_service;
pub mod cart_service;
pub mod commodity_service;
pub mod order_service;
pub mod staff_service;
