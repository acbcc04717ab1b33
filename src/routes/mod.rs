use axum::Router;

use crate::state::AppState;

pub mod access_token;
pub mod activity;
pub mod address;
pub mod cart;
pub mod commodity;
pub mod doc;
pub mod form;
pub mod health;
pub mod orders;
pub mod params;
pub mod staff;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/access_token", access_token::router())
        .nest("/users", users::router())
        .nest("/staff", staff::router())
        .nest("/address", address::router())
        .nest("/cart", cart::router())
        .nest("/commodity", commodity::router())
        .nest("/orders", orders::router())
        .nest("/activity", activity::router())
}
