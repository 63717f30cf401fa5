pub mod auth;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod middleware;
pub mod routes;
pub mod sheets;
pub mod state;
pub mod views;
