pub mod action;
pub mod auth;
pub mod edit;
pub mod models;
pub mod sort;
