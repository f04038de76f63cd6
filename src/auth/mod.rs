pub mod auth;
pub mod guard;
pub mod jwt;
pub mod middleware;
