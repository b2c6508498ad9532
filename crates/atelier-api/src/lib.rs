pub mod auth;
pub mod comments;
pub mod error;
pub mod interactions;
pub mod middleware;
pub mod posts;
pub mod routes;
pub mod stats;
