pub mod auth;
pub mod blogs;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod stats;
pub mod tokens;
pub mod users;

#[cfg(test)]
mod testing;
