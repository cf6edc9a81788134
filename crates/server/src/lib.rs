pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
mod state;

pub use state::AppState;

#[cfg(test)]
pub(crate) mod test_support;
