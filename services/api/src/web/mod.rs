pub mod protocol;
pub mod rest;
pub mod routes;
pub mod state;

// Re-export the router so the binary can build the web server in one call.
pub use routes::router;
