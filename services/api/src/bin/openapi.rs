//! services/api/src/bin/openapi.rs
//!
//! Writes the CogniPath OpenAPI document, so the web client can generate its API
//! bindings without a running server.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use api_lib::web::rest::openapi_json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    std::fs::write(&path, openapi_json()?)?;
    println!("OpenAPI specification generated at {}", path);
    Ok(())
}
