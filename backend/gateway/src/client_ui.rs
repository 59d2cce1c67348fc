//! Static hosting for the built web client.
//!
//! Unknown paths fall back to `index.html` so client-side routes resolve.

use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

/// Service serving `dir`, with an `index.html` fallback.
pub fn client_service(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}
