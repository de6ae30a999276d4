//! Single-page application bundle.
//!
//! Any request no API route claims is served from the asset directory. When
//! no file exists at the requested path the entry document (`index.html`) is
//! returned with status 200, so client-side routes survive a page reload.

use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

/// Entry document of the bundle.
pub const ENTRY_DOCUMENT: &str = "index.html";

/// Service serving `dir`, falling back to its entry document.
pub fn spa_service(dir: impl AsRef<Path>) -> ServeDir<ServeFile> {
    let dir = dir.as_ref();
    ServeDir::new(dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(dir.join(ENTRY_DOCUMENT)))
}
