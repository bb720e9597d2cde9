//! Editor assets compiled into the binary

use crate::{GatewayError, Result};

const BUNDLED: &[(&str, &[u8])] = &[
    ("/index.html", include_bytes!("../static/index.html")),
    ("/editor.js", include_bytes!("../static/editor.js")),
    ("/editor.css", include_bytes!("../static/editor.css")),
];

/// A bundled file and the content type it is served with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub body: &'static [u8],
    pub content_type: &'static str,
}

/// Look up a bundled asset by request path; `/` maps to `/index.html`
pub fn bundled(path: &str) -> Result<Asset> {
    let path = if path == "/" { "/index.html" } else { path };

    BUNDLED
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(name, body)| Asset {
            body,
            content_type: content_type(name),
        })
        .ok_or_else(|| GatewayError::AssetNotFound(path.to_string()))
}

/// Content type for a file name, by extension
pub fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" => "application/javascript",
        "css" => "text/css",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}
