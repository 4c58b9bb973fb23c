//! MIME type detection for `Content-Type` response headers.
//!
//! Lookup is keyed by the lowercase file extension. Precompressed files
//! (`.gz`, `.br`) report the type of the content they encode, so
//! `app.js.gz` is served as JavaScript with a `Content-Encoding` header.

/// Common MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const MARKDOWN: &str = "text/markdown; charset=utf-8";
    pub const CSV: &str = "text/csv; charset=utf-8";
    pub const WEBMANIFEST: &str = "application/manifest+json";

    // Documents
    pub const PDF: &str = "application/pdf";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const WASM: &str = "application/wasm";
    pub const ZIP: &str = "application/zip";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";
    pub const BMP: &str = "image/bmp";

    // Audio
    pub const MP3: &str = "audio/mpeg";
    pub const WAV: &str = "audio/wav";
    pub const OGG_AUDIO: &str = "audio/ogg";

    // Video
    pub const MP4: &str = "video/mp4";
    pub const WEBM: &str = "video/webm";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
    pub const EOT: &str = "application/vnd.ms-fontobject";
}

/// Extensions that mark a precompressed sibling file.
const COMPRESSED_EXTENSIONS: &[&str] = &["gz", "br"];

/// Guess the MIME type of a route or relative path.
///
/// A trailing compression extension is skipped, so the type reflects the
/// encoded content.
pub fn from_route(route: &str) -> &'static str {
    let file = route.rsplit('/').next().unwrap_or(route);
    let mut parts = file.rsplit('.');
    let last = parts.next();
    let ext = match last {
        Some(ext) if is_compressed_extension(ext) && file.contains('.') => parts.next(),
        _ if file.contains('.') => last,
        _ => None,
    };
    from_extension(ext)
}

/// Whether an extension names a precompressed encoding.
pub fn is_compressed_extension(ext: &str) -> bool {
    COMPRESSED_EXTENSIONS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(ext))
}

/// Guess MIME type from file extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    let Some(ext) = ext else {
        return types::OCTET_STREAM;
    };
    match ext.to_ascii_lowercase().as_str() {
        // Web / Text
        "html" | "htm" => types::HTML,
        "css" => types::CSS,
        "js" | "mjs" | "cjs" => types::JAVASCRIPT,
        "json" | "map" => types::JSON,
        "webmanifest" => types::WEBMANIFEST,
        "xml" => types::XML,
        "csv" => types::CSV,
        "txt" => types::PLAIN,
        "md" => types::MARKDOWN,

        // Images
        "svg" => types::SVG,
        "png" => types::PNG,
        "jpg" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "webp" => types::WEBP,
        "avif" => types::AVIF,
        "ico" => types::ICO,
        "bmp" => types::BMP,

        // Audio / Video
        "mp3" => types::MP3,
        "wav" => types::WAV,
        "ogg" | "oga" => types::OGG_AUDIO,
        "mp4" | "m4v" => types::MP4,
        "webm" => types::WEBM,

        // Fonts
        "woff" => types::WOFF,
        "woff2" => types::WOFF2,
        "ttf" => types::TTF,
        "otf" => types::OTF,
        "eot" => types::EOT,

        // Documents / Binary
        "pdf" => types::PDF,
        "wasm" => types::WASM,
        "zip" => types::ZIP,

        _ => types::OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_route() {
        assert_eq!(from_route("index.html"), types::HTML);
        assert_eq!(from_route("css/site.css"), types::CSS);
        assert_eq!(from_route("_content/Lib/app.js"), types::JAVASCRIPT);
        assert_eq!(from_route("app.js.map"), types::JSON);
        assert_eq!(from_route("img/logo.PNG"), types::PNG);
        assert_eq!(from_route("fonts/a.woff2"), types::WOFF2);
        assert_eq!(from_route("unknown.xyz"), types::OCTET_STREAM);
    }

    #[test]
    fn test_compressed_routes_use_inner_type() {
        assert_eq!(from_route("app.js.gz"), types::JAVASCRIPT);
        assert_eq!(from_route("css/site.css.br"), types::CSS);
        assert_eq!(from_route("app.1234asdf.js.gz"), types::JAVASCRIPT);
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(from_route("LICENSE"), types::OCTET_STREAM);
        assert_eq!(from_route("dir.d/LICENSE"), types::OCTET_STREAM);
        assert_eq!(from_extension(None), types::OCTET_STREAM);
    }

    #[test]
    fn test_is_compressed_extension() {
        assert!(is_compressed_extension("gz"));
        assert!(is_compressed_extension("BR"));
        assert!(!is_compressed_extension("js"));
    }
}
