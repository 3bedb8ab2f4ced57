//! URI and path utilities shared by the router and the static file pipeline.
//!
//! Everything here is pure string work: percent encoding, query parsing,
//! extension/MIME classification, traversal sanitation, and the path-pattern
//! matcher that powers route dispatch. The matcher supports literal segments,
//! `:name` parameter segments, and a trailing `*` wildcard.

use smallvec::SmallVec;

/// Maximum captured path parameters before spilling to the heap.
///
/// Most REST-style routes carry well under 8 parameters, so captures stay
/// stack-allocated on the hot path.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Ordered `(name, value)` pairs captured from a matched path expression.
pub type PathParams = SmallVec<[(String, String); MAX_INLINE_PARAMS]>;

/// HTTP methods the dispatch boundary accepts. Anything else is rejected with
/// a 405 before a worker task is ever enqueued.
pub const KNOWN_METHODS: [&str; 7] = [
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS",
];

/// Whether `method` (compared upper-cased) is in [`KNOWN_METHODS`].
pub fn is_known_method(method: &str) -> bool {
    KNOWN_METHODS
        .iter()
        .any(|known| method.eq_ignore_ascii_case(known))
}

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode everything outside the unreserved set
/// (ALPHA / DIGIT / `-` / `_` / `.` / `~`), using uppercase hex.
pub fn url_encode(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                escaped.push(byte as char);
            }
            _ => {
                escaped.push('%');
                escaped.push(HEX_UPPER[(byte >> 4) as usize] as char);
                escaped.push(HEX_UPPER[(byte & 0x0f) as usize] as char);
            }
        }
    }
    escaped
}

/// Decode `%HH` escapes. A trailing `%` with fewer than two digits left is
/// dropped silently; a `%` followed by non-hex characters passes through
/// unchanged so hostile input can never abort the pipeline.
pub fn url_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 < bytes.len() {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    decoded.push((hi * 16 + lo) as u8);
                    i += 3;
                    continue;
                }
                decoded.push(b'%');
            }
            // truncated escape at end of input: the '%' itself is dropped
            i += 1;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Extract the path component of a URI, stripping everything from the first
/// `?` onward.
pub fn get_path(uri: &str) -> &str {
    match uri.find('?') {
        Some(pos) => &uri[..pos],
        None => uri,
    }
}

/// Parse the query string into `(name, value)` pairs.
///
/// Splits on `&`, then on the first `=` of each part; names and values are
/// whitespace-trimmed but NOT URL-decoded ([`url_decode`] is the caller's
/// tool for that). Parts without an `=` are skipped.
pub fn get_query_parameters(uri: &str) -> Vec<(String, String)> {
    let Some(pos) = uri.find('?') else {
        return Vec::new();
    };
    uri[pos + 1..]
        .split('&')
        .filter_map(|pair| {
            let eq = pair.find('=')?;
            Some((
                pair[..eq].trim().to_string(),
                pair[eq + 1..].trim().to_string(),
            ))
        })
        .collect()
}

/// Text after the last `.` of `path`, or `""` when there is none.
///
/// Callers must strip the query first ([`get_path`]); this function does not.
pub fn file_extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(pos) => &path[pos + 1..],
        None => "",
    }
}

/// File extensions the dispatcher treats as static assets.
pub const STATIC_EXTENSIONS: [&str; 75] = [
    // web documents
    "html", "htm", "xhtml", "xml",
    // stylesheets
    "css", "scss", "sass", "less",
    // javascript
    "js", "mjs", "jsx", "ts", "tsx",
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "tiff", "tif", "svg", "webp", "ico", "cur", "avif",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // audio
    "mp3", "wav", "ogg", "m4a", "aac", "flac",
    // video
    "mp4", "webm", "avi", "mov", "wmv", "flv", "mkv",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "rtf", "odt", "ods", "odp",
    // archives
    "zip", "rar", "7z", "tar", "gz", "bz2",
    // data formats
    "json", "csv", "yaml", "yml", "toml",
    // web manifests & config
    "manifest", "webmanifest", "map", "htaccess",
    // other common formats
    "swf", "eps", "ai", "psd", "sketch",
];

/// Whether the URI names a static asset, judged purely by extension.
///
/// The query is stripped before the extension is read, so `/app.js?v=3` is
/// still static. Matching is case-sensitive.
pub fn is_static_uri(uri: &str) -> bool {
    let extension = file_extension(get_path(uri));
    STATIC_EXTENSIONS.contains(&extension)
}

/// MIME type for a file extension; `application/octet-stream` when unknown.
pub fn mime_type_from_extension(extension: &str) -> &'static str {
    match extension {
        "html" | "htm" => "text/html",
        "xhtml" => "application/xhtml+xml",
        "xml" => "application/xml",
        "css" => "text/css",
        "scss" => "text/x-scss",
        "sass" => "text/x-sass",
        "less" => "text/x-less",
        "js" | "mjs" => "application/javascript",
        "jsx" => "text/jsx",
        "ts" => "application/typescript",
        "tsx" => "text/tsx",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" | "cur" => "image/x-icon",
        "avif" => "image/avif",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "mkv" => "video/x-matroska",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" | "htaccess" => "text/plain",
        "rtf" => "application/rtf",
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "odp" => "application/vnd.oasis.opendocument.presentation",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "7z" => "application/x-7z-compressed",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        "bz2" => "application/x-bzip2",
        "json" | "map" => "application/json",
        "csv" => "text/csv",
        "yaml" | "yml" => "application/x-yaml",
        "toml" => "application/toml",
        "manifest" => "text/cache-manifest",
        "webmanifest" => "application/manifest+json",
        "swf" => "application/x-shockwave-flash",
        "eps" | "ai" => "application/postscript",
        "psd" => "image/vnd.adobe.photoshop",
        "sketch" => "application/x-sketch",
        _ => "application/octet-stream",
    }
}

/// Canonical file extension for a MIME type, when one exists.
pub fn extension_from_mime(mime_type: &str) -> Option<&'static str> {
    let extension = match mime_type {
        "text/html" => "html",
        "application/xhtml+xml" => "xhtml",
        "application/xml" => "xml",
        "text/css" => "css",
        "application/javascript" => "js",
        "application/typescript" => "ts",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        "image/x-icon" => "ico",
        "image/avif" => "avif",
        "font/woff" => "woff",
        "font/woff2" => "woff2",
        "font/ttf" => "ttf",
        "font/otf" => "otf",
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/mp4" => "m4a",
        "audio/aac" => "aac",
        "audio/flac" => "flac",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        "application/zip" => "zip",
        "application/gzip" => "gz",
        "application/x-tar" => "tar",
        "application/json" => "json",
        "text/csv" => "csv",
        "application/x-yaml" => "yaml",
        "application/toml" => "toml",
        "application/manifest+json" => "webmanifest",
        _ => return None,
    };
    Some(extension)
}

/// Textually delete every `..` occurrence from a requested path.
///
/// Defense in depth only: the static file pipeline still resolves the path
/// component-by-component and refuses anything that would escape its root.
pub fn sanitize_path(path: &str) -> String {
    let mut sanitized = path.to_string();
    while let Some(pos) = sanitized.find("..") {
        sanitized.replace_range(pos..pos + 2, "");
    }
    sanitized
}

/// Match a route expression against a concrete request path.
///
/// Returns the captured parameters on a match, `None` otherwise.
///
/// Semantics:
/// - both sides are normalized (leading slashes collapsed, one trailing slash
///   stripped unless the string is exactly `/`), then compared segment by
///   segment;
/// - `:name` matches one non-empty concrete segment; the capture value is the
///   segment URL-decoded;
/// - `*` swallows the remaining concrete segments (possibly zero). A non-empty
///   remainder is joined with `/`, URL-decoded, and captured under the name
///   `*`; an empty remainder produces no capture entry;
/// - anything else must be byte-for-byte equal;
/// - exact equality of the raw strings short-circuits with no captures.
pub fn match_path(expression: &str, path: &str) -> Option<PathParams> {
    if expression == path {
        return Some(PathParams::new());
    }

    let expr = normalize(expression);
    let concrete = normalize(path);
    if expr.is_empty() && concrete.is_empty() {
        return Some(PathParams::new());
    }

    let expr_segs = split_segments(expr);
    let path_segs = split_segments(concrete);

    let mut params = PathParams::new();
    let mut ei = 0;
    let mut pi = 0;
    while ei < expr_segs.len() && pi < path_segs.len() {
        let es = expr_segs[ei];
        let ps = path_segs[pi];

        if es == "*" {
            let remainder = path_segs[pi..].join("/");
            if !remainder.is_empty() {
                params.push(("*".to_string(), url_decode(&remainder)));
            }
            return Some(params);
        }

        if let Some(name) = es.strip_prefix(':') {
            if ps.is_empty() {
                return None;
            }
            params.push((name.to_string(), url_decode(ps)));
            ei += 1;
            pi += 1;
            continue;
        }

        if es != ps {
            return None;
        }
        ei += 1;
        pi += 1;
    }

    if ei < expr_segs.len() {
        // a single leftover `*` matches the empty remainder
        if ei + 1 == expr_segs.len() && expr_segs[ei] == "*" {
            return Some(params);
        }
        return None;
    }
    if pi < path_segs.len() {
        return None;
    }
    Some(params)
}

fn normalize(s: &str) -> &str {
    if s == "/" {
        return s;
    }
    s.trim_start_matches('/').trim_end_matches('/')
}

fn split_segments(s: &str) -> Vec<&str> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split('/').collect()
    }
}
