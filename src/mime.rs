//! Fixed MIME-type table for embedded image resources

/// Map a source file extension (no dot) to the MIME type recorded on an
/// embedded image. Extensions outside the table fall back to
/// `application/octet-stream`.
#[must_use]
pub fn from_file_extension(extension: Option<&str>) -> &'static str {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("dds") => "image/vnd-ms.dds",
        Some("ktx2") => "image/ktx2",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Map an embedded image's MIME type back to a file extension (dot
/// included). Types outside the table yield `None`.
#[must_use]
pub fn to_file_extension(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/png" => Some(".png"),
        "image/jpeg" => Some(".jpg"),
        "image/vnd-ms.dds" => Some(".dds"),
        "image/ktx2" => Some(".ktx2"),
        "image/webp" => Some(".webp"),
        _ => None,
    }
}
