/// Expand an `@Accept` / `@Produce` alias into a MIME type.
///
/// Values that already contain a `/` pass through untouched; unknown
/// aliases return `None`.
pub fn mime_type(alias: &str) -> Option<String> {
    let alias = alias.trim();
    if alias.contains('/') {
        return Some(alias.to_string());
    }
    let mime = match alias.to_ascii_lowercase().as_str() {
        "json" => "application/json",
        "xml" => "text/xml",
        "plain" => "text/plain",
        "html" => "text/html",
        "mpfd" => "multipart/form-data",
        "x-www-form-urlencoded" => "application/x-www-form-urlencoded",
        "json-api" => "application/vnd.api+json",
        "json-stream" => "application/x-json-stream",
        "octet-stream" => "application/octet-stream",
        "png" => "image/png",
        "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "event-stream" => "text/event-stream",
        _ => return None,
    };
    Some(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(mime_type("json").as_deref(), Some("application/json"));
        assert_eq!(mime_type("MPFD").as_deref(), Some("multipart/form-data"));
        assert_eq!(
            mime_type("application/vnd.custom+json").as_deref(),
            Some("application/vnd.custom+json")
        );
        assert_eq!(mime_type("yaml"), None);
    }
}
