//! Content-Disposition filename extraction.

/// Extracts the filename from a raw `Content-Disposition` header value.
/// Handles `filename="quoted"` and bare `filename=token` parameters; RFC 5987
/// `filename*` values are not decoded and are ignored.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    for param in header_value.split(';') {
        let param = param.trim();
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("filename") {
            continue;
        }
        let value = value.trim();
        let unquoted = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        if !unquoted.is_empty() {
            return Some(unquoted.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted() {
        assert_eq!(
            parse_content_disposition_filename("attachment; filename=\"report.pdf\"").as_deref(),
            Some("report.pdf")
        );
    }

    #[test]
    fn bare_token() {
        assert_eq!(
            parse_content_disposition_filename("attachment; filename=simple.bin").as_deref(),
            Some("simple.bin")
        );
    }

    #[test]
    fn absent_or_empty() {
        assert_eq!(parse_content_disposition_filename("inline"), None);
        assert_eq!(
            parse_content_disposition_filename("attachment; filename=\"\""),
            None
        );
    }
}
