//! Phone number canonicalization

/// Canonicalize a phone number to a dialable form.
///
/// Keeps digits, plus a `+` when it comes before any digit. A stripped
/// result starting with `+` is returned as is. Otherwise ten-digit numbers
/// get the North American `+1` prefix and eleven-digit numbers starting
/// with `1` get `+`. Anything else is returned stripped, or untouched if
/// stripping left nothing.
pub fn normalize_phone(raw: &str) -> String {
    let mut stripped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() || (c == '+' && stripped.is_empty()) {
            stripped.push(c);
        }
    }

    if stripped.is_empty() {
        return raw.to_string();
    }
    if stripped.starts_with('+') {
        return stripped;
    }

    let digits = stripped;
    match digits.len() {
        10 => format!("+1{}", digits),
        11 if digits.starts_with('1') => format!("+{}", digits),
        _ => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_north_american_ten_digit() {
        assert_eq!(normalize_phone("555-123-4567"), "+15551234567");
        assert_eq!(normalize_phone("(555) 123-4567"), "+15551234567");
    }

    #[test]
    fn test_eleven_digit_with_country_code() {
        assert_eq!(normalize_phone("15551234567"), "+15551234567");
        assert_eq!(normalize_phone("1 (555) 123-4567"), "+15551234567");
    }

    #[test]
    fn test_international_kept() {
        assert_eq!(normalize_phone("+44 20 7946 0958"), "+442079460958");
        assert_eq!(normalize_phone("+15551234567"), "+15551234567");
        assert_eq!(normalize_phone("(+44) 20 7946 0958"), "+442079460958");
    }

    #[test]
    fn test_plus_only_kept_at_start() {
        assert_eq!(normalize_phone("+abc"), "+");
        assert_eq!(normalize_phone("++1 555"), "+1555");
        assert_eq!(normalize_phone("555+1234567"), "+15551234567");
    }

    #[test]
    fn test_other_lengths_stripped() {
        assert_eq!(normalize_phone("25551234567"), "25551234567");
        assert_eq!(normalize_phone("911"), "911");
        assert_eq!(normalize_phone("020 7946 0958"), "02079460958");
    }

    #[test]
    fn test_no_digits_returns_original() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("ext."), "ext.");
        assert_eq!(normalize_phone("+"), "+");
    }
}
