use chrono::{DateTime, Utc};

/// Normalize a Kenyan MSISDN to the `254XXXXXXXXX` form that Daraja requires.
///
/// Accepts local formats ("0712 345 678"), bare subscriber numbers ("712345678") and international forms
/// ("+254712345678" / "254712345678"). Whitespace and a leading `+` are stripped before the prefix rules apply.
pub fn normalize_msisdn(phone: &str) -> String {
    let cleaned: String = phone.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if let Some(rest) = cleaned.strip_prefix('0') {
        format!("254{rest}")
    } else if cleaned.starts_with("254") {
        cleaned.to_string()
    } else {
        format!("254{cleaned}")
    }
}

/// The Lipa na M-Pesa Online password: base64 of shortcode + passkey + timestamp.
pub fn lipa_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    base64::encode(format!("{shortcode}{passkey}{timestamp}"))
}

/// Daraja timestamps are `YYYYMMDDHHmmss`.
pub fn daraja_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn msisdn_normalization() {
        assert_eq!(normalize_msisdn("0712345678"), "254712345678");
        assert_eq!(normalize_msisdn("712345678"), "254712345678");
        assert_eq!(normalize_msisdn("254712345678"), "254712345678");
        assert_eq!(normalize_msisdn("+254 712 345 678"), "254712345678");
        assert_eq!(normalize_msisdn("0712-345-678"), "254712345678");
    }

    #[test]
    fn password_is_base64_of_concatenation() {
        let ts = daraja_timestamp(Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap());
        assert_eq!(ts, "20240229133000");
        let password = lipa_password("174379", "passkey", &ts);
        assert_eq!(base64::decode(&password).unwrap(), b"174379passkey20240229133000");
    }
}
