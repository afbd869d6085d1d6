/// Turkish international dialing prefix. Every recipient is assumed to be a
/// Turkish number.
pub const COUNTRY_CODE: &str = "90";

/// Canonicalizes a raw phone string to `90XXXXXXXXXX` digits.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if let Some(national) = digits.strip_prefix('0') {
        format!("{COUNTRY_CODE}{national}")
    } else if digits.starts_with(COUNTRY_CODE) {
        digits
    } else {
        format!("{COUNTRY_CODE}{digits}")
    }
}

/// `+`-prefixed form typed into search fields.
pub fn display_phone(normalized: &str) -> String {
    format!("+{normalized}")
}
