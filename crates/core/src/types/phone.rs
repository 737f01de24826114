//! Phone number normalization for WhatsApp delivery.

/// Default country calling code (Indonesia).
pub const DEFAULT_COUNTRY_CODE: &str = "62";

/// Normalize a phone number into a WhatsApp target.
///
/// Removes every non-digit, strips leading zeros, and prefixes the
/// country code when the number does not already start with it.
///
/// ```
/// use jamur_pos_core::whatsapp_target;
///
/// assert_eq!(whatsapp_target("0812-3456-789", "62"), "628123456789");
/// assert_eq!(whatsapp_target("+62 812 3456 789", "62"), "628123456789");
/// ```
#[must_use]
pub fn whatsapp_target(raw: &str, country_code: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let national = digits.trim_start_matches('0');

    if national.starts_with(country_code) {
        national.to_owned()
    } else {
        format!("{country_code}{national}")
    }
}
