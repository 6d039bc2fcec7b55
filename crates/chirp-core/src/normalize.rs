/// Canonical form of a sender address for contact matching.
///
/// A `+33` country prefix becomes a single leading `0`; anything else passes
/// through untouched. The rule is deliberately this narrow: it is the form
/// numbers are stored in, and widening it would change which contacts match.
pub fn normalize_number(raw: &str) -> String {
    match raw.strip_prefix("+33") {
        Some(rest) => format!("0{rest}"),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_french_prefix() {
        assert_eq!(normalize_number("+33612345678"), "0612345678");
    }

    #[test]
    fn already_local_is_unchanged() {
        assert_eq!(normalize_number("0612345678"), "0612345678");
    }

    #[test]
    fn idempotent() {
        let once = normalize_number("+33612345678");
        assert_eq!(normalize_number(&once), once);
    }

    #[test]
    fn other_country_codes_pass_through() {
        assert_eq!(normalize_number("+4915112345678"), "+4915112345678");
        assert_eq!(normalize_number("12345"), "12345");
    }
}
