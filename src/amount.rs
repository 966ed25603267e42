//! Locale-formatted currency amounts ("12,50 €").

use regex::Regex;

/// Returns the first `digits,digits` number in `input` as a decimal value,
/// or `None` when nothing matches.
pub fn parse_amount(input: &str) -> Option<f64> {
    let re = Regex::new(r"(\d+,\d+)").ok()?;
    let caps = re.captures(input)?;
    let number = caps.get(1)?.as_str().replace(',', ".");
    number.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_decimal() {
        assert_eq!(parse_amount("Gesamtbetrag: 12,50€"), Some(12.5));
        assert_eq!(parse_amount("3,00 EUR"), Some(3.0));
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(parse_amount("1,50 € (inkl. 0,20 € Gebühr)"), Some(1.5));
    }

    #[test]
    fn rejects_numbers_without_comma() {
        assert_eq!(parse_amount("no number here"), None);
        assert_eq!(parse_amount("12 €"), None);
        assert_eq!(parse_amount("12.50 €"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn thousands_are_not_joined() {
        // only the first digits,digits span is read
        assert_eq!(parse_amount("1.234,56 €"), Some(234.56));
    }
}
