//! Field extraction from donation notification HTML.

use crate::constants::{CART_TABLE_ID, LABEL_DONOR, LABEL_MESSAGE, LABEL_TOTAL};
use crate::error::{Error, Result};
use crate::models::DonationFields;
use scraper::{ElementRef, Html, Selector};

/// Undo quoted-printable artifacts left in the HTML part: soft line breaks
/// (`=` at end of line) and the escaped equals sign `=3D`.
pub fn normalize_body(raw: &str) -> String {
    raw.replace("=\r\n", "")
        .replace("=\n", "")
        .replace("=3D", "=")
}

/// Reads the label/value cell pairs of the cart table.
///
/// Fails with [`Error::MalformedNotification`] when the table is missing.
/// Labels that are not present stay `None`.
pub fn extract_fields(raw_body: &str) -> Result<DonationFields> {
    let doc = Html::parse_document(&normalize_body(raw_body));
    let table_sel = Selector::parse(&format!("table#{CART_TABLE_ID}"))
        .map_err(|e| Error::Parse(format!("table selector: {e}")))?;
    let cell_sel =
        Selector::parse("td").map_err(|e| Error::Parse(format!("cell selector: {e}")))?;

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| Error::MalformedNotification(format!("no table#{CART_TABLE_ID}")))?;

    let cells: Vec<ElementRef> = table.select(&cell_sel).collect();
    let mut fields = DonationFields::default();
    for pair in cells.chunks_exact(2) {
        let label = stripped_text(pair[0]);
        let slot = match label.as_str() {
            LABEL_TOTAL => &mut fields.total_amount_raw,
            LABEL_DONOR => &mut fields.donor_name,
            LABEL_MESSAGE => &mut fields.message,
            _ => continue,
        };
        *slot = Some(decode_entities(&stripped_text(pair[1])));
    }
    Ok(fields)
}

/// Text of every descendant node, each piece trimmed, empty pieces dropped.
fn stripped_text(el: ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Values are sometimes encoded twice (`&amp;auml;`, `&lt;b&gt;`); the first
/// layer is gone after parsing, a second parse decodes the rest and drops any
/// markup it reveals.
fn decode_entities(text: &str) -> String {
    Html::parse_fragment(text)
        .root_element()
        .text()
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(rows: &[(&str, &str)]) -> String {
        let cells: String = rows
            .iter()
            .map(|(l, v)| format!("<tr><td><b>{l}</b></td><td>{v}</td></tr>"))
            .collect();
        format!(
            "<html><body><p>Hallo</p><table id=3D\"cartDetails\">{cells}</table></body></html>"
        )
    }

    #[test]
    fn extracts_all_three_fields() {
        let html = body(&[
            ("Gesamtbetrag:", "3,00 €"),
            ("Wer sich beteiligt hat:", "Alice"),
            ("Nachricht:", "bier"),
        ]);
        let fields = extract_fields(&html).unwrap();
        assert_eq!(fields.total_amount_raw.as_deref(), Some("3,00 €"));
        assert_eq!(fields.donor_name.as_deref(), Some("Alice"));
        assert_eq!(fields.message.as_deref(), Some("bier"));
    }

    #[test]
    fn missing_labels_stay_absent() {
        let html = body(&[("Gesamtbetrag:", "5,00 €"), ("Versand:", "keiner")]);
        let fields = extract_fields(&html).unwrap();
        assert_eq!(fields.total_amount_raw.as_deref(), Some("5,00 €"));
        assert!(fields.donor_name.is_none());
        assert!(fields.message.is_none());
    }

    #[test]
    fn missing_table_is_malformed() {
        let err = extract_fields("<html><body><table id=\"other\"></table></body></html>")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedNotification(_)));
    }

    #[test]
    fn decodes_nested_entities() {
        let html = body(&[("Wer sich beteiligt hat:", "J&amp;uuml;rgen &amp;amp; Co")]);
        let fields = extract_fields(&html).unwrap();
        assert_eq!(fields.donor_name.as_deref(), Some("Jürgen & Co"));
    }

    #[test]
    fn encoded_markup_is_stripped() {
        let html = body(&[("Nachricht:", "&lt;b&gt;hi&lt;/b&gt;")]);
        let fields = extract_fields(&html).unwrap();
        assert_eq!(fields.message.as_deref(), Some("hi"));
    }

    #[test]
    fn plain_angle_brackets_survive() {
        let html = body(&[("Nachricht:", "ich &lt;3 euch")]);
        let fields = extract_fields(&html).unwrap();
        assert_eq!(fields.message.as_deref(), Some("ich <3 euch"));
    }

    #[test]
    fn soft_line_breaks_are_joined() {
        let html = body(&[("Nachricht:", "open.spotify.com/tr=\nack/abc")]);
        let fields = extract_fields(&html).unwrap();
        assert_eq!(fields.message.as_deref(), Some("open.spotify.com/track/abc"));
    }

    #[test]
    fn odd_trailing_cell_is_ignored() {
        let html = body(&[("Wer sich beteiligt hat:", "Bob")])
            .replace("</table>", "<tr><td>Nachricht:</td></tr></table>");
        let fields = extract_fields(&html).unwrap();
        assert_eq!(fields.donor_name.as_deref(), Some("Bob"));
        assert!(fields.message.is_none());
    }

    #[test]
    fn extraction_is_idempotent() {
        let html = body(&[
            ("Gesamtbetrag:", "2,00 €"),
            ("Wer sich beteiligt hat:", "Bob"),
            ("Nachricht:", "hallo &amp;amp; tschüss"),
        ]);
        assert_eq!(extract_fields(&html).unwrap(), extract_fields(&html).unwrap());
    }
}
