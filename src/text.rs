//! Cleanup of raw recognizer output into canonical plate text.

/// Character substitutions for OCR confusions common on Vietnamese plates.
pub const OCR_CONFUSIONS: [(char, char); 5] = [
    ('O', '0'),
    ('I', '1'),
    ('S', '5'),
    ('B', '8'),
    ('Z', '2'),
];

/// Clean raw recognized text into a canonical alphanumeric plate string.
///
/// Strips everything that is not ASCII alphanumeric, uppercases, and
/// applies the confusion table. Total: empty input yields empty output,
/// and the function is idempotent.
pub fn clean_plate_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .map(|c| {
            OCR_CONFUSIONS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_and_uppercases() {
        assert_eq!(clean_plate_text("43a-123.45"), "43A12345");
        assert_eq!(clean_plate_text(" 51f 238 91 "), "51F23891");
    }

    #[test]
    fn test_confusion_corrections() {
        assert_eq!(clean_plate_text("5IF23O9Z"), "51F23092");
        assert_eq!(clean_plate_text("obs"), "085");
    }

    #[test]
    fn test_total_on_junk() {
        assert_eq!(clean_plate_text(""), "");
        assert_eq!(clean_plate_text("!@#$%"), "");
        assert_eq!(clean_plate_text("biển số"), "81N5");
    }

    #[test]
    fn test_idempotent() {
        for input in ["43a-123.45", "OISBZ", "  ", "51F23891"] {
            let once = clean_plate_text(input);
            assert_eq!(clean_plate_text(&once), once);
        }
    }
}
