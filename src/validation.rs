//! Plate format validation and best-effort reformatting.
//!
//! Checks a candidate string against the known Vietnamese plate grammars
//! and, when none matches, tries to suggest a well-formed plate built from
//! the same characters. Suggestions are guaranteed to re-validate; callers
//! can substitute them without looping back here.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One recognized plate grammar. Ordered most specific first; the first
/// match wins.
pub struct PlateGrammar {
    pub id: &'static str,
    pub example: &'static str,
    pub description: &'static str,
    pattern: Regex,
}

impl PlateGrammar {
    pub fn matches(&self, candidate: &str) -> bool {
        self.pattern.is_match(candidate)
    }
}

lazy_static! {
    /// The plate grammars accepted by the validator.
    pub static ref PLATE_GRAMMARS: [PlateGrammar; 3] = [
        PlateGrammar {
            id: "##L-###.##",
            example: "51F-238.91",
            description: "standard format (e.g. 51F-238.91)",
            pattern: Regex::new(r"^\d{2}[A-Z]-\d{3}\.\d{2}$").expect("plate grammar"),
        },
        PlateGrammar {
            id: "##L-####",
            example: "43A-12345",
            description: "dashed format without dots (e.g. 43A-12345)",
            pattern: Regex::new(r"^\d{2}[A-Z]-\d{4,5}$").expect("plate grammar"),
        },
        PlateGrammar {
            id: "##L#####",
            example: "51F23891",
            description: "compact format (e.g. 51F23891)",
            pattern: Regex::new(r"^\d{2}[A-Z]\d{5}$").expect("plate grammar"),
        },
    ];

    static ref PROVINCE_PREFIX: Regex =
        Regex::new(r"^\d{2}[A-Z]").expect("province prefix pattern");
}

/// Minimum plausible plate length after trimming.
pub const MIN_PLATE_LENGTH: usize = 5;

/// Outcome of validating one candidate string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateValidation {
    pub is_valid: bool,
    /// Id of the matched grammar when valid
    pub format: Option<String>,
    /// Reformatted plate when the input is salvageable
    pub suggestion: Option<String>,
    pub message: String,
}

impl PlateValidation {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            format: None,
            suggestion: None,
            message: message.into(),
        }
    }
}

/// Validate an arbitrary user- or pipeline-supplied plate string.
///
/// The input is trimmed and uppercased before any grammar is consulted.
pub fn validate_plate(input: &str) -> PlateValidation {
    let trimmed = input.trim().to_uppercase();

    if trimmed.is_empty() {
        return PlateValidation::invalid("Please enter a plate number");
    }

    if trimmed.chars().count() < MIN_PLATE_LENGTH {
        return PlateValidation::invalid(format!(
            "Plate number is too short (minimum {} characters)",
            MIN_PLATE_LENGTH
        ));
    }

    for grammar in PLATE_GRAMMARS.iter() {
        if grammar.matches(&trimmed) {
            return PlateValidation {
                is_valid: true,
                format: Some(grammar.id.to_string()),
                suggestion: None,
                message: format!("Valid plate, {}", grammar.description),
            };
        }
    }

    let (suggestion, message) = suggest_format(&trimmed);
    PlateValidation {
        is_valid: false,
        format: None,
        suggestion,
        message,
    }
}

/// Normalize a plate string for lookups: valid input passes through
/// trimmed and uppercased, salvageable input becomes its suggestion.
pub fn normalize_plate(plate: &str) -> String {
    let validation = validate_plate(plate);
    if validation.is_valid {
        return plate.trim().to_uppercase();
    }
    if let Some(suggestion) = validation.suggestion {
        return suggestion;
    }
    plate.trim().to_uppercase()
}

/// Best-effort reformat of a non-matching candidate.
///
/// Requires a leading two-digit + letter province prefix and at least four
/// trailing digits; anything built here matches one of the grammars above.
fn suggest_format(input: &str) -> (Option<String>, String) {
    let cleaned: String = input.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

    if cleaned.len() < MIN_PLATE_LENGTH {
        return (
            None,
            format!(
                "Unrecognized plate. Examples: {} or {}",
                PLATE_GRAMMARS[0].example, PLATE_GRAMMARS[1].example
            ),
        );
    }

    if !PROVINCE_PREFIX.is_match(&cleaned) {
        return (
            None,
            "A plate must start with a two-digit province code and a letter (e.g. 51F)"
                .to_string(),
        );
    }

    // cleaned is pure ASCII here, byte indexing is safe
    let prefix = &cleaned[..3];
    let digits: String = cleaned[3..].chars().filter(|c| c.is_ascii_digit()).collect();

    let formatted = if digits.len() >= 5 {
        format!("{}-{}.{}", prefix, &digits[..3], &digits[3..5])
    } else if digits.len() == 4 {
        format!("{}-{}", prefix, digits)
    } else {
        return (
            None,
            format!("Not enough digits after {} to form a plate", prefix),
        );
    };

    let message = format!("Suggested format: {}", formatted);
    (Some(formatted), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let result = validate_plate("");
        assert!(!result.is_valid);
        assert!(result.suggestion.is_none());
        assert!(result.message.contains("enter a plate"));
    }

    #[test]
    fn test_too_short() {
        let result = validate_plate("AB");
        assert!(!result.is_valid);
        assert!(result.message.contains("too short"));
    }

    #[test]
    fn test_grammar_matches() {
        let standard = validate_plate("51F-238.91");
        assert!(standard.is_valid);
        assert_eq!(standard.format.as_deref(), Some("##L-###.##"));
        assert!(standard.suggestion.is_none());

        let dashed = validate_plate("43A-12345");
        assert!(dashed.is_valid);
        assert_eq!(dashed.format.as_deref(), Some("##L-####"));

        let compact = validate_plate("51F23891");
        assert!(compact.is_valid);
        assert_eq!(compact.format.as_deref(), Some("##L#####"));
    }

    #[test]
    fn test_lowercase_and_whitespace_normalized() {
        let result = validate_plate("  51f-238.91 ");
        assert!(result.is_valid);
    }

    #[test]
    fn test_suggestion_from_spaced_input() {
        let result = validate_plate("43a 123 45");
        assert!(!result.is_valid);
        assert_eq!(result.suggestion.as_deref(), Some("43A-123.45"));
        assert!(result.message.contains("Suggested"));
    }

    #[test]
    fn test_suggestion_with_four_digits() {
        let result = validate_plate("29 C 1234");
        assert_eq!(result.suggestion.as_deref(), Some("29C-1234"));
    }

    #[test]
    fn test_missing_province_prefix() {
        let result = validate_plate("ABC-12345");
        assert!(!result.is_valid);
        assert!(result.suggestion.is_none());
        assert!(result.message.contains("province"));
    }

    #[test]
    fn test_too_few_digits_for_suggestion() {
        let result = validate_plate("43A-1.2");
        assert!(!result.is_valid);
        assert!(result.suggestion.is_none());
    }

    #[test]
    fn test_suggestions_revalidate() {
        for input in ["43a 123 45", "29 C 1234", "51f/23891", "74D.55532"] {
            let validation = validate_plate(input);
            if let Some(suggestion) = validation.suggestion {
                let round_trip = validate_plate(&suggestion);
                assert!(round_trip.is_valid, "suggestion {:?} must be valid", suggestion);
                assert!(round_trip.suggestion.is_none());
            }
        }
    }

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate(" 51f-238.91 "), "51F-238.91");
        assert_eq!(normalize_plate("43a 123 45"), "43A-123.45");
        assert_eq!(normalize_plate("???"), "???");
    }
}
