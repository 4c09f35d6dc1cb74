//! Free-text number lists
//!
//! Manually entered draws and durations arrive as loosely formatted text,
//! e.g. pasted from a spreadsheet. Numbers may be separated by whitespace,
//! semicolons or commas, and may use a decimal comma.

use tracing::debug;

/// Extract the numbers from a free-text list
///
/// When the text contains whitespace or semicolons those are the separators
/// and a single comma inside a token is read as a decimal comma (`0,15`).
/// Otherwise commas separate the values. Tokens that are not numbers are
/// skipped.
///
/// # Examples
///
/// ```
/// use outfall::util::parse::parse_number_list;
///
/// assert_eq!(parse_number_list("0.1, 0.5, 0.9"), vec![0.1, 0.5, 0.9]);
/// assert_eq!(parse_number_list("0,15 0,3"), vec![0.15, 0.3]);
/// assert_eq!(parse_number_list("1,2,3"), vec![1.0, 2.0, 3.0]);
/// ```
pub fn parse_number_list(text: &str) -> Vec<f64> {
    let spaced = text.chars().any(|c| c.is_whitespace() || c == ';');

    let mut pieces: Vec<String> = Vec::new();
    if spaced {
        for token in text.split(|c: char| c.is_whitespace() || c == ';') {
            let token = token.trim_matches(',');
            if token.matches(',').count() == 1 && !token.contains('.') {
                pieces.push(token.replace(',', "."));
            } else {
                pieces.extend(token.split(',').map(str::to_string));
            }
        }
    } else {
        pieces.extend(text.split(',').map(str::to_string));
    }

    pieces
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .filter_map(|p| match p.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                debug!(token = p, "skipping non-numeric token");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators() {
        assert_eq!(parse_number_list("1 2\t3\n4"), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(parse_number_list("1;2;3"), vec![1.0, 2.0, 3.0]);
        assert_eq!(parse_number_list("1, 2, 3"), vec![1.0, 2.0, 3.0]);
        assert_eq!(parse_number_list("0.25,0.5"), vec![0.25, 0.5]);
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(parse_number_list("0,15; 0,85"), vec![0.15, 0.85]);
        assert_eq!(parse_number_list("-1,5 2"), vec![-1.5, 2.0]);
    }

    #[test]
    fn test_noise_is_skipped() {
        assert_eq!(parse_number_list("draws: 0.1 x 0.2"), vec![0.1, 0.2]);
        assert!(parse_number_list("").is_empty());
        assert!(parse_number_list(" , ; ").is_empty());
        assert!(parse_number_list("inf nan").is_empty());
    }
}
