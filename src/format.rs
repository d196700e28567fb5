//! `label: value` output formatting

use crate::field::Field;

/// Width that fits every label with at least one space after it.
const LABEL_WIDTH: usize = 22;
/// Wraps space-separated hex output on a byte boundary.
const VALUE_CHUNK: usize = 54;

/// Format a labelled value, wrapping long values under the value column.
pub fn format_value(label: &str, value: &str) -> String {
    let mut output = format!("{:<width$}: ", label, width = LABEL_WIDTH);
    let chars: Vec<char> = value.chars().collect();

    if chars.len() <= VALUE_CHUNK {
        output.push_str(value);
        return output;
    }

    for (i, chunk) in chars.chunks(VALUE_CHUNK).enumerate() {
        if i > 0 {
            output.push('\n');
            output.push_str(&" ".repeat(LABEL_WIDTH + 2));
        }
        output.extend(chunk.iter());
    }
    output
}

/// Format a field using its label and rendered value.
pub fn format_field(field: &Field) -> String {
    format_value(field.label(), &field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_value() {
        assert_eq!(
            format_value("Song Title", "Opening"),
            format!("{:<22}: Opening", "Song Title")
        );
    }

    #[test]
    fn test_long_value_wraps() {
        let value = "A".repeat(60);
        let formatted = format_value("Comments", &value);
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(&"A".repeat(54)));
        assert_eq!(lines[1], format!("{}{}", " ".repeat(24), "A".repeat(6)));
    }

    #[test]
    fn test_format_field() {
        let mut field = Field::text("Dumper", 0x6E, 16);
        field.set_value("Ruby").unwrap();
        assert!(format_field(&field).ends_with(": Ruby"));
    }
}
