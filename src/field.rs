//! Fixed-size labelled byte fields
//!
//! Every value in an SPC file lives in a [`Field`]: a label, the absolute
//! offset it was read from, and a byte buffer whose length never changes.
//! The [`FieldKind`] picks how those bytes are rendered to and parsed from
//! text. Changing the kind re-interprets the same bytes; nothing is copied
//! or converted.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read, Write};

use chrono::{Datelike, NaiveDate};

use crate::error::{Result, SpcError};

const DATE_FORMAT: &str = "%m/%d/%Y";
const DATE_TEXT_LEN: usize = 10;
const DATE_BINARY_LEN: usize = 4;
const TRACK_MAX: u8 = 99;

/// How a numeric field stores its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericMode {
    /// Little-endian unsigned integer.
    Binary,
    /// ASCII digits, NUL padded.
    Text,
    /// Unknown; detected from the bytes each time the field is read.
    Either,
}

/// Decode/encode policy applied to a field's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Opaque bytes, shown as hex and never set from text.
    Raw,
    /// NUL terminated ASCII text.
    Text,
    /// Unsigned integer.
    Numeric(NumericMode),
    /// `MM/DD/YYYY` text or a day/month/year binary structure.
    Date,
    /// Suffix character followed by a track number.
    Track,
    /// Integer shown as a string of binary digits.
    BinaryDigits,
    /// Integer naming the emulator used to dump the file.
    Emulator(NumericMode),
}

/// A labelled, offset-tagged, fixed-size byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    label: Cow<'static, str>,
    offset: u64,
    kind: FieldKind,
    data: Vec<u8>,
}

impl Field {
    /// Create a zero-filled field.
    pub fn new(label: impl Into<Cow<'static, str>>, offset: u64, size: usize, kind: FieldKind) -> Self {
        Self {
            label: label.into(),
            offset,
            kind,
            data: vec![0; size],
        }
    }

    pub fn raw(label: &'static str, offset: u64, size: usize) -> Self {
        Self::new(label, offset, size, FieldKind::Raw)
    }

    pub fn text(label: &'static str, offset: u64, size: usize) -> Self {
        Self::new(label, offset, size, FieldKind::Text)
    }

    pub fn numeric(label: &'static str, offset: u64, size: usize, mode: NumericMode) -> Self {
        Self::new(label, offset, size, FieldKind::Numeric(mode))
    }

    pub fn date(label: &'static str, offset: u64, size: usize) -> Self {
        Self::new(label, offset, size, FieldKind::Date)
    }

    pub fn emulator(label: &'static str, offset: u64, size: usize, mode: NumericMode) -> Self {
        Self::new(label, offset, size, FieldKind::Emulator(mode))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<Cow<'static, str>>) {
        self.label = label.into();
    }

    /// Absolute file offset; informational only.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Re-interpret the existing bytes with another decode policy.
    pub fn set_kind(&mut self, kind: FieldKind) {
        self.kind = kind;
    }

    /// Copy of this field decoded with another policy.
    pub fn retyped(&self, kind: FieldKind) -> Self {
        let mut field = self.clone();
        field.kind = kind;
        field
    }

    /// Change the numeric mode of a numeric or emulator field.
    pub fn set_mode(&mut self, mode: NumericMode) {
        match self.kind {
            FieldKind::Numeric(_) => self.kind = FieldKind::Numeric(mode),
            FieldKind::Emulator(_) => self.kind = FieldKind::Emulator(mode),
            _ => {}
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable view of the bytes. The length is fixed.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Fill the field from a reader.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        reader.read_exact(&mut self.data)
    }

    /// Write the field's bytes.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.data)
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    /// Whether any byte is non-zero.
    pub fn is_set(&self) -> bool {
        !self.is_zero()
    }

    /// Whether every byte looks like part of a text value.
    ///
    /// Digits and NUL always qualify; date fields also accept `/`. A binary
    /// value can coincidentally pass, but a failure almost always means binary.
    pub fn is_text(&self) -> bool {
        match self.kind {
            FieldKind::Date => self.data.iter().all(|&b| is_date_char(b)),
            _ => self.is_numeric_text(),
        }
    }

    /// Whether bytes past the 4-byte binary date are all zero.
    pub fn has_clear_unused_area(&self) -> bool {
        self.data.iter().skip(DATE_BINARY_LEN).all(|&b| b == 0)
    }

    /// Little-endian interpretation of the bytes, regardless of mode.
    pub fn value(&self) -> u64 {
        self.data
            .iter()
            .take(8)
            .rev()
            .fold(0, |acc, &b| (acc << 8) | u64::from(b))
    }

    /// Value chosen by inspecting the bytes: all zero is 0, all ASCII digits
    /// is the number they spell, anything else is little-endian binary.
    pub fn detect_value(&self) -> u64 {
        if self.is_zero() {
            0
        } else if self.is_numeric_text() {
            self.text_number()
        } else {
            self.value()
        }
    }

    /// Text up to the first NUL.
    pub fn terminated(&self) -> Cow<'_, str> {
        let end = self.data.iter().position(|&b| b == 0).unwrap_or(self.data.len());
        String::from_utf8_lossy(&self.data[..end])
    }

    /// Track number stored in a track field.
    pub fn track_number(&self) -> u8 {
        self.data.get(1).copied().unwrap_or(0)
    }

    /// Optional suffix character stored in a track field.
    pub fn track_suffix(&self) -> Option<char> {
        match self.data.first() {
            Some(0) | None => None,
            Some(&c) => Some(char::from(c)),
        }
    }

    /// Encode `value` with this field's policy.
    ///
    /// The buffer is only touched once the value has parsed and fits.
    pub fn set_value(&mut self, value: &str) -> Result<()> {
        match self.kind {
            FieldKind::Raw => Err(SpcError::ReadOnlyField {
                label: self.label.to_string(),
            }),
            FieldKind::Text => {
                self.fill_text(value.as_bytes());
                Ok(())
            }
            FieldKind::Numeric(mode) | FieldKind::Emulator(mode) => {
                let number = value.trim().parse::<u64>().map_err(|_| SpcError::InvalidNumber {
                    label: self.label.to_string(),
                    value: value.to_string(),
                })?;
                self.store_number(number, mode, value)
            }
            FieldKind::Date => {
                if self.size() >= DATE_TEXT_LEN {
                    self.set_text_date(value)
                } else {
                    self.set_binary_date(value)
                }
            }
            FieldKind::Track => self.set_track(value),
            FieldKind::BinaryDigits => {
                let number = u64::from_str_radix(value.trim(), 2).map_err(|_| SpcError::InvalidNumber {
                    label: self.label.to_string(),
                    value: value.to_string(),
                })?;
                self.store_number(number, NumericMode::Binary, value)
            }
        }
    }

    /// Store a date as `MM/DD/YYYY` followed by NUL.
    pub fn set_text_date(&mut self, value: &str) -> Result<()> {
        let date = parse_date(value)?;
        if self.size() < DATE_TEXT_LEN {
            return Err(self.too_large(value));
        }
        let text = date.format(DATE_FORMAT).to_string();
        self.fill_text(text.as_bytes());
        Ok(())
    }

    /// Store a date as day, month and little-endian year, then zeros.
    pub fn set_binary_date(&mut self, value: &str) -> Result<()> {
        let date = parse_date(value)?;
        if self.size() < DATE_BINARY_LEN {
            return Err(self.too_large(value));
        }
        let year = u16::try_from(date.year()).map_err(|_| SpcError::InvalidDate {
            value: value.to_string(),
        })?;
        self.data.fill(0);
        self.data[0] = date.day() as u8;
        self.data[1] = date.month() as u8;
        self.data[2..4].copy_from_slice(&year.to_le_bytes());
        Ok(())
    }

    fn set_track(&mut self, value: &str) -> Result<()> {
        let invalid = || SpcError::InvalidTrack {
            value: value.to_string(),
        };
        let trimmed = value.trim();
        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, rest) = trimmed.split_at(digits_end);
        let number: u8 = digits.parse().map_err(|_| invalid())?;
        if number > TRACK_MAX {
            return Err(invalid());
        }

        let mut chars = rest.chars();
        let suffix = match (chars.next(), chars.next()) {
            (None, _) => 0,
            (Some(c), None) if c.is_ascii() => c as u8,
            _ => return Err(invalid()),
        };

        if self.size() < 2 {
            return Err(self.too_large(value));
        }
        self.data[0] = suffix;
        self.data[1] = number;
        Ok(())
    }

    fn store_number(&mut self, number: u64, mode: NumericMode, original: &str) -> Result<()> {
        match mode {
            NumericMode::Binary => {
                if self.size() < 8 && number >> (8 * self.size()) != 0 {
                    return Err(self.too_large(original));
                }
                let bytes = number.to_le_bytes();
                for (i, b) in self.data.iter_mut().enumerate() {
                    *b = bytes.get(i).copied().unwrap_or(0);
                }
            }
            NumericMode::Text | NumericMode::Either => {
                let digits = number.to_string();
                if digits.len() > self.size() {
                    return Err(self.too_large(original));
                }
                self.fill_text(digits.as_bytes());
            }
        }
        Ok(())
    }

    fn fill_text(&mut self, bytes: &[u8]) {
        for (i, b) in self.data.iter_mut().enumerate() {
            *b = bytes.get(i).copied().unwrap_or(0);
        }
    }

    fn too_large(&self, value: &str) -> SpcError {
        SpcError::ValueTooLarge {
            label: self.label.to_string(),
            value: value.to_string(),
            size: self.size(),
        }
    }

    fn is_numeric_text(&self) -> bool {
        self.data.iter().all(|&b| b.is_ascii_digit() || b == 0)
    }

    fn text_number(&self) -> u64 {
        self.terminated().parse().unwrap_or(0)
    }

    fn date_is_text_encoded(&self) -> bool {
        self.data.iter().take(DATE_BINARY_LEN).all(|&b| is_date_char(b))
    }

    fn fmt_numeric(&self, f: &mut fmt::Formatter<'_>, mode: NumericMode) -> fmt::Result {
        match mode {
            NumericMode::Either if self.is_zero() => write!(f, "0"),
            NumericMode::Either if self.is_numeric_text() => write!(f, "{}", self.terminated()),
            NumericMode::Text => write!(f, "{}", self.terminated()),
            _ => write!(f, "{}", self.value()),
        }
    }

    fn fmt_date(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.size() < DATE_BINARY_LEN || self.date_is_text_encoded() {
            return write!(f, "{}", self.terminated());
        }
        let day = self.data[0];
        let month = self.data[1];
        let year = u16::from_le_bytes([self.data[2], self.data[3]]);
        write!(f, "{}/{}/{}", month, day, year)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FieldKind::Raw => {
                let hex: Vec<String> = self.data.iter().map(|b| format!("{:02X}", b)).collect();
                write!(f, "{}", hex.join(" "))
            }
            FieldKind::Text => write!(f, "{}", self.terminated()),
            FieldKind::Numeric(mode) => self.fmt_numeric(f, mode),
            FieldKind::Date => self.fmt_date(f),
            FieldKind::Track => match self.track_suffix() {
                Some(suffix) => write!(f, "{}{}", self.track_number(), suffix),
                None => write!(f, "{}", self.track_number()),
            },
            FieldKind::BinaryDigits => {
                let width = self.size().min(8) * 8;
                write!(f, "{:0width$b}", self.value(), width = width)
            }
            FieldKind::Emulator(mode) => {
                let code = match mode {
                    NumericMode::Binary => self.value(),
                    _ => self.detect_value(),
                };
                write!(f, "{}", emulator_name(code))
            }
        }
    }
}

/// Display name of an emulator code.
pub fn emulator_name(code: u64) -> Cow<'static, str> {
    match code {
        0 => "Unknown".into(),
        1 => "ZSNES".into(),
        2 => "Snes9x".into(),
        3 => "ZST2SPC".into(),
        4 => "Other".into(),
        5 => "SNEShout".into(),
        6 => "ZSNES/W".into(),
        7 => "Snes9xpp".into(),
        8 => "SNESGT".into(),
        other => format!("Unknown ({})", other).into(),
    }
}

/// Code for an emulator name accepted by the emulator-used setter.
pub fn emulator_code(name: &str) -> Option<u8> {
    match name.trim().to_ascii_uppercase().as_str() {
        "UNKNOWN" => Some(0),
        "ZSNES" => Some(1),
        "SNES9X" => Some(2),
        _ => None,
    }
}

fn is_date_char(b: u8) -> bool {
    b.is_ascii_digit() || b == 0 || b == b'/'
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| SpcError::InvalidDate {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with(kind: FieldKind, bytes: &[u8]) -> Field {
        let mut field = Field::new("Test", 0, bytes.len(), kind);
        field.data_mut().copy_from_slice(bytes);
        field
    }

    #[test]
    fn test_text_field_terminates_at_nul() {
        let field = field_with(FieldKind::Text, b"Hello\0World");
        assert_eq!(field.to_string(), "Hello");
    }

    #[test]
    fn test_text_field_set_truncates_and_clears() {
        let mut field = field_with(FieldKind::Text, b"XXXXXXXX");
        field.set_value("abc").unwrap();
        assert_eq!(field.data(), b"abc\0\0\0\0\0");

        field.set_value("0123456789").unwrap();
        assert_eq!(field.data(), b"01234567");
        assert_eq!(field.to_string(), "01234567");
    }

    #[test]
    fn test_either_detects_zero() {
        let field = field_with(FieldKind::Numeric(NumericMode::Either), &[0, 0, 0]);
        assert_eq!(field.detect_value(), 0);
        assert_eq!(field.to_string(), "0");
    }

    #[test]
    fn test_either_detects_text() {
        let field = field_with(FieldKind::Numeric(NumericMode::Either), b"180");
        assert_eq!(field.detect_value(), 180);
        assert_eq!(field.to_string(), "180");
        // value() always reads binary
        assert_eq!(field.value(), 0x30_38_31);
    }

    #[test]
    fn test_either_detects_binary() {
        let field = field_with(FieldKind::Numeric(NumericMode::Either), &[0xB4, 0x00, 0x00]);
        assert_eq!(field.detect_value(), 180);
        assert_eq!(field.to_string(), "180");
    }

    #[test]
    fn test_detection_does_not_change_mode() {
        let field = field_with(FieldKind::Numeric(NumericMode::Either), b"42\0");
        assert_eq!(field.detect_value(), 42);
        assert_eq!(field.kind(), FieldKind::Numeric(NumericMode::Either));
    }

    #[test]
    fn test_numeric_binary_set() {
        let mut field = Field::numeric("Fade", 0, 4, NumericMode::Binary);
        field.set_value("10000").unwrap();
        assert_eq!(field.data(), &[0x10, 0x27, 0x00, 0x00]);
        assert_eq!(field.to_string(), "10000");
    }

    #[test]
    fn test_numeric_text_set() {
        let mut field = Field::numeric("Fade", 0, 5, NumericMode::Text);
        field.set_value("800").unwrap();
        assert_eq!(field.data(), b"800\0\0");
        assert_eq!(field.to_string(), "800");
    }

    #[test]
    fn test_numeric_rejects_non_numbers() {
        let mut field = Field::numeric("Length", 0, 3, NumericMode::Binary);
        let err = field.set_value("3 minutes").unwrap_err();
        assert!(matches!(err, SpcError::InvalidNumber { .. }));
        assert!(field.is_zero());
    }

    #[test]
    fn test_numeric_rejects_overflow() {
        let mut binary = Field::numeric("Length", 0, 1, NumericMode::Binary);
        assert!(matches!(
            binary.set_value("256").unwrap_err(),
            SpcError::ValueTooLarge { size: 1, .. }
        ));

        let mut text = Field::numeric("Length", 0, 3, NumericMode::Text);
        assert!(text.set_value("1000").is_err());
        assert!(text.set_value("999").is_ok());
    }

    #[test]
    fn test_text_date() {
        let mut field = Field::date("Date", 0, 11);
        field.set_text_date("1/2/2003").unwrap();
        assert_eq!(field.data(), b"01/02/2003\0");
        assert!(field.is_text());
        assert_eq!(field.to_string(), "01/02/2003");
    }

    #[test]
    fn test_binary_date() {
        let mut field = Field::date("Date", 0, 11);
        field.set_binary_date("12/25/1995").unwrap();
        assert_eq!(&field.data()[..4], &[25, 12, 0xCB, 0x07]);
        assert!(field.has_clear_unused_area());
        assert!(!field.is_text());
        assert_eq!(field.to_string(), "12/25/1995");
    }

    #[test]
    fn test_date_rejects_garbage() {
        let mut field = Field::date("Date", 0, 11);
        assert!(matches!(
            field.set_text_date("13/45/2001").unwrap_err(),
            SpcError::InvalidDate { .. }
        ));
        assert!(field.is_zero());
    }

    #[test]
    fn test_empty_date_renders_empty() {
        let field = Field::date("Date", 0, 11);
        assert_eq!(field.to_string(), "");
        assert!(!field.is_set());
    }

    #[test]
    fn test_track_field() {
        let mut field = Field::new("Track", 0, 2, FieldKind::Track);
        field.set_value("12b").unwrap();
        assert_eq!(field.data(), &[b'b', 12]);
        assert_eq!(field.to_string(), "12b");

        field.set_value("7").unwrap();
        assert_eq!(field.data(), &[0, 7]);
        assert_eq!(field.to_string(), "7");
    }

    #[test]
    fn test_track_rejects_invalid() {
        let mut field = Field::new("Track", 0, 2, FieldKind::Track);
        assert!(field.set_value("100").is_err());
        assert!(field.set_value("abc").is_err());
        assert!(field.set_value("3xy").is_err());
    }

    #[test]
    fn test_binary_digits_field() {
        let mut field = Field::new("Muted", 0, 1, FieldKind::BinaryDigits);
        field.set_value("00000101").unwrap();
        assert_eq!(field.data(), &[5]);
        assert_eq!(field.to_string(), "00000101");
        assert!(field.set_value("102").is_err());
    }

    #[test]
    fn test_emulator_field() {
        let binary = field_with(FieldKind::Emulator(NumericMode::Binary), &[2]);
        assert_eq!(binary.to_string(), "Snes9x");

        let text = field_with(FieldKind::Emulator(NumericMode::Text), b"1");
        assert_eq!(text.to_string(), "ZSNES");

        let odd = field_with(FieldKind::Emulator(NumericMode::Binary), &[0x42]);
        assert_eq!(odd.to_string(), "Unknown (66)");
    }

    #[test]
    fn test_emulator_code() {
        assert_eq!(emulator_code("zsnes"), Some(1));
        assert_eq!(emulator_code("SNES9X"), Some(2));
        assert_eq!(emulator_code("Unknown"), Some(0));
        assert_eq!(emulator_code("bsnes"), None);
    }

    #[test]
    fn test_raw_field_is_read_only() {
        let mut field = field_with(FieldKind::Raw, &[0xAB, 0x01]);
        assert_eq!(field.to_string(), "AB 01");
        assert!(matches!(
            field.set_value("00").unwrap_err(),
            SpcError::ReadOnlyField { .. }
        ));
    }

    #[test]
    fn test_retype_keeps_bytes() {
        let numeric = field_with(FieldKind::Numeric(NumericMode::Binary), &[b'a', 3]);
        let track = numeric.retyped(FieldKind::Track);
        assert_eq!(track.data(), numeric.data());
        assert_eq!(track.to_string(), "3a");
    }
}
