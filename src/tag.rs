//! Fixed-offset structures of an SPC file
//!
//! The file starts with a 46-byte [`Header`], followed by a 210-byte ID666
//! tag. The tag comes in two layouts that share most offsets but differ from
//! the fade length onwards, so each layout gets its own constructor with its
//! offsets baked in. [`MemoryImage`] covers the opaque regions that end right
//! where the optional extended tag begins.

use std::fmt;
use std::io::{self, Read, Write};

use crate::field::{Field, NumericMode};
use crate::format::format_field;

/// Identifier stored at the start of every SPC file.
pub const SPC_FILE_ID: &str = "SNES-SPC700 Sound File Data v0.30";
/// Value of the contains-tag header byte when an ID666 tag is present.
pub const HEADER_CONTAINS_TAG: u64 = 26;
/// Offset of the ID666 tag.
pub const TAG_OFFSET: u64 = 0x2E;
/// Size of the ID666 tag region, identical for both layouts.
pub const TAG_SIZE: usize = 0xD2;
/// Offset of the optional extended (xid6) tag chunk.
pub const EXTENDED_TAG_OFFSET: u64 = 0x10200;

/// Layout of the ID666 tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    /// Binary offsets, binary numbers.
    Binary,
    /// Text offsets, text numbers.
    Text,
    /// Text offsets, but song and fade length stored as binary.
    TextMixed,
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagType::Binary => write!(f, "Binary"),
            TagType::Text => write!(f, "Text"),
            TagType::TextMixed => write!(f, "Text (mixed)"),
        }
    }
}

/// An ordered collection of fields read and written back to back.
pub trait Structure {
    /// Fields in file order.
    fn fields(&self) -> Vec<&Field>;

    /// Mutable fields in file order.
    fn fields_mut(&mut self) -> Vec<&mut Field>;

    /// Total size of all fields.
    fn size(&self) -> usize {
        self.fields().iter().map(|field| field.size()).sum()
    }

    fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        for field in self.fields_mut() {
            field.read_from(reader)?;
        }
        Ok(())
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for field in self.fields() {
            field.write_to(writer)?;
        }
        Ok(())
    }

    /// One `label: value` line per field.
    fn render(&self) -> String {
        let mut output = String::new();
        for field in self.fields() {
            output.push_str(&format_field(field));
            output.push('\n');
        }
        output
    }
}

/// The SPC file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: Field,
    /// Purpose unclear; passed through.
    pub separator: Field,
    /// Equals [`HEADER_CONTAINS_TAG`] when an ID666 tag is present.
    pub contains_tag: Field,
    pub version_minor: Field,
    pub pc_register: Field,
    pub a_register: Field,
    pub x_register: Field,
    pub y_register: Field,
    pub psw_register: Field,
    pub sp_register: Field,
    pub reserved: Field,
}

impl Header {
    pub fn new() -> Self {
        Self {
            id: Field::text("SPC Header ID", 0x00, 33),
            separator: Field::raw("Separator", 0x21, 2),
            contains_tag: Field::numeric("Contains Tag", 0x23, 1, NumericMode::Binary),
            version_minor: Field::numeric("Version Minor", 0x24, 1, NumericMode::Binary),
            pc_register: Field::raw("PC Register", 0x25, 2),
            a_register: Field::raw("A Register", 0x27, 1),
            x_register: Field::raw("X Register", 0x28, 1),
            y_register: Field::raw("Y Register", 0x29, 1),
            psw_register: Field::raw("PSW Register", 0x2A, 1),
            sp_register: Field::raw("SP Register", 0x2B, 1),
            reserved: Field::raw("Reserved", 0x2C, 2),
        }
    }

    pub fn contains_tag(&self) -> bool {
        self.contains_tag.value() == HEADER_CONTAINS_TAG
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl Structure for Header {
    fn fields(&self) -> Vec<&Field> {
        vec![
            &self.id,
            &self.separator,
            &self.contains_tag,
            &self.version_minor,
            &self.pc_register,
            &self.a_register,
            &self.x_register,
            &self.y_register,
            &self.psw_register,
            &self.sp_register,
            &self.reserved,
        ]
    }

    fn fields_mut(&mut self) -> Vec<&mut Field> {
        vec![
            &mut self.id,
            &mut self.separator,
            &mut self.contains_tag,
            &mut self.version_minor,
            &mut self.pc_register,
            &mut self.a_register,
            &mut self.x_register,
            &mut self.y_register,
            &mut self.psw_register,
            &mut self.sp_register,
            &mut self.reserved,
        ]
    }
}

/// An ID666 tag in either the binary or the text layout.
///
/// Dumps that mix text and binary numbers still follow the offsets of one
/// layout or the other, so two layouts cover all three tag types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id666Tag {
    pub song_title: Field,
    pub game_title: Field,
    pub dumper_name: Field,
    pub comments: Field,
    pub date_dumped: Field,
    /// Seconds before fading out.
    pub song_length: Field,
    /// Fade out time in milliseconds.
    pub fade_length: Field,
    pub song_artist: Field,
    /// Documented as "default channel disables"; semantics unclear, passed through.
    pub default_channel_state: Field,
    pub emulator_used: Field,
    pub reserved: Field,
}

impl Id666Tag {
    /// Tag using binary offsets and binary numbers.
    pub fn binary() -> Self {
        Self {
            song_title: Field::text("Song Title", 0x2E, 32),
            game_title: Field::text("Game Title", 0x4E, 32),
            dumper_name: Field::text("Dumper", 0x6E, 16),
            comments: Field::text("Comments", 0x7E, 32),
            date_dumped: Field::date("Date Dumped", 0x9E, 11),
            song_length: Field::numeric("Song Length (sec)", 0xA9, 3, NumericMode::Binary),
            fade_length: Field::numeric("Fade Length (ms)", 0xAC, 4, NumericMode::Binary),
            song_artist: Field::text("Song Artist", 0xB0, 32),
            default_channel_state: Field::numeric("Default Channel State", 0xD0, 1, NumericMode::Binary),
            emulator_used: Field::emulator("Emulator Used", 0xD1, 1, NumericMode::Binary),
            reserved: Field::raw("Reserved", 0xD2, 46),
        }
    }

    /// Tag using text offsets and text numbers.
    pub fn text() -> Self {
        Self {
            song_length: Field::numeric("Song Length (sec)", 0xA9, 3, NumericMode::Text),
            fade_length: Field::numeric("Fade Length (ms)", 0xAC, 5, NumericMode::Text),
            song_artist: Field::text("Song Artist", 0xB1, 32),
            default_channel_state: Field::numeric("Default Channel State", 0xD1, 1, NumericMode::Binary),
            emulator_used: Field::emulator("Emulator Used", 0xD2, 1, NumericMode::Text),
            reserved: Field::raw("Reserved", 0xD3, 45),
            ..Self::binary()
        }
    }
}

impl Structure for Id666Tag {
    fn fields(&self) -> Vec<&Field> {
        vec![
            &self.song_title,
            &self.game_title,
            &self.dumper_name,
            &self.comments,
            &self.date_dumped,
            &self.song_length,
            &self.fade_length,
            &self.song_artist,
            &self.default_channel_state,
            &self.emulator_used,
            &self.reserved,
        ]
    }

    fn fields_mut(&mut self) -> Vec<&mut Field> {
        vec![
            &mut self.song_title,
            &mut self.game_title,
            &mut self.dumper_name,
            &mut self.comments,
            &mut self.date_dumped,
            &mut self.song_length,
            &mut self.fade_length,
            &mut self.song_artist,
            &mut self.default_channel_state,
            &mut self.emulator_used,
            &mut self.reserved,
        ]
    }
}

/// Opaque memory images copied through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    pub ram: Field,
    pub dsp_registers: Field,
    pub unused: Field,
    pub extra_ram: Field,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self {
            ram: Field::raw("SPC700 RAM", 0x100, 0x10000),
            dsp_registers: Field::raw("DSP Registers", 0x10100, 128),
            unused: Field::raw("Unused", 0x10180, 64),
            extra_ram: Field::raw("Extra RAM", 0x101C0, 64),
        }
    }
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

impl Structure for MemoryImage {
    fn fields(&self) -> Vec<&Field> {
        vec![&self.ram, &self.dsp_registers, &self.unused, &self.extra_ram]
    }

    fn fields_mut(&mut self) -> Vec<&mut Field> {
        vec![&mut self.ram, &mut self.dsp_registers, &mut self.unused, &mut self.extra_ram]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(Header::new().size(), TAG_OFFSET as usize);
        assert_eq!(Id666Tag::binary().size(), TAG_SIZE);
        assert_eq!(Id666Tag::text().size(), TAG_SIZE);
        assert_eq!(
            TAG_OFFSET + TAG_SIZE as u64 + MemoryImage::new().size() as u64,
            EXTENDED_TAG_OFFSET
        );
    }

    #[test]
    fn test_offsets_are_contiguous() {
        for tag in [Id666Tag::binary(), Id666Tag::text()] {
            let mut expected = TAG_OFFSET;
            for field in tag.fields() {
                assert_eq!(field.offset(), expected, "{}", field.label());
                expected += field.size() as u64;
            }
        }
    }

    #[test]
    fn test_layouts_diverge_at_fade_length() {
        let binary = Id666Tag::binary();
        let text = Id666Tag::text();
        assert_eq!(binary.date_dumped.offset(), text.date_dumped.offset());
        assert_eq!(binary.fade_length.size(), 4);
        assert_eq!(text.fade_length.size(), 5);
        assert_eq!(binary.song_artist.offset() + 1, text.song_artist.offset());
    }

    #[test]
    fn test_read_write_structure() {
        let mut bytes = vec![0u8; TAG_OFFSET as usize];
        bytes[..SPC_FILE_ID.len()].copy_from_slice(SPC_FILE_ID.as_bytes());
        bytes[0x23] = 26;
        bytes[0x24] = 30;

        let mut header = Header::new();
        header.read_from(&mut bytes.as_slice()).unwrap();
        assert!(header.contains_tag());
        assert_eq!(header.id.to_string(), SPC_FILE_ID);
        assert_eq!(header.version_minor.value(), 30);

        let mut written = Vec::new();
        header.write_to(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn test_render_lists_every_field() {
        let rendered = Header::new().render();
        assert_eq!(rendered.lines().count(), 11);
        assert!(rendered.starts_with("SPC Header ID"));
    }
}
