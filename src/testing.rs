//! Synthetic SPC images for tests.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::extended::padding_len;
use crate::tag::{EXTENDED_TAG_OFFSET, SPC_FILE_ID};

pub(crate) const RAM_MARKER: u8 = 0xA5;
pub(crate) const DSP_MARKER: u8 = 0x5A;

/// Builder for an in-memory SPC file.
#[derive(Debug, Clone)]
pub(crate) struct SpcImage {
    bytes: Vec<u8>,
}

impl SpcImage {
    /// Header with a tag present and an all-zero tag region.
    pub fn new() -> Self {
        let mut bytes = vec![0u8; EXTENDED_TAG_OFFSET as usize];
        bytes[..SPC_FILE_ID.len()].copy_from_slice(SPC_FILE_ID.as_bytes());
        bytes[0x21] = 26;
        bytes[0x22] = 26;
        bytes[0x23] = 26;
        bytes[0x24] = 30;
        bytes[0x100] = RAM_MARKER;
        bytes[0x10100] = DSP_MARKER;
        Self { bytes }
    }

    /// Binary layout: binary date, 180 s length, 10000 ms fade, Snes9x.
    pub fn binary() -> Self {
        Self::new()
            .text_at(0x2E, "Opening")
            .text_at(0x4E, "Test Game")
            .text_at(0x6E, "Ripper")
            .text_at(0x7E, "A comment")
            .put(0x9E, &[25, 12, 0xCB, 0x07])
            .put(0xA9, &[0xB4, 0x00, 0x00])
            .put(0xAC, &[0x10, 0x27, 0x00, 0x00])
            .text_at(0xB0, "Composer")
            .put(0xD1, &[2])
    }

    /// Text layout: text date, "180" s length, "01000" ms fade, ZSNES.
    pub fn text() -> Self {
        Self::new()
            .text_at(0x2E, "Opening")
            .text_at(0x4E, "Test Game")
            .text_at(0x6E, "Ripper")
            .text_at(0x7E, "A comment")
            .text_at(0x9E, "12/25/1995")
            .text_at(0xA9, "180")
            .text_at(0xAC, "01000")
            .text_at(0xB1, "Composer")
            .text_at(0xD2, "1")
    }

    /// Text offsets with binary song and fade length.
    pub fn mixed() -> Self {
        Self::new()
            .text_at(0x2E, "Opening")
            .text_at(0x4E, "Test Game")
            .text_at(0x9E, "12/25/1995")
            .put(0xA9, &[0xB4, 0x00, 0x00])
            .put(0xAC, &[0x10, 0x27, 0x00, 0x00, 0x00])
            .text_at(0xB1, "Composer")
    }

    /// Clear the contains-tag byte.
    pub fn without_tag(self) -> Self {
        self.put(0x23, &[27])
    }

    pub fn put(mut self, offset: usize, data: &[u8]) -> Self {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        self
    }

    pub fn text_at(self, offset: usize, text: &str) -> Self {
        self.put(offset, text.as_bytes())
    }

    /// Append an xid6 chunk holding the given encoded items.
    pub fn with_xid6(mut self, items: &[u8]) -> Self {
        self.bytes.truncate(EXTENDED_TAG_OFFSET as usize);
        self.bytes.extend_from_slice(b"xid6");
        self.bytes.extend_from_slice(&(items.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(items);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn cursor(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.bytes.clone())
    }

    /// Write the image to `dir/name` and return the path.
    pub fn write_in(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes).unwrap();
        path
    }
}

pub(crate) fn string_item(code: u8, text: &str) -> Vec<u8> {
    let mut bytes = vec![code, 1];
    bytes.extend_from_slice(&(text.len() as u16).to_le_bytes());
    bytes.extend_from_slice(text.as_bytes());
    bytes.resize(bytes.len() + padding_len(text.len()), 0);
    bytes
}

pub(crate) fn inline_item(code: u8, data: [u8; 2]) -> Vec<u8> {
    vec![code, 0, data[0], data[1]]
}

pub(crate) fn integer_item(code: u8, value: u32) -> Vec<u8> {
    let mut bytes = vec![code, 4, 4, 0];
    bytes.extend_from_slice(&value.to_le_bytes());
    bytes
}
