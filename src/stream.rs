//! Seekable byte stream over an SPC file
//!
//! [`SpcStream`] wraps any `Read + Seek` (or `Write`) source and provides
//! field and structure I/O plus the three format detectors. The detectors
//! borrow the cursor and always put it back, so they can be called at any
//! point during a load without disturbing it.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::debug;

use crate::error::Result;
use crate::extended::{ChunkHeader, EXTENDED_CHUNK_ID};
use crate::field::Field;
use crate::tag::{Header, Id666Tag, Structure, TagType, EXTENDED_TAG_OFFSET, TAG_OFFSET};

/// Byte stream positioned over an SPC file.
#[derive(Debug)]
pub struct SpcStream<S> {
    inner: S,
}

impl<S> SpcStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Seek> SpcStream<S> {
    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    pub fn set_position(&mut self, position: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(position)).map(|_| ())
    }

    /// Total size of the stream; the cursor is left where it was.
    pub fn file_size(&mut self) -> io::Result<u64> {
        let position = self.position()?;
        let size = self.inner.seek(SeekFrom::End(0))?;
        self.set_position(position)?;
        Ok(size)
    }

    /// Run `f` and restore the cursor afterwards, whether `f` failed or not.
    fn preserving<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let position = self.position()?;
        let result = f(self);
        let restored = self.set_position(position);
        let value = result?;
        restored?;
        Ok(value)
    }
}

impl<S: Read + Seek> SpcStream<S> {
    pub fn read_field(&mut self, field: &mut Field) -> io::Result<()> {
        field.read_from(&mut self.inner)
    }

    pub fn read_struct<T: Structure>(&mut self, structure: &mut T) -> io::Result<()> {
        structure.read_from(&mut self.inner)
    }

    /// Walk chunk headers from the current position until one with `id`.
    ///
    /// On a match the cursor is left just past that chunk's header.
    pub fn find_chunk(&mut self, id: &str) -> Result<Option<ChunkHeader>> {
        let size = self.file_size()?;
        loop {
            let position = self.position()?;
            if position + ChunkHeader::SIZE as u64 > size {
                return Ok(None);
            }

            let mut header = ChunkHeader::new();
            self.read_struct(&mut header)?;
            if header.chunk_id() == id.as_bytes() {
                debug!("found '{}' chunk at 0x{:X}, {} bytes", id, position, header.chunk_size());
                return Ok(Some(header));
            }
            self.inner.seek(SeekFrom::Current(header.chunk_size() as i64))?;
        }
    }

    /// Whether the header's contains-tag byte holds the tag sentinel.
    pub fn header_contains_tag(&mut self) -> Result<bool> {
        self.preserving(|stream| {
            let mut header = Header::new();
            stream.set_position(header.contains_tag.offset())?;
            stream.read_field(&mut header.contains_tag)?;
            Ok(header.contains_tag())
        })
    }

    /// Classify the ID666 tag layout.
    ///
    /// The region is read with binary offsets. If the date and both lengths
    /// look like text the tag is text. Otherwise a binary tag is expected to
    /// leave the tail of the date, the first artist byte and the reserved
    /// area untouched; any of those being used means text offsets with
    /// binary lengths.
    pub fn tag_type(&mut self) -> Result<TagType> {
        self.preserving(|stream| {
            let mut tag = Id666Tag::binary();
            stream.set_position(TAG_OFFSET)?;
            stream.read_struct(&mut tag)?;

            let tag_type = if tag.date_dumped.is_text()
                && tag.song_length.is_text()
                && tag.fade_length.is_text()
            {
                TagType::Text
            } else if tag.date_dumped.is_set() && !tag.date_dumped.has_clear_unused_area() {
                TagType::TextMixed
            } else if tag.song_artist.data()[0] == 0 && tag.song_artist.data()[1] != 0 {
                TagType::TextMixed
            } else if tag.reserved.is_set() {
                TagType::TextMixed
            } else {
                TagType::Binary
            };

            debug!("ID666 tag classified as {}", tag_type);
            Ok(tag_type)
        })
    }

    /// Whether an xid6 chunk starts at the extended tag offset.
    pub fn has_extended_tag(&mut self) -> Result<bool> {
        self.preserving(|stream| {
            if stream.file_size()? < EXTENDED_TAG_OFFSET + ChunkHeader::SIZE as u64 {
                return Ok(false);
            }
            let mut header = ChunkHeader::new();
            stream.set_position(EXTENDED_TAG_OFFSET)?;
            stream.read_field(&mut header.id)?;
            Ok(header.chunk_id() == EXTENDED_CHUNK_ID.as_bytes())
        })
    }
}

impl<S: Write> SpcStream<S> {
    pub fn write_struct<T: Structure>(&mut self, structure: &T) -> io::Result<()> {
        structure.write_to(&mut self.inner)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{string_item, SpcImage};
    use std::io::Cursor;

    fn stream(image: &SpcImage) -> SpcStream<Cursor<Vec<u8>>> {
        SpcStream::new(image.cursor())
    }

    #[test]
    fn test_text_tag_detected() {
        let mut stream = stream(&SpcImage::text());
        assert!(stream.header_contains_tag().unwrap());
        assert_eq!(stream.tag_type().unwrap(), TagType::Text);
    }

    #[test]
    fn test_binary_tag_detected() {
        let mut stream = stream(&SpcImage::binary());
        assert_eq!(stream.tag_type().unwrap(), TagType::Binary);
    }

    #[test]
    fn test_mixed_tag_detected_from_date_tail() {
        let mut stream = stream(&SpcImage::mixed());
        assert_eq!(stream.tag_type().unwrap(), TagType::TextMixed);
    }

    #[test]
    fn test_mixed_tag_detected_from_artist_shift() {
        let image = SpcImage::new()
            .put(0xA9, &[0xB4, 0x00, 0x00])
            .put(0xB0, &[0x00, b'A']);
        let mut stream = stream(&image);
        assert_eq!(stream.tag_type().unwrap(), TagType::TextMixed);
    }

    #[test]
    fn test_mixed_tag_detected_from_reserved() {
        let image = SpcImage::new().put(0xA9, &[0xB4]).put(0xD2, &[b'1']);
        let mut stream = stream(&image);
        assert_eq!(stream.tag_type().unwrap(), TagType::TextMixed);
    }

    #[test]
    fn test_detection_restores_position() {
        let mut stream = stream(&SpcImage::binary());
        stream.set_position(0x1234).unwrap();

        let first = stream.tag_type().unwrap();
        assert_eq!(stream.position().unwrap(), 0x1234);
        let second = stream.tag_type().unwrap();
        assert_eq!(first, second);
        assert_eq!(stream.position().unwrap(), 0x1234);

        stream.header_contains_tag().unwrap();
        stream.has_extended_tag().unwrap();
        stream.file_size().unwrap();
        assert_eq!(stream.position().unwrap(), 0x1234);
    }

    #[test]
    fn test_detection_restores_position_on_error() {
        let mut stream = SpcStream::new(Cursor::new(vec![0u8; 0x40]));
        stream.set_position(0x10).unwrap();
        assert!(stream.tag_type().is_err());
        assert_eq!(stream.position().unwrap(), 0x10);
    }

    #[test]
    fn test_header_without_tag() {
        let mut stream = stream(&SpcImage::binary().without_tag());
        assert!(!stream.header_contains_tag().unwrap());
    }

    #[test]
    fn test_has_extended_tag() {
        let mut plain = stream(&SpcImage::binary());
        assert!(!plain.has_extended_tag().unwrap());

        let mut extended = stream(&SpcImage::binary().with_xid6(&string_item(0x01, "Hello")));
        assert!(extended.has_extended_tag().unwrap());
    }

    #[test]
    fn test_find_chunk_skips_other_chunks() {
        let mut bytes = b"junk".to_vec();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        bytes.extend_from_slice(b"xid6");
        bytes.extend_from_slice(&12u32.to_le_bytes());
        bytes.extend(string_item(0x01, "Hello"));

        let mut stream = SpcStream::new(Cursor::new(bytes));
        let header = stream.find_chunk(EXTENDED_CHUNK_ID).unwrap().unwrap();
        assert_eq!(header.chunk_size(), 12);
        assert_eq!(stream.position().unwrap(), 20);

        stream.set_position(0).unwrap();
        assert!(stream.find_chunk("LIST").unwrap().is_none());
    }
}
