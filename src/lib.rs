//! # spc-tag
//!
//! Reader and writer for the tags of SNES SPC sound files.
//!
//! An SPC file carries two kinds of metadata:
//!
//! ```text
//! 0x00000  header          46 bytes   "SNES-SPC700 Sound File Data v0.30"
//! 0x0002E  ID666 tag      210 bytes   binary or text layout
//! 0x00100  SPC700 RAM      64 KiB
//! 0x10100  DSP registers  128 bytes
//! 0x10180  unused          64 bytes
//! 0x101C0  extra RAM       64 bytes
//! 0x10200  xid6 chunk     optional    extended items
//! ```
//!
//! ## ID666 layouts
//!
//! Nothing in the file says which layout the ID666 tag uses. The tag type is
//! inferred from the bytes themselves:
//!
//! 1. Date, song length and fade length all look like text → **Text**
//! 2. Text-only bytes are in use under binary offsets → **Text (mixed)**:
//!    text offsets, but song and fade length stored as binary
//! 3. Otherwise → **Binary**
//!
//! ## Extended tag
//!
//! The xid6 chunk holds values that do not fit the ID666 tag (long titles)
//! and values the ID666 tag has no room for (OST track, publisher, loop
//! timing and so on). [`SpcFile`] merges both layers into one value per
//! [`Attribute`] and moves text between them as it grows or shrinks.
//!
//! ```no_run
//! use spc_tag::SpcFile;
//!
//! # fn main() -> spc_tag::Result<()> {
//! let mut file = SpcFile::open("opening.spc")?;
//! println!("{}", file.song_title());
//! file.set_song_title("A title far too long for the thirty-two byte field")?;
//! file.save()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extended;
pub mod field;
pub mod file;
pub mod format;
pub mod pattern;
pub mod stream;
pub mod tag;

#[cfg(test)]
mod testing;

pub use error::{PatternError, Result, SpcError};
pub use extended::{ChunkHeader, ExtendedItem, ExtendedTag, ItemId, ItemInfo, ItemRegistry, ItemType};
pub use field::{Field, FieldKind, NumericMode};
pub use file::{Attribute, SpcFile};
pub use format::{format_field, format_value};
pub use pattern::{Pattern, Segment, TokenName};
pub use stream::SpcStream;
pub use tag::{Header, Id666Tag, MemoryImage, Structure, TagType};
