//! Error types for tag parsing and writing.

use thiserror::Error;

/// Convenient result alias for SPC tag operations.
pub type Result<T> = std::result::Result<T, SpcError>;

/// Errors that may occur while loading, editing or saving an SPC file.
#[derive(Debug, Error)]
pub enum SpcError {
    /// The underlying file could not be opened, read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `save` was called before a successful `load`.
    #[error("file has not been loaded")]
    NotLoaded,

    /// A numeric field was given text that is not an unsigned integer.
    #[error("{label}: '{value}' is not a valid number")]
    InvalidNumber {
        /// Label of the field being set.
        label: String,
        /// Rejected input.
        value: String,
    },

    /// A date field was given text that is not a `MM/DD/YYYY` date.
    #[error("'{value}' is not a valid MM/DD/YYYY date")]
    InvalidDate {
        /// Rejected input.
        value: String,
    },

    /// A track field was given text that is not `<0-99>[suffix]`.
    #[error("'{value}' is not a valid track number")]
    InvalidTrack {
        /// Rejected input.
        value: String,
    },

    /// The value does not fit in the field's fixed byte range.
    #[error("{label}: value '{value}' does not fit in {size} bytes")]
    ValueTooLarge {
        /// Label of the field being set.
        label: String,
        /// Rejected input.
        value: String,
        /// Field size in bytes.
        size: usize,
    },

    /// Opaque fields are passed through and cannot be set from text.
    #[error("{label} is an opaque field and cannot be set")]
    ReadOnlyField {
        /// Label of the opaque field.
        label: String,
    },

    /// An extended item carried a type byte outside {0, 1, 4}.
    #[error("extended item 0x{id:02x} has unknown type {item_type}")]
    UnknownItemType {
        /// Item id byte.
        id: u8,
        /// Offending type byte.
        item_type: u8,
    },

    /// An inline extended item used an id missing from the registry.
    #[error("extended item id 0x{id:02x} is not a known field")]
    UnknownItemId {
        /// Item id byte.
        id: u8,
    },

    /// An integer extended item declared a payload length other than 4.
    #[error("extended item 0x{id:02x} declares {length} bytes for an integer payload")]
    InvalidItemLength {
        /// Item id byte.
        id: u8,
        /// Declared payload length.
        length: u16,
    },

    /// Items consumed more bytes than the chunk header declared.
    #[error("extended tag items overrun the declared chunk size by {overrun} bytes")]
    ChunkOverrun {
        /// Number of bytes consumed past the declared size.
        overrun: usize,
    },

    /// A string is too long to be stored in an extended item.
    #[error("{label}: {length} bytes exceeds the extended item limit")]
    ItemTooLong {
        /// Label of the attribute being set.
        label: String,
        /// Length of the rejected value.
        length: usize,
    },

    /// A rename would replace a file that already exists.
    #[error("{} already exists", path.display())]
    TargetExists {
        /// Path that would have been replaced.
        path: std::path::PathBuf,
    },

    /// An attribute name did not match any known attribute.
    #[error("unknown attribute '{name}'")]
    UnknownAttribute {
        /// Rejected name.
        name: String,
    },

    /// Filename pattern could not be parsed or did not match.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Errors produced by filename patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern contains no `%token%`.
    #[error("pattern does not contain tokens")]
    NoTokens,

    /// The pattern names a token that is not supported.
    #[error("unrecognized token name '{name}'")]
    UnknownToken {
        /// Token name found between `%` markers.
        name: String,
    },

    /// A `%` opened a token that was never closed.
    #[error("token starting at byte {start} is not terminated")]
    UnterminatedToken {
        /// Byte index of the opening `%`.
        start: usize,
    },

    /// The text does not match the pattern.
    #[error("'{text}' does not match pattern")]
    Mismatch {
        /// Text being tokenized.
        text: String,
    },
}
