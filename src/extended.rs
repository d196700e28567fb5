//! Extended (xid6) tag codec
//!
//! The extended tag is an IFF style chunk (`"xid6"` + little-endian size)
//! placed after the fixed regions of the file. Its body is a run of
//! self-describing items with no item count, only the total byte length:
//!
//! ```text
//! +----+------+-----------+-----------------+-----------+
//! | id | type | data (LE) | payload         | padding   |
//! | 1  | 1    | 2         | data bytes      | to 4-byte |
//! +----+------+-----------+-----------------+-----------+
//! ```
//!
//! Type 0 items keep their value in `data` and carry no payload. Types 1
//! (string) and 4 (32-bit integer) use `data` as the payload length.

use std::io::{self, Read, Write};

use log::{debug, warn};

use crate::error::{Result, SpcError};
use crate::field::{Field, FieldKind, NumericMode};
use crate::tag::{Structure, EXTENDED_TAG_OFFSET};

/// Chunk identifier of the extended tag.
pub const EXTENDED_CHUNK_ID: &str = "xid6";
/// Size of an item's id, type and data fields.
pub const ITEM_HEADER_SIZE: usize = 4;
/// Size of an item's data field.
pub const ITEM_DATA_SIZE: usize = 2;
/// Size of an integer item's payload.
pub const ITEM_INTEGER_SIZE: usize = 4;

/// Label of payload items whose id is not registered.
pub const UNKNOWN_ITEM_LABEL: &str = "<Unknown Field>";
const ALIGNMENT: usize = 4;

/// Wire type of an extended item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// Value stored in the item's data field.
    Inline,
    /// String payload follows the item header.
    String,
    /// 32-bit integer payload follows the item header.
    Integer,
}

impl ItemType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ItemType::Inline),
            1 => Some(ItemType::String),
            4 => Some(ItemType::Integer),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ItemType::Inline => 0,
            ItemType::String => 1,
            ItemType::Integer => 4,
        }
    }
}

/// Identity of an extended tag slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemId {
    SongName,
    GameName,
    ArtistName,
    DumperName,
    DateDumped,
    EmulatorUsed,
    Comments,
    OstTitle,
    OstDisc,
    OstTrack,
    PublisherName,
    CopyrightYear,
    IntroLength,
    LoopLength,
    EndLength,
    FadeLength,
    MutedVoices,
    LoopTimes,
    PreampLevel,
}

impl ItemId {
    /// Every slot, in serialization order.
    pub const ALL: [ItemId; 19] = [
        ItemId::SongName,
        ItemId::GameName,
        ItemId::ArtistName,
        ItemId::DumperName,
        ItemId::DateDumped,
        ItemId::EmulatorUsed,
        ItemId::Comments,
        ItemId::OstTitle,
        ItemId::OstDisc,
        ItemId::OstTrack,
        ItemId::PublisherName,
        ItemId::CopyrightYear,
        ItemId::IntroLength,
        ItemId::LoopLength,
        ItemId::EndLength,
        ItemId::FadeLength,
        ItemId::MutedVoices,
        ItemId::LoopTimes,
        ItemId::PreampLevel,
    ];

    /// Id byte stored in the file.
    pub fn code(self) -> u8 {
        match self {
            ItemId::SongName => 0x01,
            ItemId::GameName => 0x02,
            ItemId::ArtistName => 0x03,
            ItemId::DumperName => 0x04,
            ItemId::DateDumped => 0x05,
            ItemId::EmulatorUsed => 0x06,
            ItemId::Comments => 0x07,
            ItemId::OstTitle => 0x10,
            ItemId::OstDisc => 0x11,
            ItemId::OstTrack => 0x12,
            ItemId::PublisherName => 0x13,
            ItemId::CopyrightYear => 0x14,
            ItemId::IntroLength => 0x30,
            ItemId::LoopLength => 0x31,
            ItemId::EndLength => 0x32,
            ItemId::FadeLength => 0x33,
            ItemId::MutedVoices => 0x34,
            ItemId::LoopTimes => 0x35,
            ItemId::PreampLevel => 0x36,
        }
    }
}

/// What the registry knows about one item id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemInfo {
    pub id: ItemId,
    pub label: &'static str,
    /// Wire type the slot is stored with.
    pub item_type: ItemType,
    /// Decode policy applied to the item's value.
    pub kind: FieldKind,
}

impl ItemInfo {
    /// Size of the empty field reported when the item is absent.
    pub fn default_size(&self) -> usize {
        match self.item_type {
            ItemType::String => 1,
            ItemType::Inline => ITEM_DATA_SIZE,
            ItemType::Integer => ITEM_INTEGER_SIZE,
        }
    }
}

const fn info(id: ItemId, label: &'static str, item_type: ItemType, kind: FieldKind) -> ItemInfo {
    ItemInfo {
        id,
        label,
        item_type,
        kind,
    }
}

const BINARY: FieldKind = FieldKind::Numeric(NumericMode::Binary);

static STANDARD_ITEMS: [ItemInfo; 19] = [
    info(ItemId::SongName, "Song Title*", ItemType::String, FieldKind::Text),
    info(ItemId::GameName, "Game Title*", ItemType::String, FieldKind::Text),
    info(ItemId::ArtistName, "Song Artist*", ItemType::String, FieldKind::Text),
    info(ItemId::DumperName, "Dumper Name*", ItemType::String, FieldKind::Text),
    info(ItemId::DateDumped, "Date Dumped*", ItemType::Integer, FieldKind::Date),
    info(ItemId::EmulatorUsed, "Emulator Used*", ItemType::Inline, FieldKind::Emulator(NumericMode::Binary)),
    info(ItemId::Comments, "Comments*", ItemType::String, FieldKind::Text),
    info(ItemId::OstTitle, "OST Title*", ItemType::String, FieldKind::Text),
    info(ItemId::OstDisc, "OST Disc*", ItemType::Inline, BINARY),
    info(ItemId::OstTrack, "OST Track*", ItemType::Inline, FieldKind::Track),
    info(ItemId::PublisherName, "Publisher Name*", ItemType::String, FieldKind::Text),
    info(ItemId::CopyrightYear, "Copyright Year*", ItemType::Inline, BINARY),
    info(ItemId::IntroLength, "Intro Length*", ItemType::Integer, BINARY),
    info(ItemId::LoopLength, "Loop Length*", ItemType::Integer, BINARY),
    info(ItemId::EndLength, "End Length*", ItemType::Integer, BINARY),
    info(ItemId::FadeLength, "Fade Length*", ItemType::Integer, BINARY),
    info(ItemId::MutedVoices, "Muted Voices*", ItemType::Inline, FieldKind::BinaryDigits),
    info(ItemId::LoopTimes, "Loop Times*", ItemType::Inline, BINARY),
    info(ItemId::PreampLevel, "Preamp Level*", ItemType::Integer, BINARY),
];

/// Immutable id → field description table.
#[derive(Debug, Clone, Copy)]
pub struct ItemRegistry {
    items: &'static [ItemInfo],
}

impl ItemRegistry {
    /// The items defined by the xid6 format.
    pub fn standard() -> Self {
        Self {
            items: &STANDARD_ITEMS,
        }
    }

    /// Look up an item by its id byte.
    pub fn info(&self, code: u8) -> Option<&ItemInfo> {
        self.items.iter().find(|info| info.id.code() == code)
    }

    /// Look up an item by slot.
    pub fn slot_info(&self, id: ItemId) -> Option<&ItemInfo> {
        self.info(id.code())
    }

    pub fn label(&self, code: u8) -> Option<&'static str> {
        self.info(code).map(|info| info.label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemInfo> {
        self.items.iter()
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Bytes needed after a payload to reach the next 4-byte boundary.
pub fn padding_len(payload_len: usize) -> usize {
    (ALIGNMENT - payload_len % ALIGNMENT) % ALIGNMENT
}

/// One item of the extended tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedItem {
    id_field: Field,
    type_field: Field,
    data: Field,
    payload: Option<Field>,
    padding: Option<Field>,
    item_type: ItemType,
}

impl ExtendedItem {
    /// Item whose value lives in its 2-byte data field.
    pub fn inline(code: u8, data: Field) -> Self {
        debug_assert_eq!(data.size(), ITEM_DATA_SIZE);
        Self {
            id_field: id_field(code),
            type_field: type_field(ItemType::Inline),
            data,
            payload: None,
            padding: None,
            item_type: ItemType::Inline,
        }
    }

    /// String item holding `value` exactly, padded to 4 bytes.
    pub fn string(code: u8, label: &'static str, value: &str) -> Result<Self> {
        let length = u16::try_from(value.len()).map_err(|_| SpcError::ItemTooLong {
            label: label.to_string(),
            length: value.len(),
        })?;
        let mut payload = Field::new(label, EXTENDED_TAG_OFFSET, value.len(), FieldKind::Text);
        payload.set_value(value)?;
        Ok(Self::with_payload(code, ItemType::String, length, payload))
    }

    /// Integer item; `kind` decides how `value` is parsed into 4 bytes.
    pub fn integer(code: u8, label: &'static str, kind: FieldKind, value: &str) -> Result<Self> {
        let mut payload = Field::new(label, EXTENDED_TAG_OFFSET, ITEM_INTEGER_SIZE, kind);
        payload.set_value(value)?;
        Ok(Self::with_payload(code, ItemType::Integer, ITEM_INTEGER_SIZE as u16, payload))
    }

    fn with_payload(code: u8, item_type: ItemType, length: u16, payload: Field) -> Self {
        let mut data = length_field();
        data.data_mut().copy_from_slice(&length.to_le_bytes());
        let pad = padding_len(usize::from(length));
        Self {
            id_field: id_field(code),
            type_field: type_field(item_type),
            data,
            payload: Some(payload),
            padding: (pad > 0).then(|| padding_field(pad)),
            item_type,
        }
    }

    /// Read one item and report how many bytes it consumed.
    ///
    /// Inline items must carry a registered id. Payload items with an unknown
    /// id are still read in full so the caller's byte accounting stays exact.
    pub fn read<R: Read>(reader: &mut R, registry: &ItemRegistry) -> Result<(Self, usize)> {
        let mut id_field = id_field(0);
        let mut type_field = Field::numeric("Item Type", EXTENDED_TAG_OFFSET, 1, NumericMode::Binary);
        id_field.read_from(reader)?;
        type_field.read_from(reader)?;

        let code = id_field.value() as u8;
        let type_code = type_field.value() as u8;
        let item_type = ItemType::from_code(type_code).ok_or(SpcError::UnknownItemType {
            id: code,
            item_type: type_code,
        })?;

        let mut data = Field::numeric("Item Data", EXTENDED_TAG_OFFSET, ITEM_DATA_SIZE, NumericMode::Binary);
        data.read_from(reader)?;

        if item_type == ItemType::Inline {
            let label = registry.label(code).ok_or(SpcError::UnknownItemId { id: code })?;
            data.set_label(label);
            let item = Self {
                id_field,
                type_field,
                data,
                payload: None,
                padding: None,
                item_type,
            };
            return Ok((item, ITEM_HEADER_SIZE));
        }

        data.set_label("Item Length");
        let length = data.value() as u16;
        if item_type == ItemType::Integer && usize::from(length) != ITEM_INTEGER_SIZE {
            return Err(SpcError::InvalidItemLength { id: code, length });
        }

        let label = registry.label(code).unwrap_or(UNKNOWN_ITEM_LABEL);
        let kind = match item_type {
            ItemType::String => FieldKind::Text,
            _ => FieldKind::Numeric(NumericMode::Binary),
        };
        let mut payload = Field::new(label, EXTENDED_TAG_OFFSET, usize::from(length), kind);
        payload.read_from(reader)?;

        let pad = padding_len(usize::from(length));
        let padding = if pad > 0 {
            let mut padding = padding_field(pad);
            padding.read_from(reader)?;
            Some(padding)
        } else {
            None
        };

        let item = Self {
            id_field,
            type_field,
            data,
            payload: Some(payload),
            padding,
            item_type,
        };
        let consumed = item.size();
        Ok((item, consumed))
    }

    /// Id byte of the item.
    pub fn id(&self) -> u8 {
        self.id_field.value() as u8
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Inline value, or payload length for payload items.
    pub fn data(&self) -> &Field {
        &self.data
    }

    pub fn payload(&self) -> Option<&Field> {
        self.payload.as_ref()
    }

    /// The field holding the item's value: the payload if any, else the data field.
    pub fn value_field(&self) -> &Field {
        self.payload.as_ref().unwrap_or(&self.data)
    }

    pub fn value_field_mut(&mut self) -> &mut Field {
        self.payload.as_mut().unwrap_or(&mut self.data)
    }

    pub fn padding_len(&self) -> usize {
        self.padding.as_ref().map_or(0, Field::size)
    }

    /// Decode the item's value with another policy; bytes are untouched.
    pub fn retype(&mut self, kind: FieldKind) {
        match self.payload.as_mut() {
            Some(payload) => payload.set_kind(kind),
            None => self.data.set_kind(kind),
        }
    }
}

impl Structure for ExtendedItem {
    fn fields(&self) -> Vec<&Field> {
        let mut fields = vec![&self.id_field, &self.type_field, &self.data];
        fields.extend(self.payload.as_ref());
        fields.extend(self.padding.as_ref());
        fields
    }

    fn fields_mut(&mut self) -> Vec<&mut Field> {
        let mut fields = vec![&mut self.id_field, &mut self.type_field, &mut self.data];
        fields.extend(self.payload.as_mut());
        fields.extend(self.padding.as_mut());
        fields
    }
}

fn id_field(code: u8) -> Field {
    let mut field = Field::numeric("Item ID", EXTENDED_TAG_OFFSET, 1, NumericMode::Binary);
    field.data_mut()[0] = code;
    field
}

fn type_field(item_type: ItemType) -> Field {
    let mut field = Field::numeric("Item Type", EXTENDED_TAG_OFFSET, 1, NumericMode::Binary);
    field.data_mut()[0] = item_type.code();
    field
}

fn length_field() -> Field {
    Field::numeric("Item Length", EXTENDED_TAG_OFFSET, ITEM_DATA_SIZE, NumericMode::Binary)
}

fn padding_field(size: usize) -> Field {
    Field::raw("<padding>", EXTENDED_TAG_OFFSET, size)
}

/// IFF style chunk header: 4-byte ASCII id and little-endian data size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: Field,
    pub data_size: Field,
}

impl ChunkHeader {
    pub const SIZE: usize = 8;

    pub fn new() -> Self {
        Self {
            id: Field::text("Chunk ID", EXTENDED_TAG_OFFSET, 4),
            data_size: Field::numeric("Chunk Size", EXTENDED_TAG_OFFSET + 4, 4, NumericMode::Binary),
        }
    }

    /// Header of an extended tag chunk with the given body size.
    pub fn xid6(size: usize) -> Self {
        let mut header = Self::new();
        header.id.data_mut().copy_from_slice(EXTENDED_CHUNK_ID.as_bytes());
        header.data_size.data_mut().copy_from_slice(&(size as u32).to_le_bytes());
        header
    }

    pub fn chunk_id(&self) -> &[u8] {
        self.id.data()
    }

    /// Size of the chunk body, excluding this header.
    pub fn chunk_size(&self) -> usize {
        self.data_size.value() as usize
    }
}

impl Default for ChunkHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl Structure for ChunkHeader {
    fn fields(&self) -> Vec<&Field> {
        vec![&self.id, &self.data_size]
    }

    fn fields_mut(&mut self) -> Vec<&mut Field> {
        vec![&mut self.id, &mut self.data_size]
    }
}

/// The set of extended items present in a file, one optional slot per id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedTag {
    /// Full song title when it does not fit in the ID666 tag.
    pub song_name: Option<ExtendedItem>,
    pub game_name: Option<ExtendedItem>,
    pub artist_name: Option<ExtendedItem>,
    pub dumper_name: Option<ExtendedItem>,
    pub date_dumped: Option<ExtendedItem>,
    pub emulator_used: Option<ExtendedItem>,
    pub comments: Option<ExtendedItem>,
    pub ost_title: Option<ExtendedItem>,
    pub ost_disc: Option<ExtendedItem>,
    /// Upper byte 0-99, lower byte optional ASCII suffix.
    pub ost_track: Option<ExtendedItem>,
    pub publisher_name: Option<ExtendedItem>,
    pub copyright_year: Option<ExtendedItem>,
    /// Ticks before the looped part starts.
    pub intro_length: Option<ExtendedItem>,
    pub loop_length: Option<ExtendedItem>,
    pub end_length: Option<ExtendedItem>,
    pub fade_length: Option<ExtendedItem>,
    /// One bit per voice.
    pub muted_voices: Option<ExtendedItem>,
    pub loop_times: Option<ExtendedItem>,
    /// 65536 is normal SNES amplification.
    pub preamp_level: Option<ExtendedItem>,
}

impl ExtendedTag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse items until `declared` bytes are consumed.
    pub fn read<R: Read>(reader: &mut R, declared: usize, registry: &ItemRegistry) -> Result<Self> {
        let mut tag = Self::new();
        let mut remaining = declared;

        while remaining > 0 {
            let (item, consumed) = ExtendedItem::read(reader, registry)?;
            remaining = remaining
                .checked_sub(consumed)
                .ok_or_else(|| SpcError::ChunkOverrun {
                    overrun: consumed - remaining,
                })?;
            tag.route(item, registry);
        }

        Ok(tag)
    }

    /// Place an item into the slot its id names, if the wire type matches.
    fn route(&mut self, mut item: ExtendedItem, registry: &ItemRegistry) {
        let code = item.id();
        let Some(info) = registry.info(code) else {
            warn!("dropping extended item 0x{:02x}: unknown id", code);
            return;
        };

        if info.item_type != item.item_type() {
            warn!(
                "dropping extended item 0x{:02x} ({}): stored as {:?}, expected {:?}",
                code,
                info.label,
                item.item_type(),
                info.item_type
            );
            return;
        }

        item.retype(info.kind);
        debug!("extended item 0x{:02x} ({}) = {}", code, info.label, item.value_field());
        *self.slot_mut(info.id) = Some(item);
    }

    pub fn slot(&self, id: ItemId) -> Option<&ExtendedItem> {
        match id {
            ItemId::SongName => self.song_name.as_ref(),
            ItemId::GameName => self.game_name.as_ref(),
            ItemId::ArtistName => self.artist_name.as_ref(),
            ItemId::DumperName => self.dumper_name.as_ref(),
            ItemId::DateDumped => self.date_dumped.as_ref(),
            ItemId::EmulatorUsed => self.emulator_used.as_ref(),
            ItemId::Comments => self.comments.as_ref(),
            ItemId::OstTitle => self.ost_title.as_ref(),
            ItemId::OstDisc => self.ost_disc.as_ref(),
            ItemId::OstTrack => self.ost_track.as_ref(),
            ItemId::PublisherName => self.publisher_name.as_ref(),
            ItemId::CopyrightYear => self.copyright_year.as_ref(),
            ItemId::IntroLength => self.intro_length.as_ref(),
            ItemId::LoopLength => self.loop_length.as_ref(),
            ItemId::EndLength => self.end_length.as_ref(),
            ItemId::FadeLength => self.fade_length.as_ref(),
            ItemId::MutedVoices => self.muted_voices.as_ref(),
            ItemId::LoopTimes => self.loop_times.as_ref(),
            ItemId::PreampLevel => self.preamp_level.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, id: ItemId) -> &mut Option<ExtendedItem> {
        match id {
            ItemId::SongName => &mut self.song_name,
            ItemId::GameName => &mut self.game_name,
            ItemId::ArtistName => &mut self.artist_name,
            ItemId::DumperName => &mut self.dumper_name,
            ItemId::DateDumped => &mut self.date_dumped,
            ItemId::EmulatorUsed => &mut self.emulator_used,
            ItemId::Comments => &mut self.comments,
            ItemId::OstTitle => &mut self.ost_title,
            ItemId::OstDisc => &mut self.ost_disc,
            ItemId::OstTrack => &mut self.ost_track,
            ItemId::PublisherName => &mut self.publisher_name,
            ItemId::CopyrightYear => &mut self.copyright_year,
            ItemId::IntroLength => &mut self.intro_length,
            ItemId::LoopLength => &mut self.loop_length,
            ItemId::EndLength => &mut self.end_length,
            ItemId::FadeLength => &mut self.fade_length,
            ItemId::MutedVoices => &mut self.muted_voices,
            ItemId::LoopTimes => &mut self.loop_times,
            ItemId::PreampLevel => &mut self.preamp_level,
        }
    }

    /// Every slot in serialization order.
    fn slots_mut(&mut self) -> [&mut Option<ExtendedItem>; 19] {
        [
            &mut self.song_name,
            &mut self.game_name,
            &mut self.artist_name,
            &mut self.dumper_name,
            &mut self.date_dumped,
            &mut self.emulator_used,
            &mut self.comments,
            &mut self.ost_title,
            &mut self.ost_disc,
            &mut self.ost_track,
            &mut self.publisher_name,
            &mut self.copyright_year,
            &mut self.intro_length,
            &mut self.loop_length,
            &mut self.end_length,
            &mut self.fade_length,
            &mut self.muted_voices,
            &mut self.loop_times,
            &mut self.preamp_level,
        ]
    }

    /// Present items in serialization order.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &ExtendedItem)> + '_ {
        ItemId::ALL
            .into_iter()
            .filter_map(move |id| self.slot(id).map(|item| (id, item)))
    }

    pub fn is_empty(&self) -> bool {
        self.items().next().is_none()
    }

    /// Chunk header for the current items.
    pub fn header(&self) -> ChunkHeader {
        ChunkHeader::xid6(self.size())
    }

    /// Write the chunk header followed by the items.
    pub fn write_chunk<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.header().write_to(writer)?;
        self.write_to(writer)
    }
}

impl Structure for ExtendedTag {
    fn fields(&self) -> Vec<&Field> {
        self.items().flat_map(|(_, item)| item.fields()).collect()
    }

    fn fields_mut(&mut self) -> Vec<&mut Field> {
        self.slots_mut()
            .into_iter()
            .flatten()
            .flat_map(|item| item.fields_mut())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn string_item_bytes(code: u8, text: &str) -> Vec<u8> {
        let mut bytes = vec![code, 1];
        bytes.extend_from_slice(&(text.len() as u16).to_le_bytes());
        bytes.extend_from_slice(text.as_bytes());
        bytes.resize(bytes.len() + padding_len(text.len()), 0);
        bytes
    }

    #[test]
    fn test_padding_len() {
        assert_eq!(padding_len(0), 0);
        assert_eq!(padding_len(1), 3);
        assert_eq!(padding_len(4), 0);
        assert_eq!(padding_len(5), 3);
        assert_eq!(padding_len(7), 1);
    }

    #[test]
    fn test_payload_items_are_aligned() {
        for length in 0..40 {
            let text = "x".repeat(length);
            let item = ExtendedItem::string(0x01, "Song Title*", &text).unwrap();
            assert!(item.padding_len() <= 3);
            assert_eq!(item.size() % 4, 0, "length {}", length);
            assert_eq!(item.size(), ITEM_HEADER_SIZE + length + item.padding_len());
        }
    }

    #[test]
    fn test_read_string_item() {
        let registry = ItemRegistry::standard();
        let bytes = string_item_bytes(0x01, "Hello");
        assert_eq!(bytes.len(), 12);

        let (item, consumed) = ExtendedItem::read(&mut Cursor::new(&bytes), &registry).unwrap();
        assert_eq!(consumed, 12);
        assert_eq!(item.item_type(), ItemType::String);
        assert_eq!(item.data().label(), "Item Length");
        assert_eq!(item.payload().unwrap().to_string(), "Hello");
        assert_eq!(item.payload().unwrap().label(), "Song Title*");
        assert_eq!(item.padding_len(), 3);
    }

    #[test]
    fn test_read_inline_item() {
        let registry = ItemRegistry::standard();
        let bytes = [0x11, 0, 2, 0];
        let (item, consumed) = ExtendedItem::read(&mut Cursor::new(&bytes), &registry).unwrap();
        assert_eq!(consumed, 4);
        assert!(item.payload().is_none());
        assert_eq!(item.data().label(), "OST Disc*");
        assert_eq!(item.value_field().value(), 2);
    }

    #[test]
    fn test_read_integer_item() {
        let registry = ItemRegistry::standard();
        let bytes = [0x36, 4, 4, 0, 0x00, 0x00, 0x01, 0x00];
        let (item, consumed) = ExtendedItem::read(&mut Cursor::new(&bytes), &registry).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(item.payload().unwrap().value(), 65536);
        assert_eq!(item.padding_len(), 0);
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        let registry = ItemRegistry::standard();
        let err = ExtendedItem::read(&mut Cursor::new(&[0x01, 2, 0, 0]), &registry).unwrap_err();
        assert!(matches!(err, SpcError::UnknownItemType { id: 0x01, item_type: 2 }));
    }

    #[test]
    fn test_unknown_inline_id_is_fatal() {
        let registry = ItemRegistry::standard();
        let err = ExtendedItem::read(&mut Cursor::new(&[0x7F, 0, 1, 0]), &registry).unwrap_err();
        assert!(matches!(err, SpcError::UnknownItemId { id: 0x7F }));
    }

    #[test]
    fn test_integer_item_must_be_four_bytes() {
        let registry = ItemRegistry::standard();
        let err = ExtendedItem::read(&mut Cursor::new(&[0x30, 4, 2, 0, 1, 2]), &registry).unwrap_err();
        assert!(matches!(err, SpcError::InvalidItemLength { id: 0x30, length: 2 }));
    }

    #[test]
    fn test_write_matches_read() {
        let registry = ItemRegistry::standard();
        let item = ExtendedItem::string(0x02, "Game Title*", "Chrono Trigger").unwrap();
        let mut written = Vec::new();
        item.write_to(&mut written).unwrap();
        assert_eq!(written, string_item_bytes(0x02, "Chrono Trigger"));

        let (read, consumed) = ExtendedItem::read(&mut Cursor::new(&written), &registry).unwrap();
        assert_eq!(consumed, written.len());
        assert_eq!(read.payload().unwrap().to_string(), "Chrono Trigger");
    }

    #[test]
    fn test_tag_reads_until_declared_size() {
        let registry = ItemRegistry::standard();
        let bytes = string_item_bytes(0x01, "Hello");
        let tag = ExtendedTag::read(&mut Cursor::new(&bytes), 12, &registry).unwrap();
        assert_eq!(tag.song_name.as_ref().unwrap().value_field().to_string(), "Hello");
        assert_eq!(tag.size(), 12);
    }

    #[test]
    fn test_tag_overrun_is_reported() {
        let registry = ItemRegistry::standard();
        let bytes = string_item_bytes(0x01, "Hello");
        let err = ExtendedTag::read(&mut Cursor::new(&bytes), 8, &registry).unwrap_err();
        assert!(matches!(err, SpcError::ChunkOverrun { overrun: 4 }));
    }

    #[test]
    fn test_tag_routes_and_retypes() {
        let registry = ItemRegistry::standard();
        let mut bytes = vec![0x06, 0, 2, 0]; // emulator used
        bytes.extend_from_slice(&[0x12, 0, b'a', 5]); // ost track
        bytes.extend_from_slice(&[0x34, 0, 0b101, 0]); // muted voices

        let tag = ExtendedTag::read(&mut Cursor::new(&bytes), bytes.len(), &registry).unwrap();

        let emulator = tag.slot(ItemId::EmulatorUsed).unwrap().value_field();
        assert_eq!(emulator.data(), &[2, 0]);
        assert_eq!(emulator.to_string(), "Snes9x");

        let track = tag.slot(ItemId::OstTrack).unwrap().value_field();
        assert_eq!(track.to_string(), "5a");

        let muted = tag.slot(ItemId::MutedVoices).unwrap().value_field();
        assert_eq!(muted.to_string(), "0000000000000101");
    }

    #[test]
    fn test_mismatched_and_unknown_items_are_consumed_and_dropped() {
        let registry = ItemRegistry::standard();
        // song name stored inline, unknown payload id, then a real item
        let mut bytes = vec![0x01, 0, 0, 0];
        bytes.extend(string_item_bytes(0x7E, "junk"));
        bytes.extend(string_item_bytes(0x03, "Yoko"));

        let tag = ExtendedTag::read(&mut Cursor::new(&bytes), bytes.len(), &registry).unwrap();
        assert!(tag.song_name.is_none());
        assert_eq!(tag.items().count(), 1);
        assert_eq!(tag.artist_name.as_ref().unwrap().value_field().to_string(), "Yoko");
    }

    #[test]
    fn test_tag_serializes_in_slot_order() {
        let mut tag = ExtendedTag::new();
        tag.preamp_level = Some(ExtendedItem::integer(0x36, "Preamp Level*", BINARY, "65536").unwrap());
        tag.song_name = Some(ExtendedItem::string(0x01, "Song Title*", "Hello").unwrap());

        let mut written = Vec::new();
        tag.write_chunk(&mut written).unwrap();

        assert_eq!(&written[..4], b"xid6");
        assert_eq!(u32::from_le_bytes([written[4], written[5], written[6], written[7]]), 20);
        assert_eq!(written[8], 0x01);
        assert_eq!(written[20], 0x36);
        assert_eq!(written.len(), ChunkHeader::SIZE + 20);
    }

    #[test]
    fn test_empty_tag() {
        let tag = ExtendedTag::new();
        assert!(tag.is_empty());
        assert_eq!(tag.size(), 0);
        assert_eq!(tag.header().chunk_size(), 0);
    }

    #[test]
    fn test_registry_covers_every_slot() {
        let registry = ItemRegistry::standard();
        for id in ItemId::ALL {
            let info = registry.slot_info(id).unwrap();
            assert_eq!(info.id, id);
            assert!(info.label.ends_with('*'));
        }
        assert!(registry.info(0x08).is_none());
    }
}
