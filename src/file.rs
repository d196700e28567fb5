//! SPC file facade
//!
//! [`SpcFile`] owns every structure of one file and exposes one logical
//! value per [`Attribute`], whichever layer actually stores it. Values that
//! outgrow their ID666 field are promoted into the extended tag and dropped
//! from it again once they fit.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};

use crate::error::{Result, SpcError};
use crate::extended::{
    ExtendedItem, ExtendedTag, ItemId, ItemRegistry, ItemType, EXTENDED_CHUNK_ID, ITEM_DATA_SIZE,
    UNKNOWN_ITEM_LABEL,
};
use crate::field::{emulator_code, Field, NumericMode};
use crate::pattern::{Pattern, TokenName};
use crate::stream::SpcStream;
use crate::tag::{Header, Id666Tag, MemoryImage, TagType, EXTENDED_TAG_OFFSET};

/// Characters that cannot appear in a file name on common platforms.
const INVALID_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// A logical tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    SongTitle,
    GameTitle,
    Dumper,
    Comments,
    DateDumped,
    SongLength,
    FadeLength,
    Artist,
    ChannelState,
    EmulatorUsed,
    OstTitle,
    OstDisc,
    OstTrack,
    Publisher,
    CopyrightYear,
    IntroLength,
    LoopLength,
    EndLength,
    ExtendedFadeLength,
    MutedVoices,
    LoopTimes,
    PreampLevel,
}

impl Attribute {
    pub const ALL: [Attribute; 22] = [
        Attribute::SongTitle,
        Attribute::GameTitle,
        Attribute::Dumper,
        Attribute::Comments,
        Attribute::DateDumped,
        Attribute::SongLength,
        Attribute::FadeLength,
        Attribute::Artist,
        Attribute::ChannelState,
        Attribute::EmulatorUsed,
        Attribute::OstTitle,
        Attribute::OstDisc,
        Attribute::OstTrack,
        Attribute::Publisher,
        Attribute::CopyrightYear,
        Attribute::IntroLength,
        Attribute::LoopLength,
        Attribute::EndLength,
        Attribute::ExtendedFadeLength,
        Attribute::MutedVoices,
        Attribute::LoopTimes,
        Attribute::PreampLevel,
    ];

    /// Name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::SongTitle => "song",
            Attribute::GameTitle => "game",
            Attribute::Dumper => "dumper",
            Attribute::Comments => "comments",
            Attribute::DateDumped => "date",
            Attribute::SongLength => "length",
            Attribute::FadeLength => "fade",
            Attribute::Artist => "artist",
            Attribute::ChannelState => "channels",
            Attribute::EmulatorUsed => "emulator",
            Attribute::OstTitle => "ost-title",
            Attribute::OstDisc => "ost-disc",
            Attribute::OstTrack => "ost-track",
            Attribute::Publisher => "publisher",
            Attribute::CopyrightYear => "copyright",
            Attribute::IntroLength => "intro",
            Attribute::LoopLength => "loop",
            Attribute::EndLength => "end",
            Attribute::ExtendedFadeLength => "xfade",
            Attribute::MutedVoices => "muted",
            Attribute::LoopTimes => "loop-times",
            Attribute::PreampLevel => "preamp",
        }
    }

    /// Extended item that can hold this attribute.
    pub fn item_id(self) -> Option<ItemId> {
        match self {
            Attribute::SongTitle => Some(ItemId::SongName),
            Attribute::GameTitle => Some(ItemId::GameName),
            Attribute::Dumper => Some(ItemId::DumperName),
            Attribute::Comments => Some(ItemId::Comments),
            Attribute::DateDumped => Some(ItemId::DateDumped),
            Attribute::Artist => Some(ItemId::ArtistName),
            Attribute::EmulatorUsed => Some(ItemId::EmulatorUsed),
            Attribute::SongLength | Attribute::FadeLength | Attribute::ChannelState => None,
            Attribute::OstTitle => Some(ItemId::OstTitle),
            Attribute::OstDisc => Some(ItemId::OstDisc),
            Attribute::OstTrack => Some(ItemId::OstTrack),
            Attribute::Publisher => Some(ItemId::PublisherName),
            Attribute::CopyrightYear => Some(ItemId::CopyrightYear),
            Attribute::IntroLength => Some(ItemId::IntroLength),
            Attribute::LoopLength => Some(ItemId::LoopLength),
            Attribute::EndLength => Some(ItemId::EndLength),
            Attribute::ExtendedFadeLength => Some(ItemId::FadeLength),
            Attribute::MutedVoices => Some(ItemId::MutedVoices),
            Attribute::LoopTimes => Some(ItemId::LoopTimes),
            Attribute::PreampLevel => Some(ItemId::PreampLevel),
        }
    }

    /// Whether the attribute has no ID666 field.
    pub fn is_extended_only(self) -> bool {
        !matches!(
            self,
            Attribute::SongTitle
                | Attribute::GameTitle
                | Attribute::Dumper
                | Attribute::Comments
                | Attribute::DateDumped
                | Attribute::SongLength
                | Attribute::FadeLength
                | Attribute::Artist
                | Attribute::ChannelState
                | Attribute::EmulatorUsed
        )
    }

    fn header_field(self, tag: &Id666Tag) -> Option<&Field> {
        match self {
            Attribute::SongTitle => Some(&tag.song_title),
            Attribute::GameTitle => Some(&tag.game_title),
            Attribute::Dumper => Some(&tag.dumper_name),
            Attribute::Comments => Some(&tag.comments),
            Attribute::DateDumped => Some(&tag.date_dumped),
            Attribute::SongLength => Some(&tag.song_length),
            Attribute::FadeLength => Some(&tag.fade_length),
            Attribute::Artist => Some(&tag.song_artist),
            Attribute::ChannelState => Some(&tag.default_channel_state),
            Attribute::EmulatorUsed => Some(&tag.emulator_used),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = SpcError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.name() == name)
            .ok_or(SpcError::UnknownAttribute {
                name: s.to_string(),
            })
    }
}

/// One SPC file and its tags.
#[derive(Debug, Clone)]
pub struct SpcFile {
    path: PathBuf,
    registry: ItemRegistry,
    loaded: bool,
    header: Header,
    tag_type: TagType,
    binary_tag: Id666Tag,
    text_tag: Id666Tag,
    memory: MemoryImage,
    extended: ExtendedTag,
    has_extended_tag: bool,
}

impl SpcFile {
    /// Create an unloaded file for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_registry(path, ItemRegistry::standard())
    }

    pub fn with_registry(path: impl Into<PathBuf>, registry: ItemRegistry) -> Self {
        Self {
            path: path.into(),
            registry,
            loaded: false,
            header: Header::new(),
            tag_type: TagType::Binary,
            binary_tag: Id666Tag::binary(),
            text_tag: Id666Tag::text(),
            memory: MemoryImage::new(),
            extended: ExtendedTag::new(),
            has_extended_tag: false,
        }
    }

    /// Create and load in one step.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut file = Self::new(path);
        file.load()?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The ID666 layout that is read and saved for this file.
    pub fn tag(&self) -> &Id666Tag {
        match self.tag_type {
            TagType::Binary => &self.binary_tag,
            TagType::Text | TagType::TextMixed => &self.text_tag,
        }
    }

    fn tag_mut(&mut self) -> &mut Id666Tag {
        match self.tag_type {
            TagType::Binary => &mut self.binary_tag,
            TagType::Text | TagType::TextMixed => &mut self.text_tag,
        }
    }

    pub fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    pub fn extended_tag(&self) -> &ExtendedTag {
        &self.extended
    }

    /// Whether an xid6 chunk is written on save.
    pub fn has_extended_tag(&self) -> bool {
        self.has_extended_tag
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    /// Read the file at [`path`](Self::path).
    pub fn load(&mut self) -> Result<()> {
        let file = File::open(&self.path)?;
        self.load_from(BufReader::new(file))?;
        info!("loaded {} ({} tag)", self.path.display(), self.tag_type);
        Ok(())
    }

    /// Read an SPC image from any seekable source.
    ///
    /// Nothing is changed unless the whole image parses.
    pub fn load_from<R: Read + Seek>(&mut self, reader: R) -> Result<()> {
        let mut stream = SpcStream::new(reader);
        stream.set_position(0)?;

        let mut header = Header::new();
        stream.read_struct(&mut header)?;

        let mut binary_tag = Id666Tag::binary();
        let mut text_tag = Id666Tag::text();
        let tag_type = if header.contains_tag() {
            let tag_type = stream.tag_type()?;
            match tag_type {
                TagType::Binary => stream.read_struct(&mut binary_tag)?,
                TagType::Text => stream.read_struct(&mut text_tag)?,
                TagType::TextMixed => {
                    stream.read_struct(&mut text_tag)?;
                    text_tag.song_length.set_mode(NumericMode::Binary);
                    text_tag.fade_length.set_mode(NumericMode::Binary);
                }
            }
            tag_type
        } else {
            // keep whatever occupies the tag region so a save reproduces it
            debug!("header reports no ID666 tag");
            stream.read_struct(&mut text_tag)?;
            TagType::Text
        };

        let mut memory = MemoryImage::new();
        stream.read_struct(&mut memory)?;

        let chunk = if stream.has_extended_tag()? {
            stream.set_position(EXTENDED_TAG_OFFSET)?;
            stream.find_chunk(EXTENDED_CHUNK_ID)?
        } else {
            None
        };
        let has_extended_tag = chunk.is_some();
        let extended = match chunk {
            Some(chunk) => ExtendedTag::read(stream.get_mut(), chunk.chunk_size(), &self.registry)?,
            None => ExtendedTag::new(),
        };

        self.header = header;
        self.tag_type = tag_type;
        self.binary_tag = binary_tag;
        self.text_tag = text_tag;
        self.memory = memory;
        self.extended = extended;
        self.has_extended_tag = has_extended_tag;
        self.loaded = true;
        Ok(())
    }

    /// Write back to [`path`](Self::path).
    pub fn save(&self) -> Result<()> {
        self.save_as(&self.path)
    }

    /// Write to another path; the file keeps its own path.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.loaded {
            return Err(SpcError::NotLoaded);
        }
        let path = path.as_ref();
        let file = File::create(path)?;
        self.save_to(BufWriter::new(file))?;
        info!("saved {}", path.display());
        Ok(())
    }

    /// Serialize the header, the active tag layout, the memory images and,
    /// when present, the extended tag.
    pub fn save_to<W: Write>(&self, writer: W) -> Result<()> {
        if !self.loaded {
            return Err(SpcError::NotLoaded);
        }

        let mut stream = SpcStream::new(writer);
        stream.write_struct(&self.header)?;
        stream.write_struct(self.tag())?;
        stream.write_struct(&self.memory)?;
        if self.has_extended_tag {
            self.extended.write_chunk(stream.get_mut())?;
        }
        stream.flush()?;
        Ok(())
    }

    /// Current value of `attr`.
    ///
    /// An extended item overrides the ID666 field it extends. Extended-only
    /// attributes that are absent read as an empty field.
    pub fn get(&self, attr: Attribute) -> Field {
        if let Some(id) = attr.item_id() {
            if let Some(item) = self.extended.slot(id) {
                return item.value_field().clone();
            }
        }

        match attr.header_field(self.tag()) {
            Some(field) => field.clone(),
            None => self.empty_item_field(attr),
        }
    }

    fn empty_item_field(&self, attr: Attribute) -> Field {
        match attr.item_id().and_then(|id| self.registry.slot_info(id)) {
            Some(info) => Field::new(info.label, EXTENDED_TAG_OFFSET, info.default_size(), info.kind),
            None => Field::raw(UNKNOWN_ITEM_LABEL, EXTENDED_TAG_OFFSET, 0),
        }
    }

    /// Set `attr` from text.
    pub fn set(&mut self, attr: Attribute, value: &str) -> Result<()> {
        match attr {
            Attribute::SongTitle => self.set_text(ItemId::SongName, value, |tag| &mut tag.song_title),
            Attribute::GameTitle => self.set_text(ItemId::GameName, value, |tag| &mut tag.game_title),
            Attribute::Dumper => self.set_text(ItemId::DumperName, value, |tag| &mut tag.dumper_name),
            Attribute::Comments => self.set_text(ItemId::Comments, value, |tag| &mut tag.comments),
            Attribute::Artist => self.set_text(ItemId::ArtistName, value, |tag| &mut tag.song_artist),
            Attribute::DateDumped => self.set_date(value),
            Attribute::EmulatorUsed => self.set_emulator(value),
            Attribute::SongLength => self.tag_mut().song_length.set_value(value),
            Attribute::FadeLength => self.tag_mut().fade_length.set_value(value),
            Attribute::ChannelState => self.tag_mut().default_channel_state.set_value(value),
            _ => match attr.item_id() {
                Some(id) => self.set_extended(id, value),
                None => Ok(()),
            },
        }
    }

    /// Remove the extended item behind an extended-only attribute.
    ///
    /// Returns whether an item was removed.
    pub fn clear(&mut self, attr: Attribute) -> bool {
        if !attr.is_extended_only() {
            return false;
        }
        match attr.item_id() {
            Some(id) => self.extended.slot_mut(id).take().is_some(),
            None => false,
        }
    }

    fn item_label(&self, id: ItemId) -> &'static str {
        self.registry.slot_info(id).map_or(UNKNOWN_ITEM_LABEL, |info| info.label)
    }

    fn set_text(
        &mut self,
        id: ItemId,
        value: &str,
        select: fn(&mut Id666Tag) -> &mut Field,
    ) -> Result<()> {
        let capacity = select(self.tag_mut()).size();
        let promoted = if value.len() > capacity {
            Some(ExtendedItem::string(id.code(), self.item_label(id), value)?)
        } else {
            None
        };

        select(self.tag_mut()).set_value(value)?;

        match promoted {
            Some(item) => {
                debug!("{} does not fit in {} bytes; stored in the extended tag", self.item_label(id), capacity);
                *self.extended.slot_mut(id) = Some(item);
                self.has_extended_tag = true;
            }
            None => {
                if self.extended.slot_mut(id).take().is_some() {
                    debug!("{} fits the ID666 tag again; extended item removed", self.item_label(id));
                }
            }
        }
        Ok(())
    }

    fn set_date(&mut self, value: &str) -> Result<()> {
        let binary = self.tag_type == TagType::Binary;
        let field = &mut self.tag_mut().date_dumped;
        if binary {
            field.set_binary_date(value)?;
        } else {
            field.set_text_date(value)?;
        }

        if let Some(item) = self.extended.date_dumped.as_mut() {
            item.value_field_mut().set_binary_date(value)?;
        }
        Ok(())
    }

    /// Accepts `unknown`, `zsnes` or `snes9x`; anything else is ignored.
    fn set_emulator(&mut self, value: &str) -> Result<()> {
        let Some(code) = emulator_code(value) else {
            debug!("ignoring unrecognized emulator '{}'", value);
            return Ok(());
        };

        let code = code.to_string();
        self.tag_mut().emulator_used.set_value(&code)?;
        if let Some(item) = self.extended.emulator_used.as_mut() {
            item.value_field_mut().set_value(&code)?;
        }
        Ok(())
    }

    fn set_extended(&mut self, id: ItemId, value: &str) -> Result<()> {
        let Some(info) = self.registry.slot_info(id).copied() else {
            return Err(SpcError::UnknownItemId { id: id.code() });
        };

        let item = match info.item_type {
            ItemType::Inline => {
                let mut data = Field::new(info.label, EXTENDED_TAG_OFFSET, ITEM_DATA_SIZE, info.kind);
                data.set_value(value)?;
                ExtendedItem::inline(id.code(), data)
            }
            ItemType::String => ExtendedItem::string(id.code(), info.label, value)?,
            ItemType::Integer => ExtendedItem::integer(id.code(), info.label, info.kind, value)?,
        };

        *self.extended.slot_mut(id) = Some(item);
        self.has_extended_tag = true;
        Ok(())
    }

    /// Fill song, game, artist and track from the file name, then save.
    pub fn tag_from_file_name(&mut self, pattern: &str) -> Result<()> {
        if !self.loaded {
            return Err(SpcError::NotLoaded);
        }
        let pattern = Pattern::parse(pattern)?;
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        for (token, value) in pattern.tokenize(&name)? {
            debug!("{} = '{}'", token, value);
            self.set(token_attribute(token), &value)?;
        }
        self.save()
    }

    /// Rename the file after its tag values and return the new path.
    ///
    /// Track numbers are zero padded to two digits and characters that are
    /// not allowed in file names are dropped. An existing file is never
    /// replaced; the old file is removed only once the new one is written.
    pub fn rename_from_tag(&mut self, pattern: &str) -> Result<PathBuf> {
        if !self.loaded {
            return Err(SpcError::NotLoaded);
        }
        let pattern = Pattern::parse(pattern)?;
        let name: String = pattern
            .render(|token| self.token_value(token))
            .chars()
            .filter(|c| !INVALID_FILE_NAME_CHARS.contains(c))
            .collect();

        let target = self.path.with_file_name(name);
        if target == self.path {
            return Ok(target);
        }
        if target.exists() {
            return Err(SpcError::TargetExists { path: target });
        }

        self.save_as(&target)?;
        fs::remove_file(&self.path)?;
        info!("renamed {} to {}", self.path.display(), target.display());
        self.path = target.clone();
        Ok(target)
    }

    fn token_value(&self, token: TokenName) -> String {
        match token {
            TokenName::Track => {
                let track = self.ost_track();
                let suffix = track.track_suffix().map(String::from).unwrap_or_default();
                format!("{:02}{}", track.track_number(), suffix)
            }
            _ => self.get(token_attribute(token)).to_string(),
        }
    }
}

fn token_attribute(token: TokenName) -> Attribute {
    match token {
        TokenName::Song => Attribute::SongTitle,
        TokenName::Game => Attribute::GameTitle,
        TokenName::Artist => Attribute::Artist,
        TokenName::Track => Attribute::OstTrack,
    }
}

macro_rules! attribute_accessors {
    ($($getter:ident, $setter:ident => $attr:ident;)*) => {
        impl SpcFile {
            $(
                pub fn $getter(&self) -> Field {
                    self.get(Attribute::$attr)
                }

                pub fn $setter(&mut self, value: &str) -> Result<()> {
                    self.set(Attribute::$attr, value)
                }
            )*
        }
    };
}

attribute_accessors! {
    song_title, set_song_title => SongTitle;
    game_title, set_game_title => GameTitle;
    dumper, set_dumper => Dumper;
    comments, set_comments => Comments;
    date_dumped, set_date_dumped => DateDumped;
    song_length, set_song_length => SongLength;
    fade_length, set_fade_length => FadeLength;
    artist, set_artist => Artist;
    channel_state, set_channel_state => ChannelState;
    emulator_used, set_emulator_used => EmulatorUsed;
    ost_title, set_ost_title => OstTitle;
    ost_disc, set_ost_disc => OstDisc;
    ost_track, set_ost_track => OstTrack;
    publisher, set_publisher => Publisher;
    copyright_year, set_copyright_year => CopyrightYear;
    intro_length, set_intro_length => IntroLength;
    loop_length, set_loop_length => LoopLength;
    end_length, set_end_length => EndLength;
    extended_fade_length, set_extended_fade_length => ExtendedFadeLength;
    muted_voices, set_muted_voices => MutedVoices;
    loop_times, set_loop_times => LoopTimes;
    preamp_level, set_preamp_level => PreampLevel;
}
