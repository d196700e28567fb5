//! Example of editing the tags of an in-memory SPC image

use spc_tag::{format_field, Attribute, SpcFile, Structure};
use std::io::Cursor;

const SPC_SIZE: usize = 0x10200;

fn blank_spc() -> Vec<u8> {
    let mut bytes = vec![0u8; SPC_SIZE];
    let id = b"SNES-SPC700 Sound File Data v0.30";
    bytes[..id.len()].copy_from_slice(id);
    bytes[0x21] = 26;
    bytes[0x22] = 26;
    bytes[0x23] = 26; // tag present
    bytes[0x24] = 30;
    bytes
}

fn main() -> anyhow::Result<()> {
    println!("=== SPC Tag Example ===\n");

    let mut file = SpcFile::new("demo.spc");
    file.load_from(Cursor::new(blank_spc()))?;
    println!("Detected tag type: {}", file.tag_type());

    // Fits in the ID666 tag
    file.set_game_title("Demo Quest")?;
    file.set_song_length("180")?;
    file.set_fade_length("10000")?;
    file.set_emulator_used("snes9x")?;
    file.set_date_dumped("10/19/2026")?;

    // Too long for 32 bytes, lands in the extended tag
    file.set_song_title("Theme of the Very Long Overworld Journey")?;

    // Only exists in the extended tag
    file.set_ost_track("4b")?;
    file.set_publisher("Example Soft")?;

    let mut encoded = Vec::new();
    file.save_to(&mut encoded)?;
    println!("Encoded {} bytes (extended tag: {})\n", encoded.len(), file.has_extended_tag());

    let mut decoded = SpcFile::new("demo.spc");
    decoded.load_from(Cursor::new(encoded))?;

    for attr in Attribute::ALL {
        let field = decoded.get(attr);
        if field.is_set() {
            println!("{}", format_field(&field));
        }
    }

    println!("\nExtended items:");
    print!("{}", decoded.extended_tag().render());

    Ok(())
}
