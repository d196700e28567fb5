//! spc-tag CLI
//!
//! Show, edit and rename SPC files by their ID666 and xid6 tags.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use spc_tag::{format_value, Attribute, SpcFile, Structure};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "spc-tag")]
#[command(version)]
#[command(about = "SPC ID666/xid6 tag tool")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the tags of SPC files
    Show {
        /// Files and directories to show
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Dump every structure of an SPC file field by field
    Dump {
        /// SPC file to dump
        input: PathBuf,
    },

    /// Set tag values
    Set {
        /// SPC file to edit
        input: PathBuf,

        /// Assignments such as `song="Opening Theme"` or `ost-track=3`
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(Attribute, String)>,

        /// Write to another file instead of editing in place
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Remove extended-only values
    Clear {
        /// SPC file to edit
        input: PathBuf,

        /// Attributes to remove
        #[arg(required = true)]
        names: Vec<Attribute>,
    },

    /// Fill song, game, artist and track from file names
    #[command(name = "tag-from-name")]
    TagFromName {
        /// Pattern such as `%track% - %song%.spc`
        pattern: String,

        /// Files and directories to tag
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Rename files after their tags
    Rename {
        /// Pattern such as `%game% - %track% - %song%.spc`
        pattern: String,

        /// Files and directories to rename
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Show { inputs } => {
            for path in collect_inputs(&inputs)? {
                show_file(&path)?;
            }
        }
        Commands::Dump { input } => {
            dump_file(&input)?;
        }
        Commands::Set { input, values, output } => {
            set_values(&input, &values, output, cli.verbose)?;
        }
        Commands::Clear { input, names } => {
            clear_values(&input, &names, cli.verbose)?;
        }
        Commands::TagFromName { pattern, inputs } => {
            for path in collect_inputs(&inputs)? {
                let mut file = open(&path)?;
                file.tag_from_file_name(&pattern)
                    .with_context(|| format!("Failed to tag: {}", path.display()))?;
                if cli.verbose {
                    println!("Tagged: {}", path.display());
                }
            }
        }
        Commands::Rename { pattern, inputs } => {
            for path in collect_inputs(&inputs)? {
                let mut file = open(&path)?;
                let renamed = file
                    .rename_from_tag(&pattern)
                    .with_context(|| format!("Failed to rename: {}", path.display()))?;
                println!("{} -> {}", path.display(), renamed.display());
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn parse_assignment(s: &str) -> std::result::Result<(Attribute, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <name>=<value>, got '{}'", s))?;
    let attr = name.parse::<Attribute>().map_err(|e| e.to_string())?;
    Ok((attr, value.to_string()))
}

fn open(path: &Path) -> Result<SpcFile> {
    SpcFile::open(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Expand directories into the `.spc` files below them.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }

        for entry in walkdir::WalkDir::new(input).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk: {}", input.display()))?;
            if entry.file_type().is_file() && is_spc(entry.path()) {
                paths.push(entry.into_path());
            }
        }
    }

    Ok(paths)
}

fn is_spc(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("spc"))
        .unwrap_or(false)
}

fn show_file(path: &Path) -> Result<()> {
    let file = open(path)?;

    println!("{}", path.display());
    println!("{}", format_value("Tag Type", &file.tag_type().to_string()));

    for attr in Attribute::ALL {
        let present = match attr.item_id() {
            Some(id) => file.extended_tag().slot(id).is_some(),
            None => false,
        };
        if attr.is_extended_only() && !present {
            continue;
        }
        let field = file.get(attr);
        println!("{}", format_value(field.label(), &field.to_string()));
    }
    println!();

    Ok(())
}

fn dump_file(path: &Path) -> Result<()> {
    let file = open(path)?;

    println!("[Header]");
    print!("{}", file.header().render());

    println!("\n[ID666 Tag: {}]", file.tag_type());
    print!("{}", file.tag().render());

    println!("\n[Memory]");
    for field in file.memory().fields() {
        println!("{}", format_value(field.label(), &format!("{} bytes", field.size())));
    }

    if file.has_extended_tag() {
        let extended = file.extended_tag();
        println!("\n[Extended Tag]");
        print!("{}", extended.header().render());
        print!("{}", extended.render());
    }

    Ok(())
}

fn set_values(
    input: &Path,
    values: &[(Attribute, String)],
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let mut file = open(input)?;

    for (attr, value) in values {
        file.set(*attr, value)
            .with_context(|| format!("Failed to set {} to '{}'", attr, value))?;
        if verbose {
            println!("Set: {} = {}", attr, file.get(*attr));
        }
    }

    let target = output.unwrap_or_else(|| input.to_path_buf());
    file.save_as(&target)
        .with_context(|| format!("Failed to write: {}", target.display()))?;

    if verbose {
        println!("Saved: {}", target.display());
    }

    Ok(())
}

fn clear_values(input: &Path, names: &[Attribute], verbose: bool) -> Result<()> {
    let mut file = open(input)?;

    for attr in names {
        if !attr.is_extended_only() {
            warn!("{} is stored in the ID666 tag and cannot be cleared", attr);
        } else if file.clear(*attr) && verbose {
            println!("Cleared: {}", attr);
        }
    }

    file.save()
        .with_context(|| format!("Failed to write: {}", input.display()))?;

    Ok(())
}
