//! `dtjson` CLI — reformat and inspect dtjson documents from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Validate and compact a document (stdin → stdout)
//! echo '{"at": {"__type__": "datetime", "isoformat": "2024-01-01T09:00:00"}}' | dtjson fmt
//!
//! # Pretty-print with sorted keys, from file to file
//! dtjson fmt --indent 2 --sort-keys -i data.json -o pretty.json
//!
//! # Escape all non-ASCII characters
//! dtjson fmt --ensure-ascii -i data.json
//!
//! # Count tagged values and list where they are
//! dtjson inspect -i data.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dtjson_core::{Document, EncodeOptions};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

#[derive(Parser)]
#[command(
    name = "dtjson",
    version,
    about = "JSON with tagged datetimes and timedeltas",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a document (validating tagged values) and write it back out
    Fmt {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Pretty-print with this many spaces per level
        #[arg(long)]
        indent: Option<usize>,
        /// Sort mapping keys at every depth
        #[arg(long)]
        sort_keys: bool,
        /// Escape every non-ASCII character as \uXXXX
        #[arg(long)]
        ensure_ascii: bool,
    },
    /// Report timestamps, durations and containers found in a document
    Inspect {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fmt {
            input,
            output,
            indent,
            sort_keys,
            ensure_ascii,
        } => {
            let doc = read_document(input.as_deref())?;
            let mut options = EncodeOptions::new()
                .sort_keys(sort_keys)
                .ensure_ascii(ensure_ascii);
            if let Some(width) = indent {
                options = options.indent(width);
            }
            write_document(output.as_deref(), &doc, &options)?;
        }
        Commands::Inspect { input } => {
            let doc = read_document(input.as_deref())?;
            let mut summary = Summary::default();
            summary.walk(&doc, "$".to_string());

            println!("timestamps: {}", summary.timestamps);
            println!("durations:  {}", summary.durations);
            println!("mappings:   {}", summary.mappings);
            println!("sequences:  {}", summary.sequences);
            for (path, description) in &summary.tagged {
                println!("{}  {}", path, description);
            }
        }
    }

    Ok(())
}

/// Tallies gathered while walking a document.
#[derive(Default)]
struct Summary {
    timestamps: usize,
    durations: usize,
    mappings: usize,
    sequences: usize,
    /// `(path, description)` of every tagged value, in document order.
    tagged: Vec<(String, String)>,
}

impl Summary {
    fn walk(&mut self, doc: &Document, path: String) {
        match doc {
            Document::Timestamp(ts) => {
                self.timestamps += 1;
                self.tagged.push((path, format!("datetime   {}", ts)));
            }
            Document::Duration(delta) => {
                self.durations += 1;
                let seconds = dtjson_core::time::total_seconds(delta);
                self.tagged.push((path, format!("timedelta  {}s", seconds)));
            }
            Document::Mapping(map) => {
                self.mappings += 1;
                for (key, value) in map {
                    self.walk(value, format!("{}{}", path, key_segment(key)));
                }
            }
            Document::Sequence(items) => {
                self.sequences += 1;
                for (i, item) in items.iter().enumerate() {
                    self.walk(item, format!("{}[{}]", path, i));
                }
            }
            Document::Null | Document::Bool(_) | Document::Number(_) | Document::String(_) => {}
        }
    }
}

/// `.key` for identifier-like keys, `["some key"]` otherwise.
fn key_segment(key: &str) -> String {
    let is_identifier = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_identifier {
        format!(".{}", key)
    } else {
        let quoted = serde_json::to_string(key).unwrap_or_else(|_| format!("{:?}", key));
        format!("[{}]", quoted)
    }
}

fn read_document(path: Option<&str>) -> Result<Document> {
    match path {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to read file: {}", path))?;
            dtjson_core::decode_from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to decode {}", path))
        }
        None => dtjson_core::decode_from_reader(io::stdin().lock())
            .context("Failed to decode stdin"),
    }
}

fn write_document(path: Option<&str>, doc: &Document, options: &EncodeOptions) -> Result<()> {
    match path {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Failed to write file: {}", path))?;
            let mut writer = BufWriter::new(file);
            dtjson_core::encode_to_writer(&mut writer, doc, options)
                .with_context(|| format!("Failed to encode to {}", path))?;
            writer
                .flush()
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            dtjson_core::encode_to_writer(&mut stdout, doc, options)
                .context("Failed to encode to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
