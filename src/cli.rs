//! CLI definitions for the concord command-line interface.
//!
//! Two subcommands: `group` runs a grouped aggregation over a corpus file
//! and prints the summary JSON, `inspect` shows the corpus schema.

use clap::{Parser, Subcommand};
use concord::DEFAULT_WINDOW_SIZE;

#[derive(Parser)]
#[command(
    name = "concord",
    about = "Grouped hit aggregation over tokenized corpora",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Group hits of a pattern and print the summary JSON
    Group {
        /// Path to the corpus JSON file
        #[arg(short, long)]
        corpus: String,

        /// Pattern: a literal token value, or [] to match every token
        #[arg(short, long)]
        patt: String,

        /// Grouping property, e.g. "wordright:word:i" or "field:title"
        #[arg(short, long)]
        group: String,

        /// Document filter, e.g. fromInputFile:"/input/doc-0.xml"
        #[arg(short, long)]
        filter: Option<String>,

        /// Sort order for groups (size, identity, numdocs; "-" reverses)
        #[arg(long, default_value = "size,identity")]
        sort: String,

        /// First group of the window, 0-based
        #[arg(long, default_value_t = 0)]
        first: u64,

        /// Window size
        #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
        size: u64,

        /// Token attribute literal patterns match against
        #[arg(long, default_value = "word")]
        attribute: String,
    },

    /// Print corpus schema and per-document token counts
    Inspect {
        /// Path to the corpus JSON file
        corpus: String,
    },
}
