use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pagesmith", bin_name = "pagesmith", version)]
#[command(
    about = "Compose pages from text, heading, media and quote blocks",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Workspace directory (default: $PAGESMITH_HOME, then the platform data dir)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub dir: Option<PathBuf>,

    /// Leave a pending auto-saved backup alone instead of restoring it
    #[arg(long, global = true, help_heading = "Options")]
    pub no_recover: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new document
    New {
        /// Document title
        title: String,

        #[arg(short, long)]
        author: Option<String>,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Change title, author or tags
    Meta {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Add a block at the end of the document
    Add {
        #[command(subcommand)]
        block: AddBlock,
    },

    /// Add media files (images, video, audio) as blocks
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the blocks of the document
    #[command(alias = "ls")]
    List,

    /// Duplicate blocks (1-based indexes)
    Dup {
        #[arg(required = true)]
        indexes: Vec<usize>,
    },

    /// Delete blocks (1-based indexes)
    #[command(alias = "delete")]
    Rm {
        #[arg(required = true)]
        indexes: Vec<usize>,
    },

    /// Move blocks: up, down, top or bottom
    Mv {
        direction: String,

        #[arg(required = true)]
        indexes: Vec<usize>,
    },

    /// Replace the text of a text or heading block
    Edit { index: usize, text: String },

    /// Restore the block order of the last manual save
    Reset,

    /// Restore the auto-saved backup, even one older than the recovery window
    Recover,

    /// Save the document
    Save,

    /// Show document, save and preference status
    Status,

    /// Export to html, json, md or pdf
    Export {
        format: String,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Write a preview page
    Preview {
        /// Output directory (default: current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Replace the document with a JSON export
    Import { file: PathBuf },

    /// Cycle the font size (small, medium, large)
    Font,

    /// Toggle between dark and light theme
    Theme,

    /// Get or set configuration values
    Config {
        key: Option<String>,
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AddBlock {
    /// Paragraph of text
    Text {
        content: String,

        /// left, center, right or justify
        #[arg(long)]
        align: Option<String>,

        /// default, flat, elevated or bordered
        #[arg(long)]
        style: Option<String>,

        /// Format as song lyrics
        #[arg(long)]
        lyrics: bool,
    },

    /// Section heading
    Heading {
        text: String,

        /// h2, h3 or h4
        #[arg(short, long)]
        level: Option<String>,
    },

    /// Image from a URL or a local file
    Image {
        #[arg(required_unless_present = "file")]
        url: Option<String>,

        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,

        #[arg(long)]
        alt: Option<String>,

        #[arg(long)]
        caption: Option<String>,
    },

    /// YouTube, Vimeo or direct video file URL
    Video {
        url: String,

        #[arg(long)]
        caption: Option<String>,
    },

    /// Direct audio file URL
    Audio {
        url: String,

        #[arg(long)]
        title: Option<String>,
    },

    /// Quotation with optional attribution
    Quote {
        text: String,

        #[arg(short, long)]
        author: Option<String>,
    },
}
