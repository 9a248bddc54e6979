//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::SourceFormat;
use crate::config::Delimiters;

/// Compile declarative indicator formulas into LaTeX
#[derive(Parser, Debug)]
#[command(name = "prog2math")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Suppress error messages, report failure through the exit code only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding the local .prog2math.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Render a JSON formula file (shorthand for `render`)
    #[arg(short = 'j', long = "json", value_hint = ValueHint::FilePath)]
    pub json: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render one formula file
    Render {
        /// Formula file (JSON or TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Write the formula to this file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,

        /// Also list the free symbols (formula parameters)
        #[arg(long)]
        params: bool,

        #[command(flatten)]
        options: RenderArgs,
    },

    /// Render many formula files in parallel
    Batch {
        /// Formula files
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: RenderArgs,
    },

    /// List operations, or describe one
    Ops {
        /// Operation name or alias
        name: Option<String>,
    },

    /// Print the operation tree of a formula file
    Tree {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Input format (default: from file extension)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Evaluation flags shared by `render` and `batch`; they override config.
#[derive(Args, Debug, Default, Clone)]
pub struct RenderArgs {
    /// Input format (default: from file extension)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Fail on variables that no binder declares and that are not external
    #[arg(long)]
    pub strict: bool,

    /// Formula parameters accepted as free variables in strict mode
    #[arg(long, value_delimiter = ',')]
    pub external: Vec<String>,

    /// Require the formula to start with `compose`
    #[arg(long)]
    pub labeled: bool,

    /// Maximum nesting of operations (0 disables the limit)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Math delimiters around the formula
    #[arg(long, value_enum)]
    pub delimiters: Option<DelimiterArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    Toml,
}

impl From<FormatArg> for SourceFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => SourceFormat::Json,
            FormatArg::Toml => SourceFormat::Toml,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterArg {
    None,
    Inline,
    Display,
}

impl From<DelimiterArg> for Delimiters {
    fn from(value: DelimiterArg) -> Self {
        match value {
            DelimiterArg::None => Delimiters::None,
            DelimiterArg::Inline => Delimiters::Inline,
            DelimiterArg::Display => Delimiters::Display,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
