use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stl",
    about = "Storage timeline client: read and append timeline values",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage base URI, overrides the configuration file
    #[arg(long, global = true)]
    pub uri: Option<String>,

    /// Request timelines in the binary encoding
    #[arg(long, global = true)]
    pub binary: bool,

    /// Decode binary timelines in-process instead of through the runtime
    #[arg(long, global = true)]
    pub native: bool,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the schemas of the storage
    List,
    /// List the timelines of a schema
    Timelines(SchemaArgs),
    /// Read every number of a timeline
    Numbers(TimelineArgs),
    /// Read every string of a timeline
    Strings(TimelineArgs),
    /// Read every JSON document of a timeline
    Documents(TimelineArgs),
    /// Append a number to a timeline
    AddNumber(AddNumberArgs),
    /// Append a string to a timeline
    AddString(AddStringArgs),
    /// Download the decoder artifacts
    Install(InstallArgs),
    /// Decode a binary timeline file
    Decode(DecodeArgs),
    /// Show which API dialect a URI speaks
    Dialect(DialectArgs),
}

#[derive(Args)]
pub struct SchemaArgs {
    pub schema: String,
}

#[derive(Args)]
pub struct TimelineArgs {
    pub schema: String,
    pub timeline: String,
}

#[derive(Args)]
pub struct AddNumberArgs {
    pub schema: String,
    pub timeline: String,
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
    /// Explicit timestamp; the server assigns one when omitted
    #[arg(long, allow_negative_numbers = true)]
    pub time: Option<i64>,
}

#[derive(Args)]
pub struct AddStringArgs {
    pub schema: String,
    pub timeline: String,
    pub value: String,
    #[arg(long, allow_negative_numbers = true)]
    pub time: Option<i64>,
}

#[derive(Args)]
pub struct InstallArgs {
    /// Installation directory, defaults to the well-known location
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct DecodeArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct DialectArgs {
    pub uri: String,
}
