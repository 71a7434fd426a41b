//! Command-line interface implementation for cfn-forge.
//! Provides argument parsing and help text formatting using clap.

use crate::blueprint::Blueprint;
use crate::renderer::Format;
use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for cfn-forge.
#[derive(Parser, Debug)]
#[command(author, version, about = "cfn-forge: declarative CloudFormation template builder", long_about = None)]
pub struct Args {
    /// Stack file (JSON or YAML template) or a directory holding stack.json / stack.yaml.
    /// When omitted, the selected blueprint is rendered instead.
    #[arg(short, long, value_name = "STACK")]
    pub stack: Option<PathBuf>,

    /// Built-in stack to render when no stack file is given
    #[arg(short, long, value_enum, default_value_t = Blueprint::Subnet)]
    pub blueprint: Blueprint,

    /// Directory where rendered templates are written
    #[arg(short, long, value_name = "OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Base file name of rendered templates (extension is added per format)
    #[arg(short, long, default_value = "template")]
    pub name: String,

    /// Output formats; repeat the flag to render several
    #[arg(long = "format", value_enum, default_values_t = [Format::Yaml, Format::Json])]
    pub formats: Vec<Format>,

    /// Overwrite rendered files that already exist
    #[arg(short, long)]
    pub force: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With clap's default error handling on invalid arguments
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::InvalidValue => {
            let _ = Args::command().print_help();
            eprintln!();
            e.exit();
        }
        Err(e) => e.exit(),
    }
}
