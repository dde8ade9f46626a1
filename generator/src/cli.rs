use std::path::PathBuf;

use clap::{ArgAction, Parser};
use dt_botdoc::TELEGRAM_BOT_API_URL;

use crate::generators::Generator;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[arg(default_value = TELEGRAM_BOT_API_URL, help = "The source file or URL")]
    pub input: String,

    #[arg(
        short,
        long,
        default_value = "api",
        help = "Directory receiving types.rs and the requests module"
    )]
    pub output: PathBuf,

    #[arg(long, default_value = "rust", value_enum)]
    pub generator: Generator,

    #[arg(
        long,
        default_value = "super::super::types",
        help = "Path under which the generated requests import the generated types"
    )]
    pub types_module: String,

    #[arg(short, long, action = ArgAction::Count, help = "Increase logging verbosity")]
    pub verbose: u8,
}
