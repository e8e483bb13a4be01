use std::path::PathBuf;

use clap::Parser as ClapParser;

#[derive(ClapParser, Debug)]
#[command(
    name = "voxide",
    author = "Voxide contributors",
    version,
    about = "Voxide voxel logic simulator"
)]
pub struct Cli {
    #[arg(
        short = 'i',
        long,
        help = "Run in interactive mode with a line-editing prompt",
        env = "VOXIDE_INTERACTIVE"
    )]
    pub interactive: bool,

    #[arg(
        short = 's',
        long,
        help = "Suppress command output; errors still print",
        env = "VOXIDE_SILENT"
    )]
    pub silent: bool,

    #[arg(
        short = 'p',
        long,
        value_name = "PORT",
        help = "Serve commands over TCP on 0.0.0.0:PORT instead of stdio",
        env = "VOXIDE_PORT"
    )]
    pub port: Option<u16>,

    #[arg(
        long,
        value_name = "NODES",
        default_value_t = 1024,
        help = "Capacity hint for the world's location maps",
        env = "VOXIDE_SIZE"
    )]
    pub size: usize,

    #[arg(
        long,
        value_name = "MILLIS",
        help = "Run the insert/get/delete benchmark for MILLIS per pass and exit"
    )]
    pub benchmark: Option<u64>,

    #[arg(value_name = "CONFIG_FILE", help = "Behavior configuration (TOML)")]
    pub config: PathBuf,
}
