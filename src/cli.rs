use std::path::PathBuf;

use clap::Parser;

use crate::settings::upload_config::{ConfigOverrides, MediaFormat};
use crate::utils::version;

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
    /// Base url of the upload server, files are sent to `<endpoint>/upload`
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Largest accepted file in megabytes
    #[arg(short = 's', long = "max-size", value_name = "MB")]
    pub max_size_mb: Option<u64>,

    /// Accepted media type and its extensions, e.g. `image/png=.png`. Repeatable
    #[arg(short, long, value_name = "TYPE=EXT[,EXT]")]
    pub accept: Vec<MediaFormat>,

    /// Accept more than one file per drop
    #[arg(short, long)]
    pub multiple: bool,

    /// Configuration file, defaults to config.toml in the config directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            max_size_mb: self.max_size_mb,
            accept: self.accept.clone(),
            multiple: self.multiple,
        }
    }
}
