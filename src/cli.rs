use clap::Parser;

/// Command-line arguments for pricedash
#[derive(Parser, Debug, Default)]
#[command(version, about = "Product price dashboard in the terminal")]
pub struct Args {
    /// Base URL of the catalog service (default: https://dummyjson.com)
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Request timeout in seconds for catalog calls
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Log filter written to the log file (e.g. "info", "pricedash=debug")
    /// Overrides RUST_LOG and the config file.
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Write the default configuration file and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Overwrite an existing config file when used with --generate-config
    #[arg(long = "force", action, requires = "generate_config")]
    pub force: bool,
}
