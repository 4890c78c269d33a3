use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about, bin_name = "bump")]
pub struct Arguments {
    /// Increment the major component
    #[arg(long, short = 'M')]
    pub major: bool,
    /// Increment the minor component
    #[arg(long, short = 'm')]
    pub minor: bool,
    /// Increment the patch component
    #[arg(long, short = 'p')]
    pub patch: bool,
    /// Zero the components below the one being incremented
    #[arg(long, short = 'r')]
    pub reset: bool,
    /// Set the pre-release identifier
    #[arg(long, value_name = "ID")]
    pub pre: Option<String>,
    /// Set the local version identifier
    #[arg(long, value_name = "ID")]
    pub local: Option<String>,
    /// Drop the pre-release and local identifiers
    #[arg(long = "final", short = 'f')]
    pub final_: bool,
    /// Rewrite files even if they already hold the new version
    #[arg(long, short = 'c')]
    pub canonicalize: bool,
    /// Project root used for discovery, configuration and relative inputs
    #[arg(long, short = 'd', default_value = "./")]
    pub path: String,
    #[arg(long, short)]
    pub verbose: bool,
    /// File holding the authoritative version (defaults to setup.py, then pyproject.toml)
    pub input: Option<String>,
}
