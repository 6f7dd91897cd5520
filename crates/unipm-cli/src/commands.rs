use clap::{Parser, Subcommand};
use unipm_constants::{BIN_NAME, DESCRIPTION, VERSION};

#[derive(Parser)]
#[command(name = BIN_NAME)]
#[command(version = VERSION)]
#[command(about = DESCRIPTION, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Bypass detection and use this package manager (npm, pnpm, yarn1,
    /// yarn2, bun)
    #[arg(long = "pm", global = true, value_name = "NAME")]
    pub force_pm: Option<String>,
    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
    /// Print detection, retry and subprocess detail
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Installs all dependencies, or adds the given packages first
    #[command(aliases = ["i", "add"])]
    Install {
        /// Packages to add (e.g. react@18.2.0); empty installs everything
        #[arg()]
        packages: Vec<String>,
        /// Add as devDependency
        #[arg(short = 'D', long = "dev", alias = "save-dev")]
        dev: bool,
        /// Update package.json without running the underlying CLI
        #[arg(long = "skip-install")]
        skip_install: bool,
    },
    /// Removes packages from the nearest manifest declaring them
    #[command(aliases = ["rm", "uninstall"])]
    Remove {
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Lists installed packages, flagging duplicated versions
    #[command(alias = "ls")]
    List {
        /// Name patterns to match (`*` wildcards allowed)
        #[arg()]
        patterns: Vec<String>,
        /// Tree depth to query (defaults to a deep listing)
        #[arg(long)]
        depth: Option<u32>,
    },
    /// Resolves specifiers to fully versioned ones without installing
    Resolve {
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Runs a script defined in package.json
    #[command(alias = "r")]
    Run {
        /// The name of the script (e.g. build, test, etc.)
        script: String,
        /// Arguments forwarded to the script
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Prints the registry URL the detected package manager uses
    Registry,
}
