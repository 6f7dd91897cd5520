pub mod commands;
pub mod handlers;

use anyhow::Result;
use clap::Parser;

use commands::{Cli, Commands};
use handlers::{
    InstallHandler, ListHandler, RegistryHandler, RemoveHandler, ResolveHandler, RunHandler,
};
use unipm_backend::PackageManagerKind;
use unipm_core::{Catalog, FactoryOptions, PackageManagerFactory};

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    unipm_logger::init_logger(cli.quiet, cli.verbose);

    let force = match &cli.force_pm {
        Some(name) => Some(
            name.parse::<PackageManagerKind>()
                .map_err(|err| anyhow::anyhow!(err))?,
        ),
        None => None,
    };
    let factory = PackageManagerFactory::new(Catalog::default());
    let manager = factory.get(&FactoryOptions {
        force,
        ..FactoryOptions::default()
    })?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match &cli.command {
            Commands::Install {
                packages,
                dev,
                skip_install,
            } => InstallHandler::handle(&manager, packages, *dev, *skip_install).await,
            Commands::Remove { packages } => RemoveHandler::handle(&manager, packages),
            Commands::List { patterns, depth } => {
                ListHandler::handle(&manager, patterns, *depth).await
            }
            Commands::Resolve { packages } => ResolveHandler::handle(&manager, packages).await,
            Commands::Run { script, args } => RunHandler::handle(&manager, script, args).await,
            Commands::Registry => RegistryHandler::handle(&manager).await,
        }
    })?;

    Ok(())
}
