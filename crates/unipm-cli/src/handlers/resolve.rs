use unipm_core::PackageManager;
use unipm_error::Result;

pub struct ResolveHandler;

impl ResolveHandler {
    pub async fn handle(manager: &PackageManager, packages: &[String]) -> Result<()> {
        let versioned = manager.get_versioned_packages(packages).await?;
        for spec in versioned {
            println!("{spec}");
        }
        Ok(())
    }
}
