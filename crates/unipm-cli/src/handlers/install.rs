use unipm_core::{AddOptions, PackageManager};
use unipm_error::Result;

pub struct InstallHandler;

impl InstallHandler {
    pub async fn handle(
        manager: &PackageManager,
        packages: &[String],
        dev: bool,
        skip_install: bool,
    ) -> Result<()> {
        if packages.is_empty() {
            unipm_logger::status("Installing dependencies");
            manager.install_dependencies().await?;
            unipm_logger::finish("Dependencies installed");
            return Ok(());
        }

        let opts = AddOptions { dev, skip_install };
        manager.add_dependencies(&opts, packages).await?;
        if skip_install {
            unipm_logger::finish(&format!("Recorded {} in package.json", packages.join(", ")));
        } else {
            unipm_logger::finish(&format!("Added {}", packages.join(", ")));
        }
        Ok(())
    }
}
