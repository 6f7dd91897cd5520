use unipm_core::PackageManager;
use unipm_error::Result;

pub struct RemoveHandler;

impl RemoveHandler {
    pub fn handle(manager: &PackageManager, packages: &[String]) -> Result<()> {
        manager.remove_dependencies(packages)?;
        unipm_logger::finish(&format!("Removed {}", packages.join(", ")));
        Ok(())
    }
}
