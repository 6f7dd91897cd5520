use unipm_core::PackageManager;
use unipm_error::Result;

pub struct RegistryHandler;

impl RegistryHandler {
    pub async fn handle(manager: &PackageManager) -> Result<()> {
        match manager.get_registry_url().await {
            Some(url) => println!("{url}"),
            None => unipm_logger::warn("No registry configured"),
        }
        Ok(())
    }
}
