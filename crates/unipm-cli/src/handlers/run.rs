use unipm_core::PackageManager;
use unipm_error::Result;

pub struct RunHandler;

impl RunHandler {
    pub async fn handle(manager: &PackageManager, script: &str, args: &[String]) -> Result<()> {
        manager.run_script(script, args).await
    }
}
