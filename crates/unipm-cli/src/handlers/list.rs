use owo_colors::OwoColorize;

use unipm_backend::InstallationMetadata;
use unipm_core::PackageManager;
use unipm_error::Result;

pub struct ListHandler;

impl ListHandler {
    pub async fn handle(
        manager: &PackageManager,
        patterns: &[String],
        depth: Option<u32>,
    ) -> Result<()> {
        let metadata = match depth {
            Some(depth) => manager.find_installations_at(patterns, depth).await,
            None => manager.find_installations(patterns).await,
        };
        match metadata {
            Some(meta) => Self::print(&meta),
            None => unipm_logger::warn("Could not query the installed dependency tree"),
        }
        Ok(())
    }

    fn print(meta: &InstallationMetadata) {
        for (name, records) in &meta.dependencies {
            for record in records {
                if record.location.is_empty() {
                    println!("{} {}", name.bold(), record.version);
                } else {
                    println!(
                        "{} {} {}",
                        name.bold(),
                        record.version,
                        record.location.dimmed()
                    );
                }
            }
        }

        if !meta.duplicated_dependencies.is_empty() {
            println!();
            for (name, versions) in &meta.duplicated_dependencies {
                println!(
                    "{} {} is installed as {}",
                    "duplicate".yellow().bold(),
                    name.bold(),
                    versions.join(", ")
                );
            }
            println!(
                "{}",
                format!(
                    "Inspect with `{}`, deduplicate with `{}`",
                    meta.info_command, meta.dedupe_command
                )
                .dimmed()
            );
        }
    }
}
