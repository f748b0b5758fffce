//! Write a default config file.

use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    tokio::fs::write(config_path, DEFAULT_CONFIG)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    tracing::info!("Created {}", config_path.display());

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# sitebuild configuration

[paths]
# Output directory, deleted and recreated on every run
output_dir = "dist"

# Optional asset copied into the output directory
asset = "public/favicon.ico"

# File the build must produce, relative to output_dir
artifact = "index.html"

[commands]
# Override the package-manager commands as argv lists
# install = ["npm", "install"]
# build = ["npm", "run", "build"]
# preview = ["npm", "run", "preview"]

[preview]
# Address announced before the preview server starts
url = "http://localhost:5000"
"#;
