use colored::*;
use std::{fs, path::PathBuf};

use crate::config::CONFIG_FILE;

pub fn init_config(force: bool) -> Result<(), String> {
    let config_path = PathBuf::from(CONFIG_FILE);

    if config_path.exists() && !force {
        return Err(format!(
            "{} already exists. Use --force to overwrite.",
            CONFIG_FILE
        ));
    }

    let template = r#"# pkgdocs Configuration File

# Documentation server the index is fetched from
base_url = "http://localhost:8080"

# Path of the package index on that server.
# Set base_url = "" to use this as a URL or a local file path on its own,
# e.g. index_path = "./shortcuts.json" (gzip-compressed files work too)
index_path = "/resources/shortcuts.json"

# Give up on the index fetch after this many seconds
timeout_secs = 30

# Syntax-highlight type documentation
highlight = true

# syntect theme used for highlighting
theme = "base16-ocean.dark"
"#;

    fs::write(&config_path, template)
        .map_err(|e| format!("Failed to create {}: {}", CONFIG_FILE, e))?;

    println!("{} Created {}", "✅".green(), CONFIG_FILE);
    println!("\n{}", "Configuration file created with defaults:".cyan());
    println!("  {} base_url = \"http://localhost:8080\"", "•".blue());
    println!("  {} index_path = \"/resources/shortcuts.json\"", "•".blue());
    println!("  {} timeout_secs = 30", "•".blue());
    println!("  {} highlight = true", "•".blue());
    println!(
        "\n{}",
        format!("Edit {} to point at your documentation index.", CONFIG_FILE).cyan()
    );

    Ok(())
}
