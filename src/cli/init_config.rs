use crate::models::{ToolsConfig, CONFIG_FILE};
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Write the built-in defaults to `prdops.toml` in `project_root`
pub fn run(project_root: &Path, force: bool) -> Result<()> {
    let path = project_root.join(CONFIG_FILE);

    if path.exists() && !force {
        println!(
            "{}",
            format!("⚠️  {} already exists", path.display()).yellow()
        );
        println!("   Run with --force to overwrite");
        return Ok(());
    }

    ToolsConfig::default().save(&path)?;
    println!("{}", format!("✅ Wrote {}", path.display()).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_defaults_and_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);

        run(temp_dir.path(), false).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[report]"));

        std::fs::write(&path, "# edited\n").unwrap();
        run(temp_dir.path(), false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");

        run(temp_dir.path(), true).unwrap();
        let loaded = ToolsConfig::load(Some(&path), temp_dir.path()).unwrap();
        assert_eq!(loaded.prd.render_dpi, 200);
    }
}
