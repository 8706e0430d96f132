//! Check command - validate configuration and views without fetching

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, bail};
use entrypress_core::{Config, ContentTypeConfig, PathSpec};
use entrypress_generator::{
    Collection, TemplateRegistry,
    template::{is_partial, listing_output},
};

use crate::project_root;

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates the configuration and views. Makes no network calls.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and views");

    let mut result = ValidationResult::default();
    let root = project_root(config_path);

    println!("Checking configuration...");
    let config = match Config::load_with_env(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            Some(c)
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e}"));
            println!("  ✗ Configuration invalid: {e}");
            None
        }
    };

    if let Some(ref cfg) = config {
        println!("\nChecking views...");
        let templates = check_views(cfg, root, &mut result);

        println!("\nChecking content types...");
        check_content_types(cfg, templates.as_ref(), &mut result);

        check_output_dir(cfg, root, &mut result);
    }

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Load every view; reports syntax errors.
fn check_views(config: &Config, root: &Path, result: &mut ValidationResult) -> Option<TemplateRegistry> {
    let dir = root.join(&config.build.views_dir);
    match TemplateRegistry::load_dir(&dir) {
        Ok(templates) => {
            let listing: Vec<_> = templates.views().filter(|v| !is_partial(v)).collect();
            println!("  ✓ {} views loaded from {}", templates.views().count(), dir.display());
            for view in &listing {
                println!("    {view} → {}", listing_output(view).display());
            }
            Some(templates)
        }
        Err(e) => {
            result.add_error(format!("Views error: {e}"));
            println!("  ✗ {e}");
            None
        }
    }
}

/// Report each content type's locals name and page settings.
fn check_content_types(
    config: &Config,
    templates: Option<&TemplateRegistry>,
    result: &mut ValidationResult,
) {
    let Ok(content_types) = config.content_types() else {
        return;
    };

    let mut rendered_views = 0;
    if let Some(templates) = templates {
        rendered_views = templates.views().filter(|v| !is_partial(v)).count();
    }
    let mut single_views = 0;

    for ct in &content_types {
        let name = ct.name.as_deref().unwrap_or("(from content type name)");
        println!("  • {} → {name}", ct.id);

        if let Err(e) = Collection::from_config(ct) {
            result.add_error(format!("content type `{}`: {e}", ct.id));
            continue;
        }

        match &ct.template {
            Some(template) => {
                println!("      pages: {template} at {}", describe_path(ct));
                if let Some(templates) = templates {
                    match templates.resolve(template) {
                        Some(resolved) if !is_partial(&resolved) => single_views += 1,
                        Some(_) => {}
                        None => result.add_error(format!(
                            "content type `{}`: view `{template}` not found",
                            ct.id
                        )),
                    }
                }
            }
            None if ct.path.is_some() => result.add_warning(format!(
                "content type `{}`: `path` has no effect without `template`",
                ct.id
            )),
            None => {}
        }

        if let Some(write) = &ct.write {
            println!("      json: {write}");
        }
    }

    if templates.is_some() && rendered_views <= single_views {
        result.add_warning("no listing views; only entry pages will be rendered");
    }
}

fn describe_path(ct: &ContentTypeConfig) -> String {
    match &ct.path {
        Some(PathSpec::One(pattern)) => pattern.clone(),
        Some(PathSpec::Many(patterns)) => patterns.join(", "),
        None => "<name>/<display field slug>.html".to_string(),
    }
}

fn check_output_dir(config: &Config, root: &Path, result: &mut ValidationResult) {
    let output = resolved(&root.join(&config.build.output_dir));
    let views = resolved(&root.join(&config.build.views_dir));

    if output.exists() && !output.is_dir() {
        result.add_error(format!(
            "Output path exists but is not a directory: {}",
            output.display()
        ));
    }
    if views.starts_with(&output) {
        result.add_error(format!(
            "views directory {} is inside the output directory, which is cleaned on build",
            views.display()
        ));
    }
    if resolved(root).starts_with(&output) {
        result.add_error(format!(
            "output directory {} contains the project root",
            output.display()
        ));
    }
}

/// Resolve `..` and symlinks for paths that exist.
fn resolved(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
