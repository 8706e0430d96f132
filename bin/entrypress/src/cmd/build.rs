//! Build command - fetches entries and generates the site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use entrypress_client::{ContentSource, DeliveryClient, StaticSource};
use entrypress_core::Config;
use entrypress_generator::Builder;

use crate::project_root;

/// Run the build command.
///
/// Loads the config (with `ENTRYPRESS__*` overrides), fetches every content
/// type from the API or from an offline dump, and writes the site.
pub async fn run(
    config_path: &Path,
    output: Option<&Path>,
    offline: Option<&Path>,
    preview: bool,
) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, ?offline, preview, "Starting build");

    let mut config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    if preview {
        tracing::info!("Using the preview API from CLI");
        config.contentful.preview = true;
    }
    tracing::debug!(?config, "Loaded configuration");

    let mut builder = Builder::from_config(&config, project_root(config_path))
        .wrap_err("Failed to set up build")?;
    if let Some(dir) = output {
        builder = builder.with_output_dir(dir);
    }

    let source: Box<dyn ContentSource> = match offline {
        Some(dump) => Box::new(
            StaticSource::from_file(dump).wrap_err("Failed to load offline content dump")?,
        ),
        None => Box::new(
            DeliveryClient::new(&config.contentful).wrap_err("Failed to create API client")?,
        ),
    };

    let stats = builder
        .build(source.as_ref())
        .await
        .wrap_err("Build failed")?;

    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Entries:       {}", stats.entries);
    println!("  Entry pages:   {}", stats.entry_pages);
    println!("  Listing pages: {}", stats.listing_pages);
    println!("  JSON files:    {}", stats.json_files);
    println!();
    println!("  Duration:      {:.2}s", duration.as_secs_f64());
    println!("  Output:        {}", builder.output_dir().display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[tokio::test]
    async fn test_offline_build() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join("entrypress.toml"),
            r#"
[contentful]
access_token = "token"
space_id = "space"

[[content_types]]
id = "blogPost"
template = "post"
write = "posts.json"
"#,
        )
        .unwrap();
        fs::create_dir_all(root.path().join("views")).unwrap();
        fs::write(
            root.path().join("views/index.hbs"),
            "{{#each blog_posts}}<a href=\"{{_url}}\">{{title}}</a>{{/each}}",
        )
        .unwrap();
        fs::write(root.path().join("views/post.hbs"), "<h1>{{entry.title}}</h1>").unwrap();
        let dump = root.path().join("dump.json");
        fs::write(
            &dump,
            r#"{"content_types":[{"id":"blogPost","name":"Blog Post","displayField":"title",
                "entries":[{"sys":{"id":"1"},"fields":{"title":"Real Talk"}}]}]}"#,
        )
        .unwrap();

        run(&root.path().join("entrypress.toml"), None, Some(&dump), false)
            .await
            .unwrap();

        let public = root.path().join("public");
        assert!(
            fs::read_to_string(public.join("index.html"))
                .unwrap()
                .contains("/blog_posts/real-talk.html")
        );
        assert_eq!(
            fs::read_to_string(public.join("blog_posts/real-talk.html")).unwrap(),
            "<h1>Real Talk</h1>"
        );
        assert!(public.join("posts.json").exists());
    }

    #[tokio::test]
    async fn test_missing_config() {
        let root = tempfile::tempdir().unwrap();
        let err = run(&root.path().join("entrypress.toml"), None, None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }
}
