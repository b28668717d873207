//! Scaffold a site root.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(root: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing site in {}...", root.display());

    for dir in ["src", "templates", "static", "build"] {
        let path = root.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }

    let files = [
        ("templates/base.html", DEFAULT_TEMPLATE),
        ("src/index.md", DEFAULT_INDEX),
        ("static/style.css", DEFAULT_STYLE),
    ];

    for (relative, contents) in files {
        let path = root.join(relative);
        if path.exists() && !yes {
            tracing::warn!("{} already exists. Use --yes to overwrite.", relative);
            continue;
        }

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Created {}", relative);
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'quire build' to render the site into build/.");

    Ok(())
}

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title | default(slug) }}</title>
  <link rel="stylesheet" href="{{ static }}/style.css">
</head>
<body>
  <main>
    {{ content }}
  </main>
</body>
</html>
"#;

const DEFAULT_INDEX: &str = r#"---
title: Welcome
---

# Welcome

This page was rendered from `src/index.md` through `templates/base.html`.

Add more Markdown files under `src/`; subdirectories are mirrored into `build/`.
Pick a different layout per page with `template: <name>` in the front-matter.
"#;

const DEFAULT_STYLE: &str = r#"body {
  font-family: system-ui, -apple-system, sans-serif;
  line-height: 1.6;
  max-width: 42rem;
  margin: 2rem auto;
  padding: 0 1rem;
}
"#;
