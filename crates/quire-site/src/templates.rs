//! Template engine for rendering pages.

use std::collections::BTreeMap;
use std::path::Path;

use minijinja::{path_loader, Environment, Value};
use quire_markdown::Frontmatter;

/// Values exposed to a page template.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Converted HTML body
    pub content: &'a str,
    /// Relative path from the page to the output `static` directory
    pub static_path: &'a str,
    /// Source filename without extension
    pub slug: &'a str,
    /// Front-matter fields, merged last
    pub metadata: Option<&'a Frontmatter>,
}

impl PageContext<'_> {
    /// Build the template context.
    ///
    /// Metadata is merged after the computed fields, so a front-matter key
    /// named `content`, `static` or `slug` replaces the computed value.
    fn to_context(self) -> BTreeMap<String, Value> {
        let mut ctx = BTreeMap::new();

        ctx.insert(
            "content".to_string(),
            Value::from_safe_string(self.content.to_string()),
        );
        // Only `../` segments and the directory name, nothing to escape
        ctx.insert(
            "static".to_string(),
            Value::from_safe_string(self.static_path.to_string()),
        );
        ctx.insert("slug".to_string(), Value::from(self.slug));

        for (key, value) in self.metadata.into_iter().flatten() {
            ctx.insert(key.clone(), Value::from(value.as_str()));
        }

        ctx
    }
}

/// Template engine using minijinja, loading templates from a directory.
pub struct TemplateEngine {
    env: Environment<'static>,
    extension: String,
}

impl TemplateEngine {
    /// Create an engine that resolves template `name` to `<dir>/<name>.<extension>`.
    pub fn new(template_dir: impl AsRef<Path>, extension: &str) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(template_dir.as_ref()));

        Self {
            env,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// File name a template name resolves to.
    pub fn template_file(&self, name: &str) -> String {
        if self.extension.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", name, self.extension)
        }
    }

    /// Render a page using the named template.
    pub fn render_page(
        &self,
        template: &str,
        context: &PageContext<'_>,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(&self.template_file(template))?;

        tmpl.render(context.to_context())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn engine_with(templates: &[(&str, &str)]) -> (tempfile::TempDir, TemplateEngine) {
        let temp = tempdir().unwrap();
        for (name, source) in templates {
            fs::write(temp.path().join(name), source).unwrap();
        }
        let engine = TemplateEngine::new(temp.path(), "html");
        (temp, engine)
    }

    fn context<'a>(metadata: Option<&'a Frontmatter>) -> PageContext<'a> {
        PageContext {
            content: "<p>Hello world</p>",
            static_path: "../static",
            slug: "hello",
            metadata,
        }
    }

    #[test]
    fn renders_basic_page() {
        let (_temp, engine) = engine_with(&[(
            "base.html",
            "<link href=\"{{ static }}/style.css\">{{ slug }}:{{ content }}",
        )]);

        let html = engine.render_page("base", &context(None)).unwrap();

        assert_eq!(
            html,
            "<link href=\"../static/style.css\">hello:<p>Hello world</p>"
        );
    }

    #[test]
    fn exposes_metadata_fields() {
        let (_temp, engine) = engine_with(&[("base.html", "<title>{{ title }}</title>")]);
        let mut fm = Frontmatter::default();
        fm.insert("title", "Greetings");

        let html = engine.render_page("base", &context(Some(&fm))).unwrap();

        assert_eq!(html, "<title>Greetings</title>");
    }

    #[test]
    fn escapes_metadata_but_not_content() {
        let (_temp, engine) = engine_with(&[("base.html", "{{ title }}|{{ content }}")]);
        let mut fm = Frontmatter::default();
        fm.insert("title", "<b>bold</b>");

        let html = engine.render_page("base", &context(Some(&fm))).unwrap();

        assert!(html.starts_with("&lt;b&gt;bold"));
        assert!(!html.contains("<b>"));
        assert!(html.ends_with("|<p>Hello world</p>"));
    }

    #[test]
    fn metadata_shadows_computed_fields() {
        let (_temp, engine) =
            engine_with(&[("base.html", "{{ content }}|{{ slug }}|{{ static }}")]);
        let mut fm = Frontmatter::default();
        fm.insert("content", "from metadata");
        fm.insert("slug", "custom");

        let html = engine.render_page("base", &context(Some(&fm))).unwrap();

        assert_eq!(html, "from metadata|custom|../static");
    }

    #[test]
    fn supports_template_inheritance() {
        let (_temp, engine) = engine_with(&[
            ("base.html", "<main>{% block body %}{% endblock %}</main>"),
            (
                "post.html",
                "{% extends \"base.html\" %}{% block body %}{{ content }}{% endblock %}",
            ),
        ]);

        let html = engine.render_page("post", &context(None)).unwrap();

        assert_eq!(html, "<main><p>Hello world</p></main>");
    }

    #[test]
    fn missing_template_is_an_error() {
        let (_temp, engine) = engine_with(&[]);

        let err = engine.render_page("nope", &context(None)).unwrap_err();

        assert_eq!(err.kind(), minijinja::ErrorKind::TemplateNotFound);
    }

    #[test]
    fn resolves_template_file_names() {
        let temp = tempdir().unwrap();

        assert_eq!(
            TemplateEngine::new(temp.path(), ".html").template_file("base"),
            "base.html"
        );
        assert_eq!(
            TemplateEngine::new(temp.path(), "").template_file("base.j2"),
            "base.j2"
        );
    }
}
