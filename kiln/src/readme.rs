//! README generation for freshly created projects.

use kiln_manifest::Manifest;

const SCRIPT_DESCRIPTIONS: &[(&str, &str)] = &[
    ("serve", "Compiles and hot-reloads for development"),
    ("build", "Compiles and minifies for production"),
    ("test:unit", "Run your unit tests"),
    ("test:e2e", "Run your end-to-end tests"),
    ("lint", "Lints and fixes files"),
];

/// Render a README.md summarizing the project's npm scripts.
pub fn generate_readme(manifest: &Manifest) -> String {
    let name = manifest.name().unwrap_or("project");
    let mut out = format!("# {name}\n\n## Project setup\n```\nnpm install\n```\n");

    let Some(scripts) = manifest.scripts() else {
        return out;
    };
    for (script, _) in scripts {
        if script == "serve" || script == "build" || script.starts_with("test") || script == "lint"
        {
            let description = SCRIPT_DESCRIPTIONS
                .iter()
                .find(|(known, _)| known == script)
                .map(|(_, text)| *text)
                .unwrap_or("Run your tests");
            out.push_str(&format!(
                "\n### {description}\n```\nnpm run {script}\n```\n"
            ));
        }
    }
    out
}
