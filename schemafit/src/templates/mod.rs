//! Template models and their registry.
//!
//! A template is a populated geometric model plus a name. Built-in
//! templates are zero-argument constructors compiled into the crate;
//! additional templates can be loaded from a directory of serialized
//! model JSON files without recompiling.

use std::path::Path;

use crate::geom::Schematic;

pub mod builtin;

/// Zero-argument constructor producing a fresh template model.
pub type TemplateFn = fn() -> Schematic;

/// A named template entry in the registry.
#[derive(Clone, Copy)]
pub struct Template {
    pub name: &'static str,
    pub build: TemplateFn,
}

impl Template {
    pub const fn new(name: &'static str, build: TemplateFn) -> Self {
        Self { name, build }
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template").field("name", &self.name).finish()
    }
}

/// Look up a built-in template by name.
pub fn find(name: &str) -> Option<Template> {
    builtin::all().into_iter().find(|t| t.name == name)
}

/// Load template models from a directory of JSON files. Returns the
/// successfully loaded models and any errors encountered; a bad file
/// never aborts the whole load.
pub fn load_templates_from_directory(dir: &Path) -> (Vec<(String, Schematic)>, Vec<String>) {
    let mut templates = Vec::new();
    let mut errors = Vec::new();

    if !dir.is_dir() {
        return (templates, errors);
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(format!("failed to read directory {dir:?}: {e}"));
            return (templates, errors);
        }
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    paths.sort();

    for path in paths {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("template")
            .to_string();
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Schematic>(&text) {
                Ok(model) => templates.push((name, model)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping bad template file");
                    errors.push(format!("{}: {e}", path.display()));
                }
            },
            Err(e) => errors.push(format!("{}: {e}", path.display())),
        }
    }

    (templates, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_are_unique() {
        let all = builtin::all();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn find_resolves_every_builtin() {
        for template in builtin::all() {
            assert!(find(template.name).is_some());
        }
    }

    #[test]
    fn missing_directory_loads_nothing() {
        let (templates, errors) =
            load_templates_from_directory(Path::new("/nonexistent/schemafit-templates"));
        assert!(templates.is_empty());
        assert!(errors.is_empty());
    }
}
