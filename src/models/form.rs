//! Form hints for structured field scanning.
//!
//! A form lists the fields to look for on a document and the keywords that
//! identify it. Forms are loaded from TOML, YAML or JSON files.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading form definitions.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Failed to read form file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse form file {path}: {message}")]
    Parse { path: String, message: String },
}

/// How a field's scanned value should be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
}

/// A field to look for on a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Key used in the extracted data.
    pub name: String,
    /// Printed labels that precede the value. Defaults to the field name.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub kind: FieldKind,
}

impl FormField {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            labels: Vec::new(),
            kind,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }

    /// Labels to match, falling back to the field name.
    pub fn match_labels(&self) -> Vec<&str> {
        if self.labels.is_empty() {
            vec![self.name.as_str()]
        } else {
            self.labels.iter().map(|s| s.as_str()).collect()
        }
    }
}

/// A document form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Document type label written with the results (e.g. `W2`).
    pub name: String,
    /// Phrases whose presence identifies this form.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl Form {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_keyword(mut self, keyword: &str) -> Self {
        self.keywords.push(keyword.to_string());
        self
    }

    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    /// Load a form from a file, choosing the parser by extension.
    pub fn load(path: &Path) -> Result<Self, FormError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| FormError::Read {
            path: display.clone(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let parsed = match ext {
            "json" => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
            _ => toml::from_str(&contents).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| FormError::Parse {
            path: display,
            message,
        })
    }

    /// Count how many keywords appear in the text (case-insensitive).
    fn keyword_hits(&self, haystack: &str) -> usize {
        self.keywords
            .iter()
            .filter(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
            .count()
    }
}

/// Known forms, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    forms: BTreeMap<String, Form>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.toml`, `.json`, `.yaml` and `.yml` file in a directory.
    ///
    /// A missing directory yields an empty registry.
    pub fn load_dir(dir: &Path) -> Result<Self, FormError> {
        let mut registry = Self::new();
        if !dir.is_dir() {
            tracing::debug!("Forms directory {} not found", dir.display());
            return Ok(registry);
        }

        let entries = std::fs::read_dir(dir).map_err(|source| FormError::Read {
            path: dir.display().to_string(),
            source,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            let is_form_file = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e, "toml" | "json" | "yaml" | "yml"));
            if is_form_file {
                let form = Form::load(&path)?;
                tracing::debug!("Loaded form {} from {}", form.name, path.display());
                registry.insert(form);
            }
        }

        Ok(registry)
    }

    pub fn insert(&mut self, form: Form) {
        self.forms.insert(form.name.clone(), form);
    }

    /// Look up a form by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Form> {
        self.forms.get(name).or_else(|| {
            self.forms
                .values()
                .find(|f| f.name.eq_ignore_ascii_case(name))
        })
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Pick the form whose keywords best match the text lines.
    ///
    /// Ties go to the alphabetically first name. Returns `None` when no keyword matches.
    pub fn classify<S: AsRef<str>>(&self, lines: &[S]) -> Option<&Form> {
        let haystack = lines
            .iter()
            .map(|l| l.as_ref().to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");

        let mut best: Option<(&Form, usize)> = None;
        for form in self.forms.values() {
            let hits = form.keyword_hits(&haystack);
            if hits == 0 {
                continue;
            }
            match best {
                Some((_, best_hits)) if best_hits >= hits => {}
                _ => best = Some((form, hits)),
            }
        }
        best.map(|(form, _)| form)
    }
}
