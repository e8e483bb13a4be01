//! TOML configuration loading.
//!
//! A configuration wires the built-in behavior library into a type
//! registry: user message kinds first, then behaviors (a native function
//! plus the kinds it listens for), then node types. The first type is the
//! default and must stay empty.

use std::path::Path;

use serde::Deserialize;
use voxide_common::FieldKind;
use voxide_engine::{EngineError, Field, TypeRegistry};

use crate::library::{Library, NativeHost};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("behavior '{behavior}' references unknown native function '{function}'")]
    UnknownFunction { behavior: String, function: String },

    #[error("behavior '{behavior}' listens for unknown message kind '{kind}'")]
    UnknownKind { behavior: String, kind: String },

    #[error("no types defined in configuration")]
    NoTypes,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    kinds: Vec<KindDecl>,
    #[serde(default)]
    behaviors: Vec<BehaviorDecl>,
    #[serde(default)]
    types: Vec<TypeDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KindDecl {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BehaviorDecl {
    name: String,
    #[serde(default)]
    listen: Vec<String>,
    run: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeDecl {
    name: String,
    #[serde(default)]
    fields: Vec<FieldDecl>,
    #[serde(default)]
    behaviors: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDecl {
    name: String,
    kind: FieldKindDecl,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FieldKindDecl {
    Integer,
    Direction,
    String,
}

impl From<FieldKindDecl> for FieldKind {
    fn from(decl: FieldKindDecl) -> Self {
        match decl {
            FieldKindDecl::Integer => FieldKind::Integer,
            FieldKindDecl::Direction => FieldKind::Direction,
            FieldKindDecl::String => FieldKind::Text,
        }
    }
}

/// Load a configuration file and bind it to the standard library.
pub fn load_path(path: &Path) -> Result<(TypeRegistry, NativeHost), ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_str(&text, Library::standard())
}

/// Load a configuration from text against a given library.
pub fn load_str(text: &str, library: Library) -> Result<(TypeRegistry, NativeHost), ConfigError> {
    let config: ConfigFile = toml::from_str(text)?;
    let mut registry = TypeRegistry::new();

    for kind in &config.kinds {
        registry.define_kind(&kind.name)?;
    }

    for behavior in &config.behaviors {
        let host_ref =
            library
                .find(&behavior.run)
                .ok_or_else(|| ConfigError::UnknownFunction {
                    behavior: behavior.name.clone(),
                    function: behavior.run.clone(),
                })?;

        let mut mask = 0;
        for kind_name in &behavior.listen {
            let id = registry
                .find_kind(kind_name)
                .ok_or_else(|| ConfigError::UnknownKind {
                    behavior: behavior.name.clone(),
                    kind: kind_name.clone(),
                })?;
            mask |= id;
        }

        registry.define_behavior(&behavior.name, mask, host_ref);
    }

    for type_decl in &config.types {
        let fields = type_decl
            .fields
            .iter()
            .map(|field| Field {
                name: field.name.clone(),
                kind: field.kind.into(),
            })
            .collect();
        registry.define_type(&type_decl.name, fields, &type_decl.behaviors)?;
    }

    if registry.type_count() == 0 {
        return Err(ConfigError::NoTypes);
    }

    tracing::info!(
        kinds = config.kinds.len(),
        behaviors = config.behaviors.len(),
        types = config.types.len(),
        "configuration loaded"
    );

    Ok((registry, NativeHost::new(library)))
}
