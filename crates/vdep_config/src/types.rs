//! Configuration types deserialized from `vdep.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::marker::PhantomData;
use std::str::FromStr;

/// The top-level project configuration parsed from `vdep.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Where and how virtual dependency artifacts are generated.
    #[serde(default, rename = "virtual")]
    pub virtual_deps: VirtualConfig,
    /// How the dependency closure is reported to the analyzer.
    #[serde(default)]
    pub dependencies: DependencyConfig,
    /// How stale artifacts are detected.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Core project metadata required in every `vdep.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// Settings for generated artifacts.
#[derive(Debug, Deserialize)]
pub struct VirtualConfig {
    /// Import-path namespace every virtual module lives under.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Destination root, relative to the project root.
    #[serde(default = "default_destination")]
    pub destination: String,
    /// File extension of generated artifacts.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// How the interface marker token is chosen.
    #[serde(default)]
    pub differentiator: DifferentiatorMode,
    /// Generic queryset type used when a descendant has no custom queryset.
    #[serde(default = "default_generic_queryset")]
    pub generic_queryset: String,
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            destination: default_destination(),
            extension: default_extension(),
            differentiator: DifferentiatorMode::default(),
            generic_queryset: default_generic_queryset(),
        }
    }
}

fn default_namespace() -> String {
    "__virtual_deps__".to_string()
}

fn default_destination() -> String {
    ".vdep".to_string()
}

fn default_extension() -> String {
    "py".to_string()
}

fn default_generic_queryset() -> String {
    "django.db.models.QuerySet".to_string()
}

/// Policy for the interface marker embedded in each artifact.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DifferentiatorMode {
    /// Derive the marker from the artifact's summary, so unchanged facts
    /// produce byte-identical artifacts across processes (default).
    #[default]
    Content,
    /// Pick a fresh marker once per process, forcing every regenerated
    /// artifact to look changed after a restart.
    PerProcess,
}

/// Settings for the dependency closure handed to the analyzer.
#[derive(Debug, Deserialize)]
pub struct DependencyConfig {
    /// Priority attached to every dependency the closure adds.
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Namespaces whose files never receive virtual dependencies.
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub engine_namespaces: Vec<String>,
    /// The project's settings module, if files should depend on it.
    #[serde(default)]
    pub settings_module: Option<String>,
    /// Imports that imply a dependency on the settings module.
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub settings_accessors: Vec<String>,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            engine_namespaces: Vec::new(),
            settings_module: None,
            settings_accessors: Vec::new(),
        }
    }
}

fn default_priority() -> i32 {
    10
}

/// Settings for deciding whether an on-disk artifact still describes a live module.
#[derive(Debug, Default, Deserialize)]
pub struct ResolverConfig {
    /// Source roots searched for a module named by an artifact's `mod` line.
    ///
    /// When empty, only modules present in the current pass count as live.
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub search_paths: Vec<String>,
}

/// Deserializes a field that can be either a single value or a list of values.
///
/// Allows TOML config to accept both `search_paths = "src"` (string) and
/// `search_paths = ["src", "lib"]` (array of strings).
fn deserialize_one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    struct OneOrMany<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for OneOrMany<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        type Value = Vec<T>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.parse().map_err(E::custom)?])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val.parse().map_err(de::Error::custom)?);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(OneOrMany(PhantomData))
}
