//! Model & effort resolution
//!
//! Maps public (Anthropic-style) model identifiers to backend Codex models
//! and a reasoning-effort tier. Resolution never fails: unknown identifiers
//! land on the default backend model, and unknown backend models land on
//! the middle effort tier.
//!
//! Per-family overrides come in as an explicitly constructed
//! [`ModelOverrides`] value (built by `config.rs` from the environment)
//! rather than being read from ambient process state here, so the resolver
//! stays a pure function that tests can drive directly.

/// Default backend model for unmapped public identifiers
pub const DEFAULT_BACKEND_MODEL: &str = "gpt-5.2-codex";

/// Public model id -> backend model id
const MODEL_TABLE: &[(&str, &str)] = &[
    ("claude-sonnet-4-20250514", "gpt-5.2-codex"),
    ("claude-3-5-sonnet-20241022", "gpt-5.2-codex"),
    ("claude-3-haiku-20240307", "gpt-5.3-codex-spark"),
    ("claude-3-opus-20240229", "gpt-5.3-codex-xhigh"),
];

/// Backend model id -> reasoning effort tier
const EFFORT_TABLE: &[(&str, &str)] = &[
    ("gpt-5.3-codex", "high"),
    ("gpt-5.3-codex-spark", "low"),
    ("gpt-5.3-codex-medium", "medium"),
    ("gpt-5.3-codex-low", "low"),
    ("gpt-5.3-codex-xhigh", "xhigh"),
    ("gpt-5.2-codex", "high"),
    ("gpt-5.2-codex-medium", "medium"),
    ("gpt-5.2-codex-low", "low"),
    ("gpt-5.2-codex-xhigh", "xhigh"),
    ("gpt-5.1-codex", "high"),
    ("gpt-5.1-codex-max", "xhigh"),
    ("gpt-5.1-codex-mini", "medium"),
];

const DEFAULT_EFFORT: &str = "medium";

/// Coarse model family, detected by substring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFamily {
    Haiku,
    Sonnet,
    Opus,
}

fn model_family(model: &str) -> Option<ModelFamily> {
    let m = model.to_lowercase();
    if m.contains("haiku") {
        Some(ModelFamily::Haiku)
    } else if m.contains("opus") {
        Some(ModelFamily::Opus)
    } else if m.contains("sonnet") {
        Some(ModelFamily::Sonnet)
    } else {
        None
    }
}

/// Per-family backend model overrides
///
/// An override is honored only when non-blank and a member of the known
/// backend model set; anything else falls through to the static table.
#[derive(Debug, Clone, Default)]
pub struct ModelOverrides {
    pub haiku: Option<String>,
    pub sonnet: Option<String>,
    pub opus: Option<String>,
}

impl ModelOverrides {
    fn for_family(&self, family: ModelFamily) -> Option<&str> {
        let raw = match family {
            ModelFamily::Haiku => self.haiku.as_deref(),
            ModelFamily::Sonnet => self.sonnet.as_deref(),
            ModelFamily::Opus => self.opus.as_deref(),
        }?;

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if !is_known_backend_model(trimmed) {
            tracing::warn!(
                "Ignoring model override {:?}: not a supported backend model",
                trimmed
            );
            return None;
        }
        Some(trimmed)
    }
}

fn is_known_backend_model(model: &str) -> bool {
    EFFORT_TABLE.iter().any(|(m, _)| *m == model)
}

/// Resolved backend model plus its reasoning-effort tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub model: String,
    pub effort: String,
}

/// Resolves public model identifiers to backend models and effort tiers
#[derive(Debug, Clone, Default)]
pub struct ModelResolver {
    overrides: ModelOverrides,
}

impl ModelResolver {
    pub fn new(overrides: ModelOverrides) -> Self {
        Self { overrides }
    }

    /// Resolve a public model identifier. Always succeeds.
    pub fn resolve(&self, public_model: &str) -> ResolvedModel {
        let backend_model = self.backend_model_for(public_model);
        let effort = effort_for(&backend_model);

        tracing::debug!(
            "Resolved model {} -> {} (effort={})",
            public_model,
            backend_model,
            effort
        );

        ResolvedModel {
            model: backend_model,
            effort: effort.to_string(),
        }
    }

    fn backend_model_for(&self, public_model: &str) -> String {
        if let Some(family) = model_family(public_model) {
            if let Some(override_model) = self.overrides.for_family(family) {
                return override_model.to_string();
            }
        }

        MODEL_TABLE
            .iter()
            .find(|(public, _)| *public == public_model)
            .map(|(_, backend)| (*backend).to_string())
            .unwrap_or_else(|| DEFAULT_BACKEND_MODEL.to_string())
    }
}

fn effort_for(backend_model: &str) -> &'static str {
    EFFORT_TABLE
        .iter()
        .find(|(m, _)| *m == backend_model)
        .map(|(_, effort)| *effort)
        .unwrap_or(DEFAULT_EFFORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_entries_resolve() {
        let resolver = ModelResolver::default();

        let resolved = resolver.resolve("claude-3-opus-20240229");
        assert_eq!(resolved.model, "gpt-5.3-codex-xhigh");
        assert_eq!(resolved.effort, "xhigh");

        let resolved = resolver.resolve("claude-3-haiku-20240307");
        assert_eq!(resolved.model, "gpt-5.3-codex-spark");
        assert_eq!(resolved.effort, "low");
    }

    #[test]
    fn test_unknown_model_falls_back_to_default() {
        let resolver = ModelResolver::default();

        let resolved = resolver.resolve("some-model-nobody-knows");
        assert_eq!(resolved.model, DEFAULT_BACKEND_MODEL);
        assert_eq!(resolved.effort, "high");
    }

    #[test]
    fn test_override_applies_to_family() {
        let resolver = ModelResolver::new(ModelOverrides {
            sonnet: Some("gpt-5.2-codex-low".to_string()),
            ..Default::default()
        });

        // Any sonnet-family identifier picks up the override, even one
        // absent from the static table
        let resolved = resolver.resolve("claude-sonnet-4-5-20250929");
        assert_eq!(resolved.model, "gpt-5.2-codex-low");
        assert_eq!(resolved.effort, "low");
    }

    #[test]
    fn test_unsupported_override_is_ignored() {
        let resolver = ModelResolver::new(ModelOverrides {
            opus: Some("gpt-9000-unreleased".to_string()),
            ..Default::default()
        });

        let resolved = resolver.resolve("claude-3-opus-20240229");
        assert_eq!(resolved.model, "gpt-5.3-codex-xhigh");
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let resolver = ModelResolver::new(ModelOverrides {
            haiku: Some("   ".to_string()),
            ..Default::default()
        });

        let resolved = resolver.resolve("claude-3-haiku-20240307");
        assert_eq!(resolved.model, "gpt-5.3-codex-spark");
    }

    #[test]
    fn test_family_detection_is_case_insensitive() {
        let resolver = ModelResolver::new(ModelOverrides {
            opus: Some("gpt-5.1-codex-max".to_string()),
            ..Default::default()
        });

        let resolved = resolver.resolve("Claude-OPUS-experimental");
        assert_eq!(resolved.model, "gpt-5.1-codex-max");
        assert_eq!(resolved.effort, "xhigh");
    }

    #[test]
    fn test_unknown_backend_model_gets_middle_effort() {
        assert_eq!(effort_for("gpt-never-heard-of-it"), "medium");
    }
}
