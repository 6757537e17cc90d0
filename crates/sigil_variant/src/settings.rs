//! Variant manager configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sigil_core::Result;
use sigil_template::DEFAULT_MAX_PASSES;

/// Configuration for [`VariantManager`](crate::VariantManager).
///
/// Every field is optional in JSON; missing fields take their default.
///
/// ```rust,ignore
/// let settings = VariantSettings::from_json_str(r#"{ "shader_extension": "hlsl" }"#)?;
/// assert!(settings.resolve_includes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantSettings {
    /// Extension of the main stage templates, without the dot.
    pub shader_extension: String,

    /// Profile string forwarded to the compiler with every request.
    pub shader_profile: String,

    /// Expand `#include` lines of generated source before compiling.
    pub resolve_includes: bool,

    /// Fail a request on the first template syntax error instead of
    /// compiling whatever the template degraded to.
    pub strict_templates: bool,

    /// Keep the generating properties beside each cached program and compare
    /// them on every cache hit.
    pub verify_collisions: bool,

    /// Directory receiving every generated stage source, for inspection.
    pub debug_output: Option<PathBuf>,

    /// Prefix each debug source with the properties it was generated from,
    /// inside an `#if 0` block.
    pub debug_output_properties: bool,

    /// Bound on the re-scan loops of `@foreach`, `@property` and
    /// `@insertpiece`.
    pub max_expansion_passes: usize,
}

impl Default for VariantSettings {
    fn default() -> Self {
        Self {
            shader_extension: "glsl".to_string(),
            shader_profile: "glsl".to_string(),
            resolve_includes: true,
            strict_templates: false,
            verify_collisions: cfg!(debug_assertions),
            debug_output: None,
            debug_output_properties: true,
            max_expansion_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl VariantSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// File name of `stem`'s main template, e.g. `VertexShader_vs.glsl`.
    #[must_use]
    pub fn template_file(&self, stem: &str) -> String {
        format!("{stem}.{}", self.shader_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings =
            VariantSettings::from_json_str(r#"{ "shader_extension": "hlsl", "strict_templates": true }"#)
                .unwrap();
        assert_eq!(settings.shader_extension, "hlsl");
        assert!(settings.strict_templates);
        assert!(settings.resolve_includes);
        assert_eq!(settings.max_expansion_passes, DEFAULT_MAX_PASSES);
        assert_eq!(settings.template_file("PixelShader_ps"), "PixelShader_ps.hlsl");
    }

    #[test]
    fn test_invalid_json() {
        assert!(VariantSettings::from_json_str("{ shader_extension: }").is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let settings = VariantSettings {
            debug_output: Some(PathBuf::from("/tmp/sigil")),
            ..VariantSettings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(VariantSettings::from_json_str(&json).unwrap(), settings);
    }
}
