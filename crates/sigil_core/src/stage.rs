//! Programmable pipeline stages a variant can carry.

use std::fmt;

/// One of the five programmable shader stages.
///
/// The discriminant is the stage's slot in per-variant program arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex = 0,
    Pixel = 1,
    Geometry = 2,
    Hull = 3,
    Domain = 4,
}

impl ShaderStage {
    pub const COUNT: usize = 5;

    /// All stages in generation order.
    pub const ALL: [ShaderStage; Self::COUNT] = [
        ShaderStage::Vertex,
        ShaderStage::Pixel,
        ShaderStage::Geometry,
        ShaderStage::Hull,
        ShaderStage::Domain,
    ];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// File stem of the stage's main template (`VertexShader_vs`, ...).
    #[must_use]
    pub const fn template_stem(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VertexShader_vs",
            ShaderStage::Pixel => "PixelShader_ps",
            ShaderStage::Geometry => "GeometryShader_gs",
            ShaderStage::Hull => "HullShader_hs",
            ShaderStage::Domain => "DomainShader_ds",
        }
    }

    /// Lower-case substring identifying the stage's piece files.
    #[must_use]
    pub const fn piece_pattern(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "piece_vs",
            ShaderStage::Pixel => "piece_ps",
            ShaderStage::Geometry => "piece_gs",
            ShaderStage::Hull => "piece_hs",
            ShaderStage::Domain => "piece_ds",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Pixel => "pixel",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Hull => "hull",
            ShaderStage::Domain => "domain",
        };
        f.write_str(name)
    }
}
