//! Scene-side inputs of variant selection.
//!
//! The variant manager reads renderables, lights and shadow setups through
//! the traits below. Plain descriptor structs implementing them are provided
//! for tools and tests.

use smallvec::SmallVec;

// ============================================================================
// Vertex layout
// ============================================================================

/// Meaning of a vertex element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexSemantic {
    Position,
    BlendWeights,
    BlendIndices,
    Normal,
    /// Per-vertex colour.
    Diffuse,
    Specular,
    TextureCoordinates,
    Binormal,
    Tangent,
}

/// Storage format of a vertex element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementType {
    Float1,
    Float2,
    Float3,
    Float4,
    Short1,
    Short2,
    Short3,
    Short4,
    UByte4,
    Colour,
}

impl VertexElementType {
    /// Number of components.
    #[must_use]
    pub const fn component_count(self) -> u8 {
        match self {
            Self::Float1 | Self::Short1 | Self::Colour => 1,
            Self::Float2 | Self::Short2 => 2,
            Self::Float3 | Self::Short3 => 3,
            Self::Float4 | Self::Short4 | Self::UByte4 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub semantic: VertexSemantic,
    pub element_type: VertexElementType,
    /// Set index for repeated semantics (UV sets).
    pub index: u16,
}

impl VertexElement {
    #[must_use]
    pub const fn new(semantic: VertexSemantic, element_type: VertexElementType, index: u16) -> Self {
        Self {
            semantic,
            element_type,
            index,
        }
    }
}

// ============================================================================
// Material parameters
// ============================================================================

/// String parameters bound by a material, looked up by exact key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialParams {
    entries: Vec<(String, String)>,
}

impl MaterialParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.binary_search_by(|(k, _)| k.as_str().cmp(&key)) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (key, value)),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| self.entries[idx].1.as_str())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Renderables
// ============================================================================

/// What the variant manager needs to know about a drawable object.
pub trait RenderableSource {
    /// More than one world transform means the mesh is skinned.
    fn num_world_transforms(&self) -> u16;

    fn vertex_elements(&self) -> &[VertexElement];

    fn material_params(&self) -> &MaterialParams;
}

/// Owned [`RenderableSource`] description.
#[derive(Debug, Clone, Default)]
pub struct RenderableDesc {
    pub num_world_transforms: u16,
    pub vertex_elements: Vec<VertexElement>,
    pub material_params: MaterialParams,
}

impl RenderableSource for RenderableDesc {
    fn num_world_transforms(&self) -> u16 {
        self.num_world_transforms
    }

    fn vertex_elements(&self) -> &[VertexElement] {
        &self.vertex_elements
    }

    fn material_params(&self) -> &MaterialParams {
        &self.material_params
    }
}

// ============================================================================
// Lights and shadows
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    Directional,
    Point,
    Spot,
}

pub type LightList = SmallVec<[LightType; 16]>;

/// The scene's global light list.
pub trait LightSource: Send + Sync {
    fn global_lights(&self) -> LightList;
}

impl LightSource for Vec<LightType> {
    fn global_lights(&self) -> LightList {
        self.iter().copied().collect()
    }
}

/// Shadow configuration of the pass being rendered.
pub trait ShadowNode {
    /// Lights that render into shadow maps, closest first.
    fn shadow_casting_lights(&self) -> &[LightType];

    /// Cascade split distances of the first light, when it uses PSSM.
    fn pssm_splits(&self) -> Option<&[f32]>;

    fn num_shadow_casting_lights(&self) -> usize {
        self.shadow_casting_lights().len()
    }
}

/// Owned [`ShadowNode`] description.
#[derive(Debug, Clone, Default)]
pub struct ShadowNodeDesc {
    pub casting_lights: Vec<LightType>,
    pub pssm_splits: Option<Vec<f32>>,
}

impl ShadowNode for ShadowNodeDesc {
    fn shadow_casting_lights(&self) -> &[LightType] {
        &self.casting_lights
    }

    fn pssm_splits(&self) -> Option<&[f32]> {
        self.pssm_splits.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_params_exact_lookup() {
        let params = MaterialParams::new()
            .with("diffuse_map", "rock.png")
            .with("alpha_test", "0.5");
        assert_eq!(params.get("diffuse_map"), Some("rock.png"));
        assert!(params.contains("alpha_test"));
        assert!(!params.contains("Diffuse_Map"));
        assert!(!params.contains("diffuse"));
    }

    #[test]
    fn test_material_params_overwrite() {
        let mut params = MaterialParams::new();
        params.set("normal_map", "a.png");
        params.set("normal_map", "b.png");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("normal_map"), Some("b.png"));
    }

    #[test]
    fn test_shadow_node_desc() {
        let node = ShadowNodeDesc {
            casting_lights: vec![LightType::Directional, LightType::Spot],
            pssm_splits: Some(vec![0.1, 10.0, 50.0]),
        };
        assert_eq!(node.num_shadow_casting_lights(), 2);
        assert_eq!(node.pssm_splits().map(<[f32]>::len), Some(3));
    }
}
