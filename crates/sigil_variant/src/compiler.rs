//! Shader compiler capability.
//!
//! The variant manager never talks to a graphics API. It hands generated
//! source to a [`ShaderCompiler`] and stores whatever opaque
//! [`ProgramHandle`] comes back. One implementation exists per backend.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use sigil_core::{CompileError, ShaderStage};

/// Source handed to the compiler for one stage.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub stage: ShaderStage,
    /// Unique program name, `<final hash><stage template stem>`.
    pub name: &'a str,
    pub source: &'a str,
    /// Backend profile string from the settings (e.g. `"glsl"`).
    pub profile: &'a str,
}

/// Compiles one stage of generated source.
///
/// Called with the program cache locked, so implementations must not call
/// back into the [`VariantManager`](crate::VariantManager).
pub trait ShaderCompiler: Send + Sync {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<ProgramHandle, CompileError>;
}

impl<F> ShaderCompiler for F
where
    F: Fn(&CompileRequest<'_>) -> Result<ProgramHandle, CompileError> + Send + Sync,
{
    fn compile(&self, request: &CompileRequest<'_>) -> Result<ProgramHandle, CompileError> {
        self(request)
    }
}

/// Shared, type-erased handle to a compiled program owned by the backend.
///
/// Clones share the same program; equality is identity.
#[derive(Clone)]
pub struct ProgramHandle(Arc<dyn Any + Send + Sync>);

impl ProgramHandle {
    #[must_use]
    pub fn new<T: Any + Send + Sync>(program: T) -> Self {
        Self(Arc::new(program))
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ProgramHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ProgramHandle {}

impl fmt::Debug for ProgramHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProgramHandle")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_identity() {
        let a = ProgramHandle::new(7u32);
        let b = a.clone();
        let c = ProgramHandle::new(7u32);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<u32>(), Some(&7));
        assert!(a.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_closure_compiler() {
        let compiler = |req: &CompileRequest<'_>| {
            if req.source.is_empty() {
                Err(CompileError {
                    program: req.name.to_string(),
                    stage: req.stage,
                    message: "empty source".to_string(),
                })
            } else {
                Ok(ProgramHandle::new(req.source.len()))
            }
        };
        let request = CompileRequest {
            stage: ShaderStage::Vertex,
            name: "1VertexShader_vs",
            source: "void main() {}",
            profile: "glsl",
        };
        let handle = compiler.compile(&request).unwrap();
        assert_eq!(handle.downcast_ref::<usize>(), Some(&14));

        let empty = CompileRequest { source: "", ..request };
        assert!(compiler.compile(&empty).is_err());
    }
}
