use crate::rhi::resource::RootSignatureObject;
use crate::rhi::root_signature::RootSignatureDesc;

/// OpenGL has no binding layout object. The root signature keeps the description and
/// the uniform block binding points assigned to its uniform buffer ranges.
#[derive(Debug)]
pub struct GlRootSignature {
    desc: RootSignatureDesc,
    uniform_block_bindings: Vec<Vec<Option<u32>>>,
}

impl GlRootSignature {
    pub fn new(desc: &RootSignatureDesc) -> Self {
        GlRootSignature {
            desc: desc.clone(),
            uniform_block_bindings: desc.uniform_block_bindings(),
        }
    }

    /// Gets the uniform block binding point of a uniform buffer range.
    pub fn uniform_block_binding(&self, root_parameter_index: usize, range: usize) -> Option<u32> {
        self.uniform_block_bindings
            .get(root_parameter_index)
            .and_then(|v| v.get(range))
            .and_then(|v| *v)
    }
}

impl RootSignatureObject for GlRootSignature {
    fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }
}
