//! The abstract binding layout shared by pipeline states and resource groups.

use crate::errors::*;

use super::resource::ResourceType;

/// The access kind of a descriptor range.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum DescriptorRangeType {
    /// Shader resource view, read-only textures and buffers.
    Srv,
    /// Unordered access view, read-write textures and buffers.
    Uav,
    /// Uniform buffer view.
    Ubv,
    Sampler,
}

/// The shader stages a binding is visible to.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ShaderVisibility {
    All,
    AllGraphics,
    Vertex,
    TessellationControl,
    TessellationEvaluation,
    Geometry,
    Fragment,
    Compute,
}

/// One abstract binding slot of a descriptor table.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct DescriptorRange {
    pub range_type: DescriptorRangeType,
    /// The abstract binding slot. It is the texture unit or the storage binding in
    /// OpenGL, and the descriptor set layout binding in Vulkan.
    pub base_shader_register: u32,
    pub register_space: u32,
    /// The name of the uniform or uniform block this range is resolved to in GLSL.
    pub base_shader_register_name: String,
    /// The type of resource this range expects.
    pub resource_type: ResourceType,
    pub visibility: ShaderVisibility,
}

impl DescriptorRange {
    pub fn new<T: Into<String>>(
        range_type: DescriptorRangeType,
        base_shader_register: u32,
        name: T,
        resource_type: ResourceType,
        visibility: ShaderVisibility,
    ) -> Self {
        DescriptorRange {
            range_type,
            base_shader_register,
            register_space: 0,
            base_shader_register_name: name.into(),
            resource_type,
            visibility,
        }
    }
}

/// A root parameter is a descriptor table, an ordered list of descriptor ranges. The
/// resources of a resource group align 1:1 by position with these ranges.
#[derive(Debug, Default, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct RootParameter {
    pub descriptor_table: Vec<DescriptorRange>,
}

impl RootParameter {
    pub fn new(descriptor_table: Vec<DescriptorRange>) -> Self {
        RootParameter { descriptor_table }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptor_table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptor_table.is_empty()
    }
}

/// The parameters of a root signature.
#[derive(Debug, Default, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct RootSignatureDesc {
    pub parameters: Vec<RootParameter>,
}

impl RootSignatureDesc {
    pub fn new(parameters: Vec<RootParameter>) -> Self {
        RootSignatureDesc { parameters }
    }

    pub fn validate(&self) -> Result<()> {
        for (i, parameter) in self.parameters.iter().enumerate() {
            for (j, range) in parameter.descriptor_table.iter().enumerate() {
                if !range.resource_type.is_compatible(range.range_type) {
                    return Err(Error::InvalidDescriptor(format!(
                        "range {} of root parameter {} declares {:?} as {:?}",
                        j, i, range.resource_type, range.range_type
                    ))
                    .into());
                }

                let duplicated = parameter.descriptor_table[..j].iter().any(|v| {
                    v.base_shader_register == range.base_shader_register
                        && v.register_space == range.register_space
                        && v.range_type == range.range_type
                });

                if duplicated {
                    return Err(Error::InvalidDescriptor(format!(
                        "root parameter {} binds register {} twice",
                        i, range.base_shader_register
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Assigns the uniform block binding indices. Every uniform buffer range gets the
    /// next value of a counter that runs across all the descriptor tables, the other
    /// ranges get `None`.
    pub fn uniform_block_bindings(&self) -> Vec<Vec<Option<u32>>> {
        let mut counter = 0;
        self.parameters
            .iter()
            .map(|parameter| {
                parameter
                    .descriptor_table
                    .iter()
                    .map(|range| {
                        if range.range_type == DescriptorRangeType::Ubv {
                            counter += 1;
                            Some(counter - 1)
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Iterates over all the ranges with their `(root_parameter_index, range_index)`.
    pub fn ranges(&self) -> impl Iterator<Item = (usize, usize, &DescriptorRange)> {
        self.parameters.iter().enumerate().flat_map(|(i, parameter)| {
            parameter
                .descriptor_table
                .iter()
                .enumerate()
                .map(move |(j, range)| (i, j, range))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(range_type: DescriptorRangeType, slot: u32, resource_type: ResourceType) -> DescriptorRange {
        DescriptorRange::new(range_type, slot, "x", resource_type, ShaderVisibility::All)
    }

    #[test]
    fn uniform_block_bindings() {
        use self::DescriptorRangeType::*;

        let desc = RootSignatureDesc::new(vec![
            RootParameter::new(vec![
                range(Ubv, 0, ResourceType::UniformBuffer),
                range(Srv, 0, ResourceType::Texture2D),
                range(Ubv, 1, ResourceType::UniformBuffer),
            ]),
            RootParameter::new(vec![
                range(Sampler, 0, ResourceType::SamplerState),
                range(Ubv, 0, ResourceType::UniformBuffer),
            ]),
        ]);

        assert!(desc.validate().is_ok());
        assert_eq!(
            desc.uniform_block_bindings(),
            vec![vec![Some(0), None, Some(1)], vec![None, Some(2)]]
        );
        assert_eq!(desc.ranges().count(), 5);
    }

    #[test]
    fn validate() {
        use self::DescriptorRangeType::*;

        let desc = RootSignatureDesc::new(vec![RootParameter::new(vec![range(
            Ubv,
            0,
            ResourceType::SamplerState,
        )])]);
        assert!(desc.validate().is_err());

        let desc = RootSignatureDesc::new(vec![RootParameter::new(vec![
            range(Srv, 1, ResourceType::Texture2D),
            range(Srv, 1, ResourceType::Texture3D),
        ])]);
        assert!(desc.validate().is_err());
    }
}
