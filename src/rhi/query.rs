//! Asynchronous GPU queries.

use byteorder::{ByteOrder, LittleEndian};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum QueryType {
    /// Number of samples that passed the depth and stencil tests.
    Occlusion,
    /// Counters of every pipeline stage, see `PipelineStatisticsQueryResult`.
    PipelineStatistics,
    /// GPU time stamp in nanoseconds.
    Timestamp,
}

impl QueryType {
    /// The number of bytes of one result.
    pub fn result_size(self) -> usize {
        match self {
            QueryType::Occlusion | QueryType::Timestamp => 8,
            QueryType::PipelineStatistics => PipelineStatisticsQueryResult::SIZE,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct QueryControlFlags {
    /// The occlusion query counts the exact number of samples instead of any non-zero value.
    pub precise: bool,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct QueryResultFlags {
    /// Busy-waits until every requested result is available. There is no timeout.
    pub wait: bool,
}

/// The result layout of a pipeline statistics query, 11 little endian `u64`s in this order.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct PipelineStatisticsQueryResult {
    pub input_assembler_vertices: u64,
    pub input_assembler_primitives: u64,
    pub vertex_shader_invocations: u64,
    pub geometry_shader_invocations: u64,
    pub geometry_shader_primitives: u64,
    pub clipping_input_primitives: u64,
    pub clipping_output_primitives: u64,
    pub fragment_shader_invocations: u64,
    pub tessellation_control_shader_invocations: u64,
    pub tessellation_evaluation_shader_invocations: u64,
    pub compute_shader_invocations: u64,
}

impl PipelineStatisticsQueryResult {
    pub const COUNTERS: usize = 11;
    pub const SIZE: usize = Self::COUNTERS * 8;

    pub fn from_counters(v: &[u64; Self::COUNTERS]) -> Self {
        PipelineStatisticsQueryResult {
            input_assembler_vertices: v[0],
            input_assembler_primitives: v[1],
            vertex_shader_invocations: v[2],
            geometry_shader_invocations: v[3],
            geometry_shader_primitives: v[4],
            clipping_input_primitives: v[5],
            clipping_output_primitives: v[6],
            fragment_shader_invocations: v[7],
            tessellation_control_shader_invocations: v[8],
            tessellation_evaluation_shader_invocations: v[9],
            compute_shader_invocations: v[10],
        }
    }

    pub fn counters(&self) -> [u64; Self::COUNTERS] {
        [
            self.input_assembler_vertices,
            self.input_assembler_primitives,
            self.vertex_shader_invocations,
            self.geometry_shader_invocations,
            self.geometry_shader_primitives,
            self.clipping_input_primitives,
            self.clipping_output_primitives,
            self.fragment_shader_invocations,
            self.tessellation_control_shader_invocations,
            self.tessellation_evaluation_shader_invocations,
            self.compute_shader_invocations,
        ]
    }

    pub fn read(buf: &[u8]) -> Self {
        let mut v = [0; Self::COUNTERS];
        LittleEndian::read_u64_into(&buf[..Self::SIZE], &mut v);
        Self::from_counters(&v)
    }

    pub fn write(&self, buf: &mut [u8]) {
        LittleEndian::write_u64_into(&self.counters(), &mut buf[..Self::SIZE]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let mut v = PipelineStatisticsQueryResult::default();
        v.vertex_shader_invocations = 3;
        v.compute_shader_invocations = 7;

        let mut buf = [0; PipelineStatisticsQueryResult::SIZE];
        v.write(&mut buf);
        assert_eq!(buf[16], 3);
        assert_eq!(buf[80], 7);
        assert_eq!(PipelineStatisticsQueryResult::read(&buf), v);
        assert_eq!(QueryType::PipelineStatistics.result_size(), 88);
    }
}
