//! Binary data packing for glTF buffers.

use serde_json::{Value, json};

const COMPONENT_U16: u32 = 5123;
const COMPONENT_F32: u32 = 5126;

/// Accumulates one binary buffer plus the matching bufferViews and accessors
#[derive(Default)]
pub(crate) struct BufferBuilder {
    pub data: Vec<u8>,
    pub views: Vec<Value>,
    pub accessors: Vec<Value>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// f32 accessor with per-component min/max; `N` selects SCALAR / VEC2 / VEC3 / VEC4
    pub fn f32s<const N: usize>(&mut self, values: &[[f32; N]]) -> usize
    where
        [f32; N]: bytemuck::Pod,
    {
        let mut min = [f32::INFINITY; N];
        let mut max = [f32::NEG_INFINITY; N];
        for value in values {
            for i in 0..N {
                min[i] = min[i].min(value[i]);
                max[i] = max[i].max(value[i]);
            }
        }
        let bounds = (min.to_vec(), max.to_vec());
        self.push(
            bytemuck::cast_slice(values),
            COMPONENT_F32,
            values.len(),
            type_name(N),
            Some(bounds),
        )
    }

    /// Scalar f32 accessor (animation times)
    pub fn times(&mut self, values: &[f32]) -> usize {
        let wrapped: Vec<[f32; 1]> = values.iter().map(|&v| [v]).collect();
        self.f32s(&wrapped)
    }

    /// u16 accessor (indices, joints)
    pub fn u16s<const N: usize>(&mut self, values: &[[u16; N]]) -> usize
    where
        [u16; N]: bytemuck::Pod,
    {
        self.push(
            bytemuck::cast_slice(values),
            COMPONENT_U16,
            values.len(),
            type_name(N),
            None,
        )
    }

    fn push(
        &mut self,
        bytes: &[u8],
        component_type: u32,
        count: usize,
        type_: &str,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> usize {
        // Align every view to 4 bytes
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);

        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));

        let mut accessor = json!({
            "bufferView": self.views.len() - 1,
            "componentType": component_type,
            "count": count,
            "type": type_,
        });
        if let Some((min, max)) = bounds {
            accessor["min"] = json!(min);
            accessor["max"] = json!(max);
        }
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }
}

fn type_name(components: usize) -> &'static str {
    match components {
        1 => "SCALAR",
        2 => "VEC2",
        3 => "VEC3",
        4 => "VEC4",
        _ => panic!("unsupported component count {components}"),
    }
}
