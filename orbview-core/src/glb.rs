/// Binary glTF 2.0 (GLB) reader producing a flattened triangle mesh
use nalgebra::{Matrix4, Point3, Quaternion, UnitQuaternion, Vector3};
use nom::{
    bytes::complete::{tag, take},
    number::complete::{le_f32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::LoadError;
use crate::geometry::{Mesh, Triangle, Vertex};

pub const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const MODE_TRIANGLES: u32 = 4;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

struct Chunk<'a> {
    kind: u32,
    data: &'a [u8],
}

fn header(input: &[u8]) -> IResult<&[u8], (u32, u32)> {
    let (input, _) = tag(&GLB_MAGIC[..])(input)?;
    tuple((le_u32, le_u32))(input)
}

fn chunk(input: &[u8]) -> IResult<&[u8], Chunk<'_>> {
    let (input, (length, kind)) = tuple((le_u32, le_u32))(input)?;
    let (input, data) = take(length)(input)?;
    Ok((input, Chunk { kind, data }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<SceneDef>,
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
    #[serde(default)]
    accessors: Vec<AccessorDef>,
    #[serde(default)]
    buffer_views: Vec<BufferViewDef>,
    #[serde(default)]
    buffers: Vec<BufferDef>,
    #[serde(default)]
    extensions_required: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SceneDef {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct NodeDef {
    mesh: Option<usize>,
    #[serde(default)]
    children: Vec<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

impl NodeDef {
    fn local_matrix(&self) -> Matrix4<f32> {
        if let Some(matrix) = &self.matrix {
            // glTF stores matrices column-major
            return Matrix4::from_column_slice(matrix);
        }
        let [tx, ty, tz] = self.translation.unwrap_or([0.0; 3]);
        let [qx, qy, qz, qw] = self.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]);
        let [sx, sy, sz] = self.scale.unwrap_or([1.0; 3]);
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz));
        Matrix4::new_translation(&Vector3::new(tx, ty, tz))
            * rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }
}

#[derive(Debug, Deserialize)]
struct MeshDef {
    #[serde(default)]
    primitives: Vec<PrimitiveDef>,
}

#[derive(Debug, Deserialize)]
struct PrimitiveDef {
    attributes: HashMap<String, usize>,
    indices: Option<usize>,
    mode: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
    sparse: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferDef {
    uri: Option<String>,
    byte_length: usize,
}

/// Check whether `data` starts with the GLB magic
pub fn is_glb(data: &[u8]) -> bool {
    data.starts_with(GLB_MAGIC)
}

/// Parse a GLB container into a single mesh in model space
pub fn parse_glb(data: &[u8]) -> Result<Mesh, LoadError> {
    let (rest, (version, length)) =
        header(data).map_err(|_| LoadError::malformed("missing GLB header"))?;
    if version != GLB_VERSION {
        return Err(LoadError::unsupported(format!("glTF container version {version}")));
    }
    let length = length as usize;
    if length > data.len() {
        return Err(LoadError::malformed(format!(
            "GLB declares {length} bytes but only {} are present",
            data.len()
        )));
    }
    let rest = &rest[..length.saturating_sub(12).min(rest.len())];

    let (rest, json) = chunk(rest).map_err(|_| LoadError::malformed("truncated JSON chunk"))?;
    if json.kind != CHUNK_JSON {
        return Err(LoadError::malformed("first GLB chunk is not JSON"));
    }
    let bin = match chunk(rest) {
        Ok((_, c)) if c.kind == CHUNK_BIN => c.data,
        Ok(_) | Err(_) if rest.is_empty() => &[][..],
        Ok(_) => return Err(LoadError::malformed("second GLB chunk is not BIN")),
        Err(_) => return Err(LoadError::malformed("truncated BIN chunk")),
    };

    let document: Document = serde_json::from_slice(json.data)?;
    build_mesh(&document, bin)
}

fn build_mesh(doc: &Document, bin: &[u8]) -> Result<Mesh, LoadError> {
    if let Some(ext) = doc.extensions_required.first() {
        return Err(LoadError::unsupported(format!("required extension {ext}")));
    }
    for (i, buffer) in doc.buffers.iter().enumerate() {
        if i > 0 || buffer.uri.is_some() {
            return Err(LoadError::unsupported("external buffers"));
        }
        if buffer.byte_length > bin.len() {
            return Err(LoadError::malformed("BIN chunk shorter than buffer 0"));
        }
    }

    let mut mesh = Mesh::new();

    let roots = match doc.scenes.get(doc.scene.unwrap_or(0)) {
        Some(scene) => scene.nodes.clone(),
        None if doc.scenes.is_empty() => {
            // No scene: every mesh at the origin
            for index in 0..doc.meshes.len() {
                mesh.extend(read_mesh(doc, bin, index)?);
            }
            return Ok(mesh);
        }
        None => return Err(LoadError::malformed("default scene index out of range")),
    };

    let mut stack: Vec<(usize, Matrix4<f32>, usize)> = roots
        .into_iter()
        .map(|node| (node, Matrix4::identity(), 0))
        .collect();
    while let Some((index, parent, depth)) = stack.pop() {
        if depth > doc.nodes.len() {
            return Err(LoadError::malformed("node hierarchy contains a cycle"));
        }
        let node = doc
            .nodes
            .get(index)
            .ok_or_else(|| LoadError::malformed(format!("node {index} out of range")))?;
        let world = parent * node.local_matrix();
        if let Some(mesh_index) = node.mesh {
            mesh.extend(read_mesh(doc, bin, mesh_index)?.transformed(&world));
        }
        stack.extend(node.children.iter().map(|&child| (child, world, depth + 1)));
    }

    Ok(mesh)
}

fn read_mesh(doc: &Document, bin: &[u8], index: usize) -> Result<Mesh, LoadError> {
    let def = doc
        .meshes
        .get(index)
        .ok_or_else(|| LoadError::malformed(format!("mesh {index} out of range")))?;

    let mut mesh = Mesh::new();
    for primitive in &def.primitives {
        let mode = primitive.mode.unwrap_or(MODE_TRIANGLES);
        if mode != MODE_TRIANGLES {
            return Err(LoadError::unsupported(format!("primitive mode {mode}")));
        }

        let position = *primitive
            .attributes
            .get("POSITION")
            .ok_or_else(|| LoadError::malformed("primitive without POSITION"))?;
        let positions = read_vec3(doc, bin, position)?;
        let normals = match primitive.attributes.get("NORMAL") {
            Some(&normal) => Some(read_vec3(doc, bin, normal)?),
            None => None,
        };
        if normals.as_ref().is_some_and(|n| n.len() != positions.len()) {
            return Err(LoadError::malformed("NORMAL count differs from POSITION"));
        }

        let indices = match primitive.indices {
            Some(accessor) => read_indices(doc, bin, accessor)?,
            None => (0..positions.len() as u32).collect(),
        };
        if indices.len() % 3 != 0 {
            return Err(LoadError::malformed("index count is not a multiple of 3"));
        }

        for face in indices.chunks_exact(3) {
            let vertex = |i: u32| -> Result<(Point3<f32>, Option<Vector3<f32>>), LoadError> {
                let i = i as usize;
                let p = positions
                    .get(i)
                    .ok_or_else(|| LoadError::malformed(format!("index {i} out of range")))?;
                Ok((Point3::from(*p), normals.as_ref().map(|n| n[i])))
            };
            let (p0, n0) = vertex(face[0])?;
            let (p1, n1) = vertex(face[1])?;
            let (p2, n2) = vertex(face[2])?;
            let triangle = match (n0, n1, n2) {
                (Some(n0), Some(n1), Some(n2)) => Triangle::new(
                    Vertex::from_parts(p0, n0),
                    Vertex::from_parts(p1, n1),
                    Vertex::from_parts(p2, n2),
                ),
                _ => Triangle::flat(p0, p1, p2),
            };
            mesh.add_triangle(triangle);
        }
    }
    Ok(mesh)
}

/// Byte slices for each element of an accessor, honouring the view stride
fn accessor_elements<'a>(
    doc: &Document,
    bin: &'a [u8],
    index: usize,
    element_size: usize,
) -> Result<Vec<&'a [u8]>, LoadError> {
    let accessor = accessor_def(doc, index)?;
    if accessor.sparse.is_some() {
        return Err(LoadError::unsupported("sparse accessors"));
    }
    let view_index = accessor
        .buffer_view
        .ok_or_else(|| LoadError::unsupported("accessor without buffer view"))?;
    let view = doc
        .buffer_views
        .get(view_index)
        .ok_or_else(|| LoadError::malformed(format!("buffer view {view_index} out of range")))?;
    if view.buffer != 0 {
        return Err(LoadError::unsupported("external buffers"));
    }

    let stride = view.byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(LoadError::malformed("byte stride smaller than element"));
    }
    let view_end = view
        .byte_offset
        .checked_add(view.byte_length)
        .filter(|&end| end <= bin.len())
        .ok_or_else(|| LoadError::malformed("buffer view exceeds BIN chunk"))?;
    let exceeds = || LoadError::malformed(format!("accessor {index} exceeds its view"));
    let start = view
        .byte_offset
        .checked_add(accessor.byte_offset)
        .ok_or_else(exceeds)?;

    (0..accessor.count)
        .map(|i| {
            let range = i
                .checked_mul(stride)
                .and_then(|step| start.checked_add(step))
                .and_then(|offset| Some(offset..offset.checked_add(element_size)?))
                .filter(|range| range.end <= view_end)
                .ok_or_else(exceeds)?;
            Ok(&bin[range])
        })
        .collect()
}

fn accessor_def(doc: &Document, index: usize) -> Result<&AccessorDef, LoadError> {
    doc.accessors
        .get(index)
        .ok_or_else(|| LoadError::malformed(format!("accessor {index} out of range")))
}

fn read_vec3(doc: &Document, bin: &[u8], index: usize) -> Result<Vec<Vector3<f32>>, LoadError> {
    let accessor = accessor_def(doc, index)?;
    if accessor.kind != "VEC3" || accessor.component_type != COMPONENT_F32 {
        return Err(LoadError::unsupported(format!(
            "vertex attribute {} of component type {}",
            accessor.kind, accessor.component_type
        )));
    }

    accessor_elements(doc, bin, index, 12)?
        .into_iter()
        .map(|bytes| {
            let (_, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(bytes)
                .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| {
                    LoadError::malformed("short vertex attribute")
                })?;
            Ok(Vector3::new(x, y, z))
        })
        .collect()
}

fn read_indices(doc: &Document, bin: &[u8], index: usize) -> Result<Vec<u32>, LoadError> {
    let accessor = accessor_def(doc, index)?;
    if accessor.kind != "SCALAR" {
        return Err(LoadError::malformed("index accessor is not SCALAR"));
    }
    let size = match accessor.component_type {
        COMPONENT_U8 => 1,
        COMPONENT_U16 => 2,
        COMPONENT_U32 => 4,
        other => return Err(LoadError::unsupported(format!("index component type {other}"))),
    };

    accessor_elements(doc, bin, index, size)?
        .into_iter()
        .map(|bytes| {
            let value = match size {
                1 => Ok(u32::from(bytes[0])),
                2 => le_u16(bytes).map(|(_, v)| u32::from(v)),
                _ => le_u32(bytes).map(|(_, v)| v),
            };
            value.map_err(|_: nom::Err<nom::error::Error<&[u8]>>| {
                LoadError::malformed("short index")
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn pad(mut bytes: Vec<u8>, fill: u8) -> Vec<u8> {
        while bytes.len() % 4 != 0 {
            bytes.push(fill);
        }
        bytes
    }

    /// Assemble a GLB from a JSON document and a BIN payload
    pub(crate) fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let json = pad(json.as_bytes().to_vec(), b' ');
        let bin = pad(bin.to_vec(), 0);
        let total = 12 + 8 + json.len() + if bin.is_empty() { 0 } else { 8 + bin.len() };

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(GLB_MAGIC);
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        if !bin.is_empty() {
            out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
            out.extend_from_slice(&bin);
        }
        out
    }

    fn triangle_bin() -> Vec<u8> {
        [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect()
    }

    pub(crate) fn single_triangle_glb(node: &str) -> Vec<u8> {
        let json = format!(
            r#"{{
                "asset": {{"version": "2.0"}},
                "scene": 0,
                "scenes": [{{"nodes": [0]}}],
                "nodes": [{node}],
                "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
                "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}}],
                "bufferViews": [{{"buffer": 0, "byteLength": 36}}],
                "buffers": [{{"byteLength": 36}}]
            }}"#
        );
        glb(&json, &triangle_bin())
    }

    #[test]
    fn test_single_triangle() {
        let mesh = parse_glb(&single_triangle_glb(r#"{"mesh": 0}"#)).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        let normal = mesh.triangles[0].calculate_normal();
        assert!((normal - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_node_translation_is_applied() {
        let mesh = parse_glb(&single_triangle_glb(
            r#"{"mesh": 0, "translation": [0.0, 5.0, 0.0], "scale": [2.0, 2.0, 2.0]}"#,
        ))
        .unwrap();
        let moved = mesh.triangles[0].vertices[1].position;
        assert!((moved - Point3::new(2.0, 5.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_indexed_u16_primitive() {
        let mut bin = triangle_bin();
        for i in [0u16, 1, 2, 2, 1, 0] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        let json = r#"{
            "asset": {"version": "2.0"},
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
                {"bufferView": 1, "componentType": 5123, "count": 6, "type": "SCALAR"}
            ],
            "bufferViews": [
                {"buffer": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 12}
            ],
            "buffers": [{"byteLength": 48}]
        }"#;
        let mesh = parse_glb(&glb(json, &bin)).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_rejects_bad_magic_and_version() {
        assert!(matches!(parse_glb(b"glTX????????"), Err(LoadError::Malformed(_))));

        let mut data = single_triangle_glb(r#"{"mesh": 0}"#);
        data[4..8].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(parse_glb(&data), Err(LoadError::Unsupported(_))));
    }

    #[test]
    fn test_rejects_truncated_container() {
        let data = single_triangle_glb(r#"{"mesh": 0}"#);
        let cut = &data[..data.len() - 10];
        assert!(matches!(parse_glb(cut), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_rejects_required_extensions() {
        let json = r#"{"asset": {"version": "2.0"}, "extensionsRequired": ["KHR_draco_mesh_compression"]}"#;
        assert!(matches!(parse_glb(&glb(json, &[])), Err(LoadError::Unsupported(_))));
    }

    #[test]
    fn test_rejects_node_cycles() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "scenes": [{"nodes": [0]}],
            "nodes": [{"children": [1]}, {"children": [0]}]
        }"#;
        assert!(matches!(parse_glb(&glb(json, &[])), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        assert!(matches!(parse_glb(&glb("{not json", &[])), Err(LoadError::Json(_))));
    }

    fn triangle_with_layout(accessor_offset: usize, stride: usize) -> Vec<u8> {
        let json = format!(
            r#"{{
                "asset": {{"version": "2.0"}},
                "scenes": [{{"nodes": [0]}}],
                "nodes": [{{"mesh": 0}}],
                "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
                "accessors": [{{"bufferView": 0, "byteOffset": {accessor_offset}, "componentType": 5126, "count": 3, "type": "VEC3"}}],
                "bufferViews": [{{"buffer": 0, "byteLength": 36, "byteStride": {stride}}}],
                "buffers": [{{"byteLength": 36}}]
            }}"#
        );
        glb(&json, &triangle_bin())
    }

    #[test]
    fn test_overflowing_accessor_layout_is_malformed() {
        let huge_offset = triangle_with_layout(usize::MAX, 12);
        assert!(matches!(parse_glb(&huge_offset), Err(LoadError::Malformed(_))));

        let huge_stride = triangle_with_layout(0, usize::MAX);
        assert!(matches!(parse_glb(&huge_stride), Err(LoadError::Malformed(_))));

        let past_view = triangle_with_layout(30, 12);
        assert!(matches!(parse_glb(&past_view), Err(LoadError::Malformed(_))));
    }
}
