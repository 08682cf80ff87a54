/// STL file parser for binary and ASCII formats
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::many0,
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::LoadError;
use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, LoadError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(LoadError::malformed("file too small to be a valid STL"));
    }

    let (mut input, triangle_count) = preceded(take(HEADER_LEN), le_u32)(data)
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| LoadError::malformed("bad STL header"))?;
    let triangle_count = triangle_count as usize;

    // Validate the declared count before allocating for it
    if input.len() < triangle_count.saturating_mul(FACET_LEN) {
        return Err(LoadError::malformed(format!(
            "STL declares {triangle_count} facets but is truncated"
        )));
    }

    let mut mesh = Mesh::with_capacity(triangle_count);
    for _ in 0..triangle_count {
        let (rest, triangle) = binary_facet(input)
            .map_err(|_| LoadError::malformed("unexpected end of file"))?;
        mesh.add_triangle(triangle);
        input = rest;
    }

    Ok(mesh)
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = binary_vector(input)?;
    let (input, (v0, v1, v2)) = tuple((binary_vector, binary_vector, binary_vector))(input)?;
    // Attribute byte count, unused
    let (input, _) = le_u16(input)?;
    Ok((input, facet(normal, [v0, v1, v2])))
}

/// Build a triangle, recomputing the normal when the file leaves it zeroed
fn facet(normal: (f32, f32, f32), corners: [(f32, f32, f32); 3]) -> Triangle {
    let [p0, p1, p2] = corners.map(|(x, y, z)| Point3::new(x, y, z));
    let normal = Vector3::new(normal.0, normal.1, normal.2);
    if normal.norm_squared() <= f32::EPSILON {
        return Triangle::flat(p0, p1, p2);
    }
    Triangle::new(
        Vertex::from_parts(p0, normal),
        Vertex::from_parts(p1, normal),
        Vertex::from_parts(p2, normal),
    )
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, LoadError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(LoadError::malformed(format!("failed to parse ASCII STL: {e:?}"))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }

    Ok((input, mesh))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, facet(normal, [v1, v2, v3])))
}

fn parse_vertex(input: &str) -> IResult<&str, (f32, f32, f32)> {
    preceded(preceded(multispace0, tag("vertex")), parse_vector3)(input)
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Check whether `data` looks like an STL file of either flavour
pub fn is_ascii_stl(data: &[u8]) -> bool {
    data.len() > 5 && &data[0..5] == b"solid"
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, LoadError> {
    // Binary files may also start with "solid" in their header
    if is_ascii_stl(data) {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const ASCII_TRIANGLE: &str = "solid demo
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid demo
";

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn test_parse_binary_facet_with_zero_normal() {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&1u32.to_le_bytes());
        for value in [0.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&0u16.to_le_bytes());

        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!((mesh.triangles[0].vertices[0].normal - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_binary_count_beyond_data_is_rejected() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&1_000_000u32.to_le_bytes());
        assert!(matches!(parse_binary_stl(&data), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_parse_ascii_named_solid() {
        let mesh = parse_stl(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!((mesh.triangles[0].vertices[2].position - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-6);
    }
}
