/// Static asset loading with an empty-scene fallback
use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::geometry::Mesh;
use crate::{glb, stl};

/// Container formats the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Glb,
    Stl,
}

impl ModelFormat {
    /// Guess the format from a file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "glb" => Some(Self::Glb),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    /// Identify the format from leading bytes
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if glb::is_glb(data) {
            Some(Self::Glb)
        } else if stl::is_ascii_stl(data) {
            Some(Self::Stl)
        } else {
            None
        }
    }
}

/// Parse model bytes, trusting the magic bytes over the hint
pub fn parse_model(data: &[u8], hint: Option<ModelFormat>) -> Result<Mesh, LoadError> {
    match ModelFormat::sniff(data).or(hint) {
        Some(ModelFormat::Glb) => glb::parse_glb(data),
        Some(ModelFormat::Stl) => stl::parse_stl(data),
        None => Err(LoadError::unsupported("unrecognized model format")),
    }
}

/// Read and parse a model file
pub fn load_model(path: impl AsRef<Path>) -> Result<Mesh, LoadError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_model(&data, ModelFormat::from_extension(path))?;
    log::info!(
        "loaded {} ({} triangles)",
        path.display(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Load a model, rendering nothing instead of failing
pub fn load_or_empty(path: impl AsRef<Path>) -> Mesh {
    let path = path.as_ref();
    match load_model(path) {
        Ok(mesh) => mesh,
        Err(err) => {
            log::warn!("{err}; showing an empty scene");
            Mesh::new()
        }
    }
}

/// Parse fetched bytes, rendering nothing instead of failing
pub fn parse_or_empty(data: &[u8], hint: Option<ModelFormat>) -> Mesh {
    parse_model(data, hint).unwrap_or_else(|err| {
        log::warn!("{err}; showing an empty scene");
        Mesh::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("orbview-loader-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ModelFormat::from_extension(Path::new("models/Sophos Logo.GLB")),
            Some(ModelFormat::Glb)
        );
        assert_eq!(ModelFormat::from_extension(Path::new("part.stl")), Some(ModelFormat::Stl));
        assert_eq!(ModelFormat::from_extension(Path::new("scene.obj")), None);
    }

    #[test]
    fn test_magic_bytes_win_over_hint() {
        let data = glb::tests::single_triangle_glb(r#"{"mesh": 0}"#);
        let mesh = parse_model(&data, Some(ModelFormat::Stl)).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_load_model_from_disk() {
        let path = scratch_file("triangle.stl", stl::tests::ASCII_TRIANGLE.as_bytes());
        assert_eq!(load_model(&path).unwrap().triangle_count(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_model("/definitely/not/here.glb").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_fallback_to_empty_mesh() {
        assert!(load_or_empty("/definitely/not/here.glb").is_empty());

        let garbage = scratch_file("garbage.glb", b"glTF\x02\x00\x00\x00garbage");
        assert!(load_or_empty(&garbage).is_empty());

        assert!(parse_or_empty(b"\x00\x01\x02", None).is_empty());
    }
}
