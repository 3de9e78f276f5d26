use std::io::{BufRead, Read, Write};

use thiserror::Error;
use tracing::debug;

use crate::model::GeometryModel;

/// Token opening a self-describing textual geometry archive.
pub const TEXT_ARCHIVE_TOKEN: &str = "TextOutArchive";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive parse error: {0}")]
    Parse(String),

    #[error("cannot save geometry - no writer available for this format")]
    SaveUnavailable,
}

/// A registered geometry file format. `load` returns `None` when the
/// leading token is not one of its own, letting the registry try the
/// next format.
pub trait GeometryFormat {
    fn name(&self) -> &str;

    fn load(
        &self,
        token: &str,
        input: &mut dyn BufRead,
    ) -> Option<Result<GeometryModel, ArchiveError>>;

    fn save(&self, _geo: &GeometryModel, _out: &mut dyn Write) -> Result<(), ArchiveError> {
        Err(ArchiveError::SaveUnavailable)
    }
}

/// Ordered set of geometry formats tried when loading a mesh file.
#[derive(Default)]
pub struct GeometryRegistry {
    formats: Vec<Box<dyn GeometryFormat>>,
}

impl GeometryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, format: Box<dyn GeometryFormat>) {
        self.formats.push(format);
    }

    /// Load the geometry section of a mesh file. The first token selects
    /// the format: `TextOutArchive` introduces a length-prefixed
    /// self-describing payload; any other token is offered to the
    /// registered formats in order. Returns `Ok(None)` when nobody
    /// recognizes the token.
    pub fn load_from_mesh_file(
        &self,
        input: &mut dyn BufRead,
    ) -> Result<Option<GeometryModel>, ArchiveError> {
        let Some(token) = read_token(input)? else {
            return Ok(None);
        };

        if token == TEXT_ARCHIVE_TOKEN {
            return load_text_archive(input).map(Some);
        }

        for format in &self.formats {
            if let Some(result) = format.load(&token, input) {
                debug!(format = format.name(), "geometry format matched");
                return result.map(Some);
            }
        }
        Ok(None)
    }

    /// Save through the named format; fails with `SaveUnavailable` when
    /// the format is unknown or carries no writer.
    pub fn save(
        &self,
        geo: &GeometryModel,
        format_name: &str,
        out: &mut dyn Write,
    ) -> Result<(), ArchiveError> {
        for format in &self.formats {
            if format.name() == format_name {
                return format.save(geo, out);
            }
        }
        Err(ArchiveError::SaveUnavailable)
    }
}

/// Read the length-prefixed payload following a `TextOutArchive` token.
pub fn load_text_archive(input: &mut dyn BufRead) -> Result<GeometryModel, ArchiveError> {
    let Some(len_token) = read_token(input)? else {
        return Err(ArchiveError::Parse("missing archive length".into()));
    };
    let len: usize = len_token
        .parse()
        .map_err(|_| ArchiveError::Parse(format!("bad archive length '{len_token}'")))?;

    // the token reader consumed the separator; the payload follows directly
    let mut payload = vec![0u8; len];
    input.read_exact(&mut payload)?;
    serde_json::from_slice(&payload).map_err(|e| ArchiveError::Parse(e.to_string()))
}

/// Write a geometry as a `TextOutArchive` section.
pub fn save_text_archive(geo: &GeometryModel, out: &mut dyn Write) -> Result<(), ArchiveError> {
    let payload = serde_json::to_string(geo).map_err(|e| ArchiveError::Parse(e.to_string()))?;
    write!(out, "{} {}\n{}", TEXT_ARCHIVE_TOKEN, payload.len(), payload)?;
    Ok(())
}

/// Read the next whitespace-delimited token, or `None` at end of input.
fn read_token(input: &mut dyn BufRead) -> Result<Option<String>, ArchiveError> {
    let mut token = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte)? {
            0 => {
                if token.is_empty() {
                    return Ok(None);
                }
                break;
            }
            _ => {
                if byte[0].is_ascii_whitespace() {
                    if token.is_empty() {
                        continue;
                    }
                    break;
                }
                token.push(byte[0]);
            }
        }
    }
    String::from_utf8(token)
        .map(Some)
        .map_err(|e| ArchiveError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{Curve, Line3d};
    use crate::point::Point3d;
    use crate::shapes::{EdgeShape, VertexShape};
    use std::io::Cursor;

    fn line_model() -> GeometryModel {
        let mut model = GeometryModel::new();
        let a = Point3d::ORIGIN;
        let b = Point3d::new(2.0, 0.0, 0.0);
        model.vertices.push(VertexShape::new(a));
        model.vertices.push(VertexShape::new(b));
        model
            .edges
            .push(EdgeShape::new(Curve::Line(Line3d::new(a, b)), 0, 1));
        model.update_bounding_box();
        model
    }

    #[test]
    fn test_text_archive_roundtrip() {
        let model = line_model();
        let mut buf = Vec::new();
        save_text_archive(&model, &mut buf).unwrap();

        let registry = GeometryRegistry::new();
        let loaded = registry
            .load_from_mesh_file(&mut Cursor::new(buf))
            .unwrap()
            .expect("archive token recognized");
        assert_eq!(loaded.vertices.len(), 2);
        assert_eq!(loaded.edges.len(), 1);
        assert!((loaded.bounding_box.diam() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_token_is_none() {
        let registry = GeometryRegistry::new();
        let mut input = Cursor::new(b"SomeOtherFormat 1 2 3".to_vec());
        let loaded = registry.load_from_mesh_file(&mut input).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_without_writer_fails() {
        struct ReadOnly;
        impl GeometryFormat for ReadOnly {
            fn name(&self) -> &str {
                "read-only"
            }
            fn load(
                &self,
                _token: &str,
                _input: &mut dyn BufRead,
            ) -> Option<Result<GeometryModel, ArchiveError>> {
                None
            }
        }
        let mut registry = GeometryRegistry::new();
        registry.register(Box::new(ReadOnly));
        let model = line_model();
        let mut out = Vec::new();
        let err = registry.save(&model, "read-only", &mut out).unwrap_err();
        assert!(matches!(err, ArchiveError::SaveUnavailable));
    }
}
