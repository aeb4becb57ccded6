//! Binary record format for unfolded pieces.
//!
//! Every record starts with a little-endian `u16` version tag followed by
//! its fields in a fixed order, all little-endian:
//!
//! | Record | Fields |
//! |--------|--------|
//! | file   | version, `u64` piece count, pieces |
//! | piece  | version, `u32` name length, UTF-8 name, `u64` vertex/edge/face counts, vertices, edges, faces |
//! | vertex | version, `f64` x, `f64` y, `i64` id, `u8` pinned |
//! | edge   | version, `i64` v0, `i64` v1, `i64` face, `i64` twin face, `u8` hidden, `i64` id |
//! | face   | version, `i64` v0..v2, `i64` e0..e2, `i64` id |
//!
//! Optional references are stored as `-1` when absent. Reading rejects
//! unknown versions and references outside the piece.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Point2;

use crate::algo::unfold::{Piece, UnfoldedEdge, UnfoldedFace, UnfoldedVertex};
use crate::error::{MeshError, Result};

/// Current version of every record.
const VERSION: u16 = 1;

/// Save pieces to a file.
pub fn save<P: AsRef<Path>>(pieces: &[Piece], path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_pieces(&mut writer, pieces)?;
    writer.flush()?;
    Ok(())
}

/// Load pieces from a file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Piece>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_pieces(&mut BufReader::new(file), path)
}

/// Write pieces to a writer.
pub fn write_pieces<W: Write>(writer: &mut W, pieces: &[Piece]) -> Result<()> {
    let mut enc = Encoder { writer };
    enc.u16(VERSION)?;
    enc.u64(pieces.len() as u64)?;

    for piece in pieces {
        enc.u16(VERSION)?;
        enc.u32(piece.name.len() as u32)?;
        enc.bytes(piece.name.as_bytes())?;
        enc.u64(piece.vertices.len() as u64)?;
        enc.u64(piece.edges.len() as u64)?;
        enc.u64(piece.faces.len() as u64)?;

        for v in &piece.vertices {
            enc.u16(VERSION)?;
            enc.f64(v.position.x)?;
            enc.f64(v.position.y)?;
            enc.id(v.id)?;
            enc.flag(v.pinned)?;
        }
        for e in &piece.edges {
            enc.u16(VERSION)?;
            enc.id(Some(e.vertices[0]))?;
            enc.id(Some(e.vertices[1]))?;
            enc.id(Some(e.face))?;
            enc.id(e.twin_face)?;
            enc.flag(e.hidden)?;
            enc.id(e.id)?;
        }
        for f in &piece.faces {
            enc.u16(VERSION)?;
            for &v in &f.vertices {
                enc.id(Some(v))?;
            }
            for &e in &f.edges {
                enc.id(Some(e))?;
            }
            enc.id(f.id)?;
        }
    }
    Ok(())
}

/// Read pieces from a reader. `path` is only used in error messages.
pub fn read_pieces<R: Read>(reader: &mut R, path: &Path) -> Result<Vec<Piece>> {
    let mut dec = Decoder { reader, path };
    dec.version("file")?;
    let count = dec.count()?;

    let mut pieces = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        pieces.push(dec.piece()?);
    }
    Ok(pieces)
}

struct Encoder<'a, W: Write> {
    writer: &'a mut W,
}

impl<W: Write> Encoder<'_, W> {
    fn bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        Ok(())
    }

    fn u16(&mut self, value: u16) -> Result<()> {
        self.bytes(&value.to_le_bytes())
    }

    fn u32(&mut self, value: u32) -> Result<()> {
        self.bytes(&value.to_le_bytes())
    }

    fn u64(&mut self, value: u64) -> Result<()> {
        self.bytes(&value.to_le_bytes())
    }

    fn f64(&mut self, value: f64) -> Result<()> {
        self.bytes(&value.to_le_bytes())
    }

    fn id(&mut self, value: Option<usize>) -> Result<()> {
        let raw = value.map_or(-1, |v| v as i64);
        self.bytes(&raw.to_le_bytes())
    }

    fn flag(&mut self, value: bool) -> Result<()> {
        self.bytes(&[value as u8])
    }
}

struct Decoder<'a, R: Read> {
    reader: &'a mut R,
    path: &'a Path,
}

impl<R: Read> Decoder<'_, R> {
    fn error(&self, message: String) -> MeshError {
        MeshError::LoadError {
            path: self.path.to_path_buf(),
            message,
        }
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                self.error("unexpected end of data".to_string())
            } else {
                MeshError::Io(e)
            }
        })
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    fn count(&mut self) -> Result<usize> {
        let raw = u64::from_le_bytes(self.array()?);
        usize::try_from(raw).map_err(|_| self.error(format!("count {} too large", raw)))
    }

    fn version(&mut self, record: &str) -> Result<()> {
        let version = self.u16()?;
        if version != VERSION {
            return Err(self.error(format!("unknown {} record version {}", record, version)));
        }
        Ok(())
    }

    fn id(&mut self) -> Result<Option<usize>> {
        let raw = i64::from_le_bytes(self.array()?);
        match raw {
            -1 => Ok(None),
            r if r >= 0 => Ok(Some(r as usize)),
            r => Err(self.error(format!("invalid reference {}", r))),
        }
    }

    /// A reference that must be present and below `bound`.
    fn index(&mut self, bound: usize, what: &str) -> Result<usize> {
        match self.id()? {
            Some(i) if i < bound => Ok(i),
            other => Err(self.error(format!("{} reference {:?} out of range", what, other))),
        }
    }

    fn flag(&mut self) -> Result<bool> {
        match self.array::<1>()?[0] {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(self.error(format!("invalid flag byte {}", b))),
        }
    }

    fn piece(&mut self) -> Result<Piece> {
        self.version("piece")?;
        let name_len = self.u32()? as usize;
        let mut name = vec![0u8; name_len];
        self.fill(&mut name)?;
        let name = String::from_utf8(name).map_err(|e| self.error(format!("piece name: {}", e)))?;

        let n_vertices = self.count()?;
        let n_edges = self.count()?;
        let n_faces = self.count()?;

        let mut vertices = Vec::with_capacity(n_vertices.min(1 << 16));
        for _ in 0..n_vertices {
            self.version("vertex")?;
            let x = self.f64()?;
            let y = self.f64()?;
            vertices.push(UnfoldedVertex {
                position: Point2::new(x, y),
                id: self.id()?,
                pinned: self.flag()?,
            });
        }

        let mut edges = Vec::with_capacity(n_edges.min(1 << 16));
        for _ in 0..n_edges {
            self.version("edge")?;
            let v0 = self.index(n_vertices, "vertex")?;
            let v1 = self.index(n_vertices, "vertex")?;
            let face = self.index(n_faces, "face")?;
            let twin_face = match self.id()? {
                Some(f) if f >= n_faces => {
                    return Err(self.error(format!("face reference {} out of range", f)));
                }
                twin => twin,
            };
            edges.push(UnfoldedEdge {
                vertices: [v0, v1],
                face,
                twin_face,
                hidden: self.flag()?,
                id: self.id()?,
            });
        }

        let mut faces = Vec::with_capacity(n_faces.min(1 << 16));
        for _ in 0..n_faces {
            self.version("face")?;
            let mut face_vertices = [0; 3];
            for v in &mut face_vertices {
                *v = self.index(n_vertices, "vertex")?;
            }
            let mut face_edges = [0; 3];
            for e in &mut face_edges {
                *e = self.index(n_edges, "edge")?;
            }
            faces.push(UnfoldedFace {
                vertices: face_vertices,
                edges: face_edges,
                id: self.id()?,
            });
        }

        Ok(Piece {
            name,
            vertices,
            edges,
            faces,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::unfold::{unfold, UnfoldOptions};
    use crate::mesh::{triangulate, PolygonMesh};
    use nalgebra::Point3;
    use std::io::Cursor;

    fn sample_pieces() -> Vec<Piece> {
        // An L-shaped pair of quads, one of them tilted
        let polygons = PolygonMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(2.0, 0.0, 0.4),
                Point3::new(2.0, 1.0, 0.4),
            ],
            vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]],
        );
        let mesh = triangulate(&polygons).unwrap();
        unfold(&mesh, &UnfoldOptions::default()).unwrap()
    }

    fn decode(bytes: Vec<u8>) -> Result<Vec<Piece>> {
        read_pieces(&mut Cursor::new(bytes), Path::new("test.pieces"))
    }

    #[test]
    fn test_round_trip() {
        let pieces = sample_pieces();
        let mut bytes = Vec::new();
        write_pieces(&mut bytes, &pieces).unwrap();

        let decoded = decode(bytes).unwrap();
        assert_eq!(decoded, pieces);
        assert!(decoded[0].edges.iter().any(|e| e.hidden && e.id.is_none()));
    }

    #[test]
    fn test_header_layout() {
        let mut bytes = Vec::new();
        write_pieces(&mut bytes, &sample_pieces()).unwrap();

        assert_eq!(&bytes[0..2], &VERSION.to_le_bytes());
        assert_eq!(&bytes[2..10], &1u64.to_le_bytes());
        assert_eq!(&bytes[10..12], &VERSION.to_le_bytes());
        assert_eq!(&bytes[12..16], &8u32.to_le_bytes());
        assert_eq!(&bytes[16..24], b"Piece #1");
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = Vec::new();
        write_pieces(&mut bytes, &sample_pieces()).unwrap();
        bytes[10..12].copy_from_slice(&7u16.to_le_bytes());

        let result = decode(bytes);
        assert!(matches!(result, Err(MeshError::LoadError { ref message, .. }) if message.contains("version 7")));
    }

    #[test]
    fn test_truncated_data_rejected() {
        let mut bytes = Vec::new();
        write_pieces(&mut bytes, &sample_pieces()).unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(decode(bytes), Err(MeshError::LoadError { .. })));
    }

    #[test]
    fn test_empty_collection() {
        let mut bytes = Vec::new();
        write_pieces(&mut bytes, &[]).unwrap();
        assert_eq!(bytes.len(), 10);
        assert!(decode(bytes).unwrap().is_empty());
    }
}
