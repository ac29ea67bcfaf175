//! Legacy VTK polydata reader
//!
//! Reads the surfaces FreeSurfer-style pipelines export as `lh.vtk` /
//! `rh.vtk`. Supported:
//!
//! - `ASCII` and `BINARY` (big-endian) encodings
//! - file versions up to 4.2 (`POLYGONS n size` with inline counts) and
//!   5.x (`OFFSETS` / `CONNECTIVITY` arrays)
//! - `POINTS` as `float` or `double`
//! - `POLYGONS` (fan-triangulated) and `TRIANGLE_STRIPS`
//!
//! `VERTICES` and `LINES` are skipped. Parsing stops at the first attribute
//! section (`POINT_DATA`, `CELL_DATA`, `FIELD`).

use std::path::Path;

use super::SurfaceMesh;
use crate::error::MeshError;
use crate::math::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Encoding {
    Ascii,
    Binary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DataType {
    Float32,
    Float64,
    Int32,
    Int64,
}

impl DataType {
    fn parse(name: &str) -> Result<Self, MeshError> {
        match name {
            "float" | "vtktypefloat32" => Ok(Self::Float32),
            "double" | "vtktypefloat64" => Ok(Self::Float64),
            "int" | "vtkIdType" | "vtktypeint32" => Ok(Self::Int32),
            "vtktypeint64" => Ok(Self::Int64),
            other => Err(MeshError::UnsupportedType(other.to_string())),
        }
    }

    fn width(self) -> usize {
        match self {
            Self::Float32 | Self::Int32 => 4,
            Self::Float64 | Self::Int64 => 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellKind {
    Polygons,
    Strips,
    Ignored,
}

/// Byte cursor over a VTK file
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Next line without its terminator
    fn line(&mut self) -> Option<String> {
        if self.at_end() {
            return None;
        }
        let rest = &self.bytes[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());
        let text = String::from_utf8_lossy(&rest[..end]);
        Some(text.trim_end_matches('\r').to_string())
    }

    /// Advance past the current line terminator
    fn finish_line(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
    }

    /// Next whitespace-delimited token
    fn token(&mut self) -> Option<&'a str> {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(u8::is_ascii_whitespace)
        {
            self.pos += 1;
        }
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).ok()
    }

    fn expect_token(&mut self, what: &'static str) -> Result<&'a str, MeshError> {
        self.token().ok_or(MeshError::UnexpectedEof(what))
    }

    fn number<T: std::str::FromStr>(&mut self, what: &'static str) -> Result<T, MeshError> {
        let offset = self.pos;
        let token = self.expect_token(what)?;
        token.parse().map_err(|_| MeshError::Malformed {
            offset,
            expected: what,
            found: token.to_string(),
        })
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], MeshError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(MeshError::UnexpectedEof(what))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn values(
        &mut self,
        encoding: Encoding,
        ty: DataType,
        count: usize,
        what: &'static str,
    ) -> Result<Vec<f64>, MeshError> {
        match encoding {
            Encoding::Ascii => (0..count).map(|_| self.number::<f64>(what)).collect(),
            Encoding::Binary => {
                self.finish_line();
                let width = ty.width();
                let len = count.checked_mul(width).ok_or(MeshError::UnexpectedEof(what))?;
                let raw = self.take(len, what)?;
                Ok(raw.chunks_exact(width).map(|c| decode_be(ty, c)).collect())
            }
        }
    }

    fn integers(
        &mut self,
        encoding: Encoding,
        ty: DataType,
        count: usize,
        what: &'static str,
    ) -> Result<Vec<i64>, MeshError> {
        match encoding {
            Encoding::Ascii => (0..count).map(|_| self.number::<i64>(what)).collect(),
            #[allow(clippy::cast_possible_truncation)]
            Encoding::Binary => Ok(self
                .values(encoding, ty, count, what)?
                .into_iter()
                .map(|v| v as i64)
                .collect()),
        }
    }
}

fn decode_be(ty: DataType, chunk: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf[..chunk.len()].copy_from_slice(chunk);
    match ty {
        DataType::Float32 => f64::from(f32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])),
        DataType::Float64 => f64::from_be_bytes(buf),
        DataType::Int32 => f64::from(i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])),
        #[allow(clippy::cast_precision_loss)]
        DataType::Int64 => i64::from_be_bytes(buf) as f64,
    }
}

fn parse_version(header: &str) -> Result<(u32, u32), MeshError> {
    let invalid = || MeshError::InvalidHeader {
        reason: format!("unexpected first line '{header}'"),
    };
    let lower = header.to_ascii_lowercase();
    if !lower.starts_with("# vtk datafile version") {
        return Err(invalid());
    }
    let version = header.split_whitespace().last().ok_or_else(invalid)?;
    let (major, minor) = version.split_once('.').unwrap_or((version, "0"));
    Ok((
        major.parse().map_err(|_| invalid())?,
        minor.parse().map_err(|_| invalid())?,
    ))
}

/// Parse a legacy VTK polydata file from memory.
///
/// # Errors
///
/// Returns [`MeshError`] for anything other than well-formed polydata with
/// at least one polygon.
pub fn read_vtk(bytes: &[u8]) -> Result<SurfaceMesh, MeshError> {
    let mut reader = Reader::new(bytes);

    let header = reader.line().ok_or(MeshError::UnexpectedEof("header"))?;
    let (major, _minor) = parse_version(&header)?;
    let title = reader.line().ok_or(MeshError::UnexpectedEof("title"))?;
    tracing::debug!("VTK v{major} '{}'", title.trim());

    let encoding = match reader.expect_token("encoding")?.to_ascii_uppercase().as_str() {
        "ASCII" => Encoding::Ascii,
        "BINARY" => Encoding::Binary,
        other => {
            return Err(MeshError::InvalidHeader {
                reason: format!("unknown encoding '{other}'"),
            })
        }
    };

    let keyword = reader.expect_token("DATASET")?;
    if !keyword.eq_ignore_ascii_case("DATASET") {
        return Err(MeshError::InvalidHeader {
            reason: format!("expected DATASET, found '{keyword}'"),
        });
    }
    let dataset = reader.expect_token("dataset type")?;
    if !dataset.eq_ignore_ascii_case("POLYDATA") {
        return Err(MeshError::UnsupportedDataset(dataset.to_string()));
    }

    let mut points: Vec<Vec3> = Vec::new();
    let mut triangles: Vec<[u32; 3]> = Vec::new();

    while let Some(section) = reader.token() {
        match section.to_ascii_uppercase().as_str() {
            "POINTS" => {
                let count: usize = reader.number("point count")?;
                let ty = DataType::parse(reader.expect_token("point type")?)?;
                let scalars = count.checked_mul(3).ok_or(MeshError::UnexpectedEof("POINTS"))?;
                let values = reader.values(encoding, ty, scalars, "POINTS")?;
                #[allow(clippy::cast_possible_truncation)]
                points.extend(
                    values
                        .chunks_exact(3)
                        .map(|c| [c[0] as f32, c[1] as f32, c[2] as f32]),
                );
            }
            kind @ ("POLYGONS" | "TRIANGLE_STRIPS" | "VERTICES" | "LINES") => {
                let cell_kind = match kind {
                    "POLYGONS" => CellKind::Polygons,
                    "TRIANGLE_STRIPS" => CellKind::Strips,
                    _ => CellKind::Ignored,
                };
                let first: usize = reader.number("cell count")?;
                let second: usize = reader.number("cell size")?;
                let cells = if major >= 5 {
                    read_offset_cells(&mut reader, encoding, first, second)?
                } else {
                    read_legacy_cells(&mut reader, encoding, first, second)?
                };
                if cell_kind != CellKind::Ignored {
                    for cell in &cells {
                        triangulate(cell_kind, cell, points.len(), &mut triangles)?;
                    }
                }
            }
            "METADATA" => skip_metadata(&mut reader),
            "POINT_DATA" | "CELL_DATA" | "FIELD" => break,
            _ => {
                return Err(MeshError::Malformed {
                    offset: reader.pos,
                    expected: "section keyword",
                    found: section.to_string(),
                })
            }
        }
    }

    if triangles.is_empty() {
        return Err(MeshError::Empty);
    }
    SurfaceMesh::new(points, triangles)
}

/// Read and parse a legacy VTK polydata file.
///
/// # Errors
///
/// Returns [`MeshError::Io`] if the file cannot be read, otherwise the
/// errors of [`read_vtk`].
pub fn load_vtk(path: &Path) -> Result<SurfaceMesh, MeshError> {
    let bytes = std::fs::read(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = read_vtk(&bytes)?;
    tracing::info!(
        "Loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// `n size` followed by `size` integers laid out as `k i0 .. ik-1` per cell
fn read_legacy_cells(
    reader: &mut Reader<'_>,
    encoding: Encoding,
    cell_count: usize,
    size: usize,
) -> Result<Vec<Vec<i64>>, MeshError> {
    let flat = reader.integers(encoding, DataType::Int32, size, "cell list")?;
    // Every cell takes at least one entry of the flat list.
    let mut cells = Vec::with_capacity(cell_count.min(flat.len()));
    let mut i = 0;
    for _ in 0..cell_count {
        let k = usize::try_from(*flat.get(i).ok_or(MeshError::UnexpectedEof("cell list"))?)
            .map_err(|_| MeshError::Malformed {
                offset: reader.pos,
                expected: "cell vertex count",
                found: flat[i].to_string(),
            })?;
        let end = (i + 1)
            .checked_add(k)
            .ok_or(MeshError::UnexpectedEof("cell list"))?;
        let cell = flat
            .get(i + 1..end)
            .ok_or(MeshError::UnexpectedEof("cell list"))?;
        cells.push(cell.to_vec());
        i = end;
    }
    Ok(cells)
}

/// `OFFSETS type` and `CONNECTIVITY type` arrays
fn read_offset_cells(
    reader: &mut Reader<'_>,
    encoding: Encoding,
    offset_count: usize,
    connectivity_count: usize,
) -> Result<Vec<Vec<i64>>, MeshError> {
    let mut offsets = None;
    let mut connectivity = None;
    for _ in 0..2 {
        let offset = reader.pos;
        let name = reader.expect_token("OFFSETS/CONNECTIVITY")?;
        let ty = DataType::parse(reader.expect_token("array type")?)?;
        match name.to_ascii_uppercase().as_str() {
            "OFFSETS" => {
                offsets = Some(reader.integers(encoding, ty, offset_count, "OFFSETS")?);
            }
            "CONNECTIVITY" => {
                connectivity =
                    Some(reader.integers(encoding, ty, connectivity_count, "CONNECTIVITY")?);
            }
            _ => {
                return Err(MeshError::Malformed {
                    offset,
                    expected: "OFFSETS or CONNECTIVITY",
                    found: name.to_string(),
                })
            }
        }
    }
    let offsets = offsets.ok_or(MeshError::UnexpectedEof("OFFSETS"))?;
    let connectivity = connectivity.ok_or(MeshError::UnexpectedEof("CONNECTIVITY"))?;

    offsets
        .windows(2)
        .map(|w| {
            let range = usize::try_from(w[0]).ok().zip(usize::try_from(w[1]).ok());
            range
                .and_then(|(start, end)| connectivity.get(start..end))
                .map(<[i64]>::to_vec)
                .ok_or(MeshError::UnexpectedEof("CONNECTIVITY"))
        })
        .collect()
}

fn skip_metadata(reader: &mut Reader<'_>) {
    // The block runs until the next blank line.
    reader.finish_line();
    while let Some(line) = reader.line() {
        if line.trim().is_empty() {
            break;
        }
    }
}

fn triangulate(
    kind: CellKind,
    cell: &[i64],
    point_count: usize,
    out: &mut Vec<[u32; 3]>,
) -> Result<(), MeshError> {
    let index = |i: i64| -> Result<u32, MeshError> {
        usize::try_from(i)
            .ok()
            .filter(|&u| u < point_count)
            .and_then(|u| u32::try_from(u).ok())
            .ok_or(MeshError::IndexOutOfRange {
                index: i,
                count: point_count,
            })
    };
    if cell.len() < 3 {
        return Ok(());
    }
    match kind {
        CellKind::Polygons => {
            let a = index(cell[0])?;
            for pair in cell[1..].windows(2) {
                out.push([a, index(pair[0])?, index(pair[1])?]);
            }
        }
        CellKind::Strips => {
            for (j, w) in cell.windows(3).enumerate() {
                let (a, b, c) = (index(w[0])?, index(w[1])?, index(w[2])?);
                // Alternate winding so every strip triangle faces the same way.
                if j % 2 == 0 {
                    out.push([a, b, c]);
                } else {
                    out.push([b, a, c]);
                }
            }
        }
        CellKind::Ignored => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_QUAD: &str = "# vtk DataFile Version 3.0
lh.pial
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0  1 0 0
1 1 0  0 1 0
POLYGONS 1 5
4 0 1 2 3
POINT_DATA 4
SCALARS curv float 1
LOOKUP_TABLE default
0 0 0 0
";

    #[test]
    fn test_ascii_polygons_fan() {
        let mesh = read_vtk(ASCII_QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_ascii_triangle_strip() {
        let text = "# vtk DataFile Version 2.0
strip
ASCII
DATASET POLYDATA
POINTS 4 double
0 0 0 1 0 0 0 1 0 1 1 0
TRIANGLE_STRIPS 1 5
4 0 1 2 3
";
        let mesh = read_vtk(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [2, 1, 3]]);
    }

    #[test]
    fn test_version5_offsets() {
        let text = "# vtk DataFile Version 5.1
surface
ASCII
DATASET POLYDATA
POINTS 3 float
0 0 0 1 0 0 0 1 0
METADATA
INFORMATION 0

POLYGONS 2 3
OFFSETS vtktypeint64
0 3
CONNECTIVITY vtktypeint64
0 1 2
";
        let mesh = read_vtk(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_binary_big_endian() {
        let mut bytes = b"# vtk DataFile Version 3.0\nbin\nBINARY\nDATASET POLYDATA\nPOINTS 3 float\n".to_vec();
        for v in [0.0f32, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(b"\nPOLYGONS 1 4\n");
        for i in [3i32, 0, 1, 2] {
            bytes.extend_from_slice(&i.to_be_bytes());
        }
        bytes.push(b'\n');

        let mesh = read_vtk(&bytes).unwrap();
        assert_eq!(mesh.positions[1], [2.0, 0.0, 0.0]);
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_lines_skipped() {
        let text = "# vtk DataFile Version 3.0
mixed
ASCII
DATASET POLYDATA
POINTS 3 float
0 0 0 1 0 0 0 1 0
LINES 1 3
2 0 1
POLYGONS 1 4
3 0 1 2
";
        let mesh = read_vtk(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_rejects_bad_header() {
        assert!(matches!(
            read_vtk(b"solid stl\n"),
            Err(MeshError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_rejects_unstructured_grid() {
        let text = "# vtk DataFile Version 3.0\nx\nASCII\nDATASET UNSTRUCTURED_GRID\n";
        assert!(matches!(
            read_vtk(text.as_bytes()),
            Err(MeshError::UnsupportedDataset(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let text = "# vtk DataFile Version 3.0
bad
ASCII
DATASET POLYDATA
POINTS 3 float
0 0 0 1 0 0 0 1 0
POLYGONS 1 4
3 0 1 7
";
        assert!(matches!(
            read_vtk(text.as_bytes()),
            Err(MeshError::IndexOutOfRange { index: 7, count: 3 })
        ));
    }

    #[test]
    fn test_empty_mesh() {
        let text = "# vtk DataFile Version 3.0\ne\nASCII\nDATASET POLYDATA\nPOINTS 0 float\n";
        assert!(matches!(read_vtk(text.as_bytes()), Err(MeshError::Empty)));
    }

    #[test]
    fn test_truncated_points() {
        let text = "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 2 float\n0 0 0 1\n";
        assert!(matches!(
            read_vtk(text.as_bytes()),
            Err(MeshError::UnexpectedEof("POINTS"))
        ));
    }

    #[test]
    fn test_huge_point_count_is_eof() {
        let text = "# vtk DataFile Version 3.0\nh\nASCII\nDATASET POLYDATA\nPOINTS 6148914691236517206 float\n0 0 0\n";
        assert!(matches!(
            read_vtk(text.as_bytes()),
            Err(MeshError::UnexpectedEof("POINTS"))
        ));

        let binary = b"# vtk DataFile Version 3.0\nh\nBINARY\nDATASET POLYDATA\nPOINTS 6148914691236517206 float\n\0\0\0\0";
        assert!(matches!(read_vtk(binary), Err(MeshError::UnexpectedEof("POINTS"))));
    }

    #[test]
    fn test_huge_cell_count_is_eof() {
        let text = "# vtk DataFile Version 3.0
h
ASCII
DATASET POLYDATA
POINTS 3 float
0 0 0 1 0 0 0 1 0
POLYGONS 1000000000000000000 4
3 0 1 2
";
        assert!(matches!(
            read_vtk(text.as_bytes()),
            Err(MeshError::UnexpectedEof("cell list"))
        ));
    }
}
