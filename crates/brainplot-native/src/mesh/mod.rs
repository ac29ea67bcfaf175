//! Cortical surface meshes
//!
//! Surfaces are loaded from legacy VTK polydata files (see [`vtk`]) and
//! drawn as translucent shells around the electrode markers.

pub mod vtk;

use std::path::Path;

use brainplot_core::Rgb;

use crate::error::MeshError;
use crate::math::{add, cross, normalize, sub, Vec3};

/// Default surface color (black)
pub const DEFAULT_MESH_COLOR: Rgb = [0.0, 0.0, 0.0];

/// Default surface opacity
pub const DEFAULT_MESH_OPACITY: f32 = 0.1;

/// Triangle surface with per-vertex normals
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Triangle vertex indices
    pub triangles: Vec<[u32; 3]>,
    /// Area-weighted vertex normals
    pub normals: Vec<Vec3>,
}

impl SurfaceMesh {
    /// Build a mesh and compute its normals.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::IndexOutOfRange`] if a triangle references a
    /// missing vertex.
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        let count = positions.len();
        if let Some(&bad) = triangles
            .iter()
            .flatten()
            .find(|&&i| i as usize >= count)
        {
            return Err(MeshError::IndexOutOfRange {
                index: i64::from(bad),
                count,
            });
        }
        let normals = vertex_normals(&positions, &triangles);
        Ok(Self {
            positions,
            triangles,
            normals,
        })
    }

    /// Load a legacy VTK polydata file.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        vtk::load_vtk(path.as_ref())
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounds `(min, max)`, `None` for an empty mesh
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(lo, hi), p| {
            (
                [lo[0].min(p[0]), lo[1].min(p[1]), lo[2].min(p[2])],
                [hi[0].max(p[0]), hi[1].max(p[1]), hi[2].max(p[2])],
            )
        }))
    }
}

fn vertex_normals(positions: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];
    for tri in triangles {
        let [a, b, c] = tri.map(|i| i as usize);
        // Unnormalized cross product weights by triangle area.
        let n = cross(sub(positions[b], positions[a]), sub(positions[c], positions[a]));
        for i in [a, b, c] {
            normals[i] = add(normals[i], n);
        }
    }
    normals.into_iter().map(normalize).collect()
}

/// Surface material
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshStyle {
    /// Diffuse color
    pub color: Rgb,
    /// Opacity in `[0, 1]`
    pub opacity: f32,
}

impl Default for MeshStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_MESH_COLOR,
            opacity: DEFAULT_MESH_OPACITY,
        }
    }
}
