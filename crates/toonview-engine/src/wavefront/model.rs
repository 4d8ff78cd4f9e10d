use std::path::Path;

use anyhow::{Context, Result};

use super::consolidate::consolidate_group;
use super::geometry::{Bounds, GeometryStore};
use super::material::Material;
use super::obj::{ParserConfig, parse_obj_source};

/// One triangle as three per-corner index triples into the
/// [`GeometryStore`], plus the index of its own face normal.
///
/// A corner whose source token omitted an attribute stores 0 in that field;
/// the model-wide [`VertexLayout`] decides whether the field is ever read.
#[derive(Debug, Copy, Clone)]
pub struct Triangle {
    pub positions: [u32; 3],
    pub normals: [u32; 3],
    pub texcoords: [u32; 3],
    pub face_normal: u32,
}

/// A named run of triangles drawn with one material.
#[derive(Debug)]
pub struct Group {
    pub name: String,
    pub triangles: Vec<Triangle>,
    /// Index into the model's material list. Last assignment wins.
    pub material: usize,

    /// Interleaved vertex stream, filled by [`Model::consolidate`].
    pub vertex_data: Vec<f32>,
    /// Triangle index stream into `vertex_data` slots.
    pub indices: Vec<u32>,
}

impl Group {
    pub(crate) fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            triangles: Vec::new(),
            material: 0,
            vertex_data: Vec::new(),
            indices: Vec::new(),
        }
    }
}

/// Which attributes every consolidated vertex carries.
///
/// All-or-nothing over the whole model, derived from the face-corner shapes
/// seen while parsing.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    pub has_normals: bool,
    pub has_texcoords: bool,
}

impl VertexLayout {
    /// Floats per consolidated vertex: position, then normal, then
    /// texcoord xy, in that fixed order.
    pub fn floats_per_vertex(&self) -> usize {
        3 + if self.has_normals { 3 } else { 0 } + if self.has_texcoords { 2 } else { 0 }
    }
}

/// A parsed Wavefront model: geometry, materials, groups, the uniform
/// attribute layout and the derived bounds.
///
/// Created once from a file, consolidated once, then read-only.
#[derive(Debug)]
pub struct Model {
    pub store: GeometryStore,
    pub materials: Vec<Material>,
    pub groups: Vec<Group>,
    pub layout: VertexLayout,
    pub bounds: Bounds,
    /// Material library filename referenced by the model, if any.
    pub mtllib: Option<String>,
}

impl Model {
    /// Reads and parses a model file plus its companion material library.
    ///
    /// Failure to open or parse either file is terminal for the caller;
    /// there is no partial model.
    pub fn load(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Model> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("can't open model file '{}'", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        parse_obj_source(&source, base_dir, config)
            .with_context(|| format!("while reading '{}'", path.display()))
    }

    /// Rewrites every group's triangles into a deduplicated vertex stream
    /// plus an index stream. Groups without triangles are left empty.
    pub fn consolidate(&mut self) {
        for group in &mut self.groups {
            if group.triangles.is_empty() {
                continue;
            }
            let (vertex_data, indices) = consolidate_group(&group.triangles, &self.store, self.layout);
            group.vertex_data = vertex_data;
            group.indices = indices;
        }
    }

    /// Total parsed triangle count across groups.
    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.triangles.len()).sum()
    }

    /// Finds a material by exact name.
    pub fn find_material(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name)
    }

    /// Finds a group by exact name, creating it if unseen.
    pub(crate) fn find_or_create_group(&mut self, name: &str) -> usize {
        if let Some(i) = self.groups.iter().position(|g| g.name == name) {
            return i;
        }
        self.groups.push(Group::named(name));
        self.groups.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit cube: 8 positions, one normal per face, quad faces in `v//n`
    /// form, all in one group.
    const CUBE: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
vn 0 0 -1
vn 0 0 1
vn -1 0 0
vn 1 0 0
vn 0 -1 0
vn 0 1 0
f 1//1 4//1 3//1 2//1
f 5//2 6//2 7//2 8//2
f 1//3 5//3 8//3 4//3
f 2//4 3//4 7//4 6//4
f 1//5 2//5 6//5 5//5
f 4//6 8//6 7//6 3//6
";

    fn cube() -> Model {
        let mut model = super::super::obj::parse_obj_source(
            CUBE,
            Path::new(""),
            &ParserConfig::default(),
        )
        .unwrap();
        model.consolidate();
        model
    }

    #[test]
    fn cube_fans_into_twelve_triangles() {
        let model = cube();
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.triangle_count(), 12);
    }

    #[test]
    fn cube_consolidates_to_four_vertices_per_face() {
        let model = cube();
        let group = &model.groups[0];

        assert!(model.layout.has_normals);
        assert!(!model.layout.has_texcoords);

        // Each face carries a distinct normal, so no signature is shared
        // across faces: 6 faces x 4 corners.
        let floats = model.layout.floats_per_vertex();
        assert_eq!(group.vertex_data.len() / floats, 24);
        assert_eq!(group.indices.len(), 36);
        assert!(group.indices.iter().all(|&i| i < 24));
    }

    #[test]
    fn cube_bounds_match_geometry() {
        let model = cube();
        assert_eq!(model.bounds.centre.to_array(), [0.5, 0.5, 0.5]);
        let half_diagonal = 0.5 * 3.0f32.sqrt();
        assert!((model.bounds.radius - half_diagonal).abs() < 1e-6);
    }

    #[test]
    fn empty_groups_get_no_streams() {
        let mut model = super::super::obj::parse_obj_source(
            "g empty\nv 0 0 0\n",
            Path::new(""),
            &ParserConfig::default(),
        )
        .unwrap();
        model.consolidate();
        for group in &model.groups {
            assert!(group.vertex_data.is_empty());
            assert!(group.indices.is_empty());
        }
    }

    #[test]
    fn load_of_missing_file_is_fatal() {
        let err = Model::load("/definitely/not/here.obj", &ParserConfig::default());
        assert!(err.is_err());
    }
}
