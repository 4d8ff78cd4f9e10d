//! Line parser for the Wavefront OBJ grammar.
//!
//! Recognized directives: `v`, `vn`, `vt`, `f`, `g`, `usemtl`, `mtllib`,
//! `s` (skipped) and `#`. Anything else is logged with its line number and
//! skipped. Face corners come in four shapes (`v`, `v/t`, `v/t/n`, `v//n`)
//! and indices are 1-based in the source.

use std::path::Path;

use anyhow::{Context, Result, bail};
use glam::Vec3;

use super::geometry::{Bounds, GeometryStore};
use super::material::Material;
use super::model::{Group, Model, Triangle, VertexLayout};
use super::mtl;

/// Parse-wide behavior switches, passed explicitly instead of the
/// process-wide flags a typical loader keeps.
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    /// Source faces are wound clockwise; flips the face-normal edge order.
    pub clockwise_winding: bool,
    /// Start a fresh auto-named group (`g0`, `g1`, …) on every material
    /// change. Off by default: material switches stay within the group.
    pub group_per_material: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum CornerShape {
    V,
    Vt,
    Vn,
    Vtn,
}

/// Count of faces seen per corner shape, classified by each face's first
/// corner. The attribute layout is decided from the aggregate: an attribute
/// is present only if every counted shape carried it.
#[derive(Debug, Default)]
struct ShapeCounts {
    vtn: u32,
    vt: u32,
    vn: u32,
    v: u32,
}

impl ShapeCounts {
    fn bump(&mut self, shape: CornerShape) {
        match shape {
            CornerShape::Vtn => self.vtn += 1,
            CornerShape::Vt => self.vt += 1,
            CornerShape::Vn => self.vn += 1,
            CornerShape::V => self.v += 1,
        }
    }

    fn layout(&self) -> VertexLayout {
        VertexLayout {
            has_normals: (self.vtn > 0 || self.vn > 0) && self.vt == 0 && self.v == 0,
            has_texcoords: (self.vtn > 0 || self.vt > 0) && self.vn == 0 && self.v == 0,
        }
    }
}

struct Corner {
    position: u32,
    texcoord: u32,
    normal: u32,
    shape: CornerShape,
}

pub(crate) fn parse_obj_source(
    source: &str,
    base_dir: &Path,
    config: &ParserConfig,
) -> Result<Model> {
    let mut model = Model {
        store: GeometryStore::new(),
        materials: vec![Material::named("default")],
        groups: vec![Group::named("default")],
        layout: VertexLayout {
            has_normals: false,
            has_texcoords: false,
        },
        bounds: Bounds::of_positions(&[]),
        mtllib: None,
    };

    let mut current_group = 0usize;
    let mut current_material = 0usize;
    let mut next_auto_group = 0u32;
    let mut counts = ShapeCounts::default();

    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let mut tokens = raw.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };

        match directive {
            "#" | "s" => {}

            "v" => {
                let p = read_floats::<3>(&mut tokens, line, "vertex")?;
                model.store.positions.push(p);
            }

            "vn" => {
                let n = read_floats::<3>(&mut tokens, line, "normal")?;
                model.store.normals.push(n);
            }

            "vt" => {
                let [u, v] = read_floats::<2>(&mut tokens, line, "texture coordinate")?;
                model.store.texcoords.push([u, v, 0.0]);
            }

            "mtllib" => {
                let name = tokens
                    .next()
                    .with_context(|| format!("mtllib without a filename on line {line}"))?;
                model.mtllib = Some(name.to_string());
                mtl::load_library(&base_dir.join(name), base_dir, &mut model.materials)?;
            }

            "usemtl" => {
                if config.group_per_material {
                    let name = format!("g{next_auto_group}");
                    next_auto_group += 1;
                    current_group = model.find_or_create_group(&name);
                }
                let name = tokens
                    .next()
                    .with_context(|| format!("usemtl without a name on line {line}"))?;
                current_material = match model.find_material(name) {
                    Some(i) => i,
                    None => {
                        log::warn!("material '{name}' not found (line {line}); using default");
                        0
                    }
                };
                model.groups[current_group].material = current_material;
            }

            "g" => {
                let name = tokens.next().unwrap_or("default");
                current_group = model.find_or_create_group(name);
                // The active material carries over into the new group.
                model.groups[current_group].material = current_material;
            }

            "f" => {
                let mut corners = Vec::new();
                for token in tokens {
                    corners.push(parse_corner(token, line, model.store.positions.len())?);
                }
                if corners.len() < 3 {
                    bail!("face with fewer than 3 corners on line {line}");
                }
                counts.bump(corners[0].shape);

                // An n-gon becomes a fan anchored at the first corner:
                // triangle i uses corners (0, i-1, i).
                let group = &mut model.groups[current_group];
                for i in 2..corners.len() {
                    let pick = [&corners[0], &corners[i - 1], &corners[i]];
                    group.triangles.push(Triangle {
                        positions: pick.map(|c| c.position),
                        normals: pick.map(|c| c.normal),
                        texcoords: pick.map(|c| c.texcoord),
                        face_normal: 0,
                    });
                }
            }

            other => {
                log::warn!("unrecognized directive '{other}' on line {line}");
            }
        }
    }

    model.layout = counts.layout();
    validate_attribute_indices(&model)?;
    compute_face_normals(&mut model, config.clockwise_winding);
    model.bounds = Bounds::of_positions(&model.store.positions);

    Ok(model)
}

fn parse_corner(token: &str, line: usize, position_count: usize) -> Result<Corner> {
    let (position, texcoord, normal, shape) = if let Some((v, n)) = token.split_once("//") {
        (parse_index(v, line)?, 0, parse_index(n, line)?, CornerShape::Vn)
    } else {
        let mut parts = token.split('/');
        let v = parse_index(parts.next().unwrap_or(""), line)?;
        match (parts.next(), parts.next(), parts.next()) {
            (None, _, _) => (v, 0, 0, CornerShape::V),
            (Some(t), None, _) => (v, parse_index(t, line)?, 0, CornerShape::Vt),
            (Some(t), Some(n), None) => {
                (v, parse_index(t, line)?, parse_index(n, line)?, CornerShape::Vtn)
            }
            _ => bail!("malformed face corner '{token}' on line {line}"),
        }
    };

    if position as usize >= position_count {
        bail!(
            "vertex index {} is too large on line {line}; there are only {position_count} vertices",
            position + 1
        );
    }

    Ok(Corner {
        position,
        texcoord,
        normal,
        shape,
    })
}

/// Parses a 1-based source index into a 0-based one.
fn parse_index(token: &str, line: usize) -> Result<u32> {
    let value: i64 = token
        .parse()
        .map_err(|_| anyhow::anyhow!("malformed index '{token}' on line {line}"))?;
    if value < 1 {
        bail!("non-positive index '{token}' on line {line}");
    }
    Ok((value - 1) as u32)
}

fn read_floats<const N: usize>(
    tokens: &mut std::str::SplitWhitespace<'_>,
    line: usize,
    what: &str,
) -> Result<[f32; N]> {
    let mut out = [0.0f32; N];
    for slot in &mut out {
        *slot = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .with_context(|| format!("malformed {what} on line {line}"))?;
    }
    Ok(out)
}

/// Normal/texcoord indices are not checked while reading faces (the
/// sequences may still be growing); check them once the file is consumed,
/// but only for attributes the layout actually uses.
fn validate_attribute_indices(model: &Model) -> Result<()> {
    for group in &model.groups {
        for tri in &group.triangles {
            if model.layout.has_normals {
                for n in tri.normals {
                    if n as usize >= model.store.normals.len() {
                        bail!(
                            "normal index {} is too large; there are only {} normals",
                            n + 1,
                            model.store.normals.len()
                        );
                    }
                }
            }
            if model.layout.has_texcoords {
                for t in tri.texcoords {
                    if t as usize >= model.store.texcoords.len() {
                        bail!(
                            "texture coordinate index {} is too large; there are only {} texture coordinates",
                            t + 1,
                            model.store.texcoords.len()
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

/// Appends one freshly computed face normal per triangle: the normalized
/// cross product of the two edges out of the first corner, in an order
/// picked by the winding flag.
fn compute_face_normals(model: &mut Model, clockwise: bool) {
    let Model { store, groups, .. } = model;
    for group in groups {
        for tri in &mut group.triangles {
            let p0 = store.position(tri.positions[0]);
            let e1 = store.position(tri.positions[1]) - p0;
            let e2 = store.position(tri.positions[2]) - p0;
            let n: Vec3 = if clockwise {
                e2.cross(e1)
            } else {
                e1.cross(e2)
            }
            .normalize_or_zero();

            tri.face_normal = store.face_normals.len() as u32;
            store.face_normals.push(n.to_array());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Model> {
        parse_obj_source(source, Path::new(""), &ParserConfig::default())
    }

    fn parse_with(source: &str, config: &ParserConfig) -> Result<Model> {
        parse_obj_source(source, Path::new(""), config)
    }

    const QUAD: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    // ── vertex data ───────────────────────────────────────────────────────

    #[test]
    fn reads_positions_normals_texcoords() {
        let m = parse("v 1 2 3\nvn 0 1 0\nvt 0.5 0.25\n").unwrap();
        assert_eq!(m.store.positions, vec![[1.0, 2.0, 3.0]]);
        assert_eq!(m.store.normals, vec![[0.0, 1.0, 0.0]]);
        // Texcoords share the 3-component shape with a fixed 0 third value.
        assert_eq!(m.store.texcoords, vec![[0.5, 0.25, 0.0]]);
    }

    #[test]
    fn skips_comments_and_smoothing_groups() {
        let m = parse("# header\ns 1\nv 0 0 0\n").unwrap();
        assert_eq!(m.store.positions.len(), 1);
    }

    #[test]
    fn unknown_directive_is_skipped() {
        let m = parse("o thing\nv 0 0 0\n").unwrap();
        assert_eq!(m.store.positions.len(), 1);
    }

    // ── faces ─────────────────────────────────────────────────────────────

    #[test]
    fn triangle_face_converts_to_zero_based() {
        let m = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let tri = &m.groups[0].triangles[0];
        assert_eq!(tri.positions, [0, 1, 2]);
    }

    #[test]
    fn ngon_becomes_fan_anchored_at_first_corner() {
        let m = parse(
            "v 0 0 0\nv 1 0 0\nv 2 0 0\nv 3 0 0\nv 4 0 0\nv 5 0 0\nf 1 2 3 4 5 6\n",
        )
        .unwrap();
        let tris = &m.groups[0].triangles;
        assert_eq!(tris.len(), 4); // n - 2
        for (i, tri) in tris.iter().enumerate() {
            assert_eq!(tri.positions, [0, (i + 1) as u32, (i + 2) as u32]);
        }
    }

    #[test]
    fn corner_shapes_parse_all_four_forms() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vn 0 0 1
f 1/1/1 2/1/1 3/1/1
";
        let m = parse(src).unwrap();
        let tri = &m.groups[0].triangles[0];
        assert_eq!(tri.texcoords, [0, 0, 0]);
        assert_eq!(tri.normals, [0, 0, 0]);

        let m = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n").unwrap();
        assert!(m.layout.has_normals);
        assert!(!m.layout.has_texcoords);

        let m = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3/1\n").unwrap();
        assert!(!m.layout.has_normals);
        assert!(m.layout.has_texcoords);
    }

    #[test]
    fn out_of_range_position_index_is_fatal() {
        assert!(parse("v 0 0 0\nf 1 2 3\n").is_err());
    }

    #[test]
    fn out_of_range_normal_index_is_fatal_when_normals_are_used() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//2 3//1\n";
        assert!(parse(src).is_err());
    }

    #[test]
    fn face_with_two_corners_is_fatal() {
        assert!(parse("v 0 0 0\nv 1 0 0\nf 1 2\n").is_err());
    }

    // ── attribute layout (aggregate-count rule) ───────────────────────────

    #[test]
    fn plain_faces_have_no_attributes() {
        let m = parse(QUAD).unwrap();
        assert!(!m.layout.has_normals);
        assert!(!m.layout.has_texcoords);
    }

    #[test]
    fn mixed_shapes_resolve_by_aggregate_counts() {
        // One v/t/n face and one plain face: the plain face vetoes both
        // attributes for the whole model. This mirrors the format's
        // aggregate rule rather than any per-face layout.
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vn 0 0 1
f 1/1/1 2/1/1 3/1/1
f 1 2 3
";
        let m = parse(src).unwrap();
        assert!(!m.layout.has_normals);
        assert!(!m.layout.has_texcoords);
    }

    // ── groups & materials ────────────────────────────────────────────────

    #[test]
    fn faces_accumulate_into_named_groups() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
g left
f 1 2 3
g right
f 1 2 3
g left
f 1 2 3
";
        let m = parse(src).unwrap();
        let names: Vec<_> = m.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["default", "left", "right"]);
        assert_eq!(m.groups[1].triangles.len(), 2);
        assert_eq!(m.groups[2].triangles.len(), 1);
        assert!(m.groups[0].triangles.is_empty());
    }

    #[test]
    fn bare_group_line_reselects_default() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\ng side\ng\nf 1 2 3\n";
        let m = parse(src).unwrap();
        assert_eq!(m.groups[0].triangles.len(), 1);
    }

    #[test]
    fn unknown_material_falls_back_to_default() {
        let m = parse("usemtl missing\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(m.groups[0].material, 0);
    }

    #[test]
    fn group_per_material_opens_auto_groups() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
usemtl a
f 1 2 3
usemtl b
f 1 2 3
";
        let config = ParserConfig {
            group_per_material: true,
            ..Default::default()
        };
        let m = parse_with(src, &config).unwrap();
        let names: Vec<_> = m.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["default", "g0", "g1"]);
        assert_eq!(m.groups[1].triangles.len(), 1);
        assert_eq!(m.groups[2].triangles.len(), 1);
    }

    #[test]
    fn material_switch_stays_in_group_by_default() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl a\nf 1 2 3\nusemtl b\nf 1 2 3\n";
        let m = parse(src).unwrap();
        assert_eq!(m.groups.len(), 1);
        assert_eq!(m.groups[0].triangles.len(), 2);
    }

    // ── face normals & bounds ─────────────────────────────────────────────

    #[test]
    fn each_triangle_gets_its_own_face_normal() {
        let m = parse(QUAD).unwrap();
        assert_eq!(m.store.face_normals.len(), 2);
        assert_eq!(m.groups[0].triangles[0].face_normal, 0);
        assert_eq!(m.groups[0].triangles[1].face_normal, 1);
        for n in &m.store.face_normals {
            assert_eq!(*n, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn clockwise_winding_flips_face_normals() {
        let config = ParserConfig {
            clockwise_winding: true,
            ..Default::default()
        };
        let m = parse_with(QUAD, &config).unwrap();
        for n in &m.store.face_normals {
            assert_eq!(*n, [0.0, 0.0, -1.0]);
        }
    }

    #[test]
    fn bounds_cover_all_positions() {
        let m = parse(QUAD).unwrap();
        assert_eq!(m.bounds.centre.to_array(), [0.5, 0.5, 0.0]);
        let expected = 0.5 * 2.0f32.sqrt();
        assert!((m.bounds.radius - expected).abs() < 1e-6);
    }
}
