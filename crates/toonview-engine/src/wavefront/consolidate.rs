//! Vertex consolidation.
//!
//! OBJ faces index positions, normals and texture coordinates
//! independently per corner, but an indexed GPU draw allows one index per
//! vertex. Each corner's index triple is therefore treated as a signature:
//! corners sharing a signature share one emitted vertex slot, probed in
//! triangle order so slot numbering is deterministic.

use std::collections::HashMap;

use super::geometry::GeometryStore;
use super::model::{Triangle, VertexLayout};

/// Rewrites a group's triangles into an interleaved vertex stream plus a
/// triangle index stream.
///
/// Each emitted vertex concatenates position, then normal, then texcoord
/// xy, with the optional fields controlled by the model-wide layout.
pub(crate) fn consolidate_group(
    triangles: &[Triangle],
    store: &GeometryStore,
    layout: VertexLayout,
) -> (Vec<f32>, Vec<u32>) {
    let mut slots: HashMap<(u32, u32, u32), u32> = HashMap::new();
    let mut vertex_data = Vec::new();
    let mut indices = Vec::with_capacity(triangles.len() * 3);

    for tri in triangles {
        for k in 0..3 {
            let signature = (tri.positions[k], tri.normals[k], tri.texcoords[k]);
            let next_slot = slots.len() as u32;
            let slot = *slots.entry(signature).or_insert_with(|| {
                vertex_data.extend_from_slice(&store.positions[signature.0 as usize]);
                if layout.has_normals {
                    vertex_data.extend_from_slice(&store.normals[signature.1 as usize]);
                }
                if layout.has_texcoords {
                    vertex_data.extend_from_slice(&store.texcoords[signature.2 as usize][..2]);
                }
                next_slot
            });
            indices.push(slot);
        }
    }

    (vertex_data, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GeometryStore {
        GeometryStore {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0], [0.0, 1.0, 0.0]],
            texcoords: vec![[0.1, 0.2, 0.0], [0.3, 0.4, 0.0]],
            face_normals: Vec::new(),
        }
    }

    fn tri(p: [u32; 3], n: [u32; 3], t: [u32; 3]) -> Triangle {
        Triangle {
            positions: p,
            normals: n,
            texcoords: t,
            face_normal: 0,
        }
    }

    const FULL: VertexLayout = VertexLayout {
        has_normals: true,
        has_texcoords: true,
    };

    const BARE: VertexLayout = VertexLayout {
        has_normals: false,
        has_texcoords: false,
    };

    // ── dedup ─────────────────────────────────────────────────────────────

    #[test]
    fn shared_signatures_share_one_slot() {
        // Two triangles of a quad: corners 0 and 2 appear in both.
        let tris = [
            tri([0, 1, 2], [0, 0, 0], [0, 0, 0]),
            tri([0, 2, 3], [0, 0, 0], [0, 0, 0]),
        ];
        let (vertex_data, indices) = consolidate_group(&tris, &store(), FULL);

        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(vertex_data.len(), 4 * FULL.floats_per_vertex());
    }

    #[test]
    fn same_position_with_different_normal_is_a_new_vertex() {
        let tris = [
            tri([0, 1, 2], [0, 0, 0], [0, 0, 0]),
            tri([0, 1, 2], [1, 1, 1], [0, 0, 0]),
        ];
        let (vertex_data, indices) = consolidate_group(&tris, &store(), FULL);

        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(vertex_data.len(), 6 * FULL.floats_per_vertex());
    }

    #[test]
    fn vertex_count_equals_distinct_signature_count() {
        let tris = [
            tri([0, 1, 2], [0, 0, 1], [0, 1, 0]),
            tri([2, 1, 0], [1, 0, 0], [0, 1, 0]),
            tri([0, 1, 2], [0, 0, 1], [0, 1, 0]),
        ];
        let mut distinct = std::collections::HashSet::new();
        for t in &tris {
            for k in 0..3 {
                distinct.insert((t.positions[k], t.normals[k], t.texcoords[k]));
            }
        }
        let (vertex_data, _) = consolidate_group(&tris, &store(), FULL);
        assert_eq!(vertex_data.len() / FULL.floats_per_vertex(), distinct.len());
    }

    // ── emitted fields ────────────────────────────────────────────────────

    #[test]
    fn emits_position_normal_texcoord_in_order() {
        let tris = [tri([0, 1, 2], [1, 1, 1], [1, 1, 1])];
        let (vertex_data, _) = consolidate_group(&tris, &store(), FULL);
        // First vertex: position 0, normal 1, texcoord 1 (xy only).
        assert_eq!(
            &vertex_data[..8],
            &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.3, 0.4]
        );
    }

    #[test]
    fn bare_layout_emits_positions_only() {
        let tris = [tri([0, 1, 2], [0, 0, 0], [0, 0, 0])];
        let (vertex_data, indices) = consolidate_group(&tris, &store(), BARE);
        assert_eq!(vertex_data.len(), 3 * 3);
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
