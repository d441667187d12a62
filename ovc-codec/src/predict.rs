//! Connectivity-driven traversal and prediction
//!
//! Encoder and decoder both derive the vertex visiting order and each
//! vertex's prediction context from the index buffer alone, so the decoder can
//! rebuild every prediction from values it has already reconstructed.

use std::collections::HashMap;

use crate::{quant_max, PredictionMode};

/// Already-coded neighbours available when a vertex is first visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Context {
    /// Nothing has been coded yet
    First,
    /// Previously coded vertex in traversal order
    Previous(u32),
    /// Both other corners of the visiting triangle are coded
    Pair(u32, u32),
    /// Corners `a`, `b` plus the vertex opposite edge `(a, b)` in an earlier triangle
    Parallelogram(u32, u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Visit {
    pub vertex: u32,
    pub context: Context,
}

#[inline]
fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

/// Visit every element of a slot with `count` elements exactly once
///
/// Triangles touching an element outside the slot are skipped; elements never
/// referenced by a triangle are appended in index order.
pub(crate) fn traverse(triangles: &[u16], count: usize) -> Vec<Visit> {
    let mut seen = vec![false; count];
    let mut opposite: HashMap<(u32, u32), u32> = HashMap::new();
    let mut visits = Vec::with_capacity(count);
    let mut last: Option<u32> = None;

    for tri in triangles.chunks_exact(3) {
        let corners = [tri[0] as u32, tri[1] as u32, tri[2] as u32];
        if corners.iter().any(|&c| c as usize >= count) {
            continue;
        }

        for k in 0..3 {
            let v = corners[k];
            if seen[v as usize] {
                continue;
            }
            let a = corners[(k + 1) % 3];
            let b = corners[(k + 2) % 3];
            let context = if a != v && b != v && a != b && seen[a as usize] && seen[b as usize] {
                match opposite.get(&edge_key(a, b)) {
                    Some(&o) => Context::Parallelogram(a, b, o),
                    None => Context::Pair(a, b),
                }
            } else {
                match last {
                    Some(p) => Context::Previous(p),
                    None => Context::First,
                }
            };
            seen[v as usize] = true;
            last = Some(v);
            visits.push(Visit { vertex: v, context });
        }

        for k in 0..3 {
            let a = corners[(k + 1) % 3];
            let b = corners[(k + 2) % 3];
            if a != b && corners[k] != a && corners[k] != b {
                opposite.entry(edge_key(a, b)).or_insert(corners[k]);
            }
        }
    }

    for v in 0..count {
        if !seen[v] {
            let context = match last {
                Some(p) => Context::Previous(p),
                None => Context::First,
            };
            seen[v] = true;
            last = Some(v as u32);
            visits.push(Visit {
                vertex: v as u32,
                context,
            });
        }
    }

    visits
}

/// Predict component `d` of a vertex from reconstructed quantized values
///
/// `values` holds `dim` quantized components per element; only elements that
/// appear earlier in the traversal are read.
pub(crate) fn predict(
    mode: PredictionMode,
    context: Context,
    values: &[i64],
    dim: usize,
    d: usize,
    bits: u32,
) -> i64 {
    let at = |v: u32| values[v as usize * dim + d];
    let previous = |ctx: Context| match ctx {
        Context::Previous(p) => at(p),
        _ => 0,
    };

    let predicted = match mode {
        PredictionMode::None => 0,
        PredictionMode::Differential => match context {
            Context::First => 0,
            Context::Previous(p) => at(p),
            // edge contexts still have a previous vertex, the first corner is as good
            Context::Pair(a, _) | Context::Parallelogram(a, _, _) => at(a),
        },
        PredictionMode::Parallelogram => match context {
            Context::Parallelogram(a, b, o) => at(a) + at(b) - at(o),
            Context::Pair(a, b) => (at(a) + at(b)) / 2,
            ctx => previous(ctx),
        },
        PredictionMode::SurfaceNormals => match context {
            Context::Parallelogram(a, b, _) | Context::Pair(a, b) => (at(a) + at(b)) / 2,
            ctx => previous(ctx),
        },
    };

    predicted.clamp(0, quant_max(bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traverse_quad() {
        // Two triangles sharing edge (1, 2)
        let triangles = [0u16, 1, 2, 2, 1, 3];
        let visits = traverse(&triangles, 4);
        let order: Vec<u32> = visits.iter().map(|v| v.vertex).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(visits[0].context, Context::First);
        assert_eq!(visits[1].context, Context::Previous(0));
        assert_eq!(visits[2].context, Context::Pair(0, 1));
        assert_eq!(visits[3].context, Context::Parallelogram(2, 1, 0));
    }

    #[test]
    fn test_traverse_appends_unreferenced() {
        let triangles = [2u16, 3, 4];
        let visits = traverse(&triangles, 6);
        let order: Vec<u32> = visits.iter().map(|v| v.vertex).collect();
        assert_eq!(order, vec![2, 3, 4, 0, 1, 5]);
    }

    #[test]
    fn test_traverse_skips_out_of_range_triangles() {
        let triangles = [0u16, 1, 9, 0, 1, 2];
        let visits = traverse(&triangles, 3);
        assert_eq!(visits.len(), 3);
        assert_eq!(visits[0].context, Context::First);
    }

    #[test]
    fn test_traverse_empty() {
        assert!(traverse(&[], 0).is_empty());
        assert_eq!(traverse(&[], 2).len(), 2);
    }

    #[test]
    fn test_parallelogram_prediction() {
        // 1D values: a=10, b=20, o=5 -> predicted 25
        let values = [10, 20, 5, 0];
        let p = predict(
            PredictionMode::Parallelogram,
            Context::Parallelogram(0, 1, 2),
            &values,
            1,
            0,
            8,
        );
        assert_eq!(p, 25);
    }

    #[test]
    fn test_prediction_is_clamped() {
        let values = [250, 250, 0];
        let p = predict(
            PredictionMode::Parallelogram,
            Context::Parallelogram(0, 1, 2),
            &values,
            1,
            0,
            8,
        );
        assert_eq!(p, 255);
    }

    #[test]
    fn test_surface_normal_prediction_uses_midpoint() {
        let values = [10, 30, 0];
        let p = predict(
            PredictionMode::SurfaceNormals,
            Context::Parallelogram(0, 1, 2),
            &values,
            1,
            0,
            8,
        );
        assert_eq!(p, 20);
    }
}
