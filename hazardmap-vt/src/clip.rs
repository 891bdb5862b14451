//! Clipping of normalized geometries by a stripe `k1 <= p[axis] <= k2`.

use crate::geometry::{NormPoint, VtGeometry};

pub(crate) fn clip(
    geometry: &VtGeometry<NormPoint>,
    k1: f64,
    k2: f64,
    axis: usize,
) -> Option<VtGeometry<NormPoint>> {
    let clipped = match geometry {
        VtGeometry::Points(points) => VtGeometry::Points(
            points
                .iter()
                .filter(|p| p[axis] >= k1 && p[axis] <= k2)
                .copied()
                .collect(),
        ),
        VtGeometry::Lines(lines) => {
            let mut result = vec![];
            for line in lines {
                clip_line(line, k1, k2, axis, &mut result);
            }
            VtGeometry::Lines(result)
        }
        VtGeometry::Polygons(polygons) => VtGeometry::Polygons(
            polygons
                .iter()
                .filter_map(|rings| clip_polygon(rings, k1, k2, axis))
                .collect(),
        ),
        VtGeometry::Circle { center, radius } => {
            if center[axis] + radius < k1 || center[axis] - radius > k2 {
                return None;
            }
            geometry.clone()
        }
        VtGeometry::Collection(items) => VtGeometry::Collection(
            items
                .iter()
                .filter_map(|item| clip(item, k1, k2, axis))
                .collect(),
        ),
    };

    (!clipped.is_empty()).then_some(clipped)
}

fn clip_line(line: &[NormPoint], k1: f64, k2: f64, axis: usize, out: &mut Vec<Vec<NormPoint>>) {
    let mut current: Vec<NormPoint> = vec![];
    for segment in line.windows(2) {
        match clip_segment(segment[0], segment[1], k1, k2, axis) {
            None => flush(&mut current, out),
            Some((start, end, reaches_end)) => {
                if current.last() != Some(&start) {
                    flush(&mut current, out);
                    current.push(start);
                }
                current.push(end);
                if !reaches_end {
                    flush(&mut current, out);
                }
            }
        }
    }

    flush(&mut current, out);
}

fn flush(current: &mut Vec<NormPoint>, out: &mut Vec<Vec<NormPoint>>) {
    if current.len() >= 2 {
        out.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Returns the part of the segment inside the stripe and whether that part ends at `b`.
fn clip_segment(
    a: NormPoint,
    b: NormPoint,
    k1: f64,
    k2: f64,
    axis: usize,
) -> Option<(NormPoint, NormPoint, bool)> {
    let d = b[axis] - a[axis];
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    if d == 0.0 {
        if a[axis] < k1 || a[axis] > k2 {
            return None;
        }
    } else {
        let ta = (k1 - a[axis]) / d;
        let tb = (k2 - a[axis]) / d;
        t0 = t0.max(ta.min(tb));
        t1 = t1.min(ta.max(tb));
        if t0 > t1 {
            return None;
        }
    }

    let start = if t0 <= 0.0 { a } else { lerp(a, b, t0) };
    let end = if t1 >= 1.0 { b } else { lerp(a, b, t1) };
    Some((start, end, t1 >= 1.0))
}

fn lerp(a: NormPoint, b: NormPoint, t: f64) -> NormPoint {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

fn clip_polygon(
    rings: &[Vec<NormPoint>],
    k1: f64,
    k2: f64,
    axis: usize,
) -> Option<Vec<Vec<NormPoint>>> {
    let (outer, holes) = rings.split_first()?;
    let outer = clip_ring(outer, k1, k2, axis)?;

    Some(
        std::iter::once(outer)
            .chain(holes.iter().filter_map(|h| clip_ring(h, k1, k2, axis)))
            .collect(),
    )
}

fn clip_ring(ring: &[NormPoint], k1: f64, k2: f64, axis: usize) -> Option<Vec<NormPoint>> {
    let clipped = clip_half(ring, k1, axis, true);
    let clipped = clip_half(&clipped, k2, axis, false);
    (clipped.len() >= 3).then_some(clipped)
}

/// Sutherland-Hodgman step against `p[axis] >= k` (if `keep_above`) or `p[axis] <= k`.
fn clip_half(ring: &[NormPoint], k: f64, axis: usize, keep_above: bool) -> Vec<NormPoint> {
    let inside = |p: &NormPoint| {
        if keep_above {
            p[axis] >= k
        } else {
            p[axis] <= k
        }
    };

    let Some(&last) = ring.last() else {
        return vec![];
    };

    let mut out = Vec::with_capacity(ring.len() + 2);
    let mut prev = last;
    for &cur in ring {
        match (inside(&prev), inside(&cur)) {
            (true, true) => out.push(cur),
            (false, true) => {
                out.push(intersect(prev, cur, k, axis));
                out.push(cur);
            }
            (true, false) => out.push(intersect(prev, cur, k, axis)),
            (false, false) => {}
        }
        prev = cur;
    }

    out
}

fn intersect(a: NormPoint, b: NormPoint, k: f64, axis: usize) -> NormPoint {
    let t = (k - a[axis]) / (b[axis] - a[axis]);
    let mut p = lerp(a, b, t);
    p[axis] = k;
    p
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn points_outside_are_dropped() {
        let geometry = VtGeometry::Points(vec![[0.1, 0.1], [0.5, 0.5], [0.9, 0.9]]);
        assert_eq!(
            clip(&geometry, 0.2, 0.6, 0),
            Some(VtGeometry::Points(vec![[0.5, 0.5]]))
        );
        assert_eq!(clip(&geometry, 0.95, 1.0, 1), None);
    }

    #[test]
    fn line_crossing_stripe_twice_is_split() {
        let geometry = VtGeometry::Lines(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ]]);
        let clipped = clip(&geometry, 0.5, 2.0, 0).expect("not empty");
        assert_eq!(
            clipped,
            VtGeometry::Lines(vec![vec![[0.5, 0.0], [1.0, 0.0], [1.0, 1.0], [0.5, 1.0]]])
        );

        let clipped = clip(&geometry, -1.0, 0.5, 0).expect("not empty");
        assert_eq!(
            clipped,
            VtGeometry::Lines(vec![vec![[0.0, 0.0], [0.5, 0.0]], vec![[0.5, 1.0], [0.0, 1.0]]])
        );
    }

    #[test]
    fn polygon_is_cut_at_border() {
        let geometry = VtGeometry::Polygons(vec![vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ]]]);
        let clipped = clip(&geometry, 0.25, 0.75, 0).expect("not empty");
        let VtGeometry::Polygons(polygons) = &clipped else {
            panic!("expected polygons");
        };
        assert_eq!(polygons.len(), 1);
        assert!(polygons[0][0]
            .iter()
            .all(|p| p[0] >= 0.25 && p[0] <= 0.75));
        assert_eq!(polygons[0][0].len(), 4);

        assert_matches!(clip(&geometry, 2.0, 3.0, 0), None);
    }

    #[test]
    fn hole_outside_is_dropped() {
        let geometry = VtGeometry::Polygons(vec![vec![
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            vec![[0.8, 0.4], [0.9, 0.4], [0.9, 0.6]],
        ]]);
        let VtGeometry::Polygons(polygons) = clip(&geometry, 0.0, 0.5, 0).expect("not empty")
        else {
            panic!("expected polygons");
        };
        assert_eq!(polygons[0].len(), 1);
    }

    #[test]
    fn circle_touching_stripe_is_kept() {
        let geometry = VtGeometry::Circle {
            center: [0.45, 0.5],
            radius: 0.1,
        };
        assert!(clip(&geometry, 0.5, 0.6, 0).is_some());
        assert!(clip(&geometry, 0.6, 0.7, 0).is_none());
    }
}
