//! Geometric union of observed areas.
//!
//! Boxes are dissolved on the grid spanned by their edges: every grid cell
//! inside some box is covered, and the boundary between covered and
//! uncovered cells is traced into rings. Each connected part becomes one
//! polygon with its outer ring first (counter-clockwise) and its holes
//! after it (clockwise). Parts touching only at a corner stay separate.
//!
//! Points and zero-width boxes have no area; they survive only where no
//! box covers them.

use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};

use crate::models::Envelope;

type Vertex = (i64, i64);
type Ring = Vec<[f64; 2]>;

/// GeoJSON geometry of the union of `areas`, or `None` for no areas.
pub fn union(areas: &[Envelope]) -> Option<Value> {
    let boxes: Vec<Envelope> = areas.iter().filter(|e| e.has_area()).copied().collect();
    let polygons = dissolve(&boxes);

    let mut rest: Vec<Envelope> = Vec::new();
    for area in areas.iter().filter(|e| !e.has_area()) {
        if !boxes.iter().any(|b| b.contains(area)) && !rest.contains(area) {
            rest.push(*area);
        }
    }

    if rest.is_empty() {
        return match polygons.len() {
            0 => None,
            1 => Some(json!({ "type": "Polygon", "coordinates": polygons[0] })),
            _ => Some(json!({ "type": "MultiPolygon", "coordinates": polygons })),
        };
    }
    if polygons.is_empty() && rest.iter().all(Envelope::is_point) {
        let points: Vec<[f64; 2]> = rest.iter().map(|p| p.lower).collect();
        return Some(match points.as_slice() {
            [point] => json!({ "type": "Point", "coordinates": point }),
            _ => json!({ "type": "MultiPoint", "coordinates": points }),
        });
    }

    let geometries: Vec<Value> = polygons
        .iter()
        .map(|rings| json!({ "type": "Polygon", "coordinates": rings }))
        .chain(rest.iter().map(degenerate_geometry))
        .collect();
    Some(json!({ "type": "GeometryCollection", "geometries": geometries }))
}

fn degenerate_geometry(e: &Envelope) -> Value {
    if e.is_point() {
        json!({ "type": "Point", "coordinates": e.lower })
    } else {
        json!({ "type": "LineString", "coordinates": [e.lower, e.upper] })
    }
}

fn grid_lines(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut lines: Vec<f64> = values.collect();
    lines.sort_by(f64::total_cmp);
    lines.dedup();
    lines
}

/// A traced ring in grid coordinates.
struct Trace {
    vertices: Vec<Vertex>,
    /// A point strictly inside a covered cell next to the ring.
    inside: (f64, f64),
}

/// Rings of the union of `boxes`, one ring list per connected part.
fn dissolve(boxes: &[Envelope]) -> Vec<Vec<Ring>> {
    let xs = grid_lines(boxes.iter().flat_map(|b| [b.lower[0], b.upper[0]]));
    let ys = grid_lines(boxes.iter().flat_map(|b| [b.lower[1], b.upper[1]]));
    if xs.len() < 2 || ys.len() < 2 {
        return Vec::new();
    }
    let (nx, ny) = (xs.len() - 1, ys.len() - 1);

    let mut covered = vec![false; nx * ny];
    for j in 0..ny {
        for i in 0..nx {
            covered[j * nx + i] = boxes.iter().any(|b| {
                b.lower[0] <= xs[i]
                    && xs[i + 1] <= b.upper[0]
                    && b.lower[1] <= ys[j]
                    && ys[j + 1] <= b.upper[1]
            });
        }
    }
    let is_covered = |i: i64, j: i64| {
        i >= 0
            && j >= 0
            && (i as usize) < nx
            && (j as usize) < ny
            && covered[j as usize * nx + i as usize]
    };

    // Boundary edges, covered side on the left.
    let mut edges: BTreeMap<Vertex, Vec<Vertex>> = BTreeMap::new();
    for j in 0..ny as i64 {
        for i in 0..nx as i64 {
            if !is_covered(i, j) {
                continue;
            }
            let sides = [
                ((i, j), (i + 1, j), (i, j - 1)),
                ((i + 1, j), (i + 1, j + 1), (i + 1, j)),
                ((i + 1, j + 1), (i, j + 1), (i, j + 1)),
                ((i, j + 1), (i, j), (i - 1, j)),
            ];
            for (from, to, neighbour) in sides {
                if !is_covered(neighbour.0, neighbour.1) {
                    edges.entry(from).or_default().push(to);
                }
            }
        }
    }

    let traces = trace_rings(&edges);
    let (outers, holes): (Vec<Trace>, Vec<Trace>) =
        traces.into_iter().partition(|t| twice_area(&t.vertices) > 0);

    let mut parts: Vec<Vec<Vec<Vertex>>> =
        outers.iter().map(|o| vec![o.vertices.clone()]).collect();
    for hole in holes {
        let owner = outers
            .iter()
            .enumerate()
            .filter(|(_, o)| encloses(&o.vertices, hole.inside))
            .min_by_key(|(_, o)| twice_area(&o.vertices))
            .map(|(k, _)| k);
        if let Some(k) = owner {
            parts[k].push(hole.vertices);
        }
    }

    parts
        .into_iter()
        .map(|rings| {
            rings
                .iter()
                .map(|ring| {
                    let mut coordinates: Ring = ring
                        .iter()
                        .map(|&(i, j)| [xs[i as usize], ys[j as usize]])
                        .collect();
                    if let Some(first) = coordinates.first().copied() {
                        coordinates.push(first);
                    }
                    coordinates
                })
                .collect()
        })
        .collect()
}

/// Follow boundary edges into closed rings.
///
/// Where two rings meet at a corner the walk turns left, which keeps
/// parts touching at a single point apart.
fn trace_rings(edges: &BTreeMap<Vertex, Vec<Vertex>>) -> Vec<Trace> {
    let next = |from: Vertex, at: Vertex| -> Option<Vertex> {
        let (dx, dy) = (at.0 - from.0, at.1 - from.1);
        let outgoing = edges.get(&at)?;
        [(-dy, dx), (dx, dy), (dy, -dx)]
            .iter()
            .find_map(|&turn| {
                outgoing
                    .iter()
                    .find(|to| (to.0 - at.0, to.1 - at.1) == turn)
            })
            .copied()
    };

    let mut visited: HashSet<(Vertex, Vertex)> = HashSet::new();
    let mut traces = Vec::new();
    for (&from, targets) in edges {
        for &to in targets {
            if visited.contains(&(from, to)) {
                continue;
            }
            let (dx, dy) = (to.0 - from.0, to.1 - from.1);
            let inside = (
                (from.0 + to.0) as f64 / 2.0 - dy as f64 * 0.25,
                (from.1 + to.1) as f64 / 2.0 + dx as f64 * 0.25,
            );

            let mut walk = Vec::new();
            let (mut a, mut b) = (from, to);
            while visited.insert((a, b)) {
                walk.push(a);
                match next(a, b) {
                    Some(c) => (a, b) = (b, c),
                    None => break,
                }
            }
            traces.push(Trace {
                vertices: normalize(walk),
                inside,
            });
        }
    }
    traces
}

/// Drop vertices on straight runs and start at the smallest vertex.
fn normalize(walk: Vec<Vertex>) -> Vec<Vertex> {
    let n = walk.len();
    let corners: Vec<Vertex> = (0..n)
        .filter(|&k| {
            let (p, v, q) = (walk[(k + n - 1) % n], walk[k], walk[(k + 1) % n]);
            (v.0 - p.0) * (q.1 - v.1) != (v.1 - p.1) * (q.0 - v.0)
        })
        .map(|k| walk[k])
        .collect();
    let start = (0..corners.len())
        .min_by_key(|&k| corners[k])
        .unwrap_or(0);
    let mut ring = corners[start..].to_vec();
    ring.extend_from_slice(&corners[..start]);
    ring
}

fn twice_area(ring: &[Vertex]) -> i64 {
    let n = ring.len();
    (0..n)
        .map(|k| {
            let (a, b) = (ring[k], ring[(k + 1) % n]);
            a.0 * b.1 - b.0 * a.1
        })
        .sum()
}

fn encloses(ring: &[Vertex], (px, py): (f64, f64)) -> bool {
    let n = ring.len();
    let mut inside = false;
    for k in 0..n {
        let (x0, y0) = (ring[k].0 as f64, ring[k].1 as f64);
        let (x1, y1) = (ring[(k + 1) % n].0 as f64, ring[(k + 1) % n].1 as f64);
        if (y0 > py) != (y1 > py) && px < x0 + (py - y0) * (x1 - x0) / (y1 - y0) {
            inside = !inside;
        }
    }
    inside
}
