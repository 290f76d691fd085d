//! Mesh simplification by iterative edge contraction.
//!
//! Implements the Garland-Heckbert surface simplification algorithm: edges
//! are contracted in order of quadric error cost until the face count drops
//! to the requested fraction of the input. Candidates live in a min-heap with
//! lazy invalidation; entries made stale by a contraction are flagged rather
//! than removed and skipped when they surface at the top.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use tracing::debug;

use crate::error::{SimplifyError, SimplifyResult};
use crate::halfedge::{EdgeKey, HalfEdgeMesh, Vertex, flip};
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::quadric::{QuadricTable, optimal_contraction};
use crate::tracing_ext::ReductionTimer;
use crate::types::Mesh;

/// A candidate edge contraction.
///
/// The `valid` flag works around the priority queue not supporting priority
/// updates: when an edge's cost changes, the live entry is flagged stale and
/// a replacement pushed, and stale entries are skipped at the top of the
/// heap.
#[derive(Debug)]
struct Contraction {
    /// The canonical half-edge to collapse.
    edge: EdgeKey,

    /// The optimal position for the replacement vertex.
    position: Point3<f64>,

    /// The cost of collapsing this edge.
    cost: f64,

    /// Insertion sequence number; breaks cost ties deterministically.
    seq: u64,

    /// Whether this entry still reflects the current state of its edge.
    valid: Cell<bool>,
}

impl PartialEq for Contraction {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl Eq for Contraction {}

impl PartialOrd for Contraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Contraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior; earlier insertion wins ties.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Of the two half-edges of an undirected edge, the one pointing to the
/// endpoint with the smaller id. Used as the deterministic key for heap
/// entries and the validity map.
#[inline]
fn canonical_edge(edge: EdgeKey) -> EdgeKey {
    if edge.1 < edge.0 { edge } else { flip(edge) }
}

/// Compute a contraction candidate for a canonical edge.
fn compute_contraction(
    mesh: &HalfEdgeMesh,
    quadrics: &QuadricTable,
    edge: EdgeKey,
    seq: u64,
) -> SimplifyResult<Rc<Contraction>> {
    let v0 = mesh.vertex(edge.0)?;
    let v1 = mesh.vertex(edge.1)?;

    let quadric = quadrics.edge_quadric(v0.id(), v1.id());
    let (position, cost) = optimal_contraction(&quadric, v0.position(), v1.position());

    Ok(Rc::new(Contraction {
        edge,
        position,
        cost,
        seq,
        valid: Cell::new(true),
    }))
}

/// Determine if collapsing `edge01` would break the manifold.
///
/// This is the link condition: the collapse is rejected when the one-rings of
/// the endpoints share any vertex other than the two wing vertices (the
/// apexes of the triangles incident to the edge), or when the wings
/// themselves coincide. Accepting such a collapse would fuse two previously
/// distinct triangles.
fn will_degenerate(mesh: &HalfEdgeMesh, edge01: EdgeKey) -> SimplifyResult<bool> {
    let edge10 = flip(edge01);
    let v0 = edge01.0;
    let v1_next = mesh.half_edge(mesh.next_key(edge01)?)?.vertex();
    let v0_next = mesh.half_edge(mesh.next_key(edge10)?)?.vertex();

    if v1_next == v0_next {
        return Ok(true);
    }

    let mut neighborhood = HashSet::new();
    let mut iterator = mesh.next_key(edge01)?;
    while iterator != edge10 {
        let vertex = mesh.half_edge(iterator)?.vertex();
        if vertex != v0 && vertex != v1_next && vertex != v0_next {
            neighborhood.insert(vertex);
        }
        iterator = mesh.next_key(flip(iterator))?;
    }

    let mut iterator = mesh.next_key(edge10)?;
    while iterator != edge01 {
        if neighborhood.contains(&mesh.half_edge(iterator)?.vertex()) {
            return Ok(true);
        }
        iterator = mesh.next_key(flip(iterator))?;
    }

    Ok(false)
}

/// Reduce the number of triangles in a mesh.
///
/// `rate` is the fraction of triangles to remove: 0 performs no
/// simplification, 1 removes as many as the topology allows. The result
/// carries freshly computed vertex normals and the input's model transform;
/// texture coordinates are not tracked across contraction and come back
/// empty.
///
/// Fails with `InvalidRate` when `rate` is outside `[0, 1]` and
/// `NonManifoldInput` when the input is not a closed oriented manifold. The
/// input mesh is never modified.
pub fn simplify(mesh: &Mesh, rate: f64) -> SimplifyResult<Mesh> {
    simplify_with_progress(mesh, rate, None)
}

/// Progress-reporting variant of [`simplify`].
///
/// The callback is invoked at collapse boundaries; returning `false` stops
/// the run and yields the partially simplified mesh.
pub fn simplify_with_progress(
    mesh: &Mesh,
    rate: f64,
    callback: Option<&ProgressCallback>,
) -> SimplifyResult<Mesh> {
    simplify_impl(mesh, rate, callback, None)
}

/// Shared driver body. `collapse_observer` receives the cost of every
/// applied (non-stale, non-degenerate) contraction in pop order.
fn simplify_impl(
    mesh: &Mesh,
    rate: f64,
    callback: Option<&ProgressCallback>,
    mut collapse_observer: Option<&mut dyn FnMut(f64)>,
) -> SimplifyResult<Mesh> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(SimplifyError::InvalidRate { rate });
    }

    let timer = ReductionTimer::start("simplify", mesh);

    let mut half_edge_mesh = HalfEdgeMesh::from_mesh(mesh)?;
    let mut quadrics = QuadricTable::from_mesh(&half_edge_mesh)?;

    let mut heap: BinaryHeap<Rc<Contraction>> = BinaryHeap::new();
    let mut valid_edges: HashMap<EdgeKey, Rc<Contraction>> = HashMap::new();
    let mut seq = 0u64;

    // One candidate per undirected edge.
    let edge_keys: Vec<EdgeKey> = half_edge_mesh.edges().keys().copied().collect();
    for edge in edge_keys {
        let min_edge = canonical_edge(edge);
        if !valid_edges.contains_key(&min_edge) {
            let contraction = compute_contraction(&half_edge_mesh, &quadrics, min_edge, seq)?;
            seq += 1;
            heap.push(Rc::clone(&contraction));
            valid_edges.insert(min_edge, contraction);
        }
    }

    let initial_face_count = half_edge_mesh.face_count();
    let target_face_count = initial_face_count as f64 * (1.0 - rate);
    let estimated_collapses =
        ((initial_face_count as f64 - target_face_count) / 2.0).ceil().max(1.0) as u64;
    let tracker = ProgressTracker::with_interval(estimated_collapses, std::time::Duration::ZERO);

    while half_edge_mesh.face_count() as f64 > target_face_count {
        let Some(contraction) = heap.pop() else {
            break;
        };

        if !contraction.valid.get() || will_degenerate(&half_edge_mesh, contraction.edge)? {
            continue;
        }

        let edge01 = contraction.edge;
        let (v0, v1) = edge01;

        let v_new = Vertex::new(half_edge_mesh.allocate_vertex_id(), contraction.position);
        let v_new_id = v_new.id();
        quadrics.merge(v0, v1, v_new_id);

        // Drop queue entries for every edge touching the endpoints; those
        // edges are about to disappear or be renamed.
        for vertex in [v0, v1] {
            for edge in half_edge_mesh.ring_edges(vertex)? {
                if let Some(entry) = valid_edges.remove(&canonical_edge(edge)) {
                    entry.valid.set(false);
                }
            }
        }

        half_edge_mesh.collapse_edge(edge01, v_new)?;

        if let Some(observer) = collapse_observer.as_mut() {
            observer(contraction.cost);
        }

        // Re-cost every edge whose quadric sum changed: the edges of the new
        // vertex's one-ring and of each neighbor's one-ring.
        let mut visited: HashSet<EdgeKey> = HashSet::new();
        for edgeji in half_edge_mesh.ring_edges(v_new_id)? {
            let vj = edgeji.0;
            for edgekj in half_edge_mesh.ring_edges(vj)? {
                let min_edge = canonical_edge(edgekj);
                if visited.insert(min_edge) {
                    if let Some(stale) = valid_edges.get(&min_edge) {
                        stale.valid.set(false);
                    }
                    let replacement =
                        compute_contraction(&half_edge_mesh, &quadrics, min_edge, seq)?;
                    seq += 1;
                    heap.push(Rc::clone(&replacement));
                    valid_edges.insert(min_edge, replacement);
                }
            }
        }

        tracker.increment();
        if !tracker.maybe_callback(
            callback,
            format!(
                "{} triangles remaining (target: {:.0})",
                half_edge_mesh.face_count(),
                target_face_count
            ),
        ) {
            debug!(
                collapsed = tracker.current(),
                "simplification cancelled by caller"
            );
            break;
        }
    }

    let result = half_edge_mesh.to_mesh();
    timer.finish(&result, tracker.current());

    Ok(result)
}
