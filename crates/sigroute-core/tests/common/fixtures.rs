//! Synthetic graphs and problem instances.

#![allow(dead_code)]

use sigroute_core::{NodeId, Problem};

/// Edges of the path `0 - 1 - ... - (n-1)`
pub fn path_edges(n: usize) -> Vec<(NodeId, NodeId)> {
    (1..n).map(|i| (i - 1, i)).collect()
}

/// Edges of the ring `0 - 1 - ... - (n-1) - 0`
pub fn ring_edges(n: usize) -> Vec<(NodeId, NodeId)> {
    (0..n).map(|i| (i, (i + 1) % n)).collect()
}

/// Edges of a `w x h` grid, node id `y * w + x`
pub fn grid_edges(w: usize, h: usize) -> Vec<(NodeId, NodeId)> {
    let mut edges = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let id = y * w + x;
            if x + 1 < w {
                edges.push((id, id + 1));
            }
            if y + 1 < h {
                edges.push((id, id + w));
            }
        }
    }
    edges
}

fn render(
    node_count: usize,
    edges: &[(NodeId, NodeId)],
    order: &[NodeId],
    capacity_a: usize,
    capacity_b: usize,
) -> String {
    let mut text = format!(
        "{} {} {} {} {}\n",
        node_count,
        edges.len(),
        order.len(),
        capacity_a,
        capacity_b
    );
    for (u, v) in edges {
        text.push_str(&format!("{} {}\n", u, v));
    }
    let targets: Vec<String> = order.iter().map(|t| t.to_string()).collect();
    text.push_str(&targets.join(" "));
    text.push('\n');
    text
}

/// Path of `n` nodes visited in `order`
pub fn path_problem(n: usize, order: &[NodeId], capacity_a: usize, capacity_b: usize) -> Problem {
    Problem::parse(&render(n, &path_edges(n), order, capacity_a, capacity_b)).unwrap()
}

/// `w x h` grid visiting its corners and centre back and forth
pub fn grid_problem(w: usize, h: usize, capacity_a: usize, capacity_b: usize) -> Problem {
    let n = w * h;
    let corners = [w - 1, n - 1, n - w, (h / 2) * w + w / 2];
    let order: Vec<NodeId> = corners.iter().cycle().take(12).copied().collect();
    Problem::parse(&render(n, &grid_edges(w, h), &order, capacity_a, capacity_b)).unwrap()
}

/// Path `0-1-2-3-4`, buffer 3, directory 6, order `[2, 4, 0]`
pub fn scenario_problem() -> Problem {
    path_problem(5, &[2, 4, 0], 6, 3)
}
