//! 2-D kd-tree over pixel locations
//!
//! Points carry their insertion rank so that equidistant neighbors come
//! back in insertion order. Distances are compared as exact squared
//! integers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::panel::Location;

#[derive(Debug, Clone)]
struct Node {
    location: Location,
    rank: usize,
    axis: Axis,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    fn coord(self, location: Location) -> i64 {
        match self {
            Axis::X => location.x as i64,
            Axis::Y => location.y as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    distance_sq: u128,
    rank: usize,
    location: Location,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.distance_sq, self.rank).cmp(&(other.distance_sq, other.rank))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Spatial index answering k-nearest-neighbor queries.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl KdTree {
    /// Build a balanced tree from `(location, rank)` pairs.
    pub fn build(points: impl IntoIterator<Item = (Location, usize)>) -> Self {
        let mut points: Vec<(Location, usize)> = points.into_iter().collect();
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
            root: None,
        };
        tree.root = tree.build_subtree(&mut points, Axis::X);
        tree
    }

    fn build_subtree(&mut self, points: &mut [(Location, usize)], axis: Axis) -> Option<usize> {
        if points.is_empty() {
            return None;
        }
        points.sort_unstable_by_key(|(location, rank)| (axis.coord(*location), *rank));
        let median = points.len() / 2;
        let (location, rank) = points[median];

        let index = self.nodes.len();
        self.nodes.push(Node {
            location,
            rank,
            axis,
            left: None,
            right: None,
        });

        let (lower, rest) = points.split_at_mut(median);
        let left = self.build_subtree(lower, axis.next());
        let right = self.build_subtree(&mut rest[1..], axis.next());
        self.nodes[index].left = left;
        self.nodes[index].right = right;
        Some(index)
    }

    /// Add one point as a new leaf.
    pub fn insert(&mut self, location: Location, rank: usize) {
        let index = self.nodes.len();
        let Some(mut current) = self.root else {
            self.nodes.push(Node {
                location,
                rank,
                axis: Axis::X,
                left: None,
                right: None,
            });
            self.root = Some(index);
            return;
        };

        loop {
            let node = &self.nodes[current];
            let axis = node.axis;
            let go_left = axis.coord(location) < axis.coord(node.location);
            let child = if go_left { node.left } else { node.right };
            match child {
                Some(next) => current = next,
                None => {
                    self.nodes.push(Node {
                        location,
                        rank,
                        axis: axis.next(),
                        left: None,
                        right: None,
                    });
                    let parent = &mut self.nodes[current];
                    if go_left {
                        parent.left = Some(index);
                    } else {
                        parent.right = Some(index);
                    }
                    return;
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The `k` closest locations, nearest first; ties go to the lower rank.
    pub fn nearest(&self, target: Location, k: usize) -> Vec<Location> {
        if k == 0 {
            return Vec::new();
        }
        let mut best = BinaryHeap::with_capacity(k + 1);
        if let Some(root) = self.root {
            self.search(root, target, k, &mut best);
        }
        best.into_sorted_vec()
            .into_iter()
            .map(|candidate| candidate.location)
            .collect()
    }

    fn search(&self, index: usize, target: Location, k: usize, best: &mut BinaryHeap<Candidate>) {
        let node = &self.nodes[index];
        let candidate = Candidate {
            distance_sq: target.distance_sq(node.location),
            rank: node.rank,
            location: node.location,
        };
        if best.len() < k {
            best.push(candidate);
        } else if best.peek().is_some_and(|worst| candidate < *worst) {
            best.pop();
            best.push(candidate);
        }

        let diff = node.axis.coord(target) - node.axis.coord(node.location);
        let (near, far) = if diff < 0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search(near, target, k, best);
        }
        if let Some(far) = far {
            // Equal distances must still be visited for rank tie-breaking.
            let plane_sq = (diff.unsigned_abs() as u128).pow(2);
            let must_visit = best.len() < k
                || best
                    .peek()
                    .is_some_and(|worst| plane_sq <= worst.distance_sq);
            if must_visit {
                self.search(far, target, k, best);
            }
        }
    }
}
