//! Variance-reduction regression tree.
//!
//! Nodes live in a flat arena (`nodes[0]` is the root) so a fitted tree is a
//! plain `Vec` that serializes without recursion.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Arena index of a node.
pub type NodeId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Terminal node predicting the mean target of its training rows.
    Leaf { value: f64, n_samples: u32 },
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: u32,
        threshold: f64,
        left: NodeId,
        right: NodeId,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowLimits {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Sum of squared deviations of both children.
    sse: f64,
}

impl RegressionTree {
    /// Grow a tree over the rows named by `sample` (duplicates allowed).
    pub(crate) fn grow<R: Rng + ?Sized>(
        x: &[FeatureVector],
        y: &[f64],
        sample: Vec<usize>,
        limits: GrowLimits,
        rng: &mut R,
    ) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let mut builder = Builder {
            x,
            y,
            limits,
            features: (0..n_features).collect(),
            nodes: Vec::new(),
        };
        builder.build(sample, 0, rng);
        Self { nodes: builder.nodes }
    }

    /// Leaf value reached by `row`.
    ///
    /// `row` must be at least as wide as the training rows; the forest checks
    /// this before calling.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut id = 0usize;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature as usize] <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => {
                    1 + walk(nodes, *left as usize).max(walk(nodes, *right as usize))
                }
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Structural sanity check used when loading persisted trees.
    pub(crate) fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value, .. } if !value.is_finite() => {
                    return Err(format!("node {id}: non-finite leaf value"));
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature as usize >= n_features {
                        return Err(format!("node {id}: feature {feature} out of range"));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {id}: NaN threshold"));
                    }
                    // Children are always allocated after their parent, which
                    // also rules out cycles.
                    for child in [*left, *right] {
                        let child = child as usize;
                        if child <= id || child >= self.nodes.len() {
                            return Err(format!("node {id}: bad child index {child}"));
                        }
                    }
                }
                Node::Leaf { .. } => {}
            }
        }
        Ok(())
    }
}

struct Builder<'a> {
    x: &'a [FeatureVector],
    y: &'a [f64],
    limits: GrowLimits,
    features: Vec<usize>,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn build<R: Rng + ?Sized>(&mut self, rows: Vec<usize>, depth: usize, rng: &mut R) -> NodeId {
        let id = self.nodes.len() as NodeId;
        let n = rows.len();
        let (sum, sum_sq, min, max) = rows.iter().fold(
            (0.0, 0.0, f64::INFINITY, f64::NEG_INFINITY),
            |(s, sq, lo, hi), &i| {
                let v = self.y[i];
                (s + v, sq + v * v, lo.min(v), hi.max(v))
            },
        );
        let leaf = Node::Leaf {
            value: if n == 0 { 0.0 } else { sum / n as f64 },
            n_samples: n as u32,
        };

        let should_stop = n < self.limits.min_samples_split
            || n < 2 * self.limits.min_samples_leaf
            || self.limits.max_depth.is_some_and(|d| depth >= d)
            || min == max;
        if should_stop {
            self.nodes.push(leaf);
            return id;
        }

        let parent_sse = (sum_sq - sum * sum / n as f64).max(0.0);
        let Some(best) = self.best_split(&rows, rng) else {
            self.nodes.push(leaf);
            return id;
        };
        if best.sse >= parent_sse - parent_sse.abs() * 1e-12 {
            self.nodes.push(leaf);
            return id;
        }

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| self.x[i][best.feature] <= best.threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            self.nodes.push(leaf);
            return id;
        }

        // Reserve this node's slot, then fill it once the children exist.
        self.nodes.push(leaf);
        let left = self.build(left_rows, depth + 1, rng);
        let right = self.build(right_rows, depth + 1, rng);
        self.nodes[id as usize] = Node::Split {
            feature: best.feature as u32,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    /// Scan features in random order until `max_features` non-constant ones
    /// have been evaluated; return the split with the lowest child SSE.
    fn best_split<R: Rng + ?Sized>(&mut self, rows: &[usize], rng: &mut R) -> Option<SplitCandidate> {
        self.features.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut evaluated = 0usize;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(rows.len());

        for &feature in &self.features {
            if evaluated >= self.limits.max_features {
                break;
            }
            pairs.clear();
            pairs.extend(rows.iter().map(|&i| (self.x[i][feature], self.y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let first = pairs[0].0;
            let last = pairs[pairs.len() - 1].0;
            if first == last {
                continue;
            }
            evaluated += 1;

            if let Some(candidate) = scan_feature(&pairs, feature, self.limits.min_samples_leaf) {
                if best.is_none_or(|b| candidate.sse < b.sse) {
                    best = Some(candidate);
                }
            }
        }
        best
    }
}

/// Best threshold along one feature. `pairs` is sorted by feature value.
fn scan_feature(pairs: &[(f64, f64)], feature: usize, min_leaf: usize) -> Option<SplitCandidate> {
    let n = pairs.len();
    let (total, total_sq) = pairs
        .iter()
        .fold((0.0, 0.0), |(s, sq), &(_, v)| (s + v, sq + v * v));

    let mut best: Option<SplitCandidate> = None;
    let mut left_sum = 0.0;
    let mut left_sq = 0.0;

    for i in 0..n - 1 {
        let (xv, yv) = pairs[i];
        left_sum += yv;
        left_sq += yv * yv;

        let next = pairs[i + 1].0;
        if xv == next {
            continue;
        }
        let n_left = i + 1;
        let n_right = n - n_left;
        if n_left < min_leaf || n_right < min_leaf {
            continue;
        }

        let right_sum = total - left_sum;
        let right_sq = total_sq - left_sq;
        let sse = (left_sq - left_sum * left_sum / n_left as f64).max(0.0)
            + (right_sq - right_sum * right_sum / n_right as f64).max(0.0);

        if best.is_none_or(|b| sse < b.sse) {
            let mut threshold = xv + (next - xv) / 2.0;
            // Guard against the midpoint rounding up onto the right value.
            if threshold >= next {
                threshold = xv;
            }
            if !threshold.is_finite() {
                continue;
            }
            best = Some(SplitCandidate {
                feature,
                threshold,
                sse,
            });
        }
    }
    best
}
