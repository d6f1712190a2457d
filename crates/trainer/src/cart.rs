//! Exact-greedy CART regression tree builder
//!
//! Builds one regression tree over gradient/hessian pairs. Feature
//! candidates are visited in index order and thresholds in ascending
//! order, with strictly-greater gain required to displace the incumbent
//! split, so construction is deterministic for a given input.

use edu2job_core::model::{Node, Tree};

/// Parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Learning rate baked into leaf values
    pub leaf_shrinkage: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_samples_leaf: 2,
            leaf_shrinkage: 0.1,
        }
    }
}

// Hessian regularization; keeps leaf values finite when a partition's
// hessians approach zero
const HESSIAN_EPS: f64 = 1e-6;

/// Candidate split retained during the exact-greedy scan
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Builds one regression tree from borrowed training state
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    gradients: &'a [f64],
    hessians: &'a [f64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<f64>],
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
    ) -> Self {
        assert_eq!(features.len(), gradients.len());
        assert_eq!(features.len(), hessians.len());
        let feature_count = features.first().map(Vec::len).unwrap_or(0);
        Self {
            config,
            features,
            gradients,
            hessians,
            feature_count,
        }
    }

    pub fn build(&self) -> Tree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.features.len()).collect();
        self.build_node(&indices, 0, &mut nodes);
        Tree { nodes }
    }

    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> u32 {
        let current_idx = nodes.len() as u32;
        let leaf_value = self.leaf_value(indices);

        if depth >= self.config.max_depth || indices.len() < 2 * self.config.min_samples_leaf {
            nodes.push(Node::leaf(leaf_value));
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices) else {
            nodes.push(Node::leaf(leaf_value));
            return current_idx;
        };

        let (left_indices, right_indices) =
            self.partition(indices, split.feature_idx, split.threshold);
        if left_indices.len() < self.config.min_samples_leaf
            || right_indices.len() < self.config.min_samples_leaf
        {
            nodes.push(Node::leaf(leaf_value));
            return current_idx;
        }

        // Reserve the internal node, then fill child indices after recursion
        nodes.push(Node::internal(split.feature_idx as u32, split.threshold, 0, 0));
        let left = self.build_node(&left_indices, depth + 1, nodes);
        let right = self.build_node(&right_indices, depth + 1, nodes);
        nodes[current_idx as usize].left = left;
        nodes[current_idx as usize].right = right;

        current_idx
    }

    fn find_best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..self.feature_count {
            for threshold in self.candidate_thresholds(indices, feature_idx) {
                let (left, right) = self.partition(indices, feature_idx, threshold);
                if left.len() < self.config.min_samples_leaf
                    || right.len() < self.config.min_samples_leaf
                {
                    continue;
                }

                let gain = self.split_gain(&left, &right, indices);
                let better = match &best {
                    None => gain > 0.0,
                    Some(current) => gain > current.gain,
                };
                if better {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Unique ascending feature values; the largest is skipped because
    /// splitting at it leaves the right partition empty
    fn candidate_thresholds(&self, indices: &[usize], feature_idx: usize) -> Vec<f64> {
        let mut values: Vec<f64> = indices
            .iter()
            .map(|&i| self.features[i][feature_idx])
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        values.pop();
        values
    }

    fn partition(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &idx in indices {
            if self.features[idx][feature_idx] <= threshold {
                left.push(idx);
            } else {
                right.push(idx);
            }
        }
        (left, right)
    }

    /// Gain = G_left^2/H_left + G_right^2/H_right - G_parent^2/H_parent
    fn split_gain(&self, left: &[usize], right: &[usize], parent: &[usize]) -> f64 {
        let term = |indices: &[usize]| {
            let (g, h) = self.sum_grad_hess(indices);
            (g * g) / (h + HESSIAN_EPS)
        };
        term(left) + term(right) - term(parent)
    }

    fn sum_grad_hess(&self, indices: &[usize]) -> (f64, f64) {
        let mut sum_g = 0.0;
        let mut sum_h = 0.0;
        for &idx in indices {
            sum_g += self.gradients[idx];
            sum_h += self.hessians[idx];
        }
        (sum_g, sum_h)
    }

    /// Optimal leaf value -G/H, shrunk by the learning rate
    fn leaf_value(&self, indices: &[usize]) -> f64 {
        let (sum_g, sum_h) = self.sum_grad_hess(indices);
        -self.config.leaf_shrinkage * sum_g / (sum_h + HESSIAN_EPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_a_separable_gradient() {
        let features = vec![vec![0.1], vec![0.2], vec![0.8], vec![0.9]];
        let gradients = vec![-1.0, -1.0, 1.0, 1.0];
        let hessians = vec![0.25; 4];

        let builder = CartBuilder::new(
            &features,
            &gradients,
            &hessians,
            TreeConfig {
                max_depth: 2,
                min_samples_leaf: 1,
                leaf_shrinkage: 1.0,
            },
        );
        let tree = builder.build();

        // Left half should be pushed up, right half down
        assert!(tree.evaluate(&[0.15]) > 0.0);
        assert!(tree.evaluate(&[0.85]) < 0.0);
    }

    #[test]
    fn single_sample_produces_a_leaf() {
        let features = vec![vec![0.5]];
        let gradients = vec![-1.0];
        let hessians = vec![0.25];

        let builder = CartBuilder::new(&features, &gradients, &hessians, TreeConfig::default());
        let tree = builder.build();

        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.nodes[0].value.is_some());
    }

    #[test]
    fn construction_is_deterministic() {
        let features = vec![vec![0.1, 1.0], vec![0.4, 0.2], vec![0.6, 0.9], vec![0.8, 0.3]];
        let gradients = vec![-0.5, 0.5, -0.5, 0.5];
        let hessians = vec![0.25; 4];
        let config = TreeConfig {
            max_depth: 3,
            min_samples_leaf: 1,
            leaf_shrinkage: 0.1,
        };

        let t1 = CartBuilder::new(&features, &gradients, &hessians, config.clone()).build();
        let t2 = CartBuilder::new(&features, &gradients, &hessians, config).build();
        assert_eq!(t1, t2);
    }

    #[test]
    fn respects_min_samples_leaf() {
        let features = vec![vec![0.1], vec![0.9]];
        let gradients = vec![-1.0, 1.0];
        let hessians = vec![0.25, 0.25];

        let builder = CartBuilder::new(
            &features,
            &gradients,
            &hessians,
            TreeConfig {
                max_depth: 3,
                min_samples_leaf: 2,
                leaf_shrinkage: 1.0,
            },
        );
        let tree = builder.build();
        assert_eq!(tree.nodes.len(), 1);
    }
}
