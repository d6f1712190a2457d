//! Multi-class boosted-tree scoring model
//!
//! Per-class additive tree ensembles evaluated by iterative node traversal;
//! class scores go through a softmax to produce a probability distribution.
//! Learning rate is baked into leaf values at fit time, so evaluation is a
//! plain sum over trees plus the class bias.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Feature index to compare (for internal nodes)
    pub feature_index: u32,
    /// Threshold value for comparison
    pub threshold: f64,
    /// Index of left child node
    pub left: u32,
    /// Index of right child node
    pub right: u32,
    /// Leaf value (None for internal nodes, Some for leaves)
    pub value: Option<f64>,
}

impl Node {
    pub fn leaf(value: f64) -> Self {
        Self {
            feature_index: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: Some(value),
        }
    }

    pub fn internal(feature_index: u32, threshold: f64, left: u32, right: u32) -> Self {
        Self {
            feature_index,
            threshold,
            left,
            right,
            value: None,
        }
    }
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Evaluate the tree on a feature vector.
    ///
    /// Out-of-range node or feature indices terminate traversal with 0
    /// rather than panicking; served vectors are reindexed to the canonical
    /// width before they reach here.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if let Some(value) = node.value {
                return value;
            }

            let feature_idx = node.feature_index as usize;
            let Some(&feature_value) = features.get(feature_idx) else {
                return 0.0;
            };

            idx = if feature_value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }
}

/// Fitted multi-class probabilistic classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerModel {
    /// Per-class bias (log prior at fit time)
    pub biases: Vec<f64>,
    /// Per-class additive tree ensemble; `ensembles.len() == biases.len()`
    pub ensembles: Vec<Vec<Tree>>,
}

impl CareerModel {
    /// Number of job-role classes this model was fitted on
    pub fn num_classes(&self) -> usize {
        self.biases.len()
    }

    /// Raw additive score per class
    pub fn score(&self, features: &[f64]) -> Vec<f64> {
        self.biases
            .iter()
            .zip(self.ensembles.iter())
            .map(|(&bias, trees)| {
                bias + trees.iter().map(|t| t.evaluate(features)).sum::<f64>()
            })
            .collect()
    }

    /// Probability distribution over job-role classes
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        softmax(&self.score(features))
    }

    /// Blake3 fingerprint of the serialized model; identifies the bundle
    /// this model belongs to across swaps and cached snapshots.
    pub fn fingerprint(&self) -> String {
        // serde_json ordering is deterministic for this struct (ordered
        // vectors, fixed field order), so the hash is stable per model.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(blake3::hash(&bytes).as_bytes())
    }
}

/// Numerically stable softmax; an empty slice yields an empty distribution
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum <= 0.0 {
        // Degenerate scores: fall back to a uniform distribution
        return vec![1.0 / scores.len() as f64; scores.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}
