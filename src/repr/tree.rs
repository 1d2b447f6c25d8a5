//! Structure-of-arrays regression tree.
//!
//! Nodes live in flat parallel arrays for cache-friendly traversal. Child
//! indices are local to the tree (0 = root). The grower builds a tree by
//! pushing nodes and patching children; after induction the loss family may
//! rewrite leaf values in place ([`Tree::set_leaf_value`]), which is the
//! only mutation a finished tree ever sees.

use ndarray::{Array1, ArrayView1};

use super::NodeId;

// =============================================================================
// Tree
// =============================================================================

/// A single regression tree.
///
/// Every node carries a value (the mean of its training targets); internal
/// nodes additionally carry the split feature, threshold, and the squared
/// error reduction of the split.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_features: Vec<u32>,
    thresholds: Vec<f64>,
    left_children: Vec<NodeId>,
    right_children: Vec<NodeId>,
    is_leaf: Vec<bool>,
    values: Vec<f64>,
    gains: Vec<f64>,
}

impl Tree {
    /// Create an empty tree; nodes are appended by the grower.
    pub(crate) fn new() -> Self {
        Self {
            split_features: Vec::new(),
            thresholds: Vec::new(),
            left_children: Vec::new(),
            right_children: Vec::new(),
            is_leaf: Vec::new(),
            values: Vec::new(),
            gains: Vec::new(),
        }
    }

    /// Append a leaf node predicting `value`.
    pub(crate) fn push_leaf(&mut self, value: f64) -> NodeId {
        self.push_node(0, 0.0, true, value, 0.0)
    }

    /// Append a split node. Children start unset; patch them with
    /// [`Tree::set_children`] once both subtrees exist.
    pub(crate) fn push_split(
        &mut self,
        feature: usize,
        threshold: f64,
        value: f64,
        gain: f64,
    ) -> NodeId {
        self.push_node(feature as u32, threshold, false, value, gain)
    }

    fn push_node(
        &mut self,
        feature: u32,
        threshold: f64,
        is_leaf: bool,
        value: f64,
        gain: f64,
    ) -> NodeId {
        let id = self.values.len() as NodeId;
        self.split_features.push(feature);
        self.thresholds.push(threshold);
        self.left_children.push(0);
        self.right_children.push(0);
        self.is_leaf.push(is_leaf);
        self.values.push(value);
        self.gains.push(gain);
        id
    }

    /// Patch the children of a split node.
    pub(crate) fn set_children(&mut self, node: NodeId, left: NodeId, right: NodeId) {
        debug_assert!(!self.is_leaf[node as usize]);
        self.left_children[node as usize] = left;
        self.right_children[node as usize] = right;
    }

    /// Overwrite a leaf's predicted value (terminal-region refinement).
    pub(crate) fn set_leaf_value(&mut self, node: NodeId, value: f64) {
        debug_assert!(self.is_leaf[node as usize]);
        self.values[node as usize] = value;
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    /// Number of nodes in the tree.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.values.len()
    }

    /// Whether `node` is a leaf.
    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    /// Split feature of an internal node.
    #[inline]
    pub fn split_feature(&self, node: NodeId) -> usize {
        self.split_features[node as usize] as usize
    }

    /// Split threshold of an internal node.
    #[inline]
    pub fn threshold(&self, node: NodeId) -> f64 {
        self.thresholds[node as usize]
    }

    /// Left child of an internal node.
    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    /// Right child of an internal node.
    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    /// Predicted value stored at `node`.
    #[inline]
    pub fn value(&self, node: NodeId) -> f64 {
        self.values[node as usize]
    }

    /// Iterator over the leaf node ids.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.is_leaf
            .iter()
            .enumerate()
            .filter(|(_, &leaf)| leaf)
            .map(|(id, _)| id as NodeId)
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Traverse from the root to the leaf a sample falls in.
    ///
    /// `sample` must expose at least `split_feature(node) + 1` values for
    /// every split node on the path. Values strictly below the threshold go
    /// left.
    #[inline]
    pub fn leaf_for(&self, sample: ArrayView1<'_, f64>) -> NodeId {
        let mut node: NodeId = 0;
        while !self.is_leaf(node) {
            node = if sample[self.split_feature(node)] < self.threshold(node) {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }
        node
    }

    /// Predict the leaf value for a single sample.
    #[inline]
    pub fn predict_row(&self, sample: ArrayView1<'_, f64>) -> f64 {
        self.value(self.leaf_for(sample))
    }

    // =========================================================================
    // Importance
    // =========================================================================

    /// Accumulate this tree's squared split gains into `acc`, indexed by
    /// split feature.
    pub(crate) fn accumulate_importances(&self, acc: &mut Array1<f64>) {
        for node in 0..self.n_nodes() as NodeId {
            if !self.is_leaf(node) {
                let gain = self.gains[node as usize];
                acc[self.split_feature(node)] += gain * gain;
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
