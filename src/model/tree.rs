//! Fitted tree estimators

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Leaf with the class distribution of its training samples
    Leaf { distribution: [f64; 2] },
    /// Internal node: go left when `x[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Normalized class distribution of the leaf this sample lands in
    fn leaf_proba(&self, sample: &ArrayView1<f64>) -> [f64; 2] {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { distribution } => return normalize(*distribution),
                TreeNode::Split { feature, threshold, left, right } => {
                    node = if sample[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Check split indices and leaf distributions
    pub(crate) fn validate(&self, n_features: usize) -> Result<(), String> {
        match self {
            TreeNode::Leaf { distribution } => {
                if distribution.iter().any(|&c| c < 0.0 || !c.is_finite())
                    || distribution.iter().sum::<f64>() <= 0.0
                {
                    return Err(format!("invalid leaf distribution {:?}", distribution));
                }
                Ok(())
            }
            TreeNode::Split { feature, left, right, .. } => {
                if *feature >= n_features {
                    return Err(format!(
                        "split on feature {} but model has {} features",
                        feature, n_features
                    ));
                }
                left.validate(n_features)?;
                right.validate(n_features)
            }
        }
    }
}

fn normalize(distribution: [f64; 2]) -> [f64; 2] {
    let total = distribution[0] + distribution[1];
    [distribution[0] / total, distribution[1] / total]
}

/// Argmax label; ties resolve to class 0
fn label_of(proba: &[f64; 2]) -> i64 {
    if proba[1] > proba[0] { 1 } else { 0 }
}

/// Single decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub root: TreeNode,
}

impl DecisionTree {
    pub fn predict_proba(&self, x: &Array2<f64>) -> Vec<[f64; 2]> {
        x.rows().into_iter().map(|row| self.root.leaf_proba(&row)).collect()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Vec<i64> {
        self.predict_proba(x).iter().map(label_of).collect()
    }
}

/// Random forest: mean of the trees' leaf distributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<TreeNode>,
}

impl RandomForest {
    pub fn predict_proba(&self, x: &Array2<f64>) -> Vec<[f64; 2]> {
        let n_trees = self.trees.len() as f64;
        x.rows()
            .into_iter()
            .map(|row| {
                let mut sum = [0.0, 0.0];
                for tree in &self.trees {
                    let p = tree.leaf_proba(&row);
                    sum[0] += p[0];
                    sum[1] += p[1];
                }
                [sum[0] / n_trees, sum[1] / n_trees]
            })
            .collect()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Vec<i64> {
        self.predict_proba(x).iter().map(label_of).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn stump(feature: usize, threshold: f64, left: [f64; 2], right: [f64; 2]) -> TreeNode {
        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(TreeNode::Leaf { distribution: left }),
            right: Box::new(TreeNode::Leaf { distribution: right }),
        }
    }

    #[test]
    fn test_tree_goes_left_on_equal() {
        let tree = DecisionTree { root: stump(0, 2.0, [8.0, 2.0], [1.0, 3.0]) };
        let x = array![[2.0], [2.5]];
        assert_eq!(tree.predict(&x), vec![0, 1]);
        assert_eq!(tree.predict_proba(&x)[0], [0.8, 0.2]);
        assert_eq!(tree.predict_proba(&x)[1], [0.25, 0.75]);
    }

    #[test]
    fn test_tie_resolves_to_zero() {
        let tree = DecisionTree { root: TreeNode::Leaf { distribution: [5.0, 5.0] } };
        assert_eq!(tree.predict(&array![[0.0]]), vec![0]);
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = RandomForest {
            trees: vec![
                stump(0, 1.0, [1.0, 0.0], [0.0, 1.0]),
                TreeNode::Leaf { distribution: [1.0, 1.0] },
            ],
        };
        let proba = forest.predict_proba(&array![[5.0]]);
        assert_eq!(proba[0], [0.25, 0.75]);
        assert_eq!(forest.predict(&array![[5.0], [0.0]]), vec![1, 0]);
    }

    #[test]
    fn test_validate_rejects_bad_feature_index() {
        let node = stump(3, 0.0, [1.0, 0.0], [0.0, 1.0]);
        assert!(node.validate(3).is_err());
        assert!(node.validate(4).is_ok());
        assert!(TreeNode::Leaf { distribution: [0.0, 0.0] }.validate(1).is_err());
    }

    #[test]
    fn test_node_json_shape() {
        let json = r#"{"split": {"feature": 0, "threshold": 1.5,
            "left": {"leaf": {"distribution": [3, 1]}},
            "right": {"leaf": {"distribution": [0, 4]}}}}"#;
        let node: TreeNode = serde_json::from_str(json).unwrap();
        assert!(node.validate(1).is_ok());
    }
}
