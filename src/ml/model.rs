// ============================================================
// Layer 5 — Positioning Network
// ============================================================
// Dense regression network, in two layouts:
//
//   SingleBranch
//     rss [N, n_ap] → Dense(64) → ReLU → Dropout → Dense(32) → ReLU
//                   → head_x [N, 1], head_y [N, 1]
//
//   DualBranch
//     rss   → branch (as above) ─┐
//     power → branch (as above) ─┴→ concat [N, 64]
//           → Dense(128) → ReLU → Dropout → Dense(64) → ReLU
//           → head_x, head_y
//
// Each head is a single linear unit. Loss is MSE(x) + MSE(y).
//
// Reference: Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        loss::{MseLoss, Reduction},
        Dropout, DropoutConfig, Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};
use serde::{Deserialize, Serialize};

const BRANCH_HIDDEN: usize = 64;
const BRANCH_OUT:    usize = 32;
const MERGE_HIDDEN:  usize = 128;
const MERGE_OUT:     usize = 64;

/// Which inputs the network consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchLayout {
    /// RSS only; heads sit on the RSS branch
    SingleBranch,
    /// RSS + TX power branches joined by a concatenation merge block
    DualBranch,
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct PositioningModelConfig {
    /// Width of the RSS input (number of access points)
    pub rss_features:   usize,
    /// Width of the TX power input; ignored for SingleBranch
    pub power_features: usize,
    pub layout:         BranchLayout,
    #[config(default = 0.2)]
    pub dropout:        f64,
}

impl PositioningModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PositioningModel<B> {
        match self.layout {
            BranchLayout::SingleBranch => self.build_single_branch(device),
            BranchLayout::DualBranch   => self.build_dual_branch(device),
        }
    }

    fn build_single_branch<B: Backend>(&self, device: &B::Device) -> PositioningModel<B> {
        PositioningModel {
            rss_branch: self.build_feature_branch(self.rss_features, device),
            fusion:     None,
            head_x:     LinearConfig::new(BRANCH_OUT, 1).init(device),
            head_y:     LinearConfig::new(BRANCH_OUT, 1).init(device),
        }
    }

    fn build_dual_branch<B: Backend>(&self, device: &B::Device) -> PositioningModel<B> {
        let fusion = PowerFusion {
            power_branch: self.build_feature_branch(self.power_features, device),
            merge_dense1: LinearConfig::new(2 * BRANCH_OUT, MERGE_HIDDEN).init(device),
            dropout:      DropoutConfig::new(self.dropout).init(),
            merge_dense2: LinearConfig::new(MERGE_HIDDEN, MERGE_OUT).init(device),
        };
        PositioningModel {
            rss_branch: self.build_feature_branch(self.rss_features, device),
            fusion:     Some(fusion),
            head_x:     LinearConfig::new(MERGE_OUT, 1).init(device),
            head_y:     LinearConfig::new(MERGE_OUT, 1).init(device),
        }
    }

    fn build_feature_branch<B: Backend>(&self, inputs: usize, device: &B::Device) -> FeatureBranch<B> {
        FeatureBranch {
            dense1:  LinearConfig::new(inputs, BRANCH_HIDDEN).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            dense2:  LinearConfig::new(BRANCH_HIDDEN, BRANCH_OUT).init(device),
        }
    }
}

/// Dense(64) → Dropout → Dense(32), ReLU activations.
#[derive(Module, Debug)]
pub struct FeatureBranch<B: Backend> {
    pub dense1:  Linear<B>,
    pub dropout: Dropout,
    pub dense2:  Linear<B>,
}

impl<B: Backend> FeatureBranch<B> {
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.dropout.forward(relu(self.dense1.forward(x)));
        relu(self.dense2.forward(x))
    }
}

/// TX power branch plus the Dense(128) → Dropout → Dense(64) block
/// applied to the concatenated branch outputs.
#[derive(Module, Debug)]
pub struct PowerFusion<B: Backend> {
    pub power_branch: FeatureBranch<B>,
    pub merge_dense1: Linear<B>,
    pub dropout:      Dropout,
    pub merge_dense2: Linear<B>,
}

impl<B: Backend> PowerFusion<B> {
    pub fn forward(&self, rss_hidden: Tensor<B, 2>, power: Tensor<B, 2>) -> Tensor<B, 2> {
        let power_hidden = self.power_branch.forward(power);
        let merged = Tensor::cat(vec![rss_hidden, power_hidden], 1);
        let x = self.dropout.forward(relu(self.merge_dense1.forward(merged)));
        relu(self.merge_dense2.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct PositioningModel<B: Backend> {
    pub rss_branch: FeatureBranch<B>,
    /// Present only for the dual-branch layout
    pub fusion:     Option<PowerFusion<B>>,
    pub head_x:     Linear<B>,
    pub head_y:     Linear<B>,
}

/// Scaled coordinate predictions, each `[batch, 1]`.
pub struct RegressionOutput<B: Backend> {
    pub x: Tensor<B, 2>,
    pub y: Tensor<B, 2>,
}

/// Per-head MSE and their sum (the optimised quantity).
pub struct RegressionLoss<B: Backend> {
    pub total: Tensor<B, 1>,
    pub x:     Tensor<B, 1>,
    pub y:     Tensor<B, 1>,
}

impl<B: Backend> PositioningModel<B> {
    pub fn layout(&self) -> BranchLayout {
        if self.fusion.is_some() { BranchLayout::DualBranch } else { BranchLayout::SingleBranch }
    }

    /// Number of input tensors `forward` consumes.
    pub fn num_inputs(&self) -> usize {
        if self.fusion.is_some() { 2 } else { 1 }
    }

    /// Whether branch outputs are concatenated before the heads.
    pub fn has_merge(&self) -> bool {
        self.fusion.is_some()
    }

    /// rss: [batch, n_ap], power: [batch, n_tx] → x, y: [batch, 1]
    ///
    /// # Panics
    /// Panics if the model is dual-branch and `power` is `None`.
    /// The trainer checks the dataset against the layout up front.
    pub fn forward(&self, rss: Tensor<B, 2>, power: Option<Tensor<B, 2>>) -> RegressionOutput<B> {
        let hidden = self.rss_branch.forward(rss);
        let hidden = match (&self.fusion, power) {
            (Some(fusion), Some(power)) => fusion.forward(hidden, power),
            (Some(_), None) => panic!("dual-branch model called without a TX power input"),
            (None, _) => hidden,
        };

        RegressionOutput {
            x: self.head_x.forward(hidden.clone()),
            y: self.head_y.forward(hidden),
        }
    }

    pub fn forward_loss(
        &self,
        rss:      Tensor<B, 2>,
        power:    Option<Tensor<B, 2>>,
        target_x: Tensor<B, 2>,
        target_y: Tensor<B, 2>,
    ) -> (RegressionLoss<B>, RegressionOutput<B>) {
        let output = self.forward(rss, power);
        let mse    = MseLoss::new();
        let x = mse.forward(output.x.clone(), target_x, Reduction::Mean);
        let y = mse.forward(output.y.clone(), target_y, Reduction::Mean);
        let total = x.clone() + y.clone();
        (RegressionLoss { total, x, y }, output)
    }
}
