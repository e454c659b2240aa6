// Copyright 2022 Huawei Technologies Co., Ltd
// Copyright 2021 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use tch::Tensor;

/// Softmax over the last dimension restricted to the positions allowed by `mask`.
/// Masked positions get zero weight, the remaining weights are renormalized.
fn masked_softmax(tensor: &Tensor, mask: &Tensor) -> Tensor {
    let mut mask = mask.shallow_clone();
    while mask.dim() < tensor.dim() {
        mask = mask.unsqueeze(1);
    }
    let mask = mask.expand_as(tensor).to_kind(tensor.kind());
    let weights = (tensor * &mask).softmax(-1, tensor.kind()) * &mask;
    // 1e-13 avoids a division by zero on fully masked rows
    &weights / (weights.sum_dim_intlist([-1].as_slice(), true, tensor.kind()) + 1e-13)
}

/// Weighted sum of `tensor` rows, output positions disabled by `mask` zeroed out.
fn weighted_sum(tensor: &Tensor, weights: &Tensor, mask: &Tensor) -> Tensor {
    let weighted = weights.matmul(tensor);
    let mut mask = mask.shallow_clone();
    while mask.dim() < tensor.dim() {
        mask = mask.unsqueeze(1);
    }
    let mask = mask
        .transpose(-1, -2)
        .expand_as(&weighted)
        .to_kind(weighted.kind());
    weighted * mask
}

/// # Binary attention
///
/// Soft alignment between two sequences, as used by the ESIM model for natural language
/// inference. For sequences `x_i` and `y_j`, the module attends each sequence over the
/// other using the shared similarity matrix `e_ij = x_i^T y_j`, masking out padding
/// positions on both sides.
#[derive(Debug, Default)]
pub struct BinaryAttention;

impl BinaryAttention {
    /// Creates a new `BinaryAttention`. The module holds no trainable parameter.
    pub fn new() -> BinaryAttention {
        BinaryAttention
    }

    /// Computes the soft alignment of each sequence over the other.
    ///
    /// # Arguments
    ///
    /// * `x_batch` - First sequence of shape (*batch size*, *x length*, *hidden size*)
    /// * `x_mask` - Mask of shape (*batch size*, *x length*), 0 at padding positions
    /// * `y_batch` - Second sequence of shape (*batch size*, *y length*, *hidden size*)
    /// * `y_mask` - Mask of shape (*batch size*, *y length*), 0 at padding positions
    ///
    /// # Returns
    ///
    /// * Tuple of the attended first sequence with shape (*batch size*, *x length*,
    ///   *hidden size*) and the attended second sequence with shape (*batch size*,
    ///   *y length*, *hidden size*)
    pub fn forward(
        &self,
        x_batch: &Tensor,
        x_mask: &Tensor,
        y_batch: &Tensor,
        y_mask: &Tensor,
    ) -> (Tensor, Tensor) {
        let similarity_matrix = x_batch.matmul(&y_batch.transpose(-1, -2));
        let x_y_attention = masked_softmax(&similarity_matrix, y_mask);
        let y_x_attention = masked_softmax(&similarity_matrix.transpose(-1, -2), x_mask);
        let attended_x = weighted_sum(y_batch, &x_y_attention, x_mask);
        let attended_y = weighted_sum(x_batch, &y_x_attention, y_mask);
        (attended_x, attended_y)
    }
}
