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

use crate::common::dropout::Dropout;
use tch::Tensor;

/// # Scaled dot-product attention
///
/// `Attention(Q, K, V) = softmax(QK^T / sqrt(d_k))V`, proposed in "Attention Is All You
/// Need" (Vaswani et al., 2017). The module holds no trainable parameter, scores are the
/// dot products of queries and keys scaled by the square root of the hidden dimension.
#[derive(Debug)]
pub struct ScaledDotProductAttention {
    dropout: Dropout,
}

impl ScaledDotProductAttention {
    /// Creates a new `ScaledDotProductAttention`.
    ///
    /// # Arguments
    ///
    /// * `dropout` - Dropout probability applied to the attention weights
    pub fn new(dropout: f64) -> ScaledDotProductAttention {
        ScaledDotProductAttention {
            dropout: Dropout::new(dropout),
        }
    }

    /// Computes the attended output and the attention weights.
    ///
    /// # Arguments
    ///
    /// * `query` - Query tensor of shape (*batch size*, *query length*, *hidden size*)
    /// * `key` - Key tensor of shape (*batch size*, *key length*, *hidden size*)
    /// * `value` - Value tensor of shape (*batch size*, *key length*, *value hidden size*)
    /// * `mask` - Optional mask of shape (*batch size*, *query length*, *key length*).
    ///   Positions where the mask is 0 are excluded from the attention
    /// * `train` - Boolean flag turning on dropout
    ///
    /// # Returns
    ///
    /// * Tuple of the attended output with shape (*batch size*, *query length*, *value
    ///   hidden size*) and the attention weights with shape (*batch size*, *query length*,
    ///   *key length*)
    pub fn forward_t(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Tensor>,
        train: bool,
    ) -> (Tensor, Tensor) {
        let scale = (*query.size().last().unwrap() as f64).sqrt();
        let mut scores = query.matmul(&key.transpose(-1, -2)) / scale;
        if let Some(mask) = mask {
            scores = scores.masked_fill(&mask.eq(0), -1e9);
        }
        let attention = scores
            .softmax(-1, scores.kind())
            .apply_t(&self.dropout, train);
        let output = attention.matmul(value);
        (output, attention)
    }
}
