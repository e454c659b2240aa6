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
use crate::common::linear::{linear_no_bias, LinearNoBias, LinearNoBiasConfig};
use std::borrow::Borrow;
use tch::nn::Init;
use tch::{nn, Tensor};

/// # Additive attention
///
/// `Attention(Q, K, V) = softmax(w_v^T tanh(W_q Q + W_k K + b))V`, proposed in "Neural
/// Machine Translation by Jointly Learning to Align and Translate" (Bahdanau et al., 2015).
/// Every query/key pair is scored through a single feed-forward layer, which makes the
/// module quadratic in memory over the two sequence lengths.
#[derive(Debug)]
pub struct AdditiveAttention {
    w_query: LinearNoBias,
    w_key: LinearNoBias,
    w_output: nn::Linear,
    bias: Tensor,
    dropout: Dropout,
}

impl AdditiveAttention {
    /// Creates a new `AdditiveAttention`.
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the root of the attention module
    /// * `hidden_dim` - Dimension of the query and key vectors
    /// * `dropout` - Dropout probability applied to the attention weights
    pub fn new<'p, P>(p: P, hidden_dim: i64, dropout: f64) -> AdditiveAttention
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let w_query = linear_no_bias(
            p / "w_q",
            hidden_dim,
            hidden_dim,
            LinearNoBiasConfig::default(),
        );
        let w_key = linear_no_bias(
            p / "w_k",
            hidden_dim,
            hidden_dim,
            LinearNoBiasConfig::default(),
        );
        let w_output = nn::linear(p / "w_output", hidden_dim, 1, Default::default());
        let bias = p.var("bias", &[hidden_dim], Init::Uniform { lo: -0.1, up: 0.1 });

        AdditiveAttention {
            w_query,
            w_key,
            w_output,
            bias,
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
        let features = query.apply(&self.w_query).unsqueeze(-2)
            + key.apply(&self.w_key).unsqueeze(-3)
            + &self.bias;
        let mut scores = features.tanh().apply(&self.w_output).squeeze_dim(-1);
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
