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

/// # Linear (concatenation) attention
///
/// Scores the queries against the keys by concatenating the two sequences along the length
/// dimension and projecting the result back to score space with two linear maps. The
/// projections operate on the sequence lengths, the module is therefore bound to the
/// `query_dim` and `key_dim` it was created with.
#[derive(Debug)]
pub struct LinearAttention {
    w_linear: LinearNoBias,
    v_linear: LinearNoBias,
    bias: Tensor,
    dropout: Dropout,
}

impl LinearAttention {
    /// Creates a new `LinearAttention`.
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the root of the attention module
    /// * `query_dim` - Length of the query sequences
    /// * `key_dim` - Length of the key sequences
    /// * `hidden_dim` - Dimension of the query and key vectors
    /// * `dropout` - Dropout probability applied to the attention weights
    pub fn new<'p, P>(
        p: P,
        query_dim: i64,
        key_dim: i64,
        hidden_dim: i64,
        dropout: f64,
    ) -> LinearAttention
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let w_linear = linear_no_bias(
            p / "w_linear",
            query_dim + key_dim,
            query_dim,
            LinearNoBiasConfig::default(),
        );
        let v_linear = linear_no_bias(
            p / "v_linear",
            hidden_dim,
            key_dim,
            LinearNoBiasConfig::default(),
        );
        let bias = p.var("bias", &[hidden_dim], Init::Uniform { lo: 0.0, up: 1.0 });

        LinearAttention {
            w_linear,
            v_linear,
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
        let features = Tensor::cat(&[query, key], -2)
            .transpose(-1, -2)
            .apply(&self.w_linear)
            .transpose(-1, -2);
        let mut scores = (features + &self.bias).tanh().apply(&self.v_linear);
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
