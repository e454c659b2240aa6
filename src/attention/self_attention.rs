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

use crate::attention::additive::AdditiveAttention;
use crate::attention::cosine::CosineAttention;
use crate::attention::scaled_dot::ScaledDotProductAttention;
use crate::common::Config;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use tch::{nn, Tensor};

/// # Scoring function used inside a self-attention block
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttentionMode {
    /// Scaled dot-product scores
    dot,
    /// Additive (Bahdanau) scores
    additive,
    /// Cosine similarity scores
    cosine,
}

/// # Self-attention configuration
///
/// Defines the shape and scoring function of a [`SelfAttention`] block. Optional fields
/// fall back to their defaults when left out of a configuration file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelfAttentionConfig {
    /// Dimension of the query, key and value vectors
    pub d_model: i64,
    /// Dropout probability applied to the attention weights. Defaults to 0.1
    pub dropout: Option<f64>,
    /// Use a bias term in the projection layers. Defaults to `false`
    pub bias: Option<bool>,
    /// Scoring function of the inner attention. Defaults to `AttentionMode::dot`
    pub attention_mode: Option<AttentionMode>,
}

impl Config for SelfAttentionConfig {}

impl Default for SelfAttentionConfig {
    fn default() -> SelfAttentionConfig {
        SelfAttentionConfig {
            d_model: 512,
            dropout: Some(0.1),
            bias: Some(false),
            attention_mode: Some(AttentionMode::dot),
        }
    }
}

#[derive(Debug)]
enum Scorer {
    Dot(ScaledDotProductAttention),
    Additive(AdditiveAttention),
    Cosine(CosineAttention),
}

/// # Self-attention
///
/// Self-attention block from "Attention Is All You Need" (Vaswani et al., 2017): the
/// queries, keys and values are projected, scored by the configured attention and the
/// attended output is projected back to the model dimension.
#[derive(Debug)]
pub struct SelfAttention {
    linear_query: nn::Linear,
    linear_key: nn::Linear,
    linear_value: nn::Linear,
    linear_out: nn::Linear,
    scorer: Scorer,
}

impl SelfAttention {
    /// Creates a new `SelfAttention`.
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the root of the attention module
    /// * `config` - `SelfAttentionConfig` defining the model dimension and scoring function
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_nlp_kit::attention::{SelfAttention, SelfAttentionConfig};
    /// use tch::{nn, Device};
    ///
    /// let device = Device::Cpu;
    /// let vs = nn::VarStore::new(device);
    /// let config = SelfAttentionConfig {
    ///     d_model: 128,
    ///     ..Default::default()
    /// };
    /// let attention = SelfAttention::new(&vs.root() / "attention", &config);
    /// ```
    pub fn new<'p, P>(p: P, config: &SelfAttentionConfig) -> SelfAttention
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let dropout = config.dropout.unwrap_or(0.1);
        let linear_config = nn::LinearConfig {
            bias: config.bias.unwrap_or(false),
            ..Default::default()
        };
        let linear_query = nn::linear(
            p / "linear_query",
            config.d_model,
            config.d_model,
            linear_config,
        );
        let linear_key = nn::linear(
            p / "linear_key",
            config.d_model,
            config.d_model,
            linear_config,
        );
        let linear_value = nn::linear(
            p / "linear_value",
            config.d_model,
            config.d_model,
            linear_config,
        );
        let linear_out = nn::linear(
            p / "linear_out",
            config.d_model,
            config.d_model,
            linear_config,
        );
        let scorer = match config.attention_mode.unwrap_or(AttentionMode::dot) {
            AttentionMode::dot => Scorer::Dot(ScaledDotProductAttention::new(dropout)),
            AttentionMode::additive => Scorer::Additive(AdditiveAttention::new(
                p / "attention",
                config.d_model,
                dropout,
            )),
            AttentionMode::cosine => Scorer::Cosine(CosineAttention::new(dropout)),
        };

        SelfAttention {
            linear_query,
            linear_key,
            linear_value,
            linear_out,
            scorer,
        }
    }

    /// Computes the attended output and the attention weights.
    ///
    /// # Arguments
    ///
    /// * `query` - Query tensor of shape (*batch size*, *sequence length*, *d_model*)
    /// * `key` - Key tensor of shape (*batch size*, *sequence length*, *d_model*)
    /// * `value` - Value tensor of shape (*batch size*, *sequence length*, *d_model*)
    /// * `mask` - Optional mask of shape (*batch size*, *sequence length*, *sequence
    ///   length*). Positions where the mask is 0 are excluded from the attention
    /// * `train` - Boolean flag turning on dropout
    ///
    /// # Returns
    ///
    /// * Tuple of the attended output with shape (*batch size*, *sequence length*,
    ///   *d_model*) and the attention weights of the inner scoring function
    pub fn forward_t(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Tensor>,
        train: bool,
    ) -> (Tensor, Tensor) {
        let query = query.apply(&self.linear_query);
        let key = key.apply(&self.linear_key);
        let value = value.apply(&self.linear_value);
        let (output, attention) = match &self.scorer {
            Scorer::Dot(attention) => attention.forward_t(&query, &key, &value, mask, train),
            Scorer::Additive(attention) => attention.forward_t(&query, &key, &value, mask, train),
            Scorer::Cosine(attention) => attention.forward_t(&query, &key, &value, mask, train),
        };
        (output.apply(&self.linear_out), attention)
    }
}
