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

use crate::common::linear::{linear_no_bias, LinearNoBias, LinearNoBiasConfig};
use std::borrow::Borrow;
use tch::nn::Init;
use tch::{nn, Tensor};

/// # Location aware attention
///
/// Attention for encoder/decoder models proposed in "Attention-Based Models for Speech
/// Recognition" (Chorowski et al., 2015). The scores combine the usual content terms with
/// a convolution over the attention weights of the previous decoding step, letting the
/// model track its position in the source sequence.
#[derive(Debug)]
pub struct LocationAwareAttention {
    conv: nn::Conv1D,
    w_linear: LinearNoBias,
    v_linear: LinearNoBias,
    fc_linear: nn::Linear,
    bias: Tensor,
    smoothing: bool,
    mask: Option<Tensor>,
}

impl LocationAwareAttention {
    /// Creates a new `LocationAwareAttention`.
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the root of the attention module
    /// * `hidden_dim` - Dimension of the decoder hidden states
    /// * `smoothing` - Normalize the scores with a scaled sigmoid instead of a softmax
    pub fn new<'p, P>(p: P, hidden_dim: i64, smoothing: bool) -> LocationAwareAttention
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let conv_config = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };
        let conv = nn::conv1d(p / "conv", 1, hidden_dim, 3, conv_config);
        let w_linear = linear_no_bias(
            p / "w_linear",
            hidden_dim,
            hidden_dim,
            LinearNoBiasConfig::default(),
        );
        let v_linear = linear_no_bias(
            p / "v_linear",
            hidden_dim,
            hidden_dim,
            LinearNoBiasConfig::default(),
        );
        let fc_linear = nn::linear(p / "fc_linear", hidden_dim, 1, Default::default());
        let bias = p.var("bias", &[hidden_dim], Init::Uniform { lo: 0.0, up: 1.0 });

        LocationAwareAttention {
            conv,
            w_linear,
            v_linear,
            fc_linear,
            bias,
            smoothing,
            mask: None,
        }
    }

    /// Registers the score mask applied at every forward pass, shape (*batch size*,
    /// *sequence length*). Positions where the mask is 0 are excluded from the attention.
    pub fn set_mask(&mut self, mask: Tensor) {
        self.mask = Some(mask);
    }

    /// Computes the context vector and the attention weights of the current step.
    ///
    /// # Arguments
    ///
    /// * `query` - Decoder hidden state of shape (*batch size*, 1, *hidden dim*)
    /// * `value` - Encoder outputs of shape (*batch size*, *sequence length*, *hidden dim*)
    /// * `last_attention` - Optional attention weights of the previous step, shape
    ///   (*batch size*, *sequence length*). Zeros are used on the first step
    ///
    /// # Returns
    ///
    /// * Tuple of the context vector with shape (*batch size*, 1, *hidden dim*) and the
    ///   attention weights with shape (*batch size*, *sequence length*)
    pub fn forward(
        &self,
        query: &Tensor,
        value: &Tensor,
        last_attention: Option<&Tensor>,
    ) -> (Tensor, Tensor) {
        let (batch_size, seq_len) = (query.size()[0], value.size()[1]);
        let last_attention = match last_attention {
            Some(last_attention) => last_attention.shallow_clone(),
            None => Tensor::zeros([batch_size, seq_len], (query.kind(), query.device())),
        };
        let conv_attention = last_attention
            .unsqueeze(1)
            .apply(&self.conv)
            .transpose(1, 2);
        let features = query.apply(&self.w_linear)
            + value.apply(&self.v_linear)
            + conv_attention
            + &self.bias;
        let mut scores = features.tanh().apply(&self.fc_linear).squeeze_dim(-1);
        if let Some(mask) = &self.mask {
            scores = scores.masked_fill(&mask.eq(0), -1e9);
        }
        let attention = if self.smoothing {
            let scores = scores.sigmoid();
            &scores / scores.sum_dim_intlist([-1].as_slice(), true, scores.kind())
        } else {
            scores.softmax(-1, scores.kind())
        };
        let context = attention.unsqueeze(1).matmul(value);
        (context, attention)
    }
}
