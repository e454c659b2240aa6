//! # Attention modules
//!
//! A library of attention mechanisms sharing a common style: modules are created from a
//! `tch` variable store path, scores are masked with `-1e9` before normalization where a
//! mask applies, and the forward pass returns both the attended output and the attention
//! weights. The modules are building blocks meant to be embedded in larger models.

mod additive;
mod binary;
mod cosine;
mod linear;
mod location_aware;
mod scaled_dot;
mod self_attention;

pub use additive::AdditiveAttention;
pub use binary::BinaryAttention;
pub use cosine::CosineAttention;
pub use linear::LinearAttention;
pub use location_aware::LocationAwareAttention;
pub use scaled_dot::ScaledDotProductAttention;
pub use self_attention::{AttentionMode, SelfAttention, SelfAttentionConfig};
