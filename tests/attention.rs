extern crate anyhow;

use rust_nlp_kit::attention::{
    AdditiveAttention, AttentionMode, BinaryAttention, CosineAttention, LinearAttention,
    LocationAwareAttention, ScaledDotProductAttention, SelfAttention, SelfAttentionConfig,
};
use rust_nlp_kit::Config;
use std::fs;
use tch::{nn, Device, Kind, Tensor};

fn query_key_value() -> (Tensor, Tensor, Tensor) {
    let query = Tensor::from_slice(&[0.1_f32, -0.2, 0.3, 0.4, -0.5, 0.6, -0.7, 0.8]).view([1, 2, 4]);
    let key = Tensor::from_slice(&[
        0.2_f32, 0.1, -0.3, 0.5, -0.4, 0.3, 0.2, -0.1, 0.6, -0.5, 0.4, 0.3,
    ])
    .view([1, 3, 4]);
    let value = Tensor::from_slice(&[
        1.0_f32, 0.0, -1.0, 0.5, 0.5, -0.5, 1.0, -1.0, -0.2, 0.8, 0.3, 0.1,
    ])
    .view([1, 3, 4]);
    (query, key, value)
}

#[test]
fn scaled_dot_product_attention() -> anyhow::Result<()> {
    //    Set-up attention
    let (query, key, value) = query_key_value();
    let attention = ScaledDotProductAttention::new(0.1);

    let (output, weights) = attention.forward_t(&query, &key, &value, None, false);
    assert_eq!(output.size(), vec![1, 2, 4]);
    assert_eq!(weights.size(), vec![1, 2, 3]);

    //    The attention weights are a distribution over the keys
    let sums = weights.sum_dim_intlist([-1].as_slice(), false, Kind::Float);
    assert!((sums.double_value(&[0, 0]) - 1.0).abs() < 1e-6);
    assert!((sums.double_value(&[0, 1]) - 1.0).abs() < 1e-6);

    //    Masked keys receive no weight
    let mask = Tensor::from_slice(&[1_i64, 1, 0, 1, 1, 0]).view([1, 2, 3]);
    let (_output, weights) = attention.forward_t(&query, &key, &value, Some(&mask), false);
    assert!(weights.select(-1, 2).abs().max().double_value(&[]) < 1e-6);
    Ok(())
}

#[test]
fn additive_attention() -> anyhow::Result<()> {
    //    Set-up attention
    let vs = nn::VarStore::new(Device::Cpu);
    let attention = AdditiveAttention::new(&vs.root() / "attention", 4, 0.1);

    let (query, key, value) = query_key_value();
    let (output, weights) = attention.forward_t(&query, &key, &value, None, false);
    assert_eq!(output.size(), vec![1, 2, 4]);
    assert_eq!(weights.size(), vec![1, 2, 3]);

    let sums = weights.sum_dim_intlist([-1].as_slice(), false, Kind::Float);
    assert!((sums.double_value(&[0, 0]) - 1.0).abs() < 1e-6);
    assert!((sums.double_value(&[0, 1]) - 1.0).abs() < 1e-6);

    //    Masked keys receive no weight
    let mask = Tensor::from_slice(&[0_i64, 1, 1, 0, 1, 1]).view([1, 2, 3]);
    let (_output, weights) = attention.forward_t(&query, &key, &value, Some(&mask), false);
    assert!(weights.select(-1, 0).abs().max().double_value(&[]) < 1e-6);
    Ok(())
}

#[test]
fn linear_attention() -> anyhow::Result<()> {
    //    Set-up attention, bound to the query and key lengths
    let vs = nn::VarStore::new(Device::Cpu);
    let attention = LinearAttention::new(&vs.root() / "attention", 2, 3, 4, 0.1);

    let (query, key, value) = query_key_value();
    let (output, weights) = attention.forward_t(&query, &key, &value, None, false);
    assert_eq!(output.size(), vec![1, 2, 4]);
    assert_eq!(weights.size(), vec![1, 2, 3]);

    let sums = weights.sum_dim_intlist([-1].as_slice(), false, Kind::Float);
    assert!((sums.double_value(&[0, 0]) - 1.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn cosine_attention() -> anyhow::Result<()> {
    //    Set-up attention
    let (query, key, value) = query_key_value();
    let attention = CosineAttention::new(0.1);

    let (output, weights) = attention.forward_t(&query, &key, &value, None, false);
    assert_eq!(output.size(), vec![1, 2, 4]);
    assert_eq!(weights.size(), vec![1, 2, 3]);

    let sums = weights.sum_dim_intlist([-1].as_slice(), false, Kind::Float);
    assert!((sums.double_value(&[0, 0]) - 1.0).abs() < 1e-6);
    assert!((sums.double_value(&[0, 1]) - 1.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn binary_attention() -> anyhow::Result<()> {
    //    Set-up inputs, the second x position and the last y position are padding
    let (x_batch, y_batch, _) = query_key_value();
    let x_mask = Tensor::from_slice(&[1.0_f32, 0.0]).view([1, 2]);
    let y_mask = Tensor::from_slice(&[1.0_f32, 1.0, 0.0]).view([1, 3]);
    let attention = BinaryAttention::new();

    let (attended_x, attended_y) = attention.forward(&x_batch, &x_mask, &y_batch, &y_mask);
    assert_eq!(attended_x.size(), vec![1, 2, 4]);
    assert_eq!(attended_y.size(), vec![1, 3, 4]);

    //    Padding positions are zeroed in the attended outputs
    assert!(attended_x.select(1, 1).abs().max().double_value(&[]) < 1e-6);
    assert!(attended_y.select(1, 2).abs().max().double_value(&[]) < 1e-6);
    Ok(())
}

#[test]
fn self_attention_with_config_file() -> anyhow::Result<()> {
    //    Write a configuration file and load it
    let config_dir = tempfile::tempdir()?;
    let config_path = config_dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{"d_model": 4, "dropout": 0.2, "bias": true, "attention_mode": "additive"}"#,
    )?;
    let config = SelfAttentionConfig::from_file(&config_path);
    assert_eq!(config.d_model, 4);
    assert_eq!(config.attention_mode, Some(AttentionMode::additive));

    //    Set-up attention
    let vs = nn::VarStore::new(Device::Cpu);
    let attention = SelfAttention::new(&vs.root() / "self_attention", &config);

    let (query, key, value) = query_key_value();
    let (output, weights) = attention.forward_t(&query, &key, &value, None, false);
    assert_eq!(output.size(), vec![1, 2, 4]);
    assert_eq!(weights.size(), vec![1, 2, 3]);

    //    Without dropout two passes are identical
    let (second_output, _) = attention.forward_t(&query, &key, &value, None, false);
    assert_eq!(output, second_output);
    Ok(())
}

#[test]
fn self_attention_default_configuration() -> anyhow::Result<()> {
    //    The default configuration scores with the scaled dot-product
    let config = SelfAttentionConfig {
        d_model: 4,
        ..Default::default()
    };
    let vs = nn::VarStore::new(Device::Cpu);
    let attention = SelfAttention::new(&vs.root() / "self_attention", &config);

    let (query, key, value) = query_key_value();
    let (output, weights) = attention.forward_t(&query, &key, &value, None, false);
    assert_eq!(output.size(), vec![1, 2, 4]);
    assert_eq!(weights.size(), vec![1, 2, 3]);
    Ok(())
}

#[test]
fn location_aware_attention() -> anyhow::Result<()> {
    //    Set-up attention
    let vs = nn::VarStore::new(Device::Cpu);
    let mut attention = LocationAwareAttention::new(&vs.root() / "attention", 4, false);

    let query = Tensor::from_slice(&[0.1_f32, -0.2, 0.3, 0.4]).view([1, 1, 4]);
    let (_, _, value) = query_key_value();

    //    The first step runs on zeroed previous weights
    let (context, weights) = attention.forward(&query, &value, None);
    assert_eq!(context.size(), vec![1, 1, 4]);
    assert_eq!(weights.size(), vec![1, 3]);
    let sums = weights.sum_dim_intlist([-1].as_slice(), false, Kind::Float);
    assert!((sums.double_value(&[0]) - 1.0).abs() < 1e-6);

    //    The previous weights feed the next step through the location convolution
    let (next_context, next_weights) = attention.forward(&query, &value, Some(&weights));
    assert_eq!(next_context.size(), vec![1, 1, 4]);
    assert_eq!(next_weights.size(), vec![1, 3]);

    //    Masked positions receive no weight
    attention.set_mask(Tensor::from_slice(&[1_i64, 1, 0]).view([1, 3]));
    let (_context, masked_weights) = attention.forward(&query, &value, None);
    assert!(masked_weights.select(-1, 2).abs().max().double_value(&[]) < 1e-6);
    Ok(())
}

#[test]
fn location_aware_attention_with_smoothing() -> anyhow::Result<()> {
    //    Set-up attention with sigmoid smoothing
    let vs = nn::VarStore::new(Device::Cpu);
    let attention = LocationAwareAttention::new(&vs.root() / "attention", 4, true);

    let query = Tensor::from_slice(&[0.1_f32, -0.2, 0.3, 0.4]).view([1, 1, 4]);
    let (_, _, value) = query_key_value();
    let (context, weights) = attention.forward(&query, &value, None);
    assert_eq!(context.size(), vec![1, 1, 4]);

    //    Smoothing still normalizes the weights to a distribution of positive terms
    let sums = weights.sum_dim_intlist([-1].as_slice(), false, Kind::Float);
    assert!((sums.double_value(&[0]) - 1.0).abs() < 1e-6);
    assert!(weights.min().double_value(&[]) > 0.0);
    Ok(())
}
