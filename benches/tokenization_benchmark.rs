#[macro_use]
extern crate criterion;

use criterion::Criterion;
use prost::Message;
use rust_nlp_kit::tokenizer::{Tokenizer, TruncationStrategy, XLNetTokenizer};
use rust_nlp_kit::vocab::{ModelProto, SentencePiece, SentencePieceType};
use std::time::{Duration, Instant};

static BATCH_SIZE: usize = 64;

fn benchmark_proto() -> Vec<u8> {
    let mut pieces = vec![SentencePiece::with_type(
        "<unk>",
        0.0,
        SentencePieceType::Unknown,
    )];
    for control in [
        "<s>", "</s>", "<cls>", "<sep>", "<pad>", "<mask>", "<eod>", "<eop>",
    ] {
        pieces.push(SentencePiece::with_type(
            control,
            0.0,
            SentencePieceType::Control,
        ));
    }
    for (piece, score) in [
        ("\u{2581}the", -1.0),
        ("\u{2581}quick", -2.0),
        ("\u{2581}brown", -2.5),
        ("\u{2581}fox", -3.0),
        ("\u{2581}jumped", -3.5),
        ("\u{2581}over", -2.0),
        ("\u{2581}lazy", -3.0),
        ("\u{2581}dog", -3.0),
        ("s", -1.0),
        ("\u{2581}8,", -4.0),
        ("000", -2.0),
        ("\u{2581}8", -5.0),
        (",", -6.0),
        ("\u{2581}hello", -2.0),
        ("\u{2581}world", -2.0),
    ] {
        pieces.push(SentencePiece::with_type(
            piece,
            score,
            SentencePieceType::Normal,
        ));
    }
    let proto = ModelProto { pieces };
    let mut buffer = Vec::new();
    proto.encode(&mut buffer).unwrap();
    buffer
}

fn create_tokenizer() -> XLNetTokenizer {
    XLNetTokenizer::from_serialized_proto(&benchmark_proto(), true, true, false).unwrap()
}

fn benchmark_inputs() -> Vec<String> {
    let words = [
        "the", "quick", "brown", "fox", "jumped", "over", "8,000", "lazy", "dogs", "hello",
        "world",
    ];
    (0..2000)
        .map(|i| {
            (0..16)
                .map(|j| words[(i + j) % words.len()])
                .collect::<Vec<&str>>()
                .join(" ")
        })
        .collect()
}

fn tokenization_forward_pass(
    iters: u64,
    tokenizer: &XLNetTokenizer,
    lines: &[String],
) -> Duration {
    let mut duration = Duration::new(0, 0);
    let mut output = vec![];
    for _i in 0..iters {
        let start = Instant::now();
        for batch in lines.chunks(BATCH_SIZE) {
            output.push(
                tokenizer
                    .encode_list(batch, 128, &TruncationStrategy::LongestFirst, 0)
                    .unwrap(),
            );
        }
        duration = duration.checked_add(start.elapsed()).unwrap();
    }
    duration
}

fn load_tokenizer(iters: u64) -> Duration {
    let proto = benchmark_proto();
    let mut duration = Duration::new(0, 0);
    for _i in 0..iters {
        let start = Instant::now();
        let _ = XLNetTokenizer::from_serialized_proto(&proto, true, true, false).unwrap();
        duration = duration.checked_add(start.elapsed()).unwrap();
    }
    duration
}

fn bench_tokenization(c: &mut Criterion) {
    //    Set-up tokenizer
    let tokenizer = create_tokenizer();

    //    Define input
    let lines = benchmark_inputs();

    c.bench_function("XLNet tokenization forward pass", |b| {
        b.iter_custom(|iters| tokenization_forward_pass(iters, &tokenizer, &lines))
    });

    c.bench_function("Load tokenizer", |b| b.iter_custom(load_tokenizer));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_tokenization
}

criterion_main!(benches);
