//! 순환 잔차 신경망 이미지 코덱
//!
//! 256×256 이미지를 ConvLSTM 인코더 → 이진화기 → 디코더로 반복 코딩하여
//! 4096 / 16384 / 65536 바이트 예산에 맞춘 비트열로 압축한다.

pub mod core;

// 핵심 모듈들 재수출
pub use core::{
    BitPacker, BottleneckBudget, Codec, CodecError, CodeContainer, ModelConfig, NeuralCodec,
    NeuralModel, Result, TrainConfig, Trainer,
};
