//! # 순환 잔차 이미지 코덱 핵심 모듈
//!
//! 순환 인코더-이진화기-디코더, 잔차 코딩 루프, 병목 패킹, 학습 루프

pub mod coding;
pub mod config;
pub mod error;
pub mod model;
pub mod packing;
pub mod perceptual;
pub mod tensors;
pub mod training;

// 주요 타입들 재수출
pub use coding::{Codec, CodingRun, NeuralCodec, ResidualCoder};
pub use config::{DeviceKind, ModelConfig, ReconstructionMode, TrainConfig, IMAGE_SIZE};
pub use error::{CodecError, Result};
pub use model::{
    Binarizer, CheckpointStore, Mode, ModelSnapshot, NeuralModel, RecurrentDecoder,
    RecurrentEncoder,
};
pub use packing::{BitPacker, BottleneckBudget, CodeContainer};
pub use perceptual::PerceptualLossNet;
pub use tensors::{CellState, CodeLayout, RecurrentState, RgbImage, StageShape};
pub use training::{
    BatchSource, EarlyStopping, ImageDataset, JsonlSink, MetricsSink, NullSink, StopReason,
    TrainOutcome, Trainer,
};
