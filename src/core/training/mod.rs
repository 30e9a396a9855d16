//! # 학습
//!
//! 학습률 스케줄, 조기 종료, 배치 공급, 관측 싱크, 학습 루프

pub mod data;
pub mod early_stopping;
pub mod metrics;
pub mod schedule;
pub mod trainer;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use data::{BatchSource, ImageDataset, IMAGES_KEY};
pub use early_stopping::{EarlyStopping, Verdict};
pub use metrics::{JsonlSink, MetricEvent, MetricsSink, NullSink};
pub use schedule::LearningRateSchedule;
pub use trainer::{StopReason, TrainOutcome, Trainer};
