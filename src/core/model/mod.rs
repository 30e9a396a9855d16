//! # 순환 인코더 / 이진화기 / 디코더
//!
//! 세 구성요소는 트레이트 경계로 분리되어 있어 잔차 코딩 루프와 코덱은
//! 실제 ConvLSTM 모델 대신 스텁 구현으로도 구동할 수 있다.

pub mod binarizer;
pub mod checkpoint;
pub mod conv_lstm;
pub mod decoder;
pub mod encoder;
pub mod neural;
pub mod params;

// 테스트 모듈
#[cfg(test)]
pub(crate) mod __tests__;

pub use binarizer::ConvBinarizer;
pub use checkpoint::CheckpointStore;
pub use conv_lstm::ConvLstmCell;
pub use decoder::ConvLstmDecoder;
pub use encoder::ConvLstmEncoder;
pub use neural::NeuralModel;
pub use params::{Component, ModelParams, ModelSnapshot, ParameterSet, ParameterSnapshot};

use crate::core::error::Result;
use crate::core::tensors::{RecurrentState, StageShape};
use candle_core::Tensor;

/// 이진화 동작 모드
///
/// 두 모드의 순전파 수치는 서로 다르다.
/// - `Train`: 확률적 반올림. 기대값이 tanh 출력과 같고 straight-through로 그래디언트가 흐른다.
/// - `Eval`: 결정적 부호 함수. 출력은 정확히 {-1, +1}이며 0은 +1로 보낸다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

/// 한 번의 순환 단계를 수행하는 인코더
pub trait RecurrentEncoder {
    /// 상태 형태 (배치 차원 제외)
    fn state_shapes(&self) -> Vec<StageShape>;

    /// `(입력 또는 잔차, 상태) -> (특징맵, 상태')`
    fn step(&self, input: &Tensor, state: &RecurrentState) -> Result<(Tensor, RecurrentState)>;
}

/// 연속 특징맵을 고정 크기 이진 코드로 변환
pub trait Binarizer {
    fn binarize(&self, features: &Tensor, mode: Mode) -> Result<Tensor>;
}

/// 한 번의 순환 단계를 수행하는 디코더
pub trait RecurrentDecoder {
    fn state_shapes(&self) -> Vec<StageShape>;

    /// `(코드, 상태) -> (재구성 또는 보정량, 상태')`
    fn step(&self, code: &Tensor, state: &RecurrentState) -> Result<(Tensor, RecurrentState)>;
}

impl<T: RecurrentEncoder + ?Sized> RecurrentEncoder for &T {
    fn state_shapes(&self) -> Vec<StageShape> {
        (**self).state_shapes()
    }

    fn step(&self, input: &Tensor, state: &RecurrentState) -> Result<(Tensor, RecurrentState)> {
        (**self).step(input, state)
    }
}

impl<T: Binarizer + ?Sized> Binarizer for &T {
    fn binarize(&self, features: &Tensor, mode: Mode) -> Result<Tensor> {
        (**self).binarize(features, mode)
    }
}

impl<T: RecurrentDecoder + ?Sized> RecurrentDecoder for &T {
    fn state_shapes(&self) -> Vec<StageShape> {
        (**self).state_shapes()
    }

    fn step(&self, code: &Tensor, state: &RecurrentState) -> Result<(Tensor, RecurrentState)> {
        (**self).step(code, state)
    }
}
