//! 1×1 합성곱 + tanh 이진화기
//!
//! 학습 모드에서는 `(1 + x) / 2` 확률로 +1을 뽑는 확률적 반올림을 쓰고,
//! 순전파 값은 이진이지만 역전파는 tanh 출력으로 그대로 통과시킨다 (straight-through).
//! 추론 모드에서는 `x >= 0 → +1, x < 0 → -1`의 결정적 부호 함수다.

use super::{Binarizer, Mode};
use crate::core::config::ModelConfig;
use crate::core::error::Result;
use candle_core::Tensor;
use candle_nn::{conv2d_no_bias, Conv2d, Module, VarBuilder};

#[derive(Debug)]
pub struct ConvBinarizer {
    conv: Conv2d,
}

impl ConvBinarizer {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let conv = conv2d_no_bias(
            config.encoder_channels[2],
            config.code_channels,
            1,
            Default::default(),
            vb.pp("conv"),
        )?;
        Ok(Self { conv })
    }
}

/// 결정적 부호 (0은 +1)
pub fn hard_sign(x: &Tensor) -> Result<Tensor> {
    let positive = x.ge(&x.zeros_like()?)?.to_dtype(x.dtype())?;
    Ok(positive.affine(2.0, -1.0)?)
}

/// 확률적 반올림 + straight-through 그래디언트
pub fn stochastic_sign(x: &Tensor) -> Result<Tensor> {
    let prob = x.affine(0.5, 0.5)?;
    let noise = Tensor::rand(0f32, 1f32, x.shape(), x.device())?.to_dtype(x.dtype())?;
    let hard = noise.lt(&prob)?.to_dtype(x.dtype())?.affine(2.0, -1.0)?.detach();
    // hard + (x - x.detach()): 순전파는 정확히 hard, 역전파는 항등
    let surrogate = (x - x.detach())?;
    Ok((hard + surrogate)?)
}

impl Binarizer for ConvBinarizer {
    fn binarize(&self, features: &Tensor, mode: Mode) -> Result<Tensor> {
        let x = self.conv.forward(features)?.tanh()?;
        match mode {
            Mode::Train => stochastic_sign(&x),
            Mode::Eval => hard_sign(&x),
        }
    }
}
