//! 통합 테스트 공용 스텁
//!
//! 연속 근사 코덱: 인코더는 잔차의 16×16 블록 평균을, 이진화기는 부호를,
//! 디코더는 k번째 반복에 `±0.5^(k+1)` 보정량을 낸다. 블록 단위로 일정한 이미지는
//! 반복마다 오차가 절반 이하로 줄어든다.

#![allow(dead_code)]

use candle_core::{DType, Device, Tensor};
use rnn_codec::core::model::binarizer::hard_sign;
use rnn_codec::core::{
    Binarizer, CellState, Codec, CodeLayout, Mode, ModelConfig, RecurrentDecoder,
    RecurrentEncoder, RecurrentState, ReconstructionMode, Result, StageShape,
};

pub const CODE_CHANNELS: usize = 125;
pub const BLOCK: usize = 16;

pub struct BlockMeanEncoder;

impl RecurrentEncoder for BlockMeanEncoder {
    fn state_shapes(&self) -> Vec<StageShape> {
        Vec::new()
    }

    fn step(&self, input: &Tensor, state: &RecurrentState) -> Result<(Tensor, RecurrentState)> {
        let pooled = input.avg_pool2d(BLOCK)?;
        let (batch, channels, h, w) = pooled.dims4()?;
        let pad = Tensor::zeros(
            (batch, CODE_CHANNELS - channels, h, w),
            DType::F32,
            input.device(),
        )?;
        Ok((Tensor::cat(&[&pooled, &pad], 1)?, state.clone()))
    }
}

pub struct SignBinarizer;

impl Binarizer for SignBinarizer {
    fn binarize(&self, features: &Tensor, _mode: Mode) -> Result<Tensor> {
        hard_sign(features)
    }
}

/// 은닉 상태에 반복 횟수 k를 담는 디코더
pub struct HalvingDecoder;

impl RecurrentDecoder for HalvingDecoder {
    fn state_shapes(&self) -> Vec<StageShape> {
        vec![StageShape::new(1, 1, 1)]
    }

    fn step(&self, code: &Tensor, state: &RecurrentState) -> Result<(Tensor, RecurrentState)> {
        let counter = &state.cells()[0];
        let (_, _, h, w) = code.dims4()?;
        let ln_half = 0.5f64.ln();
        // 0.5^(k+1)
        let scale = counter.hidden.affine(ln_half, ln_half)?.exp()?;
        let output = code
            .narrow(1, 0, 3)?
            .upsample_nearest2d(h * BLOCK, w * BLOCK)?
            .broadcast_mul(&scale)?;
        let next = CellState::new((&counter.hidden + 1.0)?, counter.cell.clone());
        Ok((output, RecurrentState::new(vec![next])))
    }
}

pub type StubCodec = Codec<BlockMeanEncoder, SignBinarizer, HalvingDecoder>;

pub fn stub_codec() -> StubCodec {
    Codec::new(
        BlockMeanEncoder,
        SignBinarizer,
        HalvingDecoder,
        CodeLayout::new(CODE_CHANNELS, 16, 16),
        ReconstructionMode::Additive,
        Device::Cpu,
    )
}

/// 블록마다 다른 값을 갖는 `[1, 3, 256, 256]` 이미지
pub fn block_image(device: &Device) -> Result<Tensor> {
    let side = 256 / BLOCK;
    let mut data = Vec::with_capacity(3 * 256 * 256);
    for c in 0..3 {
        for y in 0..256 {
            for x in 0..256 {
                let b = (y / BLOCK) * side + x / BLOCK;
                data.push(((b * 97 + c * 85) % 256) as f32 / 255.0);
            }
        }
    }
    Ok(Tensor::from_vec(data, (1, 3, 256, 256), device)?)
}

/// 코드 레이아웃 125×16×16은 유지하고 채널만 줄인 학습용 구성
pub fn small_model_config(name: &str) -> ModelConfig {
    ModelConfig::new(name)
        .with_stem_channels(4)
        .with_encoder_channels([8, 8, 8])
        .with_decoder_channels([16, 16, 8, 8])
}
