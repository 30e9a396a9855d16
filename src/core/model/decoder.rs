//! ConvLSTM 디코더
//!
//! 16×16 코드 → 1×1 합성곱 → ConvLSTM 4단 사이마다 depth-to-space(2) → 256×256×3
//!
//! `Replace`는 sigmoid 재구성, `Additive`는 tanh 보정량 (−1, 1)이라 0에서 시작해도
//! 한 번의 반복으로 [0,1] 전 범위에 닿는다.

use super::conv_lstm::{depth_to_space, ConvLstmCell};
use super::RecurrentDecoder;
use crate::core::config::{ModelConfig, ReconstructionMode};
use crate::core::error::Result;
use crate::core::tensors::{CodeLayout, RecurrentState, StageShape};
use candle_core::Tensor;
use candle_nn::{conv2d, Conv2d, Module, VarBuilder};

#[derive(Debug)]
pub struct ConvLstmDecoder {
    conv1: Conv2d,
    rnn1: ConvLstmCell,
    rnn2: ConvLstmCell,
    rnn3: ConvLstmCell,
    rnn4: ConvLstmCell,
    conv2: Conv2d,
    layout: CodeLayout,
    mode: ReconstructionMode,
    shapes: Vec<StageShape>,
}

impl ConvLstmDecoder {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let [d1, d2, d3, d4] = config.decoder_channels;
        let conv1 = conv2d(config.code_channels, d1, 1, Default::default(), vb.pp("conv1"))?;
        let rnn1 = ConvLstmCell::new(d1, d1, 1, vb.pp("rnn1"))?;
        let rnn2 = ConvLstmCell::new(d1 / 4, d2, 1, vb.pp("rnn2"))?;
        let rnn3 = ConvLstmCell::new(d2 / 4, d3, 1, vb.pp("rnn3"))?;
        let rnn4 = ConvLstmCell::new(d3 / 4, d4, 1, vb.pp("rnn4"))?;
        let conv2 = conv2d(d4 / 4, 3, 1, Default::default(), vb.pp("conv2"))?;

        Ok(Self {
            conv1,
            rnn1,
            rnn2,
            rnn3,
            rnn4,
            conv2,
            layout: config.code_layout(),
            mode: config.reconstruction,
            shapes: config.decoder_state_shapes(),
        })
    }
}

impl RecurrentDecoder for ConvLstmDecoder {
    fn state_shapes(&self) -> Vec<StageShape> {
        self.shapes.clone()
    }

    fn step(&self, code: &Tensor, state: &RecurrentState) -> Result<(Tensor, RecurrentState)> {
        let batch = code.dims().first().copied().unwrap_or(0);
        self.layout.check(code, batch)?;
        state.check("decoder", &self.shapes, batch)?;

        let cells = state.cells();
        let x = self.conv1.forward(code)?;
        let s1 = self.rnn1.forward(&x, &cells[0])?;
        let x = depth_to_space(&s1.hidden, 2)?;
        let s2 = self.rnn2.forward(&x, &cells[1])?;
        let x = depth_to_space(&s2.hidden, 2)?;
        let s3 = self.rnn3.forward(&x, &cells[2])?;
        let x = depth_to_space(&s3.hidden, 2)?;
        let s4 = self.rnn4.forward(&x, &cells[3])?;
        let x = depth_to_space(&s4.hidden, 2)?;
        let x = self.conv2.forward(&x)?;

        let output = match self.mode {
            ReconstructionMode::Replace => candle_nn::ops::sigmoid(&x)?,
            ReconstructionMode::Additive => x.tanh()?,
        };
        Ok((output, RecurrentState::new(vec![s1, s2, s3, s4])))
    }
}
