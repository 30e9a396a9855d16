//! ConvLSTM 인코더
//!
//! 256×256 입력 → stem 합성곱(128×128) → ConvLSTM 3단(64, 32, 16) → 16×16 특징맵

use super::conv_lstm::ConvLstmCell;
use super::RecurrentEncoder;
use crate::core::config::{ModelConfig, IMAGE_SIZE};
use crate::core::error::{CodecError, Result};
use crate::core::tensors::{RecurrentState, StageShape};
use candle_core::Tensor;
use candle_nn::{conv2d, Conv2d, Conv2dConfig, Module, VarBuilder};

#[derive(Debug)]
pub struct ConvLstmEncoder {
    conv: Conv2d,
    rnn1: ConvLstmCell,
    rnn2: ConvLstmCell,
    rnn3: ConvLstmCell,
    shapes: Vec<StageShape>,
}

impl ConvLstmEncoder {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let [c1, c2, c3] = config.encoder_channels;
        let stem_config = Conv2dConfig {
            padding: 1,
            stride: 2,
            ..Default::default()
        };
        let conv = conv2d(3, config.stem_channels, 3, stem_config, vb.pp("conv"))?;
        let rnn1 = ConvLstmCell::new(config.stem_channels, c1, 2, vb.pp("rnn1"))?;
        let rnn2 = ConvLstmCell::new(c1, c2, 2, vb.pp("rnn2"))?;
        let rnn3 = ConvLstmCell::new(c2, c3, 2, vb.pp("rnn3"))?;

        Ok(Self {
            conv,
            rnn1,
            rnn2,
            rnn3,
            shapes: config.encoder_state_shapes(),
        })
    }
}

impl RecurrentEncoder for ConvLstmEncoder {
    fn state_shapes(&self) -> Vec<StageShape> {
        self.shapes.clone()
    }

    fn step(&self, input: &Tensor, state: &RecurrentState) -> Result<(Tensor, RecurrentState)> {
        let (batch, channels, height, width) = input.dims4()?;
        if (channels, height, width) != (3, IMAGE_SIZE, IMAGE_SIZE) {
            return Err(CodecError::shape(
                "encoder input",
                &[batch, 3, IMAGE_SIZE, IMAGE_SIZE],
                input.dims(),
            ));
        }
        state.check("encoder", &self.shapes, batch)?;

        let cells = state.cells();
        let x = self.conv.forward(input)?;
        let s1 = self.rnn1.forward(&x, &cells[0])?;
        let s2 = self.rnn2.forward(&s1.hidden, &cells[1])?;
        let s3 = self.rnn3.forward(&s2.hidden, &cells[2])?;

        let features = s3.hidden.clone();
        Ok((features, RecurrentState::new(vec![s1, s2, s3])))
    }
}
