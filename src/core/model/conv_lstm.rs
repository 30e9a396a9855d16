//! 합성곱 LSTM 셀
//!
//! 입력 합성곱(3×3, stride 가변)과 은닉 합성곱(1×1)의 합으로 네 게이트를 만든다.

use crate::core::error::Result;
use crate::core::tensors::CellState;
use candle_core::Tensor;
use candle_nn::{conv2d, conv2d_no_bias, Conv2d, Conv2dConfig, Module, VarBuilder};

#[derive(Debug)]
pub struct ConvLstmCell {
    conv_ih: Conv2d,
    conv_hh: Conv2d,
    hidden_channels: usize,
}

impl ConvLstmCell {
    pub fn new(
        in_channels: usize,
        hidden_channels: usize,
        stride: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let gate_channels = 4 * hidden_channels;
        let ih_config = Conv2dConfig {
            padding: 1,
            stride,
            ..Default::default()
        };
        let conv_ih = conv2d(in_channels, gate_channels, 3, ih_config, vb.pp("conv_ih"))?;
        let conv_hh = conv2d_no_bias(
            hidden_channels,
            gate_channels,
            1,
            Default::default(),
            vb.pp("conv_hh"),
        )?;

        Ok(Self {
            conv_ih,
            conv_hh,
            hidden_channels,
        })
    }

    pub fn hidden_channels(&self) -> usize {
        self.hidden_channels
    }

    /// 한 단계 전진. 이전 상태는 건드리지 않고 새 상태를 반환한다.
    pub fn forward(&self, input: &Tensor, state: &CellState) -> Result<CellState> {
        let gates = (self.conv_ih.forward(input)? + self.conv_hh.forward(&state.hidden)?)?;
        let chunks = gates.chunk(4, 1)?;

        let input_gate = candle_nn::ops::sigmoid(&chunks[0])?;
        let forget_gate = candle_nn::ops::sigmoid(&chunks[1])?;
        let cell_gate = chunks[2].tanh()?;
        let output_gate = candle_nn::ops::sigmoid(&chunks[3])?;

        let cell = ((&forget_gate * &state.cell)? + (&input_gate * &cell_gate)?)?;
        let hidden = (&output_gate * &cell.tanh()?)?;

        Ok(CellState::new(hidden, cell))
    }
}

/// depth-to-space (pixel shuffle): `[b, c·r², h, w] -> [b, c, h·r, w·r]`
pub fn depth_to_space(x: &Tensor, factor: usize) -> Result<Tensor> {
    let (b, c, h, w) = x.dims4()?;
    let out_c = c / (factor * factor);
    let y = x
        .reshape(vec![b, out_c, factor, factor, h, w])?
        .permute(vec![0, 1, 4, 2, 5, 3])?
        .contiguous()?
        .reshape((b, out_c, h * factor, w * factor))?;
    Ok(y)
}
