//! 잔차 코딩 루프
//!
//! INIT → ITERATING → DONE 상태 머신. 매 반복마다 현재 잔차를
//! 인코더 → 이진화기 → 디코더로 통과시키고 재구성을 갱신한다.
//! 불변식: `residual_{i+1} = original - reconstruction_i`

use crate::core::config::ReconstructionMode;
use crate::core::error::{CodecError, Result};
use crate::core::model::{Binarizer, Mode, RecurrentDecoder, RecurrentEncoder};
use crate::core::tensors::RecurrentState;
use candle_core::Tensor;
use log::debug;

/// 루프 진행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Init,
    Iterating { completed: usize },
    Done,
}

/// 디코더 출력을 누적 재구성에 반영
pub fn accumulate(
    mode: ReconstructionMode,
    reconstruction: &Tensor,
    output: &Tensor,
) -> Result<Tensor> {
    match mode {
        ReconstructionMode::Replace => Ok(output.clone()),
        ReconstructionMode::Additive => Ok((reconstruction + output)?),
    }
}

/// 한 번의 잔차 코딩 실행 결과
#[derive(Debug, Clone)]
pub struct CodingRun {
    /// 최종 재구성
    pub reconstruction: Tensor,
    /// 반복 순서대로의 병목 코드
    pub codes: Vec<Tensor>,
    /// 반복별 평균 절대 잔차 (그래프 연결된 스칼라)
    pub iteration_losses: Vec<Tensor>,
}

impl CodingRun {
    pub fn iterations(&self) -> usize {
        self.codes.len()
    }

    /// 반복별 평균 절대 잔차 값
    pub fn iteration_errors(&self) -> Result<Vec<f32>> {
        self.iteration_losses
            .iter()
            .map(|loss| -> Result<f32> { Ok(loss.to_scalar::<f32>()?) })
            .collect()
    }

    /// 반복 평균 L1 손실
    pub fn mean_loss(&self) -> Result<Tensor> {
        let stacked = Tensor::stack(&self.iteration_losses, 0)?;
        Ok(stacked.mean_all()?)
    }
}

/// 세 구성요소를 빌려 루프를 구동하는 코더
pub struct ResidualCoder<'a> {
    encoder: &'a dyn RecurrentEncoder,
    binarizer: &'a dyn Binarizer,
    decoder: &'a dyn RecurrentDecoder,
    reconstruction: ReconstructionMode,
}

impl<'a> ResidualCoder<'a> {
    pub fn new(
        encoder: &'a dyn RecurrentEncoder,
        binarizer: &'a dyn Binarizer,
        decoder: &'a dyn RecurrentDecoder,
        reconstruction: ReconstructionMode,
    ) -> Self {
        Self {
            encoder,
            binarizer,
            decoder,
            reconstruction,
        }
    }

    pub fn reconstruction_mode(&self) -> ReconstructionMode {
        self.reconstruction
    }

    /// INIT 상태의 루프 생성: 재구성 0, 모든 순환 상태 0, 잔차 = 원본
    pub fn start(&self, original: &Tensor, mode: Mode) -> Result<ResidualLoop<'_>> {
        let batch = original.dims4()?.0;
        let device = original.device();
        Ok(ResidualLoop {
            coder: self,
            mode,
            original: original.clone(),
            reconstruction: original.zeros_like()?,
            residual: original.clone(),
            encoder_state: RecurrentState::zeros(&self.encoder.state_shapes(), batch, device)?,
            decoder_state: RecurrentState::zeros(&self.decoder.state_shapes(), batch, device)?,
            codes: Vec::new(),
            iteration_losses: Vec::new(),
            phase: LoopPhase::Init,
        })
    }

    /// `iterations`회 실행 후 DONE
    pub fn run(&self, original: &Tensor, iterations: usize, mode: Mode) -> Result<CodingRun> {
        if iterations == 0 {
            return Err(CodecError::InvalidConfig(
                "residual coding needs at least one iteration".to_string(),
            ));
        }
        let mut coding = self.start(original, mode)?;
        for _ in 0..iterations {
            coding.step()?;
        }
        coding.finish()
    }

    /// 코드 열만으로 재구성 (인코더 없이 디코더만 반복)
    pub fn reconstruct(&self, codes: &[Tensor], image_dims: [usize; 4]) -> Result<Tensor> {
        let first = codes.first().ok_or_else(|| {
            CodecError::InvalidConfig("cannot reconstruct from an empty code sequence".to_string())
        })?;
        let device = first.device();
        let mut state = RecurrentState::zeros(&self.decoder.state_shapes(), image_dims[0], device)?;
        let mut reconstruction = Tensor::zeros(&image_dims, first.dtype(), device)?;

        for code in codes {
            let (output, next) = self.decoder.step(code, &state)?;
            reconstruction = accumulate(self.reconstruction, &reconstruction, &output)?;
            state = next;
        }
        Ok(reconstruction)
    }
}

/// 진행 중인 한 번의 잔차 코딩
pub struct ResidualLoop<'a> {
    coder: &'a ResidualCoder<'a>,
    mode: Mode,
    original: Tensor,
    reconstruction: Tensor,
    residual: Tensor,
    encoder_state: RecurrentState,
    decoder_state: RecurrentState,
    codes: Vec<Tensor>,
    iteration_losses: Vec<Tensor>,
    phase: LoopPhase,
}

impl<'a> ResidualLoop<'a> {
    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn residual(&self) -> &Tensor {
        &self.residual
    }

    pub fn reconstruction(&self) -> &Tensor {
        &self.reconstruction
    }

    /// 한 번의 인코더 → 이진화기 → 디코더 반복
    pub fn step(&mut self) -> Result<&Tensor> {
        let completed = match self.phase {
            LoopPhase::Init => 0,
            LoopPhase::Iterating { completed } => completed,
            LoopPhase::Done => {
                return Err(CodecError::InvalidConfig(
                    "residual loop already finished".to_string(),
                ))
            }
        };

        let (features, encoder_state) =
            self.coder.encoder.step(&self.residual, &self.encoder_state)?;
        let code = self.coder.binarizer.binarize(&features, self.mode)?;
        let (output, decoder_state) = self.coder.decoder.step(&code, &self.decoder_state)?;

        self.reconstruction =
            accumulate(self.coder.reconstruction, &self.reconstruction, &output)?;
        self.residual = (&self.original - &self.reconstruction)?;
        let loss = self.residual.abs()?.mean_all()?;

        debug!("반복 {}: 평균 절대 잔차 {:.6}", completed + 1, loss.to_scalar::<f32>()?);

        self.encoder_state = encoder_state;
        self.decoder_state = decoder_state;
        self.codes.push(code);
        self.iteration_losses.push(loss);
        self.phase = LoopPhase::Iterating {
            completed: completed + 1,
        };

        self.codes
            .last()
            .ok_or_else(|| CodecError::InvalidConfig("no code produced".to_string()))
    }

    /// DONE으로 전이하고 결과 반환. 이후 `step`/`finish`는 오류.
    pub fn finish(&mut self) -> Result<CodingRun> {
        match self.phase {
            LoopPhase::Init => Err(CodecError::InvalidConfig(
                "residual loop finished before any iteration".to_string(),
            )),
            LoopPhase::Done => Err(CodecError::InvalidConfig(
                "residual loop already finished".to_string(),
            )),
            LoopPhase::Iterating { .. } => {
                self.phase = LoopPhase::Done;
                Ok(CodingRun {
                    reconstruction: self.reconstruction.clone(),
                    codes: std::mem::take(&mut self.codes),
                    iteration_losses: std::mem::take(&mut self.iteration_losses),
                })
            }
        }
    }
}
