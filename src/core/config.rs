//! # 모델 / 학습 구성 설정
//!
//! 인코더-이진화기-디코더 구조와 학습 하이퍼파라미터.
//! 학습 구성은 Trainer 생성 시 한 번 소비되고 이후 변경되지 않는다.

use crate::core::error::{CodecError, Result};
use crate::core::tensors::{CodeLayout, StageShape};
use candle_core::Device;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 입력 이미지 한 변의 크기 (인코드/디코드 공통 고정값)
pub const IMAGE_SIZE: usize = 256;

/// 인코더 전체 다운샘플 배율 (stride 2 × 4단)
pub const DOWNSAMPLE_FACTOR: usize = 16;

/// 디코더 출력의 재구성 규약
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconstructionMode {
    /// 디코더 출력이 재구성 자체 (sigmoid 출력, [0,1])
    Replace,
    /// 디코더 출력을 누적 재구성에 더함 (tanh/2 출력)
    Additive,
}

/// 모델 구조 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// 체크포인트 파일 이름 접두사
    pub name: String,
    /// 첫 stride-2 합성곱 채널 수
    pub stem_channels: usize,
    /// 인코더 ConvLSTM 3단 은닉 채널 (64×64, 32×32, 16×16)
    pub encoder_channels: [usize; 3],
    /// 병목 코드 채널 수
    pub code_channels: usize,
    /// 디코더 ConvLSTM 4단 은닉 채널 (16×16, 32×32, 64×64, 128×128)
    pub decoder_channels: [usize; 4],
    pub reconstruction: ReconstructionMode,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "crnn_sig_lr001_125".to_string(),
            stem_channels: 64,
            encoder_channels: [256, 512, 512],
            code_channels: 125,
            decoder_channels: [512, 512, 256, 128],
            reconstruction: ReconstructionMode::Replace,
        }
    }
}

impl ModelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_stem_channels(mut self, channels: usize) -> Self {
        self.stem_channels = channels;
        self
    }

    pub fn with_encoder_channels(mut self, channels: [usize; 3]) -> Self {
        self.encoder_channels = channels;
        self
    }

    pub fn with_code_channels(mut self, channels: usize) -> Self {
        self.code_channels = channels;
        self
    }

    pub fn with_decoder_channels(mut self, channels: [usize; 4]) -> Self {
        self.decoder_channels = channels;
        self
    }

    pub fn with_reconstruction(mut self, mode: ReconstructionMode) -> Self {
        self.reconstruction = mode;
        self
    }

    /// 구조 검증
    pub fn validate(&self) -> Result<()> {
        if self.stem_channels == 0 || self.code_channels == 0 {
            return Err(CodecError::InvalidConfig(
                "stem and code channels must be positive".to_string(),
            ));
        }
        if self.encoder_channels.iter().any(|&c| c == 0) {
            return Err(CodecError::InvalidConfig(format!(
                "encoder channels must be positive: {:?}",
                self.encoder_channels
            )));
        }
        // depth-to-space(2)가 채널을 4로 나눔
        if self.decoder_channels.iter().any(|&c| c == 0 || c % 4 != 0) {
            return Err(CodecError::InvalidConfig(format!(
                "decoder channels must be positive multiples of 4: {:?}",
                self.decoder_channels
            )));
        }
        Ok(())
    }

    pub fn code_layout(&self) -> CodeLayout {
        let side = IMAGE_SIZE / DOWNSAMPLE_FACTOR;
        CodeLayout::new(self.code_channels, side, side)
    }

    /// 인코더 상태 형태: 64×64, 32×32, 16×16
    pub fn encoder_state_shapes(&self) -> Vec<StageShape> {
        self.encoder_channels
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let side = IMAGE_SIZE / (4 << i);
                StageShape::new(c, side, side)
            })
            .collect()
    }

    /// 디코더 상태 형태: 16×16, 32×32, 64×64, 128×128
    pub fn decoder_state_shapes(&self) -> Vec<StageShape> {
        self.decoder_channels
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let side = (IMAGE_SIZE / DOWNSAMPLE_FACTOR) << i;
                StageShape::new(c, side, side)
            })
            .collect()
    }
}

/// 학습 장치 선택
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    Cpu,
    Cuda { ordinal: usize },
}

impl DeviceKind {
    pub fn to_device(self) -> Result<Device> {
        match self {
            DeviceKind::Cpu => Ok(Device::Cpu),
            DeviceKind::Cuda { ordinal } => Ok(Device::new_cuda(ordinal)?),
        }
    }
}

/// 학습 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub model: ModelConfig,
    pub batch_size: usize,
    /// 배치당 잔차 코딩 반복 횟수
    pub iterations: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// 지각 손실 가중치 (0이면 L1만 사용)
    pub percep_weight: f32,
    pub device: DeviceKind,
    /// 검증 활성화 여부
    pub validate: bool,
    /// 학습률 감소 에포크
    pub lr_milestones: Vec<usize>,
    /// 학습률 감소 배율
    pub lr_gamma: f64,
    /// 조기 종료 인내 횟수
    pub patience: usize,
    /// 에포크 배치 수 대비 로깅 간격 비율
    pub log_interval_fraction: f64,
    /// 검증 간격 (배치 단위, None이면 에포크당 배치 수)
    pub val_interval: Option<usize>,
    /// 학습 데이터 셔플 시드 (None이면 셔플 안 함)
    pub shuffle_seed: Option<u64>,
    pub show_progress: bool,
    pub save_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            batch_size: 32,
            iterations: 16,
            epochs: 200,
            learning_rate: 0.001,
            percep_weight: 0.0,
            device: DeviceKind::Cpu,
            validate: true,
            lr_milestones: vec![3, 10, 20, 50, 100],
            lr_gamma: 0.5,
            patience: 10,
            log_interval_fraction: 0.05,
            val_interval: None,
            shuffle_seed: Some(0),
            show_progress: false,
            save_dir: PathBuf::from("save"),
            log_dir: PathBuf::from("log"),
        }
    }
}

impl TrainConfig {
    /// JSON 파일에서 구성 로드
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: TrainConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        if self.batch_size == 0 || self.iterations == 0 {
            return Err(CodecError::InvalidConfig(
                "batch_size and iterations must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.percep_weight) {
            return Err(CodecError::InvalidConfig(format!(
                "percep_weight must be in [0, 1], got {}",
                self.percep_weight
            )));
        }
        if self.patience == 0 {
            return Err(CodecError::InvalidConfig("patience must be positive".to_string()));
        }
        if self.val_interval == Some(0) {
            return Err(CodecError::InvalidConfig("val_interval must be positive".to_string()));
        }
        Ok(())
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_percep_weight(mut self, weight: f32) -> Self {
        self.percep_weight = weight;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_val_interval(mut self, interval: Option<usize>) -> Self {
        self.val_interval = interval;
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }
}
