//! ConvLSTM 인코더 / 이진화기 / 디코더와 그 파라미터를 함께 소유하는 모델

use super::binarizer::ConvBinarizer;
use super::checkpoint::CheckpointStore;
use super::decoder::ConvLstmDecoder;
use super::encoder::ConvLstmEncoder;
use super::params::{ModelParams, ModelSnapshot};
use crate::core::config::ModelConfig;
use crate::core::error::Result;
use candle_core::Device;
use log::info;

#[derive(Debug)]
pub struct NeuralModel {
    pub config: ModelConfig,
    pub device: Device,
    pub encoder: ConvLstmEncoder,
    pub binarizer: ConvBinarizer,
    pub decoder: ConvLstmDecoder,
    pub params: ModelParams,
}

impl NeuralModel {
    /// 무작위 초기화된 새 모델
    pub fn new(config: ModelConfig, device: &Device) -> Result<Self> {
        config.validate()?;
        let params = ModelParams::new();
        let encoder = ConvLstmEncoder::new(&config, params.encoder.var_builder(device))?;
        let binarizer = ConvBinarizer::new(&config, params.binarizer.var_builder(device))?;
        let decoder = ConvLstmDecoder::new(&config, params.decoder.var_builder(device))?;

        info!(
            "모델 생성: {} (encoder {}, binarizer {}, decoder {} 파라미터)",
            config.name,
            params.encoder.num_parameters(),
            params.binarizer.num_parameters(),
            params.decoder.num_parameters()
        );

        Ok(Self {
            config,
            device: device.clone(),
            encoder,
            binarizer,
            decoder,
            params,
        })
    }

    /// 체크포인트에서 로드 (구조가 다르면 치명적 오류)
    pub fn load(config: ModelConfig, device: &Device, store: &CheckpointStore) -> Result<Self> {
        let model = Self::new(config, device)?;
        store.load_into(&model.params, device)?;
        Ok(model)
    }

    pub fn snapshot(&self) -> Result<ModelSnapshot> {
        self.params.snapshot()
    }
}
