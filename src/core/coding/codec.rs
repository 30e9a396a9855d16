//! 인코드 / 디코드 컨텍스트
//!
//! 세 구성요소와 그 파라미터를 소유하는 명시적 객체. 전역 모델 없이
//! `encode(image, budget)`/`decode(bytes, budget)`를 제공하며
//! 스텁 구성요소로도 같은 경로를 시험할 수 있다.

use super::residual_loop::ResidualCoder;
use crate::core::config::{ModelConfig, ReconstructionMode, IMAGE_SIZE};
use crate::core::error::{CodecError, Result};
use crate::core::model::{
    Binarizer, CheckpointStore, ConvBinarizer, ConvLstmDecoder, ConvLstmEncoder, Mode,
    NeuralModel, RecurrentDecoder, RecurrentEncoder,
};
use crate::core::packing::{BitPacker, BottleneckBudget};
use crate::core::tensors::{image_to_tensor, tensor_to_image, CodeLayout, RgbImage};
use candle_core::{Device, Tensor};
use log::{debug, info};

const IMAGE_DIMS: [usize; 4] = [1, 3, IMAGE_SIZE, IMAGE_SIZE];

pub struct Codec<E, B, D> {
    encoder: E,
    binarizer: B,
    decoder: D,
    layout: CodeLayout,
    reconstruction: ReconstructionMode,
    device: Device,
}

/// 학습된 ConvLSTM 모델로 구성된 코덱
pub type NeuralCodec = Codec<ConvLstmEncoder, ConvBinarizer, ConvLstmDecoder>;

impl<E, B, D> Codec<E, B, D>
where
    E: RecurrentEncoder,
    B: Binarizer,
    D: RecurrentDecoder,
{
    pub fn new(
        encoder: E,
        binarizer: B,
        decoder: D,
        layout: CodeLayout,
        reconstruction: ReconstructionMode,
        device: Device,
    ) -> Self {
        Self {
            encoder,
            binarizer,
            decoder,
            layout,
            reconstruction,
            device,
        }
    }

    pub fn layout(&self) -> &CodeLayout {
        &self.layout
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    fn coder(&self) -> ResidualCoder<'_> {
        ResidualCoder::new(&self.encoder, &self.binarizer, &self.decoder, self.reconstruction)
    }

    /// 임의 크기 이미지 → 256×256 리사이즈 → 패킹된 코드
    pub fn encode(&self, image: &RgbImage, budget: usize) -> Result<Vec<u8>> {
        let tensor = image_to_tensor(image, &self.device)?;
        self.encode_tensor(&tensor, budget)
    }

    /// `[1, 3, 256, 256]` 텐서 인코드
    ///
    /// 예산 클래스에 대응하는 횟수만큼 잔차 코딩을 돌리고 코드 열을 패킹한다.
    /// 상태는 호출마다 0에서 시작하므로 이전 호출의 영향을 받지 않는다.
    pub fn encode_tensor(&self, image: &Tensor, budget: usize) -> Result<Vec<u8>> {
        let budget = BottleneckBudget::try_from(budget)?;
        if image.dims() != IMAGE_DIMS {
            return Err(CodecError::shape("encoder input", &IMAGE_DIMS, image.dims()));
        }
        let required = budget.check_layout(&self.layout)?;

        let run = self.coder().run(image, budget.iterations(), Mode::Eval)?;
        let packed = BitPacker::from_layout(&self.layout).pack_tensors(&run.codes)?;
        debug_assert_eq!(packed.len(), required);

        debug!(
            "인코드 완료: {} ({}회 반복, {} 바이트)",
            budget,
            run.iterations(),
            packed.len()
        );
        Ok(packed)
    }

    /// 패킹된 코드 → 0–255 RGB 이미지 (256×256)
    pub fn decode(&self, packed: &[u8], budget: usize) -> Result<RgbImage> {
        let reconstruction = self.decode_tensor(packed, budget)?;
        tensor_to_image(&reconstruction)
    }

    /// 패킹된 코드 → `[1, 3, 256, 256]` 재구성 텐서
    ///
    /// 인코더 없이 디코더만 반복한다. 입력과 예산 외의 어떤 상태에도 의존하지 않는다.
    pub fn decode_tensor(&self, packed: &[u8], budget: usize) -> Result<Tensor> {
        let budget = BottleneckBudget::try_from(budget)?;
        let required = budget.check_layout(&self.layout)?;
        if packed.len() != required {
            return Err(CodecError::PackedLength {
                expected_multiple: self.layout.packed_bytes(),
                actual: packed.len(),
            });
        }

        let codes = BitPacker::from_layout(&self.layout).unpack_tensors(
            packed,
            &self.layout,
            &self.device,
        )?;
        self.coder().reconstruct(&codes, IMAGE_DIMS)
    }
}

impl NeuralCodec {
    /// 모델을 분해해 코덱으로 만든다 (파라미터는 이후 읽기 전용)
    pub fn from_model(model: NeuralModel) -> Self {
        let layout = model.config.code_layout();
        let reconstruction = model.config.reconstruction;
        Codec::new(
            model.encoder,
            model.binarizer,
            model.decoder,
            layout,
            reconstruction,
            model.device,
        )
    }

    /// 체크포인트에서 세 구성요소를 로드
    pub fn load(config: ModelConfig, device: &Device, store: &CheckpointStore) -> Result<Self> {
        let model = NeuralModel::load(config, device, store)?;
        info!("코덱 로드: {}", store.dir().display());
        Ok(Self::from_model(model))
    }
}
