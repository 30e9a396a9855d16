//! VGG16 `features` 앞부분 (인덱스 0..=22)
//!
//! 가중치 이름은 torchvision 규약 `features.{idx}.{weight,bias}`를 따른다.
//! `VarBuilder::from_tensors`로 만든 파라미터는 상수 텐서라 옵티마이저에 들어가지 않는다.

use crate::core::error::{CodecError, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, Module, VarBuilder};
use log::info;
use std::collections::BTreeMap;
use std::path::Path;

/// ImageNet 정규화 상수
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 특징을 뽑는 ReLU 인덱스와 이름
pub const SELECTED_LAYERS: [(usize, &str); 4] = [
    (3, "relu1_2"),
    (8, "relu2_2"),
    (15, "relu3_3"),
    (22, "relu4_3"),
];

#[derive(Debug, Clone, Copy)]
enum LayerSpec {
    Conv(usize, usize),
    Relu,
    Pool,
}

/// torchvision vgg16.features[0..=22]
const VGG16_PREFIX: [LayerSpec; 23] = [
    LayerSpec::Conv(3, 64),
    LayerSpec::Relu,
    LayerSpec::Conv(64, 64),
    LayerSpec::Relu,
    LayerSpec::Pool,
    LayerSpec::Conv(64, 128),
    LayerSpec::Relu,
    LayerSpec::Conv(128, 128),
    LayerSpec::Relu,
    LayerSpec::Pool,
    LayerSpec::Conv(128, 256),
    LayerSpec::Relu,
    LayerSpec::Conv(256, 256),
    LayerSpec::Relu,
    LayerSpec::Conv(256, 256),
    LayerSpec::Relu,
    LayerSpec::Pool,
    LayerSpec::Conv(256, 512),
    LayerSpec::Relu,
    LayerSpec::Conv(512, 512),
    LayerSpec::Relu,
    LayerSpec::Conv(512, 512),
    LayerSpec::Relu,
];

#[derive(Debug)]
enum Layer {
    Conv(Conv2d),
    Relu,
    Pool,
}

/// 동결된 지각 손실 특징 추출기
#[derive(Debug)]
pub struct PerceptualLossNet {
    layers: Vec<Layer>,
    mean: Tensor,
    std: Tensor,
}

impl PerceptualLossNet {
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let conv_config = Conv2dConfig {
            padding: 1,
            ..Default::default()
        };
        let features = vb.pp("features");
        let layers = VGG16_PREFIX
            .iter()
            .enumerate()
            .map(|(idx, kind)| -> Result<Layer> {
                Ok(match *kind {
                    LayerSpec::Conv(c_in, c_out) => {
                        Layer::Conv(conv2d(c_in, c_out, 3, conv_config, features.pp(idx))?)
                    }
                    LayerSpec::Relu => Layer::Relu,
                    LayerSpec::Pool => Layer::Pool,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let device = vb.device();
        let mean = Tensor::new(&IMAGENET_MEAN, device)?.reshape((1, 3, 1, 1))?;
        let std = Tensor::new(&IMAGENET_STD, device)?.reshape((1, 3, 1, 1))?;
        Ok(Self { layers, mean, std })
    }

    /// 사전학습 가중치 safetensors 파일에서 로드. 파일이 없으면 I/O 오류.
    pub fn from_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CodecError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("perceptual weights not found: {}", path.display()),
            )));
        }
        let tensors = candle_core::safetensors::load(path, device)?;
        info!("지각 손실 네트워크 로드: {} ({}개 텐서)", path.display(), tensors.len());
        Self::new(VarBuilder::from_tensors(tensors, DType::F32, device))
    }

    /// `[0,1]` 이미지 배치의 선택 층 특징
    pub fn features(&self, image: &Tensor) -> Result<BTreeMap<String, Tensor>> {
        let mut x = image.broadcast_sub(&self.mean)?.broadcast_div(&self.std)?;
        let mut out = BTreeMap::new();
        let last = SELECTED_LAYERS[SELECTED_LAYERS.len() - 1].0;

        for (idx, layer) in self.layers.iter().enumerate().take(last + 1) {
            x = match layer {
                Layer::Conv(conv) => conv.forward(&x)?,
                Layer::Relu => x.relu()?,
                Layer::Pool => x.max_pool2d(2)?,
            };
            if let Some((_, name)) = SELECTED_LAYERS.iter().find(|(i, _)| *i == idx) {
                out.insert(name.to_string(), x.clone());
            }
        }
        Ok(out)
    }

    /// 선택 층마다 MSE를 구해 합산 (원본 vs 재구성)
    pub fn loss(&self, target: &Tensor, reconstruction: &Tensor) -> Result<Tensor> {
        let target_features = self.features(&target.detach())?;
        let recon_features = self.features(reconstruction)?;

        let mut total = Tensor::zeros((), reconstruction.dtype(), reconstruction.device())?;
        for (name, target_feature) in &target_features {
            let recon_feature = recon_features.get(name).ok_or_else(|| {
                CodecError::InvalidConfig(format!("missing perceptual feature {name}"))
            })?;
            let mse = candle_nn::loss::mse(recon_feature, target_feature)?;
            total = (total + mse)?;
        }
        Ok(total)
    }
}
