//! 학습 / 검증 배치 공급

use crate::core::config::IMAGE_SIZE;
use crate::core::error::{CodecError, Result};
use candle_core::{DType, Device, Tensor};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

/// safetensors 데이터셋 파일의 텐서 이름
pub const IMAGES_KEY: &str = "images";

/// 에포크 단위 배치 공급자
pub trait BatchSource {
    fn num_batches(&self) -> usize;

    /// 에포크 `epoch`의 `[B, 3, 256, 256]` 배치들 ([0,1])
    fn epoch_batches(&mut self, epoch: usize) -> Result<Vec<Tensor>>;
}

/// 메모리에 올린 `[N, 3, 256, 256]` 이미지 묶음
#[derive(Debug, Clone)]
pub struct ImageDataset {
    images: Tensor,
    batch_size: usize,
    shuffle_seed: Option<u64>,
}

impl ImageDataset {
    pub fn new(images: Tensor, batch_size: usize) -> Result<Self> {
        let (n, c, h, w) = images.dims4()?;
        if (c, h, w) != (3, IMAGE_SIZE, IMAGE_SIZE) {
            return Err(CodecError::shape(
                "dataset images",
                &[n, 3, IMAGE_SIZE, IMAGE_SIZE],
                images.dims(),
            ));
        }
        if batch_size == 0 {
            return Err(CodecError::InvalidConfig("batch_size must be positive".to_string()));
        }
        Ok(Self {
            images,
            batch_size,
            shuffle_seed: None,
        })
    }

    /// 에포크마다 `seed + epoch`로 순서를 섞는다
    pub fn with_shuffle(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        self
    }

    /// `images` 텐서를 담은 safetensors 파일 로드 (u8이면 /255)
    pub fn from_safetensors(
        path: impl AsRef<Path>,
        batch_size: usize,
        device: &Device,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut tensors = candle_core::safetensors::load(path, device)?;
        let images = tensors.remove(IMAGES_KEY).ok_or_else(|| {
            CodecError::InvalidConfig(format!(
                "{} has no tensor named `{IMAGES_KEY}`",
                path.display()
            ))
        })?;
        let images = match images.dtype() {
            DType::U8 => images.to_dtype(DType::F32)?.affine(1.0 / 255.0, 0.0)?,
            _ => images.to_dtype(DType::F32)?,
        };
        info!("데이터셋 로드: {} ({:?})", path.display(), images.dims());
        Self::new(images, batch_size)
    }

    pub fn len(&self) -> usize {
        self.images.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn order(&self, epoch: usize) -> Vec<u32> {
        let mut order: Vec<u32> = (0..self.len() as u32).collect();
        if let Some(seed) = self.shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(epoch as u64));
            order.shuffle(&mut rng);
        }
        order
    }
}

impl BatchSource for ImageDataset {
    /// 마지막 불완전 배치 포함
    fn num_batches(&self) -> usize {
        self.len().div_ceil(self.batch_size)
    }

    fn epoch_batches(&mut self, epoch: usize) -> Result<Vec<Tensor>> {
        let order = self.order(epoch);
        order
            .chunks(self.batch_size)
            .map(|chunk| -> Result<Tensor> {
                let index = Tensor::new(chunk, self.images.device())?;
                Ok(self.images.index_select(&index, 0)?)
            })
            .collect()
    }
}
