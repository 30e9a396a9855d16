use crate::core::error::{CodecError, Result};
use crate::core::training::{BatchSource, ImageDataset, IMAGES_KEY};
use approx::assert_abs_diff_eq;
use candle_core::{DType, Device, Tensor};
use std::collections::HashMap;

/// i번째 이미지는 값 i로 채움
fn indexed_images(n: usize, device: &Device) -> Result<Tensor> {
    let images = Tensor::arange(0f32, n as f32, device)?
        .reshape((n, 1, 1, 1))?
        .broadcast_as((n, 3, 256, 256))?
        .contiguous()?;
    Ok(images)
}

fn batch_ids(batch: &Tensor) -> Result<Vec<u32>> {
    let n = batch.dims4()?.0;
    let firsts = batch.flatten_from(1)?.narrow(1, 0, 1)?.reshape(n)?;
    Ok(firsts.to_vec1::<f32>()?.into_iter().map(|v| v as u32).collect())
}

#[test]
fn 배치_분할_테스트() -> Result<()> {
    let device = Device::Cpu;
    let mut dataset = ImageDataset::new(indexed_images(5, &device)?, 2)?;
    assert_eq!(dataset.len(), 5);
    assert_eq!(dataset.num_batches(), 3, "마지막 불완전 배치 포함");

    let batches = dataset.epoch_batches(0)?;
    let ids: Vec<Vec<u32>> = batches.iter().map(batch_ids).collect::<Result<_>>()?;
    assert_eq!(ids, vec![vec![0, 1], vec![2, 3], vec![4]], "셔플 없으면 순서 유지");
    Ok(())
}

#[test]
fn 시드_셔플_결정성_테스트() -> Result<()> {
    let device = Device::Cpu;
    let images = indexed_images(16, &device)?;
    let mut a = ImageDataset::new(images.clone(), 16)?.with_shuffle(Some(42));
    let mut b = ImageDataset::new(images, 16)?.with_shuffle(Some(42));

    let epoch0 = batch_ids(&a.epoch_batches(0)?[0])?;
    assert_eq!(epoch0, batch_ids(&b.epoch_batches(0)?[0])?, "같은 시드와 에포크는 같은 순서");

    let epoch1 = batch_ids(&a.epoch_batches(1)?[0])?;
    assert_ne!(epoch0, epoch1, "에포크마다 다른 순서");

    let mut sorted = epoch1.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..16).collect::<Vec<u32>>(), "순열");
    Ok(())
}

#[test]
fn 잘못된_데이터셋_거부_테스트() -> Result<()> {
    let device = Device::Cpu;
    let small = Tensor::zeros((2, 3, 64, 64), DType::F32, &device)?;
    assert!(matches!(ImageDataset::new(small, 1), Err(CodecError::ShapeMismatch { .. })));
    assert!(ImageDataset::new(indexed_images(2, &device)?, 0).is_err());
    Ok(())
}

#[test]
fn safetensors_u8_데이터셋_로드_테스트() -> Result<()> {
    let device = Device::Cpu;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("train.safetensors");
    let images = Tensor::full(255u8, (3, 3, 256, 256), &device)?;
    candle_core::safetensors::save(&HashMap::from([(IMAGES_KEY.to_string(), images)]), &path)?;

    let mut dataset = ImageDataset::from_safetensors(&path, 2, &device)?;
    assert_eq!(dataset.len(), 3);
    let batch = &dataset.epoch_batches(0)?[0];
    assert_eq!(batch.dtype(), DType::F32);
    let max = batch.flatten_all()?.max(0)?.to_scalar::<f32>()?;
    assert_abs_diff_eq!(max, 1.0, epsilon = 1e-6);

    let other = dir.path().join("other.safetensors");
    let tensors = HashMap::from([("pixels".to_string(), Tensor::zeros(1, DType::F32, &device)?)]);
    candle_core::safetensors::save(&tensors, &other)?;
    assert!(matches!(
        ImageDataset::from_safetensors(&other, 2, &device),
        Err(CodecError::InvalidConfig(_))
    ));
    Ok(())
}
