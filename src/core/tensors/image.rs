//! 호스트 이미지 ↔ 텐서 변환
//!
//! 임의 크기의 RGB 이미지를 256×256으로 리사이즈(삼각 필터)한 뒤
//! `[1, 3, 256, 256]` f32 텐서([0,1])로 바꾸고, 디코드 결과를 다시 0–255 정수로 양자화한다.

use crate::core::config::IMAGE_SIZE;
use crate::core::error::{CodecError, Result};
use candle_core::{DType, Device, Tensor};
use ::image::{imageops, Rgb};

/// 8비트 RGB 이미지
pub type RgbImage = ::image::RgbImage;

/// 단색 이미지 생성
pub fn solid_image(height: usize, width: usize, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width as u32, height as u32, Rgb(rgb))
}

/// 삼각(bilinear) 필터 리사이즈. 크기가 같으면 복사만 한다.
pub fn resize(image: &RgbImage, height: usize, width: usize) -> Result<RgbImage> {
    let (in_w, in_h) = image.dimensions();
    if in_w == 0 || in_h == 0 {
        return Err(CodecError::shape(
            "rgb image",
            &[height, width, 3],
            &[in_h as usize, in_w as usize, 3],
        ));
    }
    if (in_h as usize, in_w as usize) == (height, width) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(
        image,
        width as u32,
        height as u32,
        imageops::FilterType::Triangle,
    ))
}

/// RGB 이미지 → `[1, 3, 256, 256]` 텐서 ([0,1] 범위)
pub fn image_to_tensor(image: &RgbImage, device: &Device) -> Result<Tensor> {
    let resized = resize(image, IMAGE_SIZE, IMAGE_SIZE)?;
    let data: Vec<f32> = resized.into_raw().iter().map(|&v| v as f32 / 255.0).collect();
    // HWC → CHW
    let tensor = Tensor::from_vec(data, (IMAGE_SIZE, IMAGE_SIZE, 3), device)?
        .permute((2, 0, 1))?
        .contiguous()?
        .unsqueeze(0)?;
    Ok(tensor)
}

/// `[1, 3, H, W]` 또는 `[3, H, W]` 텐서 → RGB 이미지 (0–255 반올림)
pub fn tensor_to_image(tensor: &Tensor) -> Result<RgbImage> {
    let tensor = match tensor.rank() {
        4 if tensor.dim(0)? == 1 => tensor.squeeze(0)?,
        3 => tensor.clone(),
        _ => {
            return Err(CodecError::shape(
                "image tensor",
                &[1, 3, IMAGE_SIZE, IMAGE_SIZE],
                tensor.dims(),
            ))
        }
    };
    let (channels, height, width) = tensor.dims3()?;
    if channels != 3 {
        return Err(CodecError::shape("image tensor", &[3, height, width], tensor.dims()));
    }

    // CHW → HWC
    let data = tensor
        .to_dtype(DType::F32)?
        .clamp(0f32, 1f32)?
        .permute((1, 2, 0))?
        .flatten_all()?
        .to_vec1::<f32>()?;
    let quantized: Vec<u8> = data.iter().map(|&v| (v * 255.0).round() as u8).collect();
    RgbImage::from_raw(width as u32, height as u32, quantized)
        .ok_or_else(|| CodecError::InvalidConfig("image buffer size mismatch".to_string()))
}

/// 이미지 평균 절대 오차 (0–1 스케일)
pub fn mean_abs_error(a: &RgbImage, b: &RgbImage) -> Result<f32> {
    if a.dimensions() != b.dimensions() {
        let (aw, ah) = a.dimensions();
        let (bw, bh) = b.dimensions();
        return Err(CodecError::shape(
            "image pair",
            &[ah as usize, aw as usize, 3],
            &[bh as usize, bw as usize, 3],
        ));
    }
    let (a, b) = (a.as_raw(), b.as_raw());
    let total: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as f32 - y as f32).abs() / 255.0)
        .sum();
    Ok(total / a.len().max(1) as f32)
}
