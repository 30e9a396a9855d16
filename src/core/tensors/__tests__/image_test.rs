use crate::core::error::{CodecError, Result};
use crate::core::tensors::{
    image_to_tensor, mean_abs_error, resize, solid_image, tensor_to_image, RgbImage,
};
use approx::assert_abs_diff_eq;
use candle_core::{DType, Device, Tensor};
use image::Rgb;

#[test]
fn 단색_리사이즈_보존_테스트() -> Result<()> {
    let image = solid_image(100, 60, [10, 200, 128]);
    let resized = resize(&image, 256, 256)?;
    assert_eq!(resized.dimensions(), (256, 256));
    assert!(resized.pixels().all(|px| *px == Rgb([10, 200, 128])));
    Ok(())
}

#[test]
fn 리사이즈_보간_테스트() -> Result<()> {
    let image = RgbImage::from_fn(2, 2, |x, y| if (x + y) % 2 == 0 { Rgb([0; 3]) } else { Rgb([255; 3]) });
    let resized = resize(&image, 8, 8)?;
    assert_eq!(resized.dimensions(), (8, 8));
    assert!(resized.as_raw().iter().any(|&v| v > 0 && v < 255), "중간값 보간");
    Ok(())
}

#[test]
fn 이미지_텐서_변환_테스트() -> Result<()> {
    let device = Device::Cpu;
    let image = solid_image(32, 48, [128, 0, 255]);
    let tensor = image_to_tensor(&image, &device)?;

    assert_eq!(tensor.dims(), &[1, 3, 256, 256]);
    let data = tensor.flatten_all()?.to_vec1::<f32>()?;
    let plane = 256 * 256;
    assert!(data[..plane].iter().all(|&v| v == 128.0 / 255.0), "채널 우선 (CHW) 배치");
    assert_abs_diff_eq!(data[plane], 0.0);
    assert_abs_diff_eq!(data[2 * plane + 1000], 1.0);

    let back = tensor_to_image(&tensor)?;
    assert_eq!(back, solid_image(256, 256, [128, 0, 255]), "0–255 양자화 왕복");
    Ok(())
}

#[test]
fn 텐서_이미지_클램프_반올림_테스트() -> Result<()> {
    let device = Device::Cpu;
    let data = vec![-0.5f32, 0.5, 1.5];
    let tensor = Tensor::from_vec(data, (3, 1, 1), &device)?;
    let image = tensor_to_image(&tensor)?;
    let Rgb([r, g, b]) = *image.get_pixel(0, 0);
    assert_eq!(r, 0, "음수는 0으로");
    assert_eq!(g, 128, "127.5는 반올림");
    assert_eq!(b, 255, "1 초과는 255로");
    Ok(())
}

#[test]
fn 잘못된_텐서_형태_거부_테스트() -> Result<()> {
    let device = Device::Cpu;
    let batch = Tensor::zeros((2, 3, 4, 4), DType::F32, &device)?;
    assert!(matches!(tensor_to_image(&batch), Err(CodecError::ShapeMismatch { .. })));
    let gray = Tensor::zeros((1, 4, 4), DType::F32, &device)?;
    assert!(tensor_to_image(&gray).is_err());
    Ok(())
}

#[test]
fn 평균절대오차_테스트() -> Result<()> {
    let a = solid_image(4, 4, [0, 0, 0]);
    let b = solid_image(4, 4, [51, 51, 51]);
    assert_abs_diff_eq!(mean_abs_error(&a, &b)?, 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(mean_abs_error(&a, &a)?, 0.0);
    assert!(mean_abs_error(&a, &solid_image(2, 2, [0, 0, 0])).is_err());
    Ok(())
}

#[test]
fn png_파일_왕복_테스트() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("gray.png");
    let decoded = tensor_to_image(&Tensor::full(0.5f32, (1, 3, 256, 256), &Device::Cpu)?)?;
    decoded
        .save(&path)
        .map_err(|e| CodecError::InvalidConfig(e.to_string()))?;

    let reopened = image::open(&path)
        .map_err(|e| CodecError::InvalidConfig(e.to_string()))?
        .to_rgb8();
    assert_eq!(reopened, decoded);
    assert_eq!(mean_abs_error(&reopened, &solid_image(256, 256, [128, 128, 128]))?, 0.0);
    Ok(())
}
