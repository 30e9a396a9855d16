use super::small_config;
use crate::core::error::Result;
use crate::core::model::binarizer::{hard_sign, stochastic_sign};
use crate::core::model::{Binarizer, ConvBinarizer, Mode};
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};

fn is_binary(t: &Tensor) -> Result<bool> {
    let values = t.flatten_all()?.to_vec1::<f32>()?;
    Ok(values.iter().all(|&v| v == 1.0 || v == -1.0))
}

#[test]
fn 결정적_부호_테스트() -> Result<()> {
    let device = Device::Cpu;
    let x = Tensor::new(&[-0.7f32, -1e-6, 0.0, 1e-6, 0.9], &device)?;
    let y = hard_sign(&x)?.to_vec1::<f32>()?;
    assert_eq!(y, vec![-1.0, -1.0, 1.0, 1.0, 1.0], "0은 +1로");
    Ok(())
}

#[test]
fn 확률적_반올림_기대값_테스트() -> Result<()> {
    let device = Device::Cpu;
    let x = Tensor::full(0.5f32, 20_000, &device)?;
    let y = stochastic_sign(&x)?;
    assert!(is_binary(&y)?, "순전파 값은 정확히 이진");

    // P(+1) = (1 + 0.5) / 2 = 0.75 → 기대값 0.5
    let mean = y.mean_all()?.to_scalar::<f32>()?;
    assert!((mean - 0.5).abs() < 0.05, "기대값 {mean}");

    let ones = stochastic_sign(&Tensor::ones(64, DType::F32, &device)?)?;
    assert_eq!(ones.min(0)?.to_scalar::<f32>()?, 1.0, "x = 1이면 항상 +1");
    Ok(())
}

#[test]
fn 확률적_반올림_정확한_이진값_테스트() -> Result<()> {
    let device = Device::Cpu;
    // 임의 실수 입력에서도 반올림 오차 없이 ±1
    let x = Tensor::randn(0f32, 1.0, (2, 125, 16, 16), &device)?.tanh()?;
    let y = stochastic_sign(&x)?;
    let values = y.flatten_all()?.to_vec1::<f32>()?;
    let off: Vec<f32> = values.iter().copied().filter(|&v| v != 1.0 && v != -1.0).collect();
    assert!(off.is_empty(), "{}개 비이진 값: {:?}", off.len(), &off[..off.len().min(4)]);
    Ok(())
}

#[test]
fn 직통_그래디언트_테스트() -> Result<()> {
    let device = Device::Cpu;
    let x = Var::from_tensor(&Tensor::new(&[-0.3f32, 0.1, 0.8], &device)?)?;
    let y = stochastic_sign(x.as_tensor())?;
    let loss = (y * Tensor::new(&[1f32, 2.0, 3.0], &device)?)?.sum_all()?;
    let grads = loss.backward()?;
    let grad = grads.get(x.as_tensor()).map(|g| g.to_vec1::<f32>());
    assert_eq!(grad.transpose()?, Some(vec![1.0, 2.0, 3.0]), "역전파는 항등");
    Ok(())
}

#[test]
fn 이진화기_모드별_출력_테스트() -> Result<()> {
    let device = Device::Cpu;
    let config = small_config("binarizer");
    let varmap = VarMap::new();
    let binarizer = ConvBinarizer::new(&config, VarBuilder::from_varmap(&varmap, DType::F32, &device))?;
    let features = Tensor::randn(0f32, 1.0, (2, 8, 16, 16), &device)?;

    let eval_a = binarizer.binarize(&features, Mode::Eval)?;
    let eval_b = binarizer.binarize(&features, Mode::Eval)?;
    assert_eq!(eval_a.dims(), &[2, 125, 16, 16]);
    assert!(is_binary(&eval_a)?);
    let diff = (&eval_a - &eval_b)?.abs()?.sum_all()?.to_scalar::<f32>()?;
    assert_eq!(diff, 0.0, "추론 모드는 결정적");

    let train = binarizer.binarize(&features, Mode::Train)?;
    assert!(is_binary(&train)?, "학습 모드도 순전파 값은 이진");
    Ok(())
}
