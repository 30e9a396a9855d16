use crate::core::error::Result;
use crate::core::model::conv_lstm::{depth_to_space, ConvLstmCell};
use crate::core::tensors::CellState;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};

#[test]
fn 깊이_공간_변환_배치_테스트() -> Result<()> {
    let device = Device::Cpu;
    let x = Tensor::arange(0f32, 4.0, &device)?.reshape((1, 4, 1, 1))?;
    let y = depth_to_space(&x, 2)?;
    assert_eq!(y.dims(), &[1, 1, 2, 2]);
    assert_eq!(y.flatten_all()?.to_vec1::<f32>()?, vec![0.0, 1.0, 2.0, 3.0]);

    let x = Tensor::rand(0f32, 1.0, (2, 16, 3, 5), &device)?;
    assert_eq!(depth_to_space(&x, 2)?.dims(), &[2, 4, 6, 10]);
    Ok(())
}

#[test]
fn 셀_한단계_형태_테스트() -> Result<()> {
    let device = Device::Cpu;
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let cell = ConvLstmCell::new(3, 6, 2, vb)?;
    assert_eq!(cell.hidden_channels(), 6);

    let input = Tensor::rand(0f32, 1.0, (2, 3, 16, 16), &device)?;
    let state = CellState::new(
        Tensor::zeros((2, 6, 8, 8), DType::F32, &device)?,
        Tensor::zeros((2, 6, 8, 8), DType::F32, &device)?,
    );
    let next = cell.forward(&input, &state)?;
    assert_eq!(next.hidden.dims(), &[2, 6, 8, 8], "stride 2로 해상도 절반");
    assert_eq!(next.cell.dims(), &[2, 6, 8, 8]);

    // 은닉 = o * tanh(c) 이므로 |h| < 1
    let max = next.hidden.abs()?.max_keepdim(3)?.flatten_all()?.max(0)?.to_scalar::<f32>()?;
    assert!(max < 1.0);

    // 이전 상태는 값으로 전달되어 변하지 않음
    let untouched = state.hidden.abs()?.sum_all()?.to_scalar::<f32>()?;
    assert_eq!(untouched, 0.0);
    Ok(())
}

#[test]
fn 셀_상태_전파_테스트() -> Result<()> {
    let device = Device::Cpu;
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let cell = ConvLstmCell::new(2, 4, 1, vb)?;

    let input = Tensor::rand(0f32, 1.0, (1, 2, 8, 8), &device)?;
    let zero = CellState::zeros(crate::core::tensors::StageShape::new(4, 8, 8), 1, &device)?;
    let first = cell.forward(&input, &zero)?;
    let second = cell.forward(&input, &first)?;
    let again = cell.forward(&input, &zero)?;

    let diff = (&second.cell - &first.cell)?.abs()?.sum_all()?.to_scalar::<f32>()?;
    assert!(diff > 0.0, "같은 입력이라도 이전 상태에 따라 결과가 달라짐");
    let same = (&again.hidden - &first.hidden)?.abs()?.sum_all()?.to_scalar::<f32>()?;
    assert_eq!(same, 0.0, "같은 (입력, 상태)는 같은 결과");
    Ok(())
}
