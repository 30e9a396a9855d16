use crate::core::error::{CodecError, Result};
use crate::core::packing::BitPacker;
use crate::core::tensors::CodeLayout;
use candle_core::{DType, Device, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_code(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| if rng.gen_bool(0.5) { 1.0 } else { -1.0 }).collect()
}

#[test]
fn 최상위비트_우선_패킹_테스트() -> Result<()> {
    let packer = BitPacker::new(8);
    let code = vec![1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 1.0];
    assert_eq!(packer.pack(&[code])?, vec![0b1000_0001]);
    Ok(())
}

#[test]
fn 마지막_바이트_패딩_테스트() -> Result<()> {
    let packer = BitPacker::new(9);
    assert_eq!(packer.bytes_per_code(), 2);

    let code = vec![-1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 1.0];
    let packed = packer.pack(&[code.clone(), code.clone()])?;
    assert_eq!(packed, vec![0x00, 0x80, 0x00, 0x80], "코드마다 0 비트로 패딩");

    let unpacked = packer.unpack(&packed)?;
    assert_eq!(unpacked, vec![code.clone(), code], "패딩 비트는 버림");
    Ok(())
}

#[test]
fn 배포_레이아웃_왕복_테스트() -> Result<()> {
    let layout = CodeLayout::new(125, 16, 16);
    let packer = BitPacker::from_layout(&layout);
    let mut rng = StdRng::seed_from_u64(7);

    for iterations in [1usize, 4, 16] {
        let codes: Vec<Vec<f32>> = (0..iterations)
            .map(|_| random_code(&mut rng, layout.elements()))
            .collect();
        let packed = packer.pack(&codes)?;
        assert_eq!(packed.len(), iterations * 4000);
        assert_eq!(packer.unpack(&packed)?, codes, "{iterations}회 코드 왕복");
    }
    Ok(())
}

#[test]
fn 비이진_원소_거부_테스트() {
    let packer = BitPacker::new(3);
    let err = packer.pack(&[vec![1.0, 0.0, -1.0]]).unwrap_err();
    assert!(matches!(err, CodecError::NonBinaryCode(v) if v == 0.0));

    let err = packer.pack(&[vec![1.0, -1.0]]).unwrap_err();
    assert!(matches!(err, CodecError::ShapeMismatch { .. }), "원소 수 불일치");
}

#[test]
fn 패킹_길이_검증_테스트() {
    let packer = BitPacker::new(32_000);
    let err = packer.unpack(&[0u8; 3999]).unwrap_err();
    assert!(matches!(
        err,
        CodecError::PackedLength { expected_multiple: 4000, actual: 3999 }
    ));
    assert!(packer.unpack(&[]).map(|codes| codes.is_empty()).unwrap_or(false));
}

#[test]
fn 텐서_패킹_왕복_테스트() -> Result<()> {
    let device = Device::Cpu;
    let layout = CodeLayout::new(5, 4, 4);
    let packer = BitPacker::from_layout(&layout);

    let codes: Vec<Tensor> = (0..3)
        .map(|_| -> Result<Tensor> {
            let noise = Tensor::randn(0f32, 1.0, &layout.dims(1), &device)?;
            let sign = noise.ge(&noise.zeros_like()?)?.to_dtype(DType::F32)?.affine(2.0, -1.0)?;
            Ok(sign)
        })
        .collect::<Result<_>>()?;
    let packed = packer.pack_tensors(&codes)?;
    assert_eq!(packed.len(), 3 * 10);

    let restored = packer.unpack_tensors(&packed, &layout, &device)?;
    assert_eq!(restored.len(), 3);
    for (a, b) in codes.iter().zip(&restored) {
        assert_eq!(b.dims(), &[1, 5, 4, 4]);
        let diff = (a - b)?.abs()?.sum_all()?.to_scalar::<f32>()?;
        assert_eq!(diff, 0.0);
    }

    let wrong = CodeLayout::new(4, 4, 4);
    assert!(packer.unpack_tensors(&packed, &wrong, &device).is_err());
    Ok(())
}
