use crate::core::config::ModelConfig;
use crate::core::error::CodecError;
use crate::core::packing::BottleneckBudget;
use crate::core::tensors::CodeLayout;

#[test]
fn 예산별_반복횟수_테스트() {
    let table: Vec<(usize, usize)> = BottleneckBudget::ALL
        .iter()
        .map(|b| (b.bytes(), b.iterations()))
        .collect();
    assert_eq!(table, vec![(4096, 1), (16384, 4), (65536, 16)]);
}

#[test]
fn 지원하지_않는_예산_거부_테스트() {
    for bytes in [0usize, 1000, 4095, 8192, 65537] {
        let err = BottleneckBudget::try_from(bytes).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedBudget(b) if b == bytes));
    }
    assert_eq!(BottleneckBudget::try_from(16384).ok(), Some(BottleneckBudget::Bytes16384));
}

#[test]
fn 배포_구성_예산_법칙_테스트() {
    let layout = ModelConfig::default().code_layout();
    for budget in BottleneckBudget::ALL {
        let required = budget.check_layout(&layout).unwrap_or(usize::MAX);
        assert_eq!(required, budget.iterations() * 4000);
        assert!(required <= budget.bytes(), "{budget}: {required}");
    }
}

#[test]
fn 예산_초과_레이아웃_거부_테스트() {
    // 129 × 16 × 16 / 8 = 4128 > 4096
    let layout = CodeLayout::new(129, 16, 16);
    let err = BottleneckBudget::Bytes4096.check_layout(&layout).unwrap_err();
    assert!(matches!(
        err,
        CodecError::BudgetExceeded { budget: 4096, required: 4128 }
    ));
    assert_eq!(BottleneckBudget::Bytes4096.to_string(), "4096 bytes");
}
