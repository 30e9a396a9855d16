//! 병목 크기 클래스
//!
//! 세 가지 바이트 예산과 각각의 잔차 코딩 반복 횟수 대응 (4096→1, 16384→4, 65536→16)

use crate::core::error::{CodecError, Result};
use crate::core::tensors::CodeLayout;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BottleneckBudget {
    Bytes4096,
    Bytes16384,
    Bytes65536,
}

impl BottleneckBudget {
    pub const ALL: [BottleneckBudget; 3] = [
        BottleneckBudget::Bytes4096,
        BottleneckBudget::Bytes16384,
        BottleneckBudget::Bytes65536,
    ];

    pub fn bytes(self) -> usize {
        match self {
            BottleneckBudget::Bytes4096 => 4096,
            BottleneckBudget::Bytes16384 => 16384,
            BottleneckBudget::Bytes65536 => 65536,
        }
    }

    /// 잔차 코딩 반복 횟수
    pub fn iterations(self) -> usize {
        match self {
            BottleneckBudget::Bytes4096 => 1,
            BottleneckBudget::Bytes16384 => 4,
            BottleneckBudget::Bytes65536 => 16,
        }
    }

    /// `N * ceil(elements / 8)`
    pub fn required_bytes(self, layout: &CodeLayout) -> usize {
        self.iterations() * layout.packed_bytes()
    }

    /// 레이아웃이 예산 안에 들어가는지 검증하고 필요한 바이트 수를 반환
    pub fn check_layout(self, layout: &CodeLayout) -> Result<usize> {
        let required = self.required_bytes(layout);
        if required > self.bytes() {
            return Err(CodecError::BudgetExceeded {
                budget: self.bytes(),
                required,
            });
        }
        Ok(required)
    }
}

impl TryFrom<usize> for BottleneckBudget {
    type Error = CodecError;

    fn try_from(bytes: usize) -> Result<Self> {
        match bytes {
            4096 => Ok(BottleneckBudget::Bytes4096),
            16384 => Ok(BottleneckBudget::Bytes16384),
            65536 => Ok(BottleneckBudget::Bytes65536),
            other => Err(CodecError::UnsupportedBudget(other)),
        }
    }
}

impl fmt::Display for BottleneckBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.bytes())
    }
}
