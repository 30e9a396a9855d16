//! 코덱 전역 오류 타입
//!
//! 설정 오류, 수치 발산, I/O 실패를 하나의 열거형으로 모은다.
//! 검증 손실이 개선되지 않는 경우는 오류가 아니라 조기 종료 상태 머신이 처리한다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    /// 지원하지 않는 병목 바이트 예산
    #[error("unsupported bottleneck budget {0} (expected one of 4096, 16384, 65536)")]
    UnsupportedBudget(usize),

    /// 코드 레이아웃이 예산에 들어가지 않음
    #[error("code layout needs {required} bytes but budget is {budget}")]
    BudgetExceeded { budget: usize, required: usize },

    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// 체크포인트와 구성요소 구조가 다름
    #[error("architecture mismatch in {component}: {detail}")]
    ArchitectureMismatch { component: String, detail: String },

    #[error("code element {0} is not -1 or +1")]
    NonBinaryCode(f32),

    #[error("packed length {actual} is not a valid multiple of {expected_multiple} bytes")]
    PackedLength {
        expected_multiple: usize,
        actual: usize,
    },

    #[error("malformed code container: {0}")]
    MalformedContainer(String),

    #[error("non-finite loss at epoch {epoch}, batch {batch}")]
    NonFiniteLoss { epoch: usize, batch: usize },

    #[error("perceptual weight is non-zero but no perceptual loss net was supplied")]
    MissingPerceptualNet,

    /// 파라미터 맵을 잡고 있던 스레드가 패닉함
    #[error("parameter map lock poisoned for {0}")]
    LockPoisoned(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tensor(#[from] candle_core::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    pub fn shape(what: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        CodecError::ShapeMismatch {
            what: what.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}
