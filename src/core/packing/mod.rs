//! # 병목 패킹
//!
//! 바이트 예산 클래스, 비트 패커, CLI 코드 파일 포맷

pub mod bit_packer;
pub mod budget;
pub mod container;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use bit_packer::BitPacker;
pub use budget::BottleneckBudget;
pub use container::{CodeContainer, CONTAINER_MAGIC};
