//! 텐서 / 데이터 모델 모듈
//!
//! 순환 셀 상태, 병목 코드 레이아웃, 호스트 이미지 변환

pub mod cell_state;
pub mod image;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use cell_state::{CellState, CodeLayout, RecurrentState, StageShape};
pub use self::image::{image_to_tensor, mean_abs_error, resize, solid_image, tensor_to_image, RgbImage};
