//! # 지각 손실
//!
//! 사전학습된 분류 네트워크의 중간 특징을 비교하는 손실 항.
//! 학습되지 않으며 옵티마이저 파라미터 집합에서 제외된다.

pub mod vgg;


pub use vgg::{PerceptualLossNet, SELECTED_LAYERS};
