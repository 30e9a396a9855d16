//! # 잔차 코딩
//!
//! 점진적 재구성 루프와 그 위의 인코드/디코드 컨텍스트

pub mod codec;
pub mod residual_loop;


pub use codec::{Codec, NeuralCodec};
pub use residual_loop::{accumulate, CodingRun, LoopPhase, ResidualCoder, ResidualLoop};
