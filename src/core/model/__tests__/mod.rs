pub mod binarizer_test;
pub mod conv_lstm_test;

use crate::core::config::ModelConfig;

/// 입력 256×256, 코드 125×16×16은 그대로 두고 채널만 줄인 구성
pub(crate) fn small_config(name: &str) -> ModelConfig {
    ModelConfig::new(name)
        .with_stem_channels(4)
        .with_encoder_channels([8, 8, 8])
        .with_decoder_channels([16, 16, 8, 8])
}
