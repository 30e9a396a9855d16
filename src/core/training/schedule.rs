//! 학습률 스케줄링

use serde::{Deserialize, Serialize};

/// 에포크 단위 학습률 스케줄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LearningRateSchedule {
    /// 고정 학습률
    Constant,
    /// 마일스톤 에포크마다 `gamma`배 감소
    MultiStep { milestones: Vec<usize>, gamma: f64 },
}

impl Default for LearningRateSchedule {
    fn default() -> Self {
        LearningRateSchedule::MultiStep {
            milestones: vec![3, 10, 20, 50, 100],
            gamma: 0.5,
        }
    }
}

impl LearningRateSchedule {
    pub fn multi_step(milestones: Vec<usize>, gamma: f64) -> Self {
        LearningRateSchedule::MultiStep { milestones, gamma }
    }

    /// 0부터 센 에포크 `epoch`의 학습률: `base * gamma^(지난 마일스톤 수)`
    pub fn learning_rate(&self, base: f64, epoch: usize) -> f64 {
        match self {
            LearningRateSchedule::Constant => base,
            LearningRateSchedule::MultiStep { milestones, gamma } => {
                let passed = milestones.iter().filter(|&&m| m <= epoch).count();
                base * gamma.powi(passed as i32)
            }
        }
    }
}
