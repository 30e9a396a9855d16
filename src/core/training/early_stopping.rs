//! 인내 기반 조기 종료
//!
//! 최고 검증 손실과 그 시점의 스냅샷을 보관한다. 스냅샷은 깊은 복사 값이어야
//! 이후의 학습 갱신이 이미 보관된 최고 모델을 바꾸지 못한다.

use log::{info, warn};

/// 검증 한 번의 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 최고 손실 갱신, 인내 카운터 초기화
    Improved,
    /// 개선 없음, 남은 인내 횟수
    Stalled { remaining: usize },
    /// 인내 소진
    Stop,
}

#[derive(Debug)]
pub struct EarlyStopping<S> {
    patience: usize,
    remaining: usize,
    best_loss: f32,
    best: Option<S>,
    checks: usize,
}

impl<S> EarlyStopping<S> {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            remaining: patience,
            best_loss: f32::INFINITY,
            best: None,
            checks: 0,
        }
    }

    pub fn patience(&self) -> usize {
        self.patience
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn best_loss(&self) -> f32 {
        self.best_loss
    }

    pub fn best(&self) -> Option<&S> {
        self.best.as_ref()
    }

    pub fn into_best(self) -> Option<S> {
        self.best
    }

    pub fn checks(&self) -> usize {
        self.checks
    }

    /// 검증 손실을 기록한다. 개선된 경우에만 `snapshot`을 호출해 보관한다.
    pub fn observe<E>(
        &mut self,
        loss: f32,
        snapshot: impl FnOnce() -> Result<S, E>,
    ) -> Result<Verdict, E> {
        self.checks += 1;
        if loss < self.best_loss {
            self.best = Some(snapshot()?);
            self.best_loss = loss;
            self.remaining = self.patience;
            info!("검증 손실 개선: {:.6}", loss);
            return Ok(Verdict::Improved);
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            info!("인내 소진, 최고 검증 손실 {:.6}", self.best_loss);
            Ok(Verdict::Stop)
        } else {
            warn!(
                "검증 손실 {:.6} (최고 {:.6}), 남은 인내 {}",
                loss, self.best_loss, self.remaining
            );
            Ok(Verdict::Stalled {
                remaining: self.remaining,
            })
        }
    }
}
