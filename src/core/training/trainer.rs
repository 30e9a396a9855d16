//! 학습 루프
//!
//! 에포크 → 배치 → 반복 순으로 엄격히 순차 실행한다. 배치마다 잔차 코딩 루프를
//! 학습 모드로 한 번 돌리고, 결합 손실
//! `w * 지각 손실 + (1 - w) * 반복 평균 L1`로 세 구성요소를 함께 갱신한다.
//! 조기 종료는 검증 간격 경계에서만 일어난다.

use super::data::BatchSource;
use super::early_stopping::{EarlyStopping, Verdict};
use super::metrics::MetricsSink;
use super::schedule::LearningRateSchedule;
use crate::core::coding::{CodingRun, ResidualCoder};
use crate::core::config::TrainConfig;
use crate::core::error::{CodecError, Result};
use crate::core::model::{CheckpointStore, Mode, ModelSnapshot, NeuralModel};
use crate::core::perceptual::PerceptualLossNet;
use candle_core::Tensor;
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

/// 학습 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 인내 소진
    EarlyStopped,
    /// 설정된 에포크를 모두 수행
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    pub stop: StopReason,
    /// 검증을 하지 않았으면 `None`
    pub best_val_loss: Option<f32>,
    pub epochs_run: usize,
    /// 에포크별 평균 학습 손실 (중단된 에포크는 그 시점까지의 평균)
    pub epoch_losses: Vec<f32>,
}

pub struct Trainer<M: MetricsSink> {
    config: TrainConfig,
    model: NeuralModel,
    perceptual: Option<PerceptualLossNet>,
    optimizer: AdamW,
    schedule: LearningRateSchedule,
    store: CheckpointStore,
    sink: M,
}

impl<M: MetricsSink> Trainer<M> {
    /// 구성과 모델로 학습기 생성. 구성은 이후 변경되지 않는다.
    pub fn new(
        config: TrainConfig,
        model: NeuralModel,
        perceptual: Option<PerceptualLossNet>,
        sink: M,
    ) -> Result<Self> {
        config.validate()?;
        if model.config != config.model {
            return Err(CodecError::InvalidConfig(format!(
                "model `{}` does not match training config `{}`",
                model.config.name, config.model.name
            )));
        }
        if config.percep_weight > 0.0 && perceptual.is_none() {
            return Err(CodecError::MissingPerceptualNet);
        }

        // 지각 손실 네트워크 파라미터는 포함하지 않는다
        let params = ParamsAdamW {
            lr: config.learning_rate,
            weight_decay: 0.0,
            ..Default::default()
        };
        let optimizer = AdamW::new(model.params.trainable_vars(), params)?;
        let schedule =
            LearningRateSchedule::multi_step(config.lr_milestones.clone(), config.lr_gamma);
        let store = CheckpointStore::new(&config.save_dir, &config.model.name);

        Ok(Self {
            config,
            model,
            perceptual,
            optimizer,
            schedule,
            store,
            sink,
        })
    }

    /// 구성의 장치에 새 모델을 만들어 학습기 생성
    pub fn from_config(
        config: TrainConfig,
        perceptual: Option<PerceptualLossNet>,
        sink: M,
    ) -> Result<Self> {
        let device = config.device.to_device()?;
        let model = NeuralModel::new(config.model.clone(), &device)?;
        Self::new(config, model, perceptual, sink)
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn model(&self) -> &NeuralModel {
        &self.model
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn sink(&self) -> &M {
        &self.sink
    }

    pub fn into_model(self) -> NeuralModel {
        self.model
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    /// 배치 하나에 대한 순전파 + 역전파 + 갱신. 결합 손실 값과 루프 결과를 반환.
    pub fn train_step(
        &mut self,
        batch: &Tensor,
        epoch: usize,
        batch_idx: usize,
    ) -> Result<(f32, CodingRun)> {
        let coder = ResidualCoder::new(
            &self.model.encoder,
            &self.model.binarizer,
            &self.model.decoder,
            self.model.config.reconstruction,
        );
        let run = coder.run(batch, self.config.iterations, Mode::Train)?;
        let l1 = run.mean_loss()?;

        let weight = self.config.percep_weight as f64;
        let loss = match &self.perceptual {
            Some(net) if weight > 0.0 => {
                let percep = net.loss(batch, &run.reconstruction)?;
                (percep.affine(weight, 0.0)? + l1.affine(1.0 - weight, 0.0)?)?
            }
            _ => l1,
        };

        let value = loss.to_scalar::<f32>()?;
        if !value.is_finite() {
            return Err(CodecError::NonFiniteLoss {
                epoch,
                batch: batch_idx,
            });
        }
        self.optimizer.backward_step(&loss)?;
        debug!("에포크 {} 배치 {}: 손실 {:.6}", epoch, batch_idx, value);
        Ok((value, run))
    }

    /// 독립 검증 패스: 배치마다 새 0 상태, 추론 모드, 설정된 반복 횟수.
    /// 최종 재구성과 입력 사이 L1의 배치 평균을 반환.
    pub fn validate(&self, source: &mut dyn BatchSource, val_round: usize) -> Result<f32> {
        let coder = ResidualCoder::new(
            &self.model.encoder,
            &self.model.binarizer,
            &self.model.decoder,
            self.model.config.reconstruction,
        );
        let batches = source.epoch_batches(val_round)?;
        if batches.is_empty() {
            return Err(CodecError::InvalidConfig("validation set is empty".to_string()));
        }

        let mut total = 0f32;
        for batch in &batches {
            let run = coder.run(batch, self.config.iterations, Mode::Eval)?;
            let l1 = (&run.reconstruction - batch)?.abs()?.mean_all()?;
            total += l1.to_scalar::<f32>()?;
        }
        Ok(total / batches.len() as f32)
    }

    fn progress_bar(&self, epoch: usize, len: usize) -> Result<ProgressBar> {
        if !self.config.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} {msg}")
                .map_err(|e| CodecError::InvalidConfig(e.to_string()))?
                .progress_chars("#>-"),
        );
        bar.set_message(format!("에포크 {}", epoch));
        Ok(bar)
    }

    fn persist(&self, snapshot: &ModelSnapshot) -> Result<()> {
        self.store.save(snapshot)
    }

    /// 전체 학습
    ///
    /// 검증이 켜져 있으면 `val_interval` 배치마다 검증하고, 개선 시 세 파라미터
    /// 집합을 깊은 복사해 저장한다. 인내가 소진되면 최고 스냅샷을 다시 저장하고
    /// 살아 있는 모델도 그 값으로 되돌린 뒤 종료한다.
    /// 검증이 꺼져 있으면 마지막 파라미터를 저장한다.
    pub fn train(
        &mut self,
        train: &mut dyn BatchSource,
        mut val: Option<&mut dyn BatchSource>,
    ) -> Result<TrainOutcome> {
        if self.config.validate && val.is_none() {
            return Err(CodecError::InvalidConfig(
                "validation is enabled but no validation set was supplied".to_string(),
            ));
        }
        let num_batches = train.num_batches();
        if num_batches == 0 {
            return Err(CodecError::InvalidConfig("training set is empty".to_string()));
        }

        let log_interval =
            ((num_batches as f64 * self.config.log_interval_fraction) as usize).max(1);
        let val_interval = self.config.val_interval.unwrap_or(num_batches);
        let mut stopper: EarlyStopping<ModelSnapshot> = EarlyStopping::new(self.config.patience);
        let mut epoch_losses = Vec::with_capacity(self.config.epochs);
        let mut step = 0usize;
        let mut val_round = 0usize;

        info!(
            "학습 시작: {} 에포크, 에포크당 {} 배치, 반복 {}회",
            self.config.epochs, num_batches, self.config.iterations
        );

        for epoch in 0..self.config.epochs {
            let lr = self.schedule.learning_rate(self.config.learning_rate, epoch);
            self.optimizer.set_learning_rate(lr);
            self.sink.add_scalar("lr", lr, epoch)?;

            let batches = train.epoch_batches(epoch)?;
            let bar = self.progress_bar(epoch, batches.len())?;
            let mut loss_sum = 0f32;
            let mut seen = 0usize;

            for (batch_idx, batch) in batches.iter().enumerate() {
                let (loss, run) = self.train_step(batch, epoch, batch_idx)?;
                loss_sum += loss;
                seen += 1;

                if batch_idx % log_interval == 0 {
                    self.sink.add_scalar("loss", loss as f64, step)?;
                    self.sink.add_image("input_img", batch, step)?;
                    self.sink.add_image("recon_img", &run.reconstruction, step)?;
                }
                step += 1;
                bar.inc(1);
                bar.set_message(format!("에포크 {} 손실 {:.4}", epoch, loss));

                let Some(source) = val.as_deref_mut() else {
                    continue;
                };
                if !self.config.validate || (batch_idx + 1) % val_interval != 0 {
                    continue;
                }

                let val_loss = self.validate(source, val_round)?;
                self.sink.add_scalar("val_loss", val_loss as f64, val_round)?;
                val_round += 1;

                let verdict = stopper.observe(val_loss, || self.model.snapshot())?;
                match verdict {
                    Verdict::Improved => {
                        if let Some(best) = stopper.best() {
                            self.persist(best)?;
                        }
                    }
                    Verdict::Stalled { .. } => {}
                    Verdict::Stop => {
                        bar.finish_and_clear();
                        epoch_losses.push(loss_sum / seen as f32);
                        if let Some(best) = stopper.best() {
                            self.persist(best)?;
                            self.model.params.restore(best)?;
                        }
                        self.sink.flush()?;
                        info!("조기 종료: 에포크 {} 배치 {}", epoch, batch_idx);
                        return Ok(TrainOutcome {
                            stop: StopReason::EarlyStopped,
                            best_val_loss: Some(stopper.best_loss()),
                            epochs_run: epoch + 1,
                            epoch_losses,
                        });
                    }
                }
            }

            bar.finish_and_clear();
            let mean = loss_sum / seen.max(1) as f32;
            epoch_losses.push(mean);
            self.sink.flush()?;
            info!("에포크 {} 완료: 평균 손실 {:.6}, 학습률 {:.2e}", epoch, mean, lr);
        }

        let best_val_loss = if stopper.checks() > 0 {
            Some(stopper.best_loss())
        } else {
            self.persist(&self.model.snapshot()?)?;
            None
        };
        info!("학습 완료: {} 에포크", self.config.epochs);

        Ok(TrainOutcome {
            stop: StopReason::Completed,
            best_val_loss,
            epochs_run: self.config.epochs,
            epoch_losses,
        })
    }
}
