//! 쓰기 전용 관측 싱크
//!
//! 학습 루프는 스칼라와 이미지를 기록만 하고 결과를 읽지 않는다.

use crate::core::error::Result;
use candle_core::{DType, Tensor};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub trait MetricsSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()>;

    /// 이미지 배치 기록 (`[B, 3, H, W]`, [0,1])
    fn add_image(&mut self, tag: &str, image: &Tensor, step: usize) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

impl<T: MetricsSink + ?Sized> MetricsSink for &mut T {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        (**self).add_scalar(tag, value, step)
    }

    fn add_image(&mut self, tag: &str, image: &Tensor, step: usize) -> Result<()> {
        (**self).add_image(tag, image, step)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// 모든 기록을 버림
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn add_scalar(&mut self, _tag: &str, _value: f64, _step: usize) -> Result<()> {
        Ok(())
    }

    fn add_image(&mut self, _tag: &str, _image: &Tensor, _step: usize) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// JSONL 한 줄
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricEvent<'a> {
    Scalar {
        timestamp: String,
        tag: &'a str,
        step: usize,
        value: f64,
    },
    /// 이미지는 크기와 요약 통계만 남긴다
    Image {
        timestamp: String,
        tag: &'a str,
        step: usize,
        shape: Vec<usize>,
        min: f32,
        mean: f32,
        max: f32,
    },
}

/// `{log_dir}/{run_name}.jsonl`에 이벤트를 한 줄씩 기록
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlSink {
    pub fn create(log_dir: impl AsRef<Path>, run_name: &str) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("{run_name}.jsonl"));
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_event(&mut self, event: &MetricEvent<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl MetricsSink for JsonlSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        self.write_event(&MetricEvent::Scalar {
            timestamp: timestamp(),
            tag,
            step,
            value,
        })
    }

    fn add_image(&mut self, tag: &str, image: &Tensor, step: usize) -> Result<()> {
        let flat = image.detach().to_dtype(DType::F32)?.flatten_all()?;
        let min = flat.min(0)?.to_scalar::<f32>()?;
        let max = flat.max(0)?.to_scalar::<f32>()?;
        let mean = flat.mean_all()?.to_scalar::<f32>()?;
        self.write_event(&MetricEvent::Image {
            timestamp: timestamp(),
            tag,
            step,
            shape: image.dims().to_vec(),
            min,
            mean,
            max,
        })
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
