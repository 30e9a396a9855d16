//! 체크포인트 저장소
//!
//! `{dir}/{model}_{encoder|binarizer|decoder}.safetensors` 세 파일을
//! 모델 이름 기준으로 독립적으로 저장/로드한다.

use super::params::{Component, ModelParams, ModelSnapshot, ParameterSet};
use crate::core::error::Result;
use candle_core::Device;
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
    model_name: String,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>, model_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            model_name: model_name.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn path(&self, component: Component) -> PathBuf {
        self.dir
            .join(format!("{}_{}.safetensors", self.model_name, component.as_str()))
    }

    /// 세 파일이 모두 있는지
    pub fn exists(&self) -> bool {
        Component::ALL.iter().all(|&c| self.path(c).is_file())
    }

    pub fn save(&self, snapshot: &ModelSnapshot) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        for component in Component::ALL {
            let path = self.path(component);
            snapshot.get(component).save(&path)?;
        }
        info!("체크포인트 저장: {} ({})", self.model_name, self.dir.display());
        Ok(())
    }

    /// 한 구성요소만 로드
    pub fn load_component(&self, set: &ParameterSet, device: &Device) -> Result<()> {
        let path = self.path(set.component());
        set.load_file(&path, device)?;
        info!("{} 파라미터 로드: {}", set.component(), path.display());
        Ok(())
    }

    pub fn load_into(&self, params: &ModelParams, device: &Device) -> Result<()> {
        for component in Component::ALL {
            self.load_component(params.get(component), device)?;
        }
        Ok(())
    }
}
