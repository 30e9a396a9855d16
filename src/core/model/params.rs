//! 구성요소별 파라미터 집합과 스냅샷
//!
//! 인코더 / 이진화기 / 디코더는 각자 독립된 `VarMap`을 소유한다.
//! 스냅샷은 `Tensor::copy`로 저장소까지 복제한 값이므로, 옵티마이저가 이후 변수를
//! 제자리에서 갱신해도 이미 찍어 둔 최고 모델은 바뀌지 않는다.

use crate::core::error::{CodecError, Result};
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// 파라미터 소유 구성요소
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Encoder,
    Binarizer,
    Decoder,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Encoder, Component::Binarizer, Component::Decoder];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Encoder => "encoder",
            Component::Binarizer => "binarizer",
            Component::Decoder => "decoder",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 이름 → 텐서 매핑의 깊은 복사본
#[derive(Debug, Clone)]
pub struct ParameterSnapshot {
    pub component: Component,
    pub tensors: HashMap<String, Tensor>,
}

impl ParameterSnapshot {
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    /// safetensors 파일로 저장
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        candle_core::safetensors::save(&self.tensors, path.as_ref())?;
        Ok(())
    }
}

/// 한 구성요소의 학습 가능한 파라미터
#[derive(Clone)]
pub struct ParameterSet {
    component: Component,
    varmap: VarMap,
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSet")
            .field("component", &self.component)
            .field("vars", &self.varmap.all_vars().len())
            .finish()
    }
}

impl ParameterSet {
    pub fn new(component: Component) -> Self {
        Self {
            component,
            varmap: VarMap::new(),
        }
    }

    pub fn component(&self) -> Component {
        self.component
    }

    pub fn var_builder(&self, device: &Device) -> VarBuilder<'static> {
        VarBuilder::from_varmap(&self.varmap, DType::F32, device)
    }

    /// 변수 저장소 (복제본은 같은 변수를 공유한다)
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn all_vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    pub fn num_parameters(&self) -> usize {
        self.all_vars().iter().map(|v| v.elem_count()).sum()
    }

    fn with_vars<T>(&self, f: impl FnOnce(&HashMap<String, Var>) -> Result<T>) -> Result<T> {
        let guard = self
            .varmap
            .data()
            .lock()
            .map_err(|_| CodecError::LockPoisoned(self.component.to_string()))?;
        f(&guard)
    }

    /// 깊은 복사 스냅샷
    pub fn snapshot(&self) -> Result<ParameterSnapshot> {
        let tensors = self.with_vars(|vars| {
            vars.iter()
                .map(|(name, var)| -> Result<(String, Tensor)> {
                    Ok((name.clone(), var.as_tensor().copy()?))
                })
                .collect::<Result<HashMap<_, _>>>()
        })?;
        Ok(ParameterSnapshot {
            component: self.component,
            tensors,
        })
    }

    /// 스냅샷 값을 현재 변수에 기록
    pub fn restore(&self, snapshot: &ParameterSnapshot) -> Result<()> {
        if snapshot.component != self.component {
            return Err(CodecError::ArchitectureMismatch {
                component: self.component.to_string(),
                detail: format!("snapshot belongs to {}", snapshot.component),
            });
        }
        self.assign(&snapshot.tensors)
    }

    /// safetensors 파일에서 파라미터 로드 (키 집합과 형태가 정확히 일치해야 함)
    pub fn load_file(&self, path: impl AsRef<Path>, device: &Device) -> Result<()> {
        let bytes = std::fs::read(path.as_ref())?;
        let tensors = candle_core::safetensors::load_buffer(&bytes, device)?;
        self.assign(&tensors)
    }

    fn assign(&self, tensors: &HashMap<String, Tensor>) -> Result<()> {
        let component = self.component.to_string();
        self.with_vars(|vars| {
            let mut missing: Vec<&str> = vars
                .keys()
                .filter(|name| !tensors.contains_key(*name))
                .map(String::as_str)
                .collect();
            let mut unexpected: Vec<&str> = tensors
                .keys()
                .filter(|name| !vars.contains_key(*name))
                .map(String::as_str)
                .collect();
            if !missing.is_empty() || !unexpected.is_empty() {
                missing.sort_unstable();
                unexpected.sort_unstable();
                return Err(CodecError::ArchitectureMismatch {
                    component: component.clone(),
                    detail: format!("missing {missing:?}, unexpected {unexpected:?}"),
                });
            }

            for (name, var) in vars {
                let source = &tensors[name];
                if source.dims() != var.dims() {
                    return Err(CodecError::ArchitectureMismatch {
                        component: component.clone(),
                        detail: format!(
                            "{name}: expected {:?}, got {:?}",
                            var.dims(),
                            source.dims()
                        ),
                    });
                }
            }
            for (name, var) in vars {
                let source = tensors[name].to_dtype(var.dtype())?.to_device(var.device())?;
                var.set(&source)?;
            }
            Ok(())
        })
    }
}

/// 세 구성요소의 파라미터 전체
#[derive(Debug, Clone)]
pub struct ModelParams {
    pub encoder: ParameterSet,
    pub binarizer: ParameterSet,
    pub decoder: ParameterSet,
}

impl ModelParams {
    pub fn new() -> Self {
        Self {
            encoder: ParameterSet::new(Component::Encoder),
            binarizer: ParameterSet::new(Component::Binarizer),
            decoder: ParameterSet::new(Component::Decoder),
        }
    }

    pub fn get(&self, component: Component) -> &ParameterSet {
        match component {
            Component::Encoder => &self.encoder,
            Component::Binarizer => &self.binarizer,
            Component::Decoder => &self.decoder,
        }
    }

    /// 옵티마이저에 넘길 변수 (세 구성요소 합집합)
    pub fn trainable_vars(&self) -> Vec<Var> {
        Component::ALL
            .iter()
            .flat_map(|&c| self.get(c).all_vars())
            .collect()
    }

    pub fn snapshot(&self) -> Result<ModelSnapshot> {
        Ok(ModelSnapshot {
            encoder: self.encoder.snapshot()?,
            binarizer: self.binarizer.snapshot()?,
            decoder: self.decoder.snapshot()?,
        })
    }

    pub fn restore(&self, snapshot: &ModelSnapshot) -> Result<()> {
        for component in Component::ALL {
            self.get(component).restore(snapshot.get(component))?;
        }
        Ok(())
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        Self::new()
    }
}

/// 세 구성요소 스냅샷 묶음
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub encoder: ParameterSnapshot,
    pub binarizer: ParameterSnapshot,
    pub decoder: ParameterSnapshot,
}

impl ModelSnapshot {
    pub fn get(&self, component: Component) -> &ParameterSnapshot {
        match component {
            Component::Encoder => &self.encoder,
            Component::Binarizer => &self.binarizer,
            Component::Decoder => &self.decoder,
        }
    }
}
