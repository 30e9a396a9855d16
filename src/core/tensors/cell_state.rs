//! 순환 셀 상태와 코드 레이아웃
//!
//! 상태는 불변 스냅샷으로 다뤄진다. 한 단계는 `(입력, 상태) -> (출력, 상태')`이며
//! 이전 상태를 변경하지 않고 새 상태를 돌려준다.

use crate::core::error::{CodecError, Result};
use candle_core::{DType, Device, Tensor};

/// 한 순환 단계의 상태 형태 (배치 차원 제외)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageShape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl StageShape {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self { channels, height, width }
    }

    pub fn with_batch(&self, batch: usize) -> [usize; 4] {
        [batch, self.channels, self.height, self.width]
    }
}

/// (hidden, cell) 쌍
#[derive(Debug, Clone)]
pub struct CellState {
    pub hidden: Tensor,
    pub cell: Tensor,
}

impl CellState {
    pub fn new(hidden: Tensor, cell: Tensor) -> Self {
        Self { hidden, cell }
    }

    pub fn zeros(shape: StageShape, batch: usize, device: &Device) -> Result<Self> {
        let dims = shape.with_batch(batch);
        let hidden = Tensor::zeros(&dims, DType::F32, device)?;
        let cell = Tensor::zeros(&dims, DType::F32, device)?;
        Ok(Self { hidden, cell })
    }
}

/// 단계별 셀 상태 묶음 (인코더 3단, 디코더 4단)
#[derive(Debug, Clone)]
pub struct RecurrentState {
    cells: Vec<CellState>,
}

impl RecurrentState {
    pub fn new(cells: Vec<CellState>) -> Self {
        Self { cells }
    }

    /// 모든 단계를 0으로 초기화
    pub fn zeros(shapes: &[StageShape], batch: usize, device: &Device) -> Result<Self> {
        let cells = shapes
            .iter()
            .map(|&shape| CellState::zeros(shape, batch, device))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn into_cells(self) -> Vec<CellState> {
        self.cells
    }

    /// 단계 수와 각 텐서 형태 검증
    pub fn check(&self, what: &str, shapes: &[StageShape], batch: usize) -> Result<()> {
        if self.cells.len() != shapes.len() {
            return Err(CodecError::shape(
                format!("{what} stage count"),
                &[shapes.len()],
                &[self.cells.len()],
            ));
        }
        for (i, (cell, shape)) in self.cells.iter().zip(shapes).enumerate() {
            let expected = shape.with_batch(batch);
            for (label, tensor) in [("hidden", &cell.hidden), ("cell", &cell.cell)] {
                if tensor.dims() != &expected[..] {
                    return Err(CodecError::shape(
                        format!("{what} stage {i} {label}"),
                        &expected,
                        tensor.dims(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// 병목 코드 한 개의 고정 레이아웃 (채널 × 높이 × 너비)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeLayout {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl CodeLayout {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self { channels, height, width }
    }

    pub fn elements(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// 코드 하나를 패킹했을 때의 바이트 수 (마지막 바이트 패딩 포함)
    pub fn packed_bytes(&self) -> usize {
        self.elements().div_ceil(8)
    }

    pub fn dims(&self, batch: usize) -> [usize; 4] {
        [batch, self.channels, self.height, self.width]
    }

    pub fn check(&self, code: &Tensor, batch: usize) -> Result<()> {
        let expected = self.dims(batch);
        if code.dims() != &expected[..] {
            return Err(CodecError::shape("bottleneck code", &expected, code.dims()));
        }
        Ok(())
    }
}
