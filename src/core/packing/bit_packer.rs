//! {-1, +1} 코드 ↔ 바이트 비트 패킹
//!
//! 원소 하나당 1비트(+1→1, -1→0), 채널·높이·너비 순으로 평탄화하여 MSB부터 채운다.
//! 코드마다 마지막 바이트는 0 비트로 패딩되고, 반복 순서대로 이어 붙인다.
//! 따라서 길이는 항상 `코드 수 × ceil(원소 수 / 8)`이다.

use crate::core::error::{CodecError, Result};
use crate::core::tensors::CodeLayout;
use candle_core::{DType, Device, Tensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPacker {
    elements_per_code: usize,
}

impl BitPacker {
    pub fn new(elements_per_code: usize) -> Self {
        Self { elements_per_code }
    }

    pub fn from_layout(layout: &CodeLayout) -> Self {
        Self::new(layout.elements())
    }

    pub fn elements_per_code(&self) -> usize {
        self.elements_per_code
    }

    pub fn bytes_per_code(&self) -> usize {
        self.elements_per_code.div_ceil(8)
    }

    /// 코드 묶음을 바이트로 패킹
    pub fn pack(&self, codes: &[Vec<f32>]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(codes.len() * self.bytes_per_code());
        for code in codes {
            self.pack_one(code, &mut out)?;
        }
        Ok(out)
    }

    fn pack_one(&self, code: &[f32], out: &mut Vec<u8>) -> Result<()> {
        if code.len() != self.elements_per_code {
            return Err(CodecError::shape("packed code", &[self.elements_per_code], &[code.len()]));
        }
        for chunk in code.chunks(8) {
            let mut byte = 0u8;
            for (i, &value) in chunk.iter().enumerate() {
                let bit = match value {
                    v if v == 1.0 => 1u8,
                    v if v == -1.0 => 0u8,
                    v => return Err(CodecError::NonBinaryCode(v)),
                };
                byte |= bit << (7 - i);
            }
            out.push(byte);
        }
        Ok(())
    }

    /// 바이트를 코드 묶음으로 복원 (패딩 비트는 버림)
    pub fn unpack(&self, bytes: &[u8]) -> Result<Vec<Vec<f32>>> {
        let per_code = self.bytes_per_code();
        if per_code == 0 || bytes.len() % per_code != 0 {
            return Err(CodecError::PackedLength {
                expected_multiple: per_code,
                actual: bytes.len(),
            });
        }

        let codes: Vec<Vec<f32>> = bytes
            .chunks(per_code)
            .map(|chunk| {
                (0..self.elements_per_code)
                    .map(|i| {
                        let bit = (chunk[i / 8] >> (7 - i % 8)) & 1;
                        2.0 * bit as f32 - 1.0
                    })
                    .collect()
            })
            .collect();
        Ok(codes)
    }

    /// `[1, C, H, W]` 코드 텐서들을 패킹
    pub fn pack_tensors(&self, codes: &[Tensor]) -> Result<Vec<u8>> {
        let flat = codes
            .iter()
            .map(|code| -> Result<Vec<f32>> {
                Ok(code.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?)
            })
            .collect::<Result<Vec<_>>>()?;
        self.pack(&flat)
    }

    /// 바이트를 `[1, C, H, W]` 코드 텐서들로 복원
    pub fn unpack_tensors(
        &self,
        bytes: &[u8],
        layout: &CodeLayout,
        device: &Device,
    ) -> Result<Vec<Tensor>> {
        if layout.elements() != self.elements_per_code {
            return Err(CodecError::shape(
                "code layout",
                &[self.elements_per_code],
                &[layout.elements()],
            ));
        }
        self.unpack(bytes)?
            .into_iter()
            .map(|code| -> Result<Tensor> { Ok(Tensor::from_vec(code, &layout.dims(1), device)?) })
            .collect()
    }
}
