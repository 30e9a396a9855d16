//! CLI용 코드 파일 포맷
//!
//! `b"RCC1"` | 예산 (u32 LE) | 페이로드 길이 (u32 LE) | 페이로드

use super::budget::BottleneckBudget;
use crate::core::error::{CodecError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

pub const CONTAINER_MAGIC: &[u8; 4] = b"RCC1";
const HEADER_LEN: usize = 12;

/// 패킹된 코드와 그 예산을 한 파일로 묶음
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeContainer {
    pub budget: BottleneckBudget,
    pub payload: Vec<u8>,
}

impl CodeContainer {
    pub fn new(budget: BottleneckBudget, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > budget.bytes() {
            return Err(CodecError::BudgetExceeded {
                budget: budget.bytes(),
                required: payload.len(),
            });
        }
        Ok(Self { budget, payload })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.extend_from_slice(CONTAINER_MAGIC);
        out.write_u32::<LittleEndian>(self.budget.bytes() as u32)?;
        out.write_u32::<LittleEndian>(self.payload.len() as u32)?;
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::MalformedContainer(format!(
                "header needs {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut cursor = Cursor::new(bytes);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if &magic != CONTAINER_MAGIC {
            return Err(CodecError::MalformedContainer(format!("bad magic {magic:?}")));
        }
        let budget = BottleneckBudget::try_from(cursor.read_u32::<LittleEndian>()? as usize)?;
        let len = cursor.read_u32::<LittleEndian>()? as usize;

        let payload = &bytes[HEADER_LEN..];
        if payload.len() != len {
            return Err(CodecError::MalformedContainer(format!(
                "payload length {} does not match header {len}",
                payload.len()
            )));
        }
        Self::new(budget, payload.to_vec())
    }
}
