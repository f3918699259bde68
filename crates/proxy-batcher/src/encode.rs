//! Packed encoding for the multi-send helper.
//!
//! Each operation becomes one fixed-layout record:
//!
//! `kind (1) || target (20) || value (32, big-endian) || payload length (32, big-endian) || payload`
//!
//! Records are concatenated with no padding or delimiters. The layout must
//! match what the on-chain multi-send helper unpacks; any padding or
//! reordering breaks execution inside the proxy account.

use alloy_primitives::{Address, Bytes, U256};

use crate::error::BatchError;
use crate::types::{Operation, OperationKind};

/// Fixed-width prefix of one packed record.
const RECORD_HEADER_SIZE: usize = 1 + 20 + 32 + 32;

/// Packs `operations`, in order, into the multi-send payload.
///
/// Pure; the only failure is an empty input.
pub fn encode_multi_send(operations: &[Operation]) -> Result<Bytes, BatchError> {
    if operations.is_empty() {
        return Err(BatchError::InvalidBatch("empty operation list"));
    }
    let size = operations.iter().map(|op| RECORD_HEADER_SIZE + op.payload.len()).sum();
    let mut packed = Vec::with_capacity(size);
    for op in operations {
        packed.push(op.kind as u8);
        packed.extend_from_slice(op.target.as_slice());
        packed.extend_from_slice(&op.value.to_be_bytes::<32>());
        packed.extend_from_slice(&U256::from(op.payload.len()).to_be_bytes::<32>());
        packed.extend_from_slice(&op.payload);
    }
    Ok(packed.into())
}

/// Exact inverse of [`encode_multi_send`].
///
/// Used by tests and for inspecting payloads handed to a relay. Truncated
/// records or an unknown operation kind fail with
/// [`BatchError::InvalidBatch`].
pub fn decode_multi_send(packed: &[u8]) -> Result<Vec<Operation>, BatchError> {
    if packed.is_empty() {
        return Err(BatchError::InvalidBatch("empty packed payload"));
    }
    let mut operations = Vec::new();
    let mut data = packed;
    while !data.is_empty() {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(BatchError::InvalidBatch("truncated record header"));
        }
        let kind = match data[0] {
            0 => OperationKind::Call,
            1 => OperationKind::DelegateCall,
            _ => return Err(BatchError::InvalidBatch("unknown operation kind")),
        };
        let target = Address::from_slice(&data[1..21]);
        let value = U256::from_be_slice(&data[21..53]);
        let payload_len = usize::try_from(U256::from_be_slice(&data[53..85]))
            .map_err(|_| BatchError::InvalidBatch("payload length overflow"))?;
        let rest = &data[RECORD_HEADER_SIZE..];
        if rest.len() < payload_len {
            return Err(BatchError::InvalidBatch("truncated payload"));
        }
        operations.push(Operation {
            kind,
            target,
            value,
            payload: Bytes::copy_from_slice(&rest[..payload_len]),
        });
        data = &rest[payload_len..];
    }
    Ok(operations)
}
