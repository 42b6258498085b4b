use alloy::primitives::{Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;

use super::types::LogRecord;

// Outer event emitted by the transfer-logic contract. The inner `data` is
// the selector-prefixed transfer payload.
sol! {
    event TransferLogicEntered(bytes data, uint256 indexed nonce);
}

/// Topic 0 of `TransferLogicEntered(bytes,uint256)`.
pub fn event_topic() -> B256 {
    TransferLogicEntered::SIGNATURE_HASH
}

/// Unpacked outer layer of a log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    pub payload: Bytes,
    pub nonce: Option<U256>,
}

/// Decode the non-indexed data of a `TransferLogicEntered` log.
/// The nonce is read from topic 1 when the node returned it.
pub fn unpack(record: &LogRecord) -> Result<EventEnvelope, alloy::sol_types::Error> {
    let (payload,) = TransferLogicEntered::abi_decode_data(&record.data)?;
    let nonce = record.topics.get(1).map(|t| U256::from_be_bytes(t.0));
    Ok(EventEnvelope { payload, nonce })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::testing::envelope_record;

    #[test]
    fn test_unpack_roundtrip() {
        let record = envelope_record(10, vec![0xaa, 0xbb, 0xcc, 0xdd, 0x01], 42);
        let envelope = unpack(&record).unwrap();
        assert_eq!(envelope.payload.as_ref(), &[0xaa, 0xbb, 0xcc, 0xdd, 0x01]);
        assert_eq!(envelope.nonce, Some(U256::from(42u64)));
    }

    #[test]
    fn test_unpack_garbage_fails() {
        let mut record = envelope_record(10, vec![0x01], 1);
        record.data = Bytes::from(vec![0xff; 7]);
        assert!(unpack(&record).is_err());
    }

    #[test]
    fn test_missing_nonce_topic() {
        let mut record = envelope_record(10, vec![0x01, 0x02, 0x03, 0x04], 1);
        record.topics.truncate(1);
        assert_eq!(unpack(&record).unwrap().nonce, None);
    }
}
