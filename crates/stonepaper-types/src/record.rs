use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::DocHash;

/// Record-type tag written into every stored document.
///
/// The rich-query selector matches on this tag, so it must stay in sync with
/// the selector built by the query executor.
pub const RECORD_TYPE: &str = "stonePaper";

/// A registered document.
///
/// Records are append-only: the registry writes each one exactly once and
/// never mutates or removes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Content hash of the document; primary key in the store.
    pub doc_hash: DocHash,
    /// Caller-chosen database selector.
    pub database: i64,
    /// Registration time, as rendered at creation.
    pub time: String,
    /// Resolved creator identity.
    pub creator: String,
    /// Opaque reference to the associated sub-agreement.
    pub sub_contract: String,
    /// Contract classification code.
    pub contract_type: i64,
}

/// Wire shape of a record. Field order here is the serialized field order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodedRecord<'a> {
    doc_type: &'a str,
    doc_hash: &'a str,
    database: i64,
    time: &'a str,
    creator: &'a str,
    sub_contract: &'a str,
    contract_type: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecodedRecord {
    doc_type: String,
    doc_hash: DocHash,
    database: i64,
    time: String,
    creator: String,
    sub_contract: String,
    contract_type: i64,
}

impl DocumentRecord {
    /// Check that every string field is populated.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.time.is_empty() {
            return Err(TypeError::EmptyField("time"));
        }
        if self.creator.is_empty() {
            return Err(TypeError::EmptyField("creator"));
        }
        if self.sub_contract.is_empty() {
            return Err(TypeError::EmptyField("subContract"));
        }
        Ok(())
    }

    /// Encode to the stored JSON form.
    ///
    /// Output is deterministic: `docType`, `docHash`, `database`, `time`,
    /// `creator`, `subContract`, `contractType`, in that order, with integer
    /// fields as JSON numbers.
    pub fn encode(&self) -> Result<Vec<u8>, TypeError> {
        self.validate()?;
        let wire = EncodedRecord {
            doc_type: RECORD_TYPE,
            doc_hash: self.doc_hash.as_str(),
            database: self.database,
            time: &self.time,
            creator: &self.creator,
            sub_contract: &self.sub_contract,
            contract_type: self.contract_type,
        };
        serde_json::to_vec(&wire).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode a stored JSON document.
    ///
    /// Fails if the bytes are not a record, or carry a different `docType`.
    pub fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        let wire: DecodedRecord =
            serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))?;
        Self::from_wire(wire)
    }

    /// Decode a record already parsed into a JSON value (a result-set row).
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, TypeError> {
        let wire: DecodedRecord =
            serde_json::from_value(value).map_err(|e| TypeError::Serialization(e.to_string()))?;
        Self::from_wire(wire)
    }

    fn from_wire(wire: DecodedRecord) -> Result<Self, TypeError> {
        if wire.doc_type != RECORD_TYPE {
            return Err(TypeError::RecordTypeMismatch {
                expected: RECORD_TYPE.into(),
                found: wire.doc_type,
            });
        }
        let record = Self {
            doc_hash: wire.doc_hash,
            database: wire.database,
            time: wire.time,
            creator: wire.creator,
            sub_contract: wire.sub_contract,
            contract_type: wire.contract_type,
        };
        record.validate()?;
        Ok(record)
    }

    /// The encoded record as a JSON value (for embedding in result sets).
    pub fn to_json_value(&self) -> Result<serde_json::Value, TypeError> {
        let bytes = self.encode()?;
        serde_json::from_slice(&bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
