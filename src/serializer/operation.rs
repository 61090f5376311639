//! Operation encoding shared by the trace and stitch serializers.
//!
//! Merge points encode as `{i, <semantic name>: value, ...}`. Plain
//! operations encode as `{num, i, [args], [res], [descr], [dump],
//! [descr_number]}` where each bracketed key is present only when its value
//! is non-empty:
//!
//! | key            | present when                          |
//! |----------------|---------------------------------------|
//! | `args`         | at least one argument                 |
//! | `res`          | result set and non-empty              |
//! | `descr`        | descriptor set and non-empty          |
//! | `dump`         | core dump with at least one byte      |
//! | `descr_number` | descriptor number set and non-zero    |

use crate::forest::{MergePoint, MpValue, Op, Operation, SemType};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Serialized form of one operation
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum OperationJson {
    MergePoint(MergePointJson),
    Plain(PlainOperationJson),
}

/// Serialized form of a merge point, keys flattened next to `i`
#[derive(Debug, Clone, PartialEq)]
pub struct MergePointJson {
    pub i: u64,
    pub values: BTreeMap<SemType, MpValue>,
}

impl Serialize for MergePointJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("i", &self.i)?;
        for (sem_type, value) in &self.values {
            map.serialize_entry(sem_type.name(), value)?;
        }
        map.end()
    }
}

/// Serialized form of a plain operation
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlainOperationJson {
    pub num: u32,
    pub i: u64,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub res: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,

    /// Base64 of the dumped machine code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr_number: Option<String>,
}

/// Encode any stage entry
pub fn serialize_op(op: &Op) -> OperationJson {
    match op {
        Op::Plain(operation) => OperationJson::Plain(serialize_operation(operation)),
        Op::MergePoint(mp) => OperationJson::MergePoint(serialize_merge_point(mp)),
    }
}

pub fn serialize_merge_point(mp: &MergePoint) -> MergePointJson {
    MergePointJson {
        i: mp.index,
        values: mp.values.clone(),
    }
}

pub fn serialize_operation(op: &Operation) -> PlainOperationJson {
    PlainOperationJson {
        num: op.opnum,
        i: op.index,
        args: op.args.clone(),
        res: non_empty(op.result.as_deref()),
        descr: non_empty(op.descr.as_deref()),
        dump: op
            .core_dump
            .as_ref()
            .filter(|dump| !dump.bytes.is_empty())
            .map(|dump| BASE64.encode(&dump.bytes)),
        descr_number: op
            .descr_number
            .filter(|n| *n != 0)
            .map(|n| format!("{:#x}", n)),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_operation_has_no_optional_keys() {
        let op = Operation::new(12, "int_add", 3);
        let value = serde_json::to_value(serialize_op(&Op::Plain(op))).unwrap();
        assert_eq!(value, json!({ "num": 12, "i": 3 }));
    }

    #[test]
    fn test_full_operation() {
        let op = Operation::new(40, "guard_true", 5)
            .with_args(["i0", "i1"])
            .with_result("i2")
            .with_descr("<Guard0x7f>")
            .with_descr_number(255)
            .with_core_dump(0x1000, vec![0x48, 0x89, 0xe5]);

        let value = serde_json::to_value(serialize_op(&Op::Plain(op))).unwrap();
        assert_eq!(
            value,
            json!({
                "num": 40,
                "i": 5,
                "args": ["i0", "i1"],
                "res": "i2",
                "descr": "<Guard0x7f>",
                "dump": "SInl",
                "descr_number": "0xff"
            })
        );
    }

    #[test]
    fn test_empty_values_are_omitted() {
        let op = Operation::new(1, "jump", 0)
            .with_result("")
            .with_descr("")
            .with_descr_number(0)
            .with_core_dump(0x1000, Vec::new());

        let value = serde_json::to_value(serialize_operation(&op)).unwrap();
        assert_eq!(value, json!({ "num": 1, "i": 0 }));
    }

    #[test]
    fn test_merge_point_uses_semantic_names() {
        let mp = MergePoint::new(2)
            .with_value(SemType::Filename, "app.py")
            .with_value(SemType::Lineno, 10_i64)
            .with_value(SemType::Opcode, "LOAD_FAST");

        let value = serde_json::to_value(serialize_op(&Op::MergePoint(mp))).unwrap();
        assert_eq!(
            value,
            json!({ "i": 2, "filename": "app.py", "lineno": 10, "opcode": "LOAD_FAST" })
        );
    }
}
