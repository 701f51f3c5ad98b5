//! Task detail payload
//!
//! The backend transports the detail as a JSON string in the `taskDetail`
//! column. [`decode`]/[`encode`] are the serialization boundary; nothing
//! outside this module sees a partially parsed shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::process::ProcessStep;

/// Job specifics: paper, sizes, delivery, and the ordered process list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDetail {
    pub delivery_method: String,
    pub description: String,
    /// Raw paper size before cutting
    pub original_size: String,
    /// Finished product size
    pub individual_size: String,
    pub paper: String,
    pub processes: Vec<ProcessStep>,
}

impl TaskDetail {
    pub fn with_processes(mut self, processes: Vec<ProcessStep>) -> Self {
        self.processes = processes;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskDetail::default()
    }

    /// First step that is not done yet, which drives the "next action" UI
    pub fn next_pending_step(&self) -> Option<(usize, &ProcessStep)> {
        self.processes.iter().enumerate().find(|(_, s)| !s.is_done())
    }

    /// Number of finished steps
    pub fn done_count(&self) -> usize {
        self.processes.iter().filter(|s| s.is_done()).count()
    }
}

/// Parse a detail payload that is either an already decoded object or a
/// JSON string. Anything else, and any parse failure, yields the empty detail.
pub fn parse_detail(raw: &Value) -> TaskDetail {
    match raw {
        Value::String(text) => decode(text),
        Value::Object(_) => from_object(raw.clone()),
        Value::Null => TaskDetail::default(),
        other => {
            warn!(kind = value_kind(other), "task detail payload has unexpected type");
            TaskDetail::default()
        }
    }
}

/// Decode the stringified detail column
pub fn decode(text: &str) -> TaskDetail {
    let text = text.trim();
    if text.is_empty() {
        return TaskDetail::default();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => from_object(value),
        Ok(other) => {
            warn!(kind = value_kind(&other), "task detail string is not an object");
            TaskDetail::default()
        }
        Err(err) => {
            warn!(error = %err, "failed to parse task detail");
            TaskDetail::default()
        }
    }
}

/// Encode the detail for the `taskDetail` column
pub fn encode(detail: &TaskDetail) -> String {
    // TaskDetail has only string/number/list fields, so serializing cannot fail.
    serde_json::to_string(detail).unwrap_or_else(|_| "{}".to_string())
}

fn from_object(value: Value) -> TaskDetail {
    serde_json::from_value(value).unwrap_or_else(|err| {
        warn!(error = %err, "task detail object has invalid fields");
        TaskDetail::default()
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serde adapter for the `taskDetail` field: accepts a string or an object,
/// writes a string.
pub mod as_json_string {
    use super::*;

    pub fn serialize<S>(detail: &TaskDetail, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&encode(detail))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TaskDetail, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map(parse_detail).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{renumber, ProcessStatus};
    use serde_json::json;

    fn sample() -> TaskDetail {
        TaskDetail {
            delivery_method: "택배".into(),
            description: "양면 컬러".into(),
            original_size: "4절".into(),
            individual_size: "90x50".into(),
            paper: "스노우화이트 250g".into(),
            processes: renumber(vec![
                ProcessStep::printing("디지털인쇄", "내부인쇄").with_status(ProcessStatus::Done),
                ProcessStep::new("코팅", "코팅(무광)", "우신코팅")
                    .with_phone(Some("02-123-4567".into())),
            ]),
        }
    }

    #[test]
    fn test_malformed_inputs_yield_default() {
        for raw in [
            json!(null),
            json!(42),
            json!(true),
            json!([1, 2]),
            json!(""),
            json!("   "),
            json!("{not json"),
            json!("[1,2,3]"),
            json!({"processes": "oops"}),
        ] {
            let detail = parse_detail(&raw);
            assert!(detail.is_empty(), "input {:?}", raw);
            assert!(detail.processes.is_empty());
        }
    }

    #[test]
    fn test_parse_string_and_object_agree() {
        let detail = sample();
        let as_string = Value::String(encode(&detail));
        let as_object = serde_json::to_value(&detail).unwrap();
        assert_eq!(parse_detail(&as_string), detail);
        assert_eq!(parse_detail(&as_object), detail);
    }

    #[test]
    fn test_roundtrip_is_stable() {
        let encoded = encode(&sample());
        assert_eq!(encode(&decode(&encoded)), encoded);
    }

    #[test]
    fn test_roundtrip_across_detail_shapes() {
        let in_progress = TaskDetail {
            description: "재단 후 포장 \"주의\"\n2차 검수 🙂".into(),
            processes: renumber(vec![
                ProcessStep::printing("오프셋인쇄", "외부인쇄")
                    .with_status(ProcessStatus::InProgress)
                    .with_memo("CMYK 교정본 확인"),
                ProcessStep::new("박", "박(금박)", "외부박").with_phone(None),
                ProcessStep::new("접지", "", "자체접지").with_memo("ü/é 표기"),
            ]),
            ..TaskDetail::default()
        };

        for detail in [TaskDetail::default(), sample(), in_progress] {
            let encoded = encode(&detail);
            let decoded = decode(&encoded);
            assert_eq!(decoded, detail);
            assert_eq!(encode(&decoded), encoded);
        }
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let detail = decode(r#"{"paper":"아트지"}"#);
        assert_eq!(detail.paper, "아트지");
        assert!(detail.processes.is_empty());
        assert_eq!(detail.delivery_method, "");
    }

    #[test]
    fn test_next_pending_step() {
        let detail = sample();
        let (index, step) = detail.next_pending_step().unwrap();
        assert_eq!(index, 1);
        assert_eq!(step.category, "코팅");
        assert_eq!(detail.done_count(), 1);
    }
}
