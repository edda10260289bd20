use serde::{Deserialize, Serialize};

/// A single engine operation: opaque id echoed in the response, method
/// name, and positional JSON arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

/// What a submitting process frames onto the socket. Lower priority
/// values are served first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task: Task,
    pub priority: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
}

/// Framed back once the task has run (or been rejected). `error` is
/// null on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: String,
    pub error: Option<ResponseError>,
    #[serde(default)]
    pub result: serde_json::Value,
}

impl TaskResponse {
    pub fn ok(id: String, result: serde_json::Value) -> Self {
        Self { id, error: None, result }
    }

    pub fn err(id: String, message: impl Into<String>) -> Self {
        Self {
            id,
            error: Some(ResponseError { message: message.into() }),
            result: serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let request = TaskRequest {
            task: Task {
                id: "42".to_string(),
                method: "createWallet".to_string(),
                params: vec![json!("00ff")],
            },
            priority: 5,
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["task"]["method"], "createWallet");
        assert_eq!(wire["priority"], 5);

        let back: TaskRequest = serde_json::from_value(wire).unwrap();
        assert_eq!(back.task.id, "42");
    }

    #[test]
    fn error_field_serializes_as_null_on_success() {
        let wire = serde_json::to_value(TaskResponse::ok("1".into(), json!(7))).unwrap();
        assert!(wire["error"].is_null());
        assert_eq!(wire["result"], 7);
    }
}
