//! Canned API response bodies

use serde_json::{Value, json};

pub fn error_string_body(message: &str) -> Value {
    json!({ "error": message })
}

pub fn error_message_body(message: &str) -> Value {
    json!({ "error": { "message": message, "code": "E_INVALID" } })
}

pub fn items_body() -> Value {
    json!({
        "items": [
            { "id": 1, "name": "first" },
            { "id": 2, "name": "second" }
        ]
    })
}
