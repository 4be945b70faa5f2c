//! Canned Bot API responses for wiremock servers.

use serde_json::{json, Value};

pub const TOKEN: &str = "123:ABC";

pub fn message_ok(message_id: i64, chat_id: i64) -> Value {
    json!({
        "ok": true,
        "result": {
            "message_id": message_id,
            "chat": { "id": chat_id, "type": "group" },
            "date": 1_700_000_000
        }
    })
}

pub fn service_unavailable() -> Value {
    json!({
        "ok": false,
        "error_code": 503,
        "description": "Service Unavailable"
    })
}
