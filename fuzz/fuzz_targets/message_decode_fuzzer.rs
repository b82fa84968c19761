//! Fuzz target for inbound frame decoding
//!
//! # Strategy
//!
//! - Random text: arbitrary strings (general malformation)
//! - Deeply nested: `payload` nested to arbitrary depth (stack usage)
//! - Type confusion: a known `type` with another type's payload
//! - Field confusion: right `type`, fields of the wrong JSON kind
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Anything that decodes re-encodes, and the re-encoding decodes to the
//!   same message
//! - A decoded `join` never names a blank room or display name

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zenchat_proto::ClientMessage;

const TYPES: [&str; 6] = ["join", "chat", "typing", "reaction", "status", "system"];

#[derive(Debug, Clone, Arbitrary)]
enum DecodeAttack {
    RandomText { text: String },
    DeeplyNested { depth: u8, type_index: u8 },
    TypeConfusion { type_index: u8, payload_index: u8 },
    FieldConfusion { type_index: u8, value: FieldValue },
}

#[derive(Debug, Clone, Arbitrary)]
enum FieldValue {
    Null,
    Bool(bool),
    Number(i64),
    Text(String),
    Array,
}

impl FieldValue {
    fn to_json(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => format!("{s:?}"),
            Self::Array => "[]".to_string(),
        }
    }
}

fn payloads() -> [&'static str; 6] {
    [
        r#"{"roomId":"R1","name":"Alice"}"#,
        r#"{"message":"hi"}"#,
        r#"{"isTyping":true}"#,
        r#"{"messageId":"m","emoji":"x","action":"add"}"#,
        r#"{"status":"busy"}"#,
        r#"{"message":"x","userCount":1,"users":[]}"#,
    ]
}

fuzz_target!(|attack: DecodeAttack| {
    match attack {
        DecodeAttack::RandomText { text } => check(&text),

        DecodeAttack::DeeplyNested { depth, type_index } => {
            let kind = TYPES[type_index as usize % TYPES.len()];
            let depth = depth as usize;
            let payload = format!("{}{}", "{\"a\":".repeat(depth), "1") + &"}".repeat(depth);
            check(&format!(r#"{{"type":"{kind}","payload":{payload}}}"#));
        }

        DecodeAttack::TypeConfusion { type_index, payload_index } => {
            let kind = TYPES[type_index as usize % TYPES.len()];
            let payload = payloads()[payload_index as usize % TYPES.len()];
            check(&format!(r#"{{"type":"{kind}","payload":{payload}}}"#));
        }

        DecodeAttack::FieldConfusion { type_index, value } => {
            let kind = TYPES[type_index as usize % TYPES.len()];
            let v = value.to_json();
            for field in ["roomId", "name", "message", "isTyping", "messageId", "emoji", "status"] {
                check(&format!(r#"{{"type":"{kind}","payload":{{"{field}":{v}}}}}"#));
            }
        }
    }
});

fn check(text: &str) {
    let Ok(message) = ClientMessage::decode(text) else {
        return;
    };

    if let ClientMessage::Join(join) = &message {
        assert!(!join.room_id.trim().is_empty());
        assert!(!join.name.trim().is_empty());
    }

    let encoded = message.encode().expect("decoded message must encode");
    let again = ClientMessage::decode(&encoded).expect("re-encoded message must decode");
    assert_eq!(again, message);
}
