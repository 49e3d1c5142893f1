//! Chat payload intake
//!
//! Turns backend chat messages into input cell writes. A response always
//! overwrites both the pose directive and the expression targets; absent
//! fields reset them.

use lapwing_core::{AvatarError, AvatarResult};
use lapwing_visual::ExpressionTargets;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{AvatarInputs, RuntimeError, RuntimeResult};

/// Chat backend message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatMessage {
    /// Server acknowledged the user's message
    Received,
    Response(ChatResponse),
    Error {
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Unknown,
}

/// Assistant reply with avatar directives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatResponse {
    pub response: Option<String>,
    /// Encoded speech audio, handed to the playback collaborator
    pub audio_data: Option<Value>,
    /// Object of name -> number, or a string containing one
    pub expression_values: Option<Value>,
    pub pose: Option<String>,
}

impl ChatResponse {
    pub fn has_audio(&self) -> bool {
        match &self.audio_data {
            Some(Value::String(data)) => !data.is_empty(),
            Some(Value::Array(data)) => !data.is_empty(),
            _ => false,
        }
    }

    /// Trimmed pose name; blank means the default pose
    pub fn pose_directive(&self) -> Option<&str> {
        self.pose
            .as_deref()
            .map(str::trim)
            .filter(|pose| !pose.is_empty())
    }
}

/// What a message did to the avatar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Acknowledged,
    Response {
        pose: Option<String>,
        /// Number of expression targets accepted
        controls: usize,
        has_audio: bool,
    },
    ServerError(String),
    Ignored,
}

fn decode_object(map: &serde_json::Map<String, Value>) -> ExpressionTargets {
    let mut targets = ExpressionTargets::new();
    for (name, value) in map {
        match value.as_f64() {
            Some(v) => targets.set(name.as_str(), v as f32),
            None => debug!(control = %name, "non-numeric expression value dropped"),
        }
    }
    targets
}

/// Decode an `expressionValues` payload. Strings get exactly one level of
/// JSON decoding.
pub fn decode_expressions(value: &Value) -> AvatarResult<ExpressionTargets> {
    match value {
        Value::Null => Ok(ExpressionTargets::new()),
        Value::Object(map) => Ok(decode_object(map)),
        Value::String(text) if text.trim().is_empty() => Ok(ExpressionTargets::new()),
        Value::String(text) => {
            let inner: Value = serde_json::from_str(text)
                .map_err(|e| AvatarError::MalformedPayload(e.to_string()))?;
            match inner {
                Value::Null => Ok(ExpressionTargets::new()),
                Value::Object(map) => Ok(decode_object(&map)),
                other => Err(AvatarError::MalformedPayload(format!(
                    "expected an object, got {}",
                    kind(&other)
                ))),
            }
        }
        other => Err(AvatarError::MalformedPayload(format!(
            "expected an object or string, got {}",
            kind(other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Apply an already parsed message
pub fn apply_chat_message(inputs: &AvatarInputs, message: &ChatMessage) -> IntakeOutcome {
    match message {
        ChatMessage::Received => {
            debug!("message received by server");
            IntakeOutcome::Acknowledged
        }
        ChatMessage::Response(response) => {
            let pose = response.pose_directive().map(str::to_string);
            inputs.set_pose(pose.as_deref());

            let targets = match response.expression_values.as_ref().map(decode_expressions) {
                None => ExpressionTargets::new(),
                Some(Ok(targets)) => targets,
                Some(Err(err)) => {
                    warn!(error = %err, "expressions cleared");
                    ExpressionTargets::new()
                }
            };
            let controls = targets.len();
            inputs.set_expressions(targets);

            let has_audio = response.has_audio();
            debug!(pose = ?pose, controls, has_audio, "response applied");

            IntakeOutcome::Response {
                pose,
                controls,
                has_audio,
            }
        }
        ChatMessage::Error { message } => {
            warn!(%message, "chat server error");
            IntakeOutcome::ServerError(message.clone())
        }
        ChatMessage::Unknown => {
            debug!("unknown chat message type ignored");
            IntakeOutcome::Ignored
        }
    }
}

/// Parse a raw chat frame and apply it
pub fn apply_message(inputs: &AvatarInputs, text: &str) -> RuntimeResult<IntakeOutcome> {
    let message: ChatMessage = serde_json::from_str(text).map_err(RuntimeError::MessageParse)?;
    Ok(apply_chat_message(inputs, &message))
}

/// Reset chat-driven inputs when the conversation is cleared
pub fn clear_chat(inputs: &AvatarInputs) {
    inputs.clear();
    debug!("chat cleared");
}
