//! WebSocket frame codec.
//!
//! Every text frame is `{"event": <name>, "data": <payload>}`. Inbound
//! frames are decoded in two steps: the envelope first, then `data` against
//! the payload type the event name selects. `data` stays raw until then, so
//! signaling payloads are never re-encoded.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::value::RawValue;

use neonchat_core::event::{InterestsData, MessageData, SignalData};
use neonchat_core::{ClientEvent, NeonChatError, ServerEvent};

#[derive(Debug, Deserialize)]
struct InboundFrame {
    event: String,
    #[serde(default)]
    data: Option<Box<RawValue>>,
}

fn parse_data<T: DeserializeOwned>(event: &str, data: Option<&RawValue>) -> Result<T, NeonChatError> {
    let data = data.ok_or_else(|| NeonChatError::Protocol(format!("'{event}' requires data")))?;
    serde_json::from_str(data.get())
        .map_err(|e| NeonChatError::Protocol(format!("bad '{event}' data: {e}")))
}

fn parse_interests(event: &str, data: Option<&RawValue>) -> Result<Vec<String>, NeonChatError> {
    match data {
        Some(_) => parse_data::<InterestsData>(event, data).map(|d| d.interests),
        None => Ok(Vec::new()),
    }
}

/// Decode one inbound text frame.
pub fn decode_client_event(text: &str) -> Result<ClientEvent, NeonChatError> {
    let frame: InboundFrame = serde_json::from_str(text)
        .map_err(|e| NeonChatError::Protocol(format!("malformed frame: {e}")))?;
    let event = frame.event.as_str();
    let data = frame.data.as_deref();

    match event {
        "join_queue" => Ok(ClientEvent::JoinQueue {
            interests: parse_interests(event, data)?,
        }),
        "next_partner" => Ok(ClientEvent::NextPartner {
            interests: parse_interests(event, data)?,
        }),
        "leave_queue" => Ok(ClientEvent::LeaveQueue),
        "send_message" => {
            let MessageData { text } = parse_data(event, data)?;
            Ok(ClientEvent::SendMessage { text })
        }
        "typing" => Ok(ClientEvent::Typing(parse_data(event, data)?)),
        "signal" => {
            let SignalData { target, signal } = parse_data(event, data)?;
            Ok(ClientEvent::Signal { target, signal })
        }
        other => Err(NeonChatError::Protocol(format!("unknown event '{other}'"))),
    }
}

/// Encode one outbound event as a text frame.
pub fn encode_server_event(event: &ServerEvent) -> Result<String, NeonChatError> {
    serde_json::to_string(event).map_err(|e| NeonChatError::Protocol(e.to_string()))
}
