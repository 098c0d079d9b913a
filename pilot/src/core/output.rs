//! Decoding of the agent's structured (`--output-format json`) payload.

use serde::Deserialize;

use crate::core::error::AgentError;

const RESULT_TYPE: &str = "result";

/// The JSON object the agent prints to stdout at exit.
#[derive(Debug, Clone, Deserialize)]
pub struct CliMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

fn decode(data: &[u8]) -> Result<CliMessage, AgentError> {
    serde_json::from_slice(data).map_err(AgentError::JsonDecodingFailed)
}

fn result_text(message: CliMessage) -> Result<(String, Option<String>), AgentError> {
    if message.kind != RESULT_TYPE {
        return Err(AgentError::NoResultMessage);
    }
    match message.result {
        Some(text) => Ok((text, message.session_id)),
        None => Err(AgentError::NoResultMessage),
    }
}

/// Extract the result text from a single-turn payload.
pub fn parse_result(data: &[u8]) -> Result<String, AgentError> {
    let (text, _) = result_text(decode(data)?)?;
    Ok(text)
}

/// Extract the result text and session id from a session-creating payload.
///
/// The session id is only checked once the result text is known to exist.
pub fn parse_session_result(data: &[u8]) -> Result<(String, String), AgentError> {
    let (text, session_id) = result_text(decode(data)?)?;
    let session_id = session_id.ok_or(AgentError::NoSessionId)?;
    Ok((text, session_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_result_text() {
        let data = br#"{"type":"result","subtype":"success","result":"4","session_id":"s-1"}"#;
        assert_eq!(parse_result(data).expect("parse"), "4");
    }

    #[test]
    fn result_text_may_be_empty() {
        let data = br#"{"type":"result","result":""}"#;
        assert_eq!(parse_result(data).expect("parse"), "");
    }

    #[test]
    fn malformed_json_is_decoding_failure() {
        let err = parse_result(b"not json").unwrap_err();
        assert!(matches!(err, AgentError::JsonDecodingFailed(_)));

        let err = parse_result(br#"{"subtype":"success"}"#).unwrap_err();
        assert!(matches!(err, AgentError::JsonDecodingFailed(_)));
    }

    #[test]
    fn non_result_type_is_no_result_message() {
        let data = br#"{"type":"assistant","result":"partial"}"#;
        assert!(matches!(
            parse_result(data).unwrap_err(),
            AgentError::NoResultMessage
        ));
    }

    #[test]
    fn null_or_missing_result_is_no_result_message() {
        for data in [
            br#"{"type":"result","result":null}"#.as_slice(),
            br#"{"type":"result","subtype":"error_max_turns"}"#.as_slice(),
        ] {
            assert!(matches!(
                parse_result(data).unwrap_err(),
                AgentError::NoResultMessage
            ));
        }
    }

    #[test]
    fn session_result_requires_session_id() {
        let data = br#"{"type":"result","result":"hello","session_id":"abc"}"#;
        let (text, id) = parse_session_result(data).expect("parse");
        assert_eq!(text, "hello");
        assert_eq!(id, "abc");

        let data = br#"{"type":"result","result":"hello"}"#;
        assert!(matches!(
            parse_session_result(data).unwrap_err(),
            AgentError::NoSessionId
        ));
    }

    #[test]
    fn missing_result_wins_over_missing_session_id() {
        let data = br#"{"type":"result"}"#;
        assert!(matches!(
            parse_session_result(data).unwrap_err(),
            AgentError::NoResultMessage
        ));
    }
}
