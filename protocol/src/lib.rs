//! Wire format spoken with the move agent service.

use fluo_core::{AgentReply, BoardSnapshot, BotMove, CellIndex, encode};
use serde::{Deserialize, Serialize};

/// Endpoint the agent answers next-move requests on.
pub const AGENT_NEXT_MOVE_PATH: &str = "/api/get-next-move";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePath {
    /// Color id, `1..=8`.
    pub color: u8,
    pub cells: Vec<CellIndex>,
    pub complete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextMoveRequest {
    /// Level token, as found in the page address.
    pub level: String,
    pub paths: Vec<WirePath>,
}

impl NextMoveRequest {
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        let paths = snapshot
            .paths
            .iter()
            .map(|path| WirePath {
                color: path.color.id(),
                cells: path.cells.clone(),
                complete: path.complete,
            })
            .collect();
        Self {
            level: encode(&snapshot.level),
            paths,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    NoMoreMoves,
    Solved,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextMoveResponse {
    Move { from: CellIndex, to: CellIndex },
    Status { status: AgentStatus },
}

impl NextMoveResponse {
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

impl From<NextMoveResponse> for AgentReply {
    fn from(response: NextMoveResponse) -> Self {
        match response {
            NextMoveResponse::Move { from, to } => AgentReply::Move(BotMove { from, to }),
            NextMoveResponse::Status {
                status: AgentStatus::NoMoreMoves,
            } => AgentReply::NoMoreMoves,
            NextMoveResponse::Status {
                status: AgentStatus::Solved,
            } => AgentReply::Solved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluo_core::{Color, Endpoint, GridEngine, Level};
    use serde_json::json;

    #[test]
    fn request_carries_token_and_paths() {
        let level = Level::new(
            2,
            3,
            vec![
                Endpoint::new(0, Color::Red),
                Endpoint::new(2, Color::Red),
                Endpoint::new(3, Color::Blue),
                Endpoint::new(5, Color::Blue),
            ],
        )
        .unwrap();
        let mut engine = GridEngine::new(level.clone());
        engine.extend_or_retract(Color::Red, 0).unwrap();
        engine.extend_or_retract(Color::Red, 1).unwrap();

        let request = NextMoveRequest::from_snapshot(&engine.snapshot());
        let value: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "level": encode(&level),
                "paths": [{ "color": 1, "cells": [0, 1], "complete": false }],
            })
        );
    }

    #[test]
    fn parses_every_response_shape() {
        assert_eq!(
            NextMoveResponse::from_json(r#"{"from": 4, "to": 5}"#).unwrap(),
            NextMoveResponse::Move { from: 4, to: 5 }
        );
        assert_eq!(
            AgentReply::from(NextMoveResponse::from_json(r#"{"status":"no_more_moves"}"#).unwrap()),
            AgentReply::NoMoreMoves
        );
        assert_eq!(
            AgentReply::from(NextMoveResponse::from_json(r#"{"status":"solved"}"#).unwrap()),
            AgentReply::Solved
        );
        assert_eq!(
            AgentReply::from(NextMoveResponse::Move { from: 1, to: 2 }),
            AgentReply::Move(BotMove { from: 1, to: 2 })
        );
    }

    #[test]
    fn rejects_unknown_responses() {
        assert!(NextMoveResponse::from_json(r#"{"status":"thinking"}"#).is_err());
        assert!(NextMoveResponse::from_json(r#"{"from": 4}"#).is_err());
        assert!(NextMoveResponse::from_json(r#"{"from": -1, "to": 2}"#).is_err());
    }

    #[test]
    fn status_serializes_in_snake_case() {
        let response = NextMoveResponse::Status {
            status: AgentStatus::NoMoreMoves,
        };
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({ "status": "no_more_moves" })
        );
    }
}
