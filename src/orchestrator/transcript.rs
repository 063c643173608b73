use std::collections::VecDeque;

use crate::llm::InputItem;

/// One entry of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    UserMessage(String),
    AssistantMessage(String),
    ToolRequest {
        call_id: String,
        name: String,
        arguments: String,
    },
    ToolResult {
        call_id: String,
        output: String,
    },
    DeveloperNote(String),
}

impl Turn {
    /// Wire representation of this turn.
    pub fn to_input_item(&self) -> InputItem {
        match self {
            Turn::UserMessage(text) => InputItem::user(text.clone()),
            Turn::AssistantMessage(text) => InputItem::assistant(text.clone()),
            Turn::DeveloperNote(text) => InputItem::developer(text.clone()),
            Turn::ToolRequest {
                call_id,
                name,
                arguments,
            } => InputItem::FunctionCall {
                call_id: call_id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
            },
            Turn::ToolResult { call_id, output } => InputItem::FunctionCallOutput {
                call_id: call_id.clone(),
                output: output.clone(),
            },
        }
    }
}

/// Ordered, bounded conversation history.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: VecDeque<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Wire representation of the whole transcript
    pub fn to_input(&self) -> Vec<InputItem> {
        self.turns.iter().map(Turn::to_input_item).collect()
    }

    /// Drop the oldest turns until at most `limit` remain.
    ///
    /// Removing a tool request also removes its result, so requests and
    /// results always stay paired.
    pub fn trim(&mut self, limit: usize) {
        while self.turns.len() > limit {
            let Some(front) = self.turns.pop_front() else {
                break;
            };
            if let Turn::ToolRequest { call_id, .. } = front {
                if let Some(idx) = self.turns.iter().position(
                    |turn| matches!(turn, Turn::ToolResult { call_id: id, .. } if *id == call_id),
                ) {
                    self.turns.remove(idx);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(id: &str) -> Turn {
        Turn::ToolRequest {
            call_id: id.into(),
            name: "get_categories".into(),
            arguments: "{}".into(),
        }
    }

    fn result(id: &str) -> Turn {
        Turn::ToolResult {
            call_id: id.into(),
            output: "{}".into(),
        }
    }

    fn is_paired(transcript: &Transcript) -> bool {
        let turns: Vec<&Turn> = transcript.turns().collect();
        turns.iter().enumerate().all(|(i, turn)| match turn {
            Turn::ToolResult { call_id, .. } => turns[..i]
                .iter()
                .any(|t| matches!(t, Turn::ToolRequest { call_id: id, .. } if id == call_id)),
            Turn::ToolRequest { call_id, .. } => turns[i + 1..]
                .iter()
                .any(|t| matches!(t, Turn::ToolResult { call_id: id, .. } if id == call_id)),
            _ => true,
        })
    }

    #[test]
    fn test_trim_keeps_newest_turns() {
        let mut transcript = Transcript::new();
        for i in 0..5 {
            transcript.push(Turn::UserMessage(format!("m{i}")));
        }
        transcript.trim(3);
        assert_eq!(
            transcript.turns().cloned().collect::<Vec<_>>(),
            vec![
                Turn::UserMessage("m2".into()),
                Turn::UserMessage("m3".into()),
                Turn::UserMessage("m4".into()),
            ]
        );
    }

    #[test]
    fn test_trim_removes_paired_result() {
        let mut transcript = Transcript::new();
        transcript.push(request("a"));
        transcript.push(request("b"));
        transcript.push(result("a"));
        transcript.push(result("b"));
        transcript.push(Turn::DeveloperNote("note".into()));

        transcript.trim(4);

        assert_eq!(
            transcript.turns().cloned().collect::<Vec<_>>(),
            vec![request("b"), result("b"), Turn::DeveloperNote("note".into())]
        );
        assert!(is_paired(&transcript));
    }

    #[test]
    fn test_trim_never_leaves_unpaired_turns() {
        let mut transcript = Transcript::new();
        for round in 0..20 {
            transcript.push(Turn::UserMessage(format!("u{round}")));
            for call in 0..(round % 3) {
                transcript.push(request(&format!("c{round}-{call}")));
            }
            for call in 0..(round % 3) {
                transcript.push(result(&format!("c{round}-{call}")));
            }
            transcript.push(Turn::AssistantMessage(format!("a{round}")));
            for limit in [1, 4, 7] {
                let mut copy = transcript.clone();
                copy.trim(limit);
                assert!(copy.len() <= limit);
                assert!(is_paired(&copy));
            }
            transcript.trim(7);
        }
    }

    #[test]
    fn test_to_input_uses_wire_items() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::UserMessage("hi".into()));
        transcript.push(request("a"));
        transcript.push(result("a"));
        let input = transcript.to_input();
        assert_eq!(input[0], InputItem::user("hi"));
        assert!(matches!(input[1], InputItem::FunctionCall { .. }));
        assert!(matches!(input[2], InputItem::FunctionCallOutput { .. }));
    }
}
