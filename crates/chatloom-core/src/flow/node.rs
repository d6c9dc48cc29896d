//! Flow node kinds.
//!
//! A node reads the current conversation state and returns the messages it
//! produces. Nodes never rewrite existing messages; the compiled flow appends
//! what they return.

use chatloom_types::chat::ConversationState;
use chatloom_types::llm::{LlmError, Message};

use crate::llm::generator::ResponseGenerator;

/// One step in a conversation flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowNode {
    /// Wrap the inbound text as a human message.
    Intake,
    /// Ask the generator for a reply over the full message sequence.
    Generate { system_prompt: Option<String> },
    /// Reply with fixed text, without calling the generator.
    Fixed { reply: String },
}

impl FlowNode {
    /// Short kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowNode::Intake => "intake",
            FlowNode::Generate { .. } => "generate",
            FlowNode::Fixed { .. } => "fixed",
        }
    }

    /// Run the node against `state`, returning the messages to append.
    pub async fn run(
        &self,
        state: &ConversationState,
        generator: &ResponseGenerator,
    ) -> Result<Vec<Message>, LlmError> {
        match self {
            FlowNode::Intake => Ok(vec![Message::human(state.last_human_message.clone())]),
            FlowNode::Generate { system_prompt } => {
                let reply = generator
                    .generate(&state.messages, system_prompt.as_deref())
                    .await?;
                Ok(vec![Message::assistant(reply)])
            }
            FlowNode::Fixed { reply } => Ok(vec![Message::assistant(reply.clone())]),
        }
    }
}
