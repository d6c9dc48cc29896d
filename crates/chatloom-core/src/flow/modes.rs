//! Mode registry: the static table from chat mode to flow constructor.
//!
//! Every `ChatMode` has exactly one entry. Flows are compiled once when the
//! registry is built and looked up per turn. Tags that do not parse into a
//! `ChatMode` are rejected with `SessionError::UnknownMode`.

use std::collections::HashMap;

use chatloom_types::chat::ChatMode;
use chatloom_types::error::{FlowError, SessionError};

use super::graph::{CompiledFlow, END, FlowBuilder, START};
use super::node::FlowNode;

/// System instruction for the question-answering flow.
pub const CHATBOT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.\n\
Provide clear, concise, and helpful responses to user questions.\n\
Be friendly, professional, and informative in your interactions.";

/// Fixed reply of the content generation flow.
pub const CONTENT_GEN_REPLY: &str = "Hello World";

type FlowConstructor = fn() -> Result<CompiledFlow, FlowError>;

const MODE_TABLE: &[(ChatMode, FlowConstructor)] = &[
    (ChatMode::Qna, qna_flow),
    (ChatMode::ContentGen, content_gen_flow),
];

/// `START -> human -> chatbot -> END`
pub fn qna_flow() -> Result<CompiledFlow, FlowError> {
    FlowBuilder::new(ChatMode::Qna.tag())
        .add_node("human", FlowNode::Intake)
        .add_node(
            "chatbot",
            FlowNode::Generate {
                system_prompt: Some(CHATBOT_SYSTEM_PROMPT.to_string()),
            },
        )
        .add_edge(START, "human")
        .add_edge("human", "chatbot")
        .add_edge("chatbot", END)
        .compile()
}

/// `START -> human -> hello_world -> END`
pub fn content_gen_flow() -> Result<CompiledFlow, FlowError> {
    FlowBuilder::new(ChatMode::ContentGen.tag())
        .add_node("human", FlowNode::Intake)
        .add_node(
            "hello_world",
            FlowNode::Fixed {
                reply: CONTENT_GEN_REPLY.to_string(),
            },
        )
        .add_edge(START, "human")
        .add_edge("human", "hello_world")
        .add_edge("hello_world", END)
        .compile()
}

/// Compiled flows for every registered mode.
#[derive(Debug)]
pub struct ModeRegistry {
    flows: HashMap<ChatMode, CompiledFlow>,
}

impl ModeRegistry {
    /// Compile every flow in the table.
    pub fn new() -> Result<Self, FlowError> {
        let mut flows = HashMap::with_capacity(MODE_TABLE.len());
        for (mode, construct) in MODE_TABLE {
            flows.insert(*mode, construct()?);
        }
        Ok(Self { flows })
    }

    /// Registered modes in display order.
    pub fn modes(&self) -> &'static [ChatMode] {
        ChatMode::all()
    }

    /// Parse a wire tag into a mode.
    pub fn parse_mode(tag: &str) -> Result<ChatMode, SessionError> {
        tag.parse::<ChatMode>()
            .map_err(|_| SessionError::UnknownMode(tag.to_string()))
    }

    /// The compiled flow for a mode.
    pub fn flow(&self, mode: ChatMode) -> Result<&CompiledFlow, SessionError> {
        self.flows
            .get(&mode)
            .ok_or_else(|| SessionError::UnknownMode(mode.tag().to_string()))
    }
}
