use thiserror::Error;

use crate::{opcodes::Form, Pos};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("{pos}: {msg}")]
    Syntax { pos: Pos, msg: String },

    #[error("{pos}: {msg}")]
    Range { pos: Pos, msg: String },

    #[error("{pos}: unresolved symbol `{name}`")]
    Unresolved { pos: Pos, name: String },

    #[error("{pos}: {mnemonic} does not support {form} addressing")]
    Unsupported {
        pos: Pos,
        mnemonic: &'static str,
        form: Form,
    },

    #[error("{pos}: label `{name}` moved from ${expected:04X} to ${found:04X} between passes")]
    Phase {
        pos: Pos,
        name: String,
        expected: i32,
        found: i32,
    },
}

impl AsmError {
    pub fn syntax(pos: Pos, msg: impl Into<String>) -> Self {
        Self::Syntax {
            pos,
            msg: msg.into(),
        }
    }

    pub fn range(pos: Pos, msg: impl Into<String>) -> Self {
        Self::Range {
            pos,
            msg: msg.into(),
        }
    }

    pub fn pos(&self) -> Pos {
        match self {
            Self::Syntax { pos, .. }
            | Self::Range { pos, .. }
            | Self::Unresolved { pos, .. }
            | Self::Unsupported { pos, .. }
            | Self::Phase { pos, .. } => *pos,
        }
    }
}
