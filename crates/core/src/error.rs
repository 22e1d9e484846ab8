use serde::Serialize;

/// A failure while compiling one line of query text.
///
/// Positions are byte offsets into the line that was compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryError {
    /// No lexer rule matches at `position`.
    #[error("no token matches at position {position}: '{remainder}'")]
    Lex { position: usize, remainder: String },

    /// The token stream does not form a valid query.
    #[error("{message} (at position {position})")]
    Parse { position: usize, message: String },

    /// A lexer table pattern failed to compile.
    #[error("lexer rule /{pattern}/ does not compile: {message}")]
    Rule { pattern: String, message: String },
}

impl QueryError {
    pub fn lex(position: usize, remainder: impl Into<String>) -> Self {
        QueryError::Lex {
            position,
            remainder: remainder.into(),
        }
    }

    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        QueryError::Parse {
            position,
            message: message.into(),
        }
    }

    pub fn rule(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::Rule {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn position(&self) -> usize {
        match self {
            QueryError::Lex { position, .. } | QueryError::Parse { position, .. } => *position,
            QueryError::Rule { .. } => 0,
        }
    }

    /// Move the position right by `offset` bytes, for errors found in a
    /// slice of a longer line.
    pub fn shifted(self, offset: usize) -> Self {
        match self {
            QueryError::Lex { position, remainder } => QueryError::Lex {
                position: position + offset,
                remainder,
            },
            QueryError::Parse { position, message } => QueryError::Parse {
                position: position + offset,
                message,
            },
            rule @ QueryError::Rule { .. } => rule,
        }
    }

    /// Short name of the failure class, as shown to administrators.
    pub fn kind_name(&self) -> &'static str {
        match self {
            QueryError::Lex { .. } => "LexError",
            QueryError::Parse { .. } => "ParseError",
            QueryError::Rule { .. } => "LexerRuleError",
        }
    }

    /// Serialize to a JSON object with every field present.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":     self.kind_name(),
            "message":  self.to_string(),
            "position": self.position(),
        })
    }
}
