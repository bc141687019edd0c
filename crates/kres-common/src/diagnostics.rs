//! Diagnostics reported while resolving types and calls.
//!
//! Diagnostics are attached to syntax nodes rather than source spans; the
//! embedding front end maps a `NodeId` back to a file position.

use crate::node::NodeId;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    pub const UNRESOLVED_REFERENCE: u32 = 1001;
    pub const WRONG_NUMBER_OF_TYPE_ARGUMENTS: u32 = 1002;
    pub const TYPE_ARGUMENTS_FOR_OUTER_CLASS_WHEN_NESTED_REFERENCED: u32 = 1003;
    pub const REDUNDANT_PROJECTION: u32 = 1004;
    pub const CONFLICTING_PROJECTION: u32 = 1005;
    pub const REDUNDANT_NULLABLE: u32 = 1006;
    pub const UNSUPPORTED: u32 = 1007;
    pub const UPPER_BOUND_VIOLATED: u32 = 1008;
    pub const INACCESSIBLE_OUTER_CLASS_EXPRESSION: u32 = 1009;
    pub const PLATFORM_CLASS_MAPPED_TO_BUILTIN: u32 = 1010;
}

pub mod diagnostic_messages {
    pub const UNRESOLVED_REFERENCE: &str = "Unresolved reference: {0}";
    pub const WRONG_NUMBER_OF_TYPE_ARGUMENTS: &str = "{0} type arguments expected";
    pub const TYPE_ARGUMENTS_FOR_OUTER_CLASS_WHEN_NESTED_REFERENCED: &str =
        "Type arguments for outer class are redundant when nested class is referenced";
    pub const REDUNDANT_PROJECTION: &str =
        "Projection is redundant: the corresponding type parameter of {0} has the same variance";
    pub const CONFLICTING_PROJECTION: &str =
        "Projection is conflicting with variance of the corresponding type parameter of {0}. Remove the projection or replace it with '*'";
    pub const REDUNDANT_NULLABLE: &str = "Redundant '?'";
    pub const UNSUPPORTED: &str = "Unsupported [{0}]";
    pub const UPPER_BOUND_VIOLATED: &str =
        "Type argument is not within its bounds. Expected: {0}. Found: {1}";
    pub const INACCESSIBLE_OUTER_CLASS_EXPRESSION: &str =
        "Expression is inaccessible from a nested class '{0}', use 'inner' keyword to make the class inner";
    pub const PLATFORM_CLASS_MAPPED_TO_BUILTIN: &str =
        "This class shouldn't be used here. Use {0} instead.";
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::UNRESOLVED_REFERENCE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::UNRESOLVED_REFERENCE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::WRONG_NUMBER_OF_TYPE_ARGUMENTS,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::WRONG_NUMBER_OF_TYPE_ARGUMENTS,
    },
    DiagnosticMessage {
        code: diagnostic_codes::TYPE_ARGUMENTS_FOR_OUTER_CLASS_WHEN_NESTED_REFERENCED,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::TYPE_ARGUMENTS_FOR_OUTER_CLASS_WHEN_NESTED_REFERENCED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::REDUNDANT_PROJECTION,
        category: DiagnosticCategory::Warning,
        message: diagnostic_messages::REDUNDANT_PROJECTION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CONFLICTING_PROJECTION,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CONFLICTING_PROJECTION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::REDUNDANT_NULLABLE,
        category: DiagnosticCategory::Warning,
        message: diagnostic_messages::REDUNDANT_NULLABLE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::UNSUPPORTED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::UPPER_BOUND_VIOLATED,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::UPPER_BOUND_VIOLATED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::INACCESSIBLE_OUTER_CLASS_EXPRESSION,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::INACCESSIBLE_OUTER_CLASS_EXPRESSION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::PLATFORM_CLASS_MAPPED_TO_BUILTIN,
        category: DiagnosticCategory::Warning,
        message: diagnostic_messages::PLATFORM_CLASS_MAPPED_TO_BUILTIN,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub node: NodeId,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub node: NodeId,
    pub message_text: String,
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn error(node: NodeId, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            node,
            message_text: message.into(),
            related_information: Vec::new(),
        }
    }

    pub fn warning(node: NodeId, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            ..Self::error(node, message, code)
        }
    }

    /// Build a diagnostic from its registered template, taking the category
    /// from the message table.
    pub fn from_code(node: NodeId, code: u32, args: &[&str]) -> Self {
        let (category, template) = DIAGNOSTIC_MESSAGES
            .iter()
            .find(|m| m.code == code)
            .map_or((DiagnosticCategory::Error, ""), |m| (m.category, m.message));
        Self {
            category,
            code,
            node,
            message_text: format_message(template, args),
            related_information: Vec::new(),
        }
    }

    pub fn with_related(mut self, node: NodeId, message: impl Into<String>) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            node,
            message_text: message.into(),
        });
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

pub fn get_message_template(code: u32) -> Option<&'static str> {
    DIAGNOSTIC_MESSAGES
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_message_replaces_positional_args() {
        let text = format_message(diagnostic_messages::UPPER_BOUND_VIOLATED, &["Number", "String"]);
        assert_eq!(
            text,
            "Type argument is not within its bounds. Expected: Number. Found: String"
        );
    }

    #[test]
    fn from_code_uses_registered_category() {
        let diag = Diagnostic::from_code(NodeId(3), diagnostic_codes::REDUNDANT_NULLABLE, &[]);
        assert_eq!(diag.category, DiagnosticCategory::Warning);
        assert_eq!(diag.message_text, "Redundant '?'");

        let diag = Diagnostic::from_code(
            NodeId(4),
            diagnostic_codes::WRONG_NUMBER_OF_TYPE_ARGUMENTS,
            &["1"],
        );
        assert!(diag.is_error());
        assert_eq!(diag.message_text, "1 type arguments expected");
    }

    #[test]
    fn every_code_has_a_template() {
        for code in 1001..=1010 {
            assert!(get_message_template(code).is_some(), "missing template for {code}");
        }
    }
}
