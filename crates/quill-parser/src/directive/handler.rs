//! Directive handler trait.

use crate::ast::DirectiveNode;

use super::DirectiveError;

/// Handler registered for a directive name.
///
/// Handlers do not render anything. They describe a directive and may
/// reject an assembled [`DirectiveNode`], which replaces it with an error
/// node in the output.
///
/// # Example
///
/// ```
/// use quill_parser::DirectiveNode;
/// use quill_parser::directive::{DirectiveError, DirectiveHandler, DirectiveSpec};
///
/// struct Figure;
///
/// impl DirectiveHandler for Figure {
///     fn name(&self) -> &str { "figure" }
///
///     fn spec(&self) -> DirectiveSpec {
///         DirectiveSpec::new("An image with a caption").with_arg("Image path")
///     }
///
///     fn validate(&self, node: &DirectiveNode) -> Result<(), DirectiveError> {
///         if node.arg.is_none() {
///             return Err(DirectiveError::validation("figure requires an image path"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait DirectiveHandler: Send + Sync {
    /// Directive name matched against `{name}`.
    fn name(&self) -> &str;

    /// Additional names for the same directive.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Documentation metadata. Never enforced by the parser.
    fn spec(&self) -> DirectiveSpec {
        DirectiveSpec::default()
    }

    /// Check an assembled directive.
    ///
    /// Returning an error turns the directive into an error node.
    fn validate(&self, _node: &DirectiveNode) -> Result<(), DirectiveError> {
        Ok(())
    }
}

/// Documentation of a directive's shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectiveSpec {
    /// What the directive does.
    pub doc: String,
    /// Description of the argument, if the directive takes one.
    pub arg: Option<String>,
    /// Documented options.
    pub options: Vec<OptionSpec>,
    /// Whether the directive uses its body.
    pub body: bool,
}

impl DirectiveSpec {
    /// Create a spec with a description.
    #[must_use]
    pub fn new(doc: impl Into<String>) -> Self {
        Self {
            doc: doc.into(),
            ..Self::default()
        }
    }

    /// Describe the argument.
    #[must_use]
    pub fn with_arg(mut self, doc: impl Into<String>) -> Self {
        self.arg = Some(doc.into());
        self
    }

    /// Document an option.
    #[must_use]
    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Mark the body as used.
    #[must_use]
    pub fn with_body(mut self) -> Self {
        self.body = true;
        self
    }
}

/// Expected type of a documented option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptionKind {
    #[default]
    String,
    Number,
    Boolean,
}

/// Documentation of a single option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionSpec {
    /// Option key.
    pub name: String,
    /// Expected type.
    pub kind: OptionKind,
    /// What the option does.
    pub doc: String,
}

impl OptionSpec {
    /// Document an option.
    pub fn new(name: impl Into<String>, kind: OptionKind, doc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            doc: doc.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder() {
        let spec = DirectiveSpec::new("Admonition")
            .with_arg("Title")
            .with_option(OptionSpec::new("class", OptionKind::String, "Extra classes"))
            .with_body();
        assert_eq!(spec.doc, "Admonition");
        assert_eq!(spec.arg.as_deref(), Some("Title"));
        assert_eq!(spec.options.len(), 1);
        assert_eq!(spec.options[0].kind, OptionKind::String);
        assert!(spec.body);
    }
}
