//! The syntax tree produced by the compiler front end.
use std::fmt::{self, Display, Formatter};

use super::types::LineNumber;

/// Name of the function definition at the root of every program.
pub const ROOT_NODE_NAME: &str = "cflat_node_root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionType {
    FunctionDef,
    FunctionArgumentDef,
    /// A call to something the compiler itself provides, such as
    /// `#_declarevar`.
    InternalCall,
    FunctionCall,
    LiteralLeaf,
    /// The target of an assignment.
    VariableWrite,
    VariableRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Int,
    Float,
    Nothing,
    /// Text, such as a string literal or a variable name.
    Database,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Bool(bool),
    Int(i32),
    Double(f64),
    Str(String),
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            LiteralValue::Bool(b) => write!(f, "{b}"),
            LiteralValue::Int(n) => write!(f, "{n}"),
            LiteralValue::Double(x) => write!(f, "{x:?}"),
            LiteralValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTreeNode {
    pub expression_type: ExpressionType,
    pub return_type: Option<ReturnType>,
    pub name: Option<String>,
    pub line_number: LineNumber,
    pub arguments: Vec<SyntaxTreeNode>,
    pub statements: Vec<SyntaxTreeNode>,
    pub literal_value: Option<LiteralValue>,
    /// Number of `*` in a declaration.
    pub pointer_depth: u32,
}

impl SyntaxTreeNode {
    fn new(
        expression_type: ExpressionType,
        name: Option<String>,
        line_number: LineNumber,
    ) -> SyntaxTreeNode {
        SyntaxTreeNode {
            expression_type,
            return_type: None,
            name,
            line_number,
            arguments: Vec::new(),
            statements: Vec::new(),
            literal_value: None,
            pointer_depth: 0,
        }
    }

    #[must_use]
    pub fn function_call(name: &str, line_number: LineNumber) -> SyntaxTreeNode {
        SyntaxTreeNode::new(
            ExpressionType::FunctionCall,
            Some(name.to_string()),
            line_number,
        )
    }

    #[must_use]
    pub fn internal_call(name: &str, line_number: LineNumber) -> SyntaxTreeNode {
        SyntaxTreeNode::new(
            ExpressionType::InternalCall,
            Some(name.to_string()),
            line_number,
        )
    }

    #[must_use]
    pub fn function_def(
        name: &str,
        return_type: ReturnType,
        line_number: LineNumber,
    ) -> SyntaxTreeNode {
        SyntaxTreeNode {
            return_type: Some(return_type),
            ..SyntaxTreeNode::new(
                ExpressionType::FunctionDef,
                Some(name.to_string()),
                line_number,
            )
        }
    }

    #[must_use]
    pub fn argument_def(
        name: &str,
        return_type: ReturnType,
        pointer_depth: u32,
        line_number: LineNumber,
    ) -> SyntaxTreeNode {
        SyntaxTreeNode {
            return_type: Some(return_type),
            pointer_depth,
            ..SyntaxTreeNode::new(
                ExpressionType::FunctionArgumentDef,
                Some(name.to_string()),
                line_number,
            )
        }
    }

    #[must_use]
    pub fn literal(
        return_type: ReturnType,
        value: LiteralValue,
        line_number: LineNumber,
    ) -> SyntaxTreeNode {
        SyntaxTreeNode {
            return_type: Some(return_type),
            literal_value: Some(value),
            ..SyntaxTreeNode::new(ExpressionType::LiteralLeaf, None, line_number)
        }
    }

    /// A literal holding source text as it was written.
    #[must_use]
    pub fn raw(text: &str, line_number: LineNumber) -> SyntaxTreeNode {
        SyntaxTreeNode::literal(
            ReturnType::Database,
            LiteralValue::Str(text.to_string()),
            line_number,
        )
    }

    #[must_use]
    pub fn variable_read(name: &str, line_number: LineNumber) -> SyntaxTreeNode {
        SyntaxTreeNode::new(
            ExpressionType::VariableRead,
            Some(name.to_string()),
            line_number,
        )
    }

    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// A one-line rendering of an expression, such as `+(1, *(2, 3))`.
    #[must_use]
    pub fn expression(&self) -> Expression<'_> {
        Expression(self)
    }

    fn fmt_indented(
        &self,
        f: &mut Formatter<'_>,
        indent: usize,
        marker: &str,
    ) -> Result<(), fmt::Error> {
        write!(f, "{:indent$}{marker}{:?}", "", self.expression_type)?;
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        if let Some(value) = &self.literal_value {
            write!(f, " {value}")?;
        }
        if let Some(return_type) = &self.return_type {
            write!(f, " -> {return_type:?}")?;
        }
        if self.pointer_depth > 0 {
            write!(f, " {}", "*".repeat(self.pointer_depth as usize))?;
        }
        writeln!(f, " (line {})", self.line_number)?;
        for argument in &self.arguments {
            argument.fmt_indented(f, indent + 2, "= ")?;
        }
        for statement in &self.statements {
            statement.fmt_indented(f, indent + 2, "")?;
        }
        Ok(())
    }
}

/// Prints the tree one node per line, indenting statements under
/// their parent and marking arguments with `=`.
impl Display for SyntaxTreeNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.fmt_indented(f, 0, "")
    }
}

pub struct Expression<'a>(&'a SyntaxTreeNode);

impl Display for Expression<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let node = self.0;
        match (&node.literal_value, &node.name) {
            (Some(value), _) => write!(f, "{value}"),
            (None, Some(name)) if node.expression_type == ExpressionType::VariableRead
                || node.expression_type == ExpressionType::VariableWrite =>
            {
                f.write_str(name)
            }
            (None, name) => {
                f.write_str(name.as_deref().unwrap_or("?"))?;
                f.write_str("(")?;
                for (i, argument) in node.arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", argument.expression())?;
                }
                f.write_str(")")
            }
        }
    }
}
