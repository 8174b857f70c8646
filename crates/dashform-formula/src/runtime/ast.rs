//! Script expression AST

/// Expression in the translated script dialect
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal (`True`, `false`, ...)
    Boolean(bool),
    /// `null` / `None`
    Null,
    /// Array literal `[a, b, c]`
    Array(Vec<ScriptExpr>),

    /// Bare name that is not a literal or a call
    Identifier(String),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<ScriptExpr>,
        right: Box<ScriptExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<ScriptExpr>,
    },
    /// `then if condition else otherwise` / `condition ? then : otherwise`
    Conditional {
        condition: Box<ScriptExpr>,
        then: Box<ScriptExpr>,
        otherwise: Box<ScriptExpr>,
    },

    // === Function call ===
    Call { name: String, args: Vec<ScriptExpr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // Text
    Concat,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Logical (short-circuit)
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}
