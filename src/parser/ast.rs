use serde::Serialize;

use crate::errors::Span;

/// A statement node. Every node carries the span of the tokens it consumed;
/// nodes synthesized by desugaring reuse the spans of the surface tokens
/// they came from, so diagnostics keep pointing at real source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    /// Variable or function definition. Named functions are immutable
    /// definitions whose initializer is a function expression; `attrs` is
    /// always present, empty when no attributes were written.
    Def {
        name: String,
        ty: Option<TypeAnn>,
        init: Expr,
        mutable: bool,
        attrs: Vec<Attr>,
    },
    Return(Expr),
    Break,
    Continue,
    /// The only primitive loop. `while` and `do..while` lower onto this.
    Loop { body: Vec<Stmt> },
    /// Only synthesized while lowering `while`/`do..while`; the surface
    /// language has no statement-level `if`.
    If {
        cond: Expr,
        then: Box<Stmt>,
        else_ifs: Vec<(Expr, Stmt)>,
    },
    Each {
        var: String,
        source: Expr,
        body: Box<Stmt>,
    },
    For {
        target: ForTarget,
        body: Box<Stmt>,
    },
    Assign {
        op: AssignOp,
        dest: Expr,
        src: Expr,
    },
    Expr(Expr),
    Block(Vec<Stmt>),
}

/// The two mutually exclusive shapes of a `for` loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ForTarget {
    Range { var: String, from: Expr, to: Expr },
    Times(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

/// An `#[name value]` attribute collected ahead of a definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attr {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Num(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        target: Box<Expr>,
        name: String,
    },
    List(Vec<Expr>),
    Fn {
        params: Vec<Param>,
        ret: Option<TypeAnn>,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeAnn>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAnn {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeKind {
    Named(String),
    Array(Box<TypeAnn>),
}
