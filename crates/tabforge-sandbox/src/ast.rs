//! Parsed form of a transformation program.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    /// `df["name"] = expr`
    Assign { column: String, expr: Expr },
    /// `df = df<ops>`, applied left to right
    Rebind(Vec<TableOp>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableOp {
    Select(Vec<String>),
    Rename(Vec<(String, String)>),
    Drop(Vec<String>),
    FillMissing(f64),
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Number(f64),
    Str(String),
    Column(String),
    Neg(Box<Expr>),
    /// Left-associative run of same-precedence operators: `first op e op e ...`
    Chain {
        first: Box<Expr>,
        rest: Vec<(BinOp, Expr)>,
    },
    Call {
        func: Primitive,
        args: Vec<Expr>,
    },
}

/// The only functions a program can call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Primitive {
    Len,
    Words,
    NuniqueChars,
    Contains,
    Lower,
    Codes,
    Counts,
    ToNumeric,
    ExtractNumber,
    Int,
    FillMissing,
    Abs,
    Log1p,
    Min,
    Max,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "len" => Primitive::Len,
            "words" => Primitive::Words,
            "nunique_chars" => Primitive::NuniqueChars,
            "contains" => Primitive::Contains,
            "lower" => Primitive::Lower,
            "codes" => Primitive::Codes,
            "counts" => Primitive::Counts,
            "to_numeric" => Primitive::ToNumeric,
            "extract_number" => Primitive::ExtractNumber,
            "int" => Primitive::Int,
            "fillna" => Primitive::FillMissing,
            "abs" => Primitive::Abs,
            "log1p" => Primitive::Log1p,
            "min" => Primitive::Min,
            "max" => Primitive::Max,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Len => "len",
            Primitive::Words => "words",
            Primitive::NuniqueChars => "nunique_chars",
            Primitive::Contains => "contains",
            Primitive::Lower => "lower",
            Primitive::Codes => "codes",
            Primitive::Counts => "counts",
            Primitive::ToNumeric => "to_numeric",
            Primitive::ExtractNumber => "extract_number",
            Primitive::Int => "int",
            Primitive::FillMissing => "fillna",
            Primitive::Abs => "abs",
            Primitive::Log1p => "log1p",
            Primitive::Min => "min",
            Primitive::Max => "max",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Primitive::Contains | Primitive::FillMissing | Primitive::Min | Primitive::Max => 2,
            _ => 1,
        }
    }
}
