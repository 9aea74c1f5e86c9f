//! Tree-walking interpreter over a private copy of the input table.
//!
//! Cell semantics:
//! - missing (`Null` or NaN) propagates through arithmetic and primitives
//! - arithmetic on text is a type error
//! - division by zero yields a missing cell
//! - scalar results broadcast to every row on assignment

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tabforge_core::{Column, Table, Value};

use crate::ast::{BinOp, Expr, Primitive, Program, Statement, TableOp};
use crate::ExecutionError;

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"-?\d+(?:[.,]\d+)*").unwrap();
}

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Scalar(Value),
    Column(Vec<Value>),
}

impl Operand {
    fn into_values(self, rows: usize) -> Vec<Value> {
        match self {
            Operand::Scalar(v) => vec![v; rows],
            Operand::Column(values) => values,
        }
    }

    fn map<F>(self, f: F) -> Result<Operand, ExecutionError>
    where
        F: Fn(&Value) -> Result<Value, ExecutionError>,
    {
        match self {
            Operand::Scalar(v) => Ok(Operand::Scalar(f(&v)?)),
            Operand::Column(values) => Ok(Operand::Column(
                values.iter().map(f).collect::<Result<_, _>>()?,
            )),
        }
    }

    fn zip<F>(self, other: Operand, f: F) -> Result<Operand, ExecutionError>
    where
        F: Fn(&Value, &Value) -> Result<Value, ExecutionError>,
    {
        match (self, other) {
            (Operand::Scalar(a), Operand::Scalar(b)) => Ok(Operand::Scalar(f(&a, &b)?)),
            (Operand::Column(a), Operand::Scalar(b)) => Ok(Operand::Column(
                a.iter().map(|x| f(x, &b)).collect::<Result<_, _>>()?,
            )),
            (Operand::Scalar(a), Operand::Column(b)) => Ok(Operand::Column(
                b.iter().map(|y| f(&a, y)).collect::<Result<_, _>>()?,
            )),
            (Operand::Column(a), Operand::Column(b)) => Ok(Operand::Column(
                a.iter().zip(&b).map(|(x, y)| f(x, y)).collect::<Result<_, _>>()?,
            )),
        }
    }
}

pub struct Interpreter {
    table: Table,
    rows: usize,
}

impl Interpreter {
    /// Takes ownership of the working copy; the row count is fixed from here on
    pub fn new(table: Table) -> Self {
        let rows = table.num_rows();
        Self { table, rows }
    }

    pub fn run(mut self, program: &Program) -> Result<Table, ExecutionError> {
        for statement in &program.statements {
            self.apply(statement)?;
        }
        Ok(self.table)
    }

    fn apply(&mut self, statement: &Statement) -> Result<(), ExecutionError> {
        match statement {
            Statement::Assign { column, expr } => {
                let values = self.eval(expr)?.into_values(self.rows);
                self.table.set_column(Column::new(column.clone(), values))?;
            }
            Statement::Rebind(ops) => {
                for op in ops {
                    self.apply_table_op(op)?;
                }
            }
        }
        Ok(())
    }

    fn apply_table_op(&mut self, op: &TableOp) -> Result<(), ExecutionError> {
        match op {
            TableOp::Select(names) => {
                self.table = self.table.select(names).map_err(unknown_column)?;
            }
            TableOp::Drop(names) => self.table.drop_columns(names).map_err(unknown_column)?,
            TableOp::Rename(pairs) => {
                for (from, _) in pairs {
                    if !self.table.has_column(from) {
                        return Err(ExecutionError::UnknownColumn(from.clone()));
                    }
                }
                // simultaneous, so {"a": "b", "b": "a"} swaps
                let renamed = self
                    .table
                    .columns()
                    .iter()
                    .map(|c| {
                        let name = pairs
                            .iter()
                            .find(|(from, _)| *from == c.name)
                            .map(|(_, to)| to.clone())
                            .unwrap_or_else(|| c.name.clone());
                        Column::new(name, c.values.clone())
                    })
                    .collect();
                self.table = Table::from_columns(renamed)?;
            }
            TableOp::FillMissing(fill) => self.table.fill_missing(&number(*fill)),
            TableOp::Copy => {}
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr) -> Result<Operand, ExecutionError> {
        match expr {
            Expr::Number(n) => Ok(Operand::Scalar(number(*n))),
            Expr::Str(s) => Ok(Operand::Scalar(Value::Text(s.clone()))),
            Expr::Column(name) => self
                .table
                .column(name)
                .map(|c| Operand::Column(c.values.clone()))
                .ok_or_else(|| ExecutionError::UnknownColumn(name.clone())),
            Expr::Neg(inner) => self.eval(inner)?.map(|v| arithmetic(BinOp::Sub, &Value::Int(0), v)),
            Expr::Chain { first, rest } => {
                let mut acc = self.eval(first)?;
                for (op, operand) in rest {
                    acc = acc.zip(self.eval(operand)?, |a, b| arithmetic(*op, a, b))?;
                }
                Ok(acc)
            }
            Expr::Call { func, args } => {
                let mut operands = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter();
                let first = operands
                    .next()
                    .ok_or(ExecutionError::Arity { name: func.name(), expected: func.arity(), got: 0 })?;
                match operands.next() {
                    None => call_unary(*func, first),
                    Some(second) => call_binary(*func, first, second),
                }
            }
        }
    }
}

fn unknown_column(err: tabforge_core::TableError) -> ExecutionError {
    match err {
        tabforge_core::TableError::UnknownColumn(name) => ExecutionError::UnknownColumn(name),
        other => ExecutionError::Table(other),
    }
}

/// Integral literals stay integers
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::Int(n as i64)
    } else {
        Value::Float(n)
    }
}

fn numeric(value: &Value, context: &str) -> Result<Option<f64>, ExecutionError> {
    if value.is_missing() {
        return Ok(None);
    }
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| ExecutionError::Type(format!("{} on non-numeric value '{}'", context, value)))
}

fn arithmetic(op: BinOp, a: &Value, b: &Value) -> Result<Value, ExecutionError> {
    let context = match op {
        BinOp::Add => "addition",
        BinOp::Sub => "subtraction",
        BinOp::Mul => "multiplication",
        BinOp::Div => "division",
    };
    let (x, y) = match (numeric(a, context)?, numeric(b, context)?) {
        (Some(x), Some(y)) => (x, y),
        _ => return Ok(Value::Null),
    };

    if let (Value::Int(i), Value::Int(j)) = (a, b) {
        let exact = match op {
            BinOp::Add => i.checked_add(*j),
            BinOp::Sub => i.checked_sub(*j),
            BinOp::Mul => i.checked_mul(*j),
            BinOp::Div => None,
        };
        if let Some(v) = exact {
            return Ok(Value::Int(v));
        }
    }

    let result = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div if y == 0.0 => return Ok(Value::Null),
        BinOp::Div => x / y,
    };
    Ok(Value::Float(result))
}

fn call_unary(func: Primitive, x: Operand) -> Result<Operand, ExecutionError> {
    match func {
        Primitive::Len => x.map(|v| Ok(text_metric(v, |s| s.chars().count()))),
        Primitive::Words => x.map(|v| Ok(text_metric(v, |s| s.split_whitespace().count()))),
        Primitive::NuniqueChars => x.map(|v| {
            Ok(text_metric(v, |s| {
                let mut chars: Vec<char> = s.chars().collect();
                chars.sort_unstable();
                chars.dedup();
                chars.len()
            }))
        }),
        Primitive::Lower => x.map(|v| {
            Ok(match v {
                Value::Text(s) => Value::Text(s.to_lowercase()),
                other => other.clone(),
            })
        }),
        Primitive::Codes => Ok(codes(x)),
        Primitive::Counts => Ok(counts(x)),
        Primitive::ToNumeric => x.map(|v| Ok(to_numeric(v))),
        Primitive::ExtractNumber => x.map(|v| Ok(extract_number(v))),
        Primitive::Int => x.map(to_int),
        Primitive::Abs => x.map(|v| {
            Ok(match v {
                Value::Int(i) => i.checked_abs().map(Value::Int).unwrap_or(Value::Float((*i as f64).abs())),
                other => numeric(other, "abs")?.map(|f| Value::Float(f.abs())).unwrap_or(Value::Null),
            })
        }),
        Primitive::Log1p => x.map(|v| {
            Ok(match numeric(v, "log1p")? {
                Some(f) if f > -1.0 => Value::Float(f.ln_1p()),
                _ => Value::Null,
            })
        }),
        _ => Err(ExecutionError::Arity {
            name: func.name(),
            expected: func.arity(),
            got: 1,
        }),
    }
}

fn call_binary(func: Primitive, x: Operand, y: Operand) -> Result<Operand, ExecutionError> {
    match func {
        Primitive::Contains => {
            let keyword = match &y {
                Operand::Scalar(Value::Text(k)) => k.to_lowercase(),
                _ => return Err(ExecutionError::Type("contains expects a quoted keyword".into())),
            };
            x.map(|v| {
                Ok(match v {
                    Value::Text(s) => Value::Int(i64::from(s.to_lowercase().contains(&keyword))),
                    _ => Value::Int(0),
                })
            })
        }
        Primitive::FillMissing => x.zip(y, |v, fill| {
            Ok(if v.is_missing() { fill.clone() } else { v.clone() })
        }),
        Primitive::Min | Primitive::Max => x.zip(y, |a, b| {
            let name = func.name();
            Ok(match (numeric(a, name)?, numeric(b, name)?) {
                (Some(p), Some(q)) => {
                    let pick_a = if func == Primitive::Min { p <= q } else { p >= q };
                    if pick_a { a.clone() } else { b.clone() }
                }
                _ => Value::Null,
            })
        }),
        _ => Err(ExecutionError::Arity {
            name: func.name(),
            expected: func.arity(),
            got: 2,
        }),
    }
}

fn text_metric(value: &Value, metric: impl Fn(&str) -> usize) -> Value {
    match value {
        Value::Text(s) => Value::Int(metric(s) as i64),
        _ => Value::Null,
    }
}

/// Dense codes in first-seen order; missing cells get -1
fn codes(x: Operand) -> Operand {
    let Operand::Column(values) = x else {
        return Operand::Scalar(Value::Int(0));
    };
    let mut seen: HashMap<String, i64> = HashMap::new();
    let coded = values
        .iter()
        .map(|v| {
            if v.is_missing() {
                return Value::Int(-1);
            }
            let next = seen.len() as i64;
            Value::Int(*seen.entry(v.to_string()).or_insert(next))
        })
        .collect();
    Operand::Column(coded)
}

/// Frequency of each cell's value within its column
fn counts(x: Operand) -> Operand {
    let Operand::Column(values) = x else {
        return Operand::Scalar(Value::Int(1));
    };
    let mut freq: HashMap<String, i64> = HashMap::new();
    for v in values.iter().filter(|v| !v.is_missing()) {
        *freq.entry(v.to_string()).or_insert(0) += 1;
    }
    let counted = values
        .iter()
        .map(|v| {
            if v.is_missing() {
                Value::Null
            } else {
                Value::Int(freq.get(&v.to_string()).copied().unwrap_or(0))
            }
        })
        .collect();
    Operand::Column(counted)
}

fn to_numeric(value: &Value) -> Value {
    match value {
        Value::Int(_) | Value::Float(_) => value.clone(),
        Value::Bool(b) => Value::Int(i64::from(*b)),
        Value::Text(s) => match Value::infer(s.trim()) {
            v @ (Value::Int(_) | Value::Float(_)) => v,
            Value::Bool(b) => Value::Int(i64::from(b)),
            _ => Value::Null,
        },
        Value::Null => Value::Null,
    }
}

/// First number in a text cell; thousands separators are dropped
fn extract_number(value: &Value) -> Value {
    match value {
        Value::Text(s) => NUMBER
            .find(s)
            .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
            .map(Value::Float)
            .unwrap_or(Value::Null),
        Value::Int(_) | Value::Float(_) => value.clone(),
        Value::Bool(b) => Value::Int(i64::from(*b)),
        Value::Null => Value::Null,
    }
}

fn to_int(value: &Value) -> Result<Value, ExecutionError> {
    match to_numeric(value) {
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Float(_) | Value::Null if value.is_missing() => Ok(Value::Null),
        _ => Err(ExecutionError::Type(format!("cannot convert '{}' to int", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn table() -> Table {
        Table::from_columns(vec![
            Column::new("title", vec![text("Data Engineer"), text("Sales"), Value::Null, text("Sales")]),
            Column::new("salary", vec![text("$40,000-60,000"), Value::Null, text("n/a"), text("55000")]),
            Column::new("n", vec![Value::Int(4), Value::Float(0.5), Value::Null, Value::Int(-2)]),
        ])
        .unwrap()
    }

    fn run(source: &str) -> Result<Table, ExecutionError> {
        Interpreter::new(table()).run(&parse_program(source)?)
    }

    fn col(t: &Table, name: &str) -> Vec<Value> {
        t.column(name).unwrap().values.clone()
    }

    #[test]
    fn test_arithmetic_and_broadcast() {
        let out = run("df['x'] = df['n'] * 2 + 1\ndf['k'] = 7\ndf['d'] = df['n'] / 0").unwrap();
        assert_eq!(col(&out, "x"), vec![Value::Int(9), Value::Float(2.0), Value::Null, Value::Int(-3)]);
        assert_eq!(col(&out, "k"), vec![Value::Int(7); 4]);
        assert_eq!(col(&out, "d"), vec![Value::Null; 4]);
    }

    #[test]
    fn test_arithmetic_on_text_fails() {
        assert!(matches!(run("df['x'] = df['title'] + 1"), Err(ExecutionError::Type(_))));
    }

    #[test]
    fn test_text_primitives() {
        let out = run(
            "df['l'] = len(df['title'])\n\
             df['w'] = words(df['title'])\n\
             df['c'] = contains(df['title'], 'ENGINEER')\n\
             df['u'] = nunique_chars(df['title'])",
        )
        .unwrap();
        assert_eq!(col(&out, "l"), vec![Value::Int(13), Value::Int(5), Value::Null, Value::Int(5)]);
        assert_eq!(col(&out, "w")[0], Value::Int(2));
        assert_eq!(col(&out, "c"), vec![Value::Int(1), Value::Int(0), Value::Int(0), Value::Int(0)]);
        assert_eq!(col(&out, "u")[1], Value::Int(5));
    }

    #[test]
    fn test_codes_and_counts() {
        let out = run("df['c'] = codes(df['title'])\ndf['f'] = counts(df['title'])").unwrap();
        assert_eq!(col(&out, "c"), vec![Value::Int(0), Value::Int(1), Value::Int(-1), Value::Int(1)]);
        assert_eq!(col(&out, "f"), vec![Value::Int(1), Value::Int(2), Value::Null, Value::Int(2)]);
    }

    #[test]
    fn test_numeric_conversions() {
        let out = run(
            "df['a'] = fillna(extract_number(df['salary']), 0)\n\
             df['b'] = to_numeric(df['salary'])\n\
             df['i'] = int(df['n'])",
        )
        .unwrap();
        assert_eq!(col(&out, "a"), vec![Value::Float(40000.0), Value::Int(0), Value::Int(0), Value::Float(55000.0)]);
        assert_eq!(col(&out, "b"), vec![Value::Null, Value::Null, Value::Null, Value::Int(55000)]);
        assert_eq!(col(&out, "i"), vec![Value::Int(4), Value::Int(0), Value::Null, Value::Int(-2)]);
        assert!(matches!(run("df['i'] = int(df['title'])"), Err(ExecutionError::Type(_))));
    }

    #[test]
    fn test_table_ops() {
        let out = run(
            "df = df.rename({'title': 'job', 'n': 'title'})\n\
             df = df[['title', 'job']].fillna(-1)",
        )
        .unwrap();
        assert_eq!(out.column_names(), vec!["title", "job"]);
        assert_eq!(col(&out, "title")[2], Value::Int(-1));
        assert_eq!(col(&out, "job")[0], text("Data Engineer"));
    }

    #[test]
    fn test_unknown_column() {
        assert!(matches!(run("df['x'] = df['missing']"), Err(ExecutionError::UnknownColumn(c)) if c == "missing"));
        assert!(matches!(run("df = df.drop(['missing'])"), Err(ExecutionError::UnknownColumn(_))));
        assert!(matches!(run("df = df[['missing']]"), Err(ExecutionError::UnknownColumn(_))));
    }

    #[test]
    fn test_row_count_survives_empty_projection() {
        let out = run("df = df.drop(['title', 'salary', 'n'])\ndf['z'] = 0").unwrap();
        assert_eq!(out.num_rows(), 4);
    }

    #[test]
    fn test_min_max_abs_log() {
        let out = run(
            "df['m'] = max(df['n'], 1)\ndf['a'] = abs(df['n'])\ndf['g'] = log1p(df['n'])",
        )
        .unwrap();
        assert_eq!(col(&out, "m"), vec![Value::Int(4), Value::Int(1), Value::Null, Value::Int(1)]);
        assert_eq!(col(&out, "a")[3], Value::Int(2));
        assert_eq!(col(&out, "g")[3], Value::Null);
    }
}
