//! Pest parser: program text into [`Program`].

use pest::iterators::{Pair, Pairs};
use pest::Parser;

use crate::ast::{BinOp, Expr, Primitive, Program, Statement, TableOp};
use crate::ExecutionError;

#[derive(pest_derive::Parser)]
#[grammar = "dsl.pest"] // relative to src/
pub struct DslParser;

/// Widest `"V1".."V28"` style range a program may spell out
pub const MAX_RANGE_LEN: u64 = 1024;

/// Deepest expression nesting accepted, counting brackets and method calls
pub const MAX_EXPR_DEPTH: usize = 128;

pub fn parse_program(source: &str) -> Result<Program, ExecutionError> {
    check_bracket_depth(source)?;
    let mut pairs = DslParser::parse(Rule::program, source)
        .map_err(|e| ExecutionError::Parse(e.to_string()))?;
    let program = next(&mut pairs, "program")?;

    let mut statements = Vec::new();
    for pair in program.into_inner() {
        match pair.as_rule() {
            Rule::column_assign => statements.push(build_column_assign(pair)?),
            Rule::table_assign => statements.push(build_table_assign(pair)?),
            Rule::EOI => {}
            rule => return Err(unexpected(rule, "statement")),
        }
    }
    Ok(Program { statements })
}

/// Rejects deep bracket nesting before the recursive descent parser sees it.
/// String literals and comments do not count.
fn check_bracket_depth(source: &str) -> Result<(), ExecutionError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) => match c {
                '\\' => {
                    chars.next();
                }
                c if c == q => quote = None,
                _ => {}
            },
            None => match c {
                '"' | '\'' => quote = Some(c),
                '#' => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    if depth > MAX_EXPR_DEPTH {
                        return Err(ExecutionError::TooDeep { limit: MAX_EXPR_DEPTH });
                    }
                }
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            },
        }
    }
    Ok(())
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>, what: &str) -> Result<Pair<'i, Rule>, ExecutionError> {
    pairs
        .next()
        .ok_or_else(|| ExecutionError::Parse(format!("missing {}", what)))
}

fn unexpected(rule: Rule, expected: &str) -> ExecutionError {
    ExecutionError::Parse(format!("expected {}, found {:?}", expected, rule))
}

fn build_column_assign(pair: Pair<Rule>) -> Result<Statement, ExecutionError> {
    let mut inner = pair.into_inner();
    let column = build_column_ref(next(&mut inner, "column")?)?;
    let expr = build_expr(next(&mut inner, "expression")?, 0)?;
    Ok(Statement::Assign { column, expr })
}

fn build_table_assign(pair: Pair<Rule>) -> Result<Statement, ExecutionError> {
    let table_expr = next(&mut pair.into_inner(), "table expression")?;
    let ops = table_expr
        .into_inner()
        .map(build_table_op)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Statement::Rebind(ops))
}

fn build_table_op(pair: Pair<Rule>) -> Result<TableOp, ExecutionError> {
    match pair.as_rule() {
        Rule::projection | Rule::select_op => {
            let list = next(&mut pair.into_inner(), "column list")?;
            Ok(TableOp::Select(build_name_list(list)?))
        }
        Rule::drop_op => {
            let list = next(&mut pair.into_inner(), "column list")?;
            Ok(TableOp::Drop(build_name_list(list)?))
        }
        Rule::rename_op => {
            let pairs = pair
                .into_inner()
                .map(|rename| {
                    let mut inner = rename.into_inner();
                    let from = build_string(next(&mut inner, "old name")?)?;
                    let to = build_string(next(&mut inner, "new name")?)?;
                    Ok((from, to))
                })
                .collect::<Result<Vec<_>, ExecutionError>>()?;
            Ok(TableOp::Rename(pairs))
        }
        Rule::fillna_op => {
            let number = next(&mut pair.into_inner(), "fill value")?;
            Ok(TableOp::FillMissing(parse_number(number.as_str())?))
        }
        Rule::copy_op => Ok(TableOp::Copy),
        rule => Err(unexpected(rule, "table operation")),
    }
}

fn build_name_list(pair: Pair<Rule>) -> Result<Vec<String>, ExecutionError> {
    let mut names = Vec::new();
    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::string => names.push(build_string(item)?),
            Rule::name_range => {
                let mut inner = item.into_inner();
                let start = build_string(next(&mut inner, "range start")?)?;
                let end = build_string(next(&mut inner, "range end")?)?;
                names.extend(expand_range(&start, &end)?);
            }
            rule => return Err(unexpected(rule, "column name")),
        }
    }
    Ok(names)
}

/// `"V1".."V3"` → `V1, V2, V3`
pub(crate) fn expand_range(start: &str, end: &str) -> Result<Vec<String>, ExecutionError> {
    let bad = || ExecutionError::Parse(format!("invalid column range \"{}\"..\"{}\"", start, end));
    let (prefix_a, from) = split_numeric_suffix(start).ok_or_else(bad)?;
    let (prefix_b, to) = split_numeric_suffix(end).ok_or_else(bad)?;
    if prefix_a != prefix_b || from > to || to - from >= MAX_RANGE_LEN {
        return Err(bad());
    }
    Ok((from..=to).map(|i| format!("{}{}", prefix_a, i)).collect())
}

fn split_numeric_suffix(name: &str) -> Option<(&str, u64)> {
    let digits_at = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    let (prefix, digits) = name.split_at(digits_at);
    digits.parse().ok().map(|n| (prefix, n))
}

fn build_column_ref(pair: Pair<Rule>) -> Result<String, ExecutionError> {
    build_string(next(&mut pair.into_inner(), "column name")?)
}

fn build_string(pair: Pair<Rule>) -> Result<String, ExecutionError> {
    let inner = next(&mut pair.into_inner(), "string body")?;
    Ok(unescape(inner.as_str()))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_number(text: &str) -> Result<f64, ExecutionError> {
    text.parse()
        .map_err(|_| ExecutionError::Parse(format!("invalid number '{}'", text)))
}

/// `depth` counts enclosing expressions; every method call adds one more.
fn build_expr(pair: Pair<Rule>, depth: usize) -> Result<Expr, ExecutionError> {
    match pair.as_rule() {
        Rule::expr | Rule::term => {
            let depth = depth + usize::from(pair.as_rule() == Rule::expr);
            if depth > MAX_EXPR_DEPTH {
                return Err(ExecutionError::TooDeep { limit: MAX_EXPR_DEPTH });
            }
            let mut inner = pair.into_inner();
            let first = build_expr(next(&mut inner, "operand")?, depth)?;
            let mut rest = Vec::new();
            while let Some(op) = inner.next() {
                let op = match op.as_str() {
                    "+" => BinOp::Add,
                    "-" => BinOp::Sub,
                    "*" => BinOp::Mul,
                    "/" => BinOp::Div,
                    other => return Err(ExecutionError::Parse(format!("unknown operator '{}'", other))),
                };
                rest.push((op, build_expr(next(&mut inner, "operand")?, depth)?));
            }
            if rest.is_empty() {
                Ok(first)
            } else {
                Ok(Expr::Chain {
                    first: Box::new(first),
                    rest,
                })
            }
        }
        Rule::factor => {
            let mut inner = pair.into_inner();
            let first = next(&mut inner, "operand")?;
            if first.as_rule() == Rule::neg {
                let operand = build_expr(next(&mut inner, "operand")?, depth)?;
                Ok(Expr::Neg(Box::new(operand)))
            } else {
                build_expr(first, depth)
            }
        }
        Rule::postfix => {
            let mut inner = pair.into_inner();
            let mut expr = build_expr(next(&mut inner, "operand")?, depth)?;
            let mut depth = depth;
            for method in inner {
                depth += 1;
                if depth > MAX_EXPR_DEPTH {
                    return Err(ExecutionError::TooDeep { limit: MAX_EXPR_DEPTH });
                }
                expr = apply_method(expr, method, depth)?;
            }
            Ok(expr)
        }
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = next(&mut inner, "function name")?.as_str().to_string();
            let args = build_args(next(&mut inner, "arguments")?, depth)?;
            build_call(&name, args)
        }
        Rule::number => Ok(Expr::Number(parse_number(pair.as_str())?)),
        Rule::string => Ok(Expr::Str(build_string(pair)?)),
        Rule::column_ref => Ok(Expr::Column(build_column_ref(pair)?)),
        rule => Err(unexpected(rule, "expression")),
    }
}

/// `x.f(a)` is `f(x, a)`; a bare `.str` accessor is transparent
fn apply_method(receiver: Expr, method: Pair<Rule>, depth: usize) -> Result<Expr, ExecutionError> {
    let mut inner = method.into_inner();
    let name = next(&mut inner, "method name")?.as_str().to_string();
    match inner.next() {
        Some(args) => {
            let mut all = vec![receiver];
            all.extend(build_args(args, depth)?);
            build_call(&name, all)
        }
        None if name == "str" => Ok(receiver),
        None => Err(ExecutionError::Parse(format!("unsupported attribute '.{}'", name))),
    }
}

fn build_args(pair: Pair<Rule>, depth: usize) -> Result<Vec<Expr>, ExecutionError> {
    pair.into_inner().map(|arg| build_expr(arg, depth)).collect()
}

fn build_call(name: &str, args: Vec<Expr>) -> Result<Expr, ExecutionError> {
    let func =
        Primitive::from_name(name).ok_or_else(|| ExecutionError::UnknownPrimitive(name.to_string()))?;
    if args.len() != func.arity() {
        return Err(ExecutionError::Arity {
            name: func.name(),
            expected: func.arity(),
            got: args.len(),
        });
    }
    Ok(Expr::Call { func, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignments_and_rebinds() {
        let program = parse_program(
            "# build features\n\
             df[\"V1\"] = len(df['description'])\n\
             df = df.rename(columns={\"a\": \"b\"}).drop(['c']); df = df.fillna(0)\n",
        )
        .unwrap();
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(
            &program.statements[0],
            Statement::Assign { column, expr: Expr::Call { func: Primitive::Len, .. } } if column == "V1"
        ));
        assert_eq!(
            program.statements[1],
            Statement::Rebind(vec![
                TableOp::Rename(vec![("a".into(), "b".into())]),
                TableOp::Drop(vec!["c".into()]),
            ])
        );
        assert_eq!(program.statements[2], Statement::Rebind(vec![TableOp::FillMissing(0.0)]));
    }

    #[test]
    fn test_precedence() {
        let program = parse_program("df[\"x\"] = 1 + 2 * -df[\"y\"]").unwrap();
        let Statement::Assign { expr, .. } = &program.statements[0] else {
            panic!("expected assignment");
        };
        let expected = Expr::Chain {
            first: Box::new(Expr::Number(1.0)),
            rest: vec![(
                BinOp::Add,
                Expr::Chain {
                    first: Box::new(Expr::Number(2.0)),
                    rest: vec![(BinOp::Mul, Expr::Neg(Box::new(Expr::Column("y".into()))))],
                },
            )],
        };
        assert_eq!(expr, &expected);
    }

    #[test]
    fn test_flat_chain_stays_shallow() {
        let source = format!("df[\"x\"] = 1{}", " - 1".repeat(500));
        let program = parse_program(&source).unwrap();
        let Statement::Assign { expr: Expr::Chain { rest, .. }, .. } = &program.statements[0] else {
            panic!("expected chain");
        };
        assert_eq!(rest.len(), 500);
        assert!(rest.iter().all(|(op, e)| *op == BinOp::Sub && *e == Expr::Number(1.0)));
    }

    #[test]
    fn test_depth_limit() {
        let ok = format!("df[\"x\"] = df[\"x\"]{}", ".abs()".repeat(MAX_EXPR_DEPTH - 1));
        assert!(parse_program(&ok).is_ok());

        let methods = format!("df[\"x\"] = df[\"x\"]{}", ".abs()".repeat(MAX_EXPR_DEPTH + 1));
        assert_eq!(
            parse_program(&methods),
            Err(ExecutionError::TooDeep { limit: MAX_EXPR_DEPTH })
        );

        let n = MAX_EXPR_DEPTH + 1;
        let parens = format!("df[\"x\"] = {}1{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(
            parse_program(&parens),
            Err(ExecutionError::TooDeep { limit: MAX_EXPR_DEPTH })
        );

        // brackets inside strings and comments are not nesting
        let quoted = format!("# {}\ndf[\"x\"] = contains(df[\"t\"], \"{}\")", "(".repeat(n), "[".repeat(n));
        assert!(parse_program(&quoted).is_ok());
    }

    #[test]
    fn test_method_sugar() {
        let program = parse_program("df['n'] = df['t'].str.len()\ndf['f'] = df['a'].fillna(0)").unwrap();
        let Statement::Assign { expr, .. } = &program.statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            expr,
            &Expr::Call { func: Primitive::Len, args: vec![Expr::Column("t".into())] }
        );
        assert!(matches!(
            &program.statements[1],
            Statement::Assign { expr: Expr::Call { func: Primitive::FillMissing, args }, .. } if args.len() == 2
        ));
    }

    #[test]
    fn test_projection_with_range() {
        let program = parse_program("df = df[[\"V1\"..\"V3\", \"Amount\"]]").unwrap();
        assert_eq!(
            program.statements[0],
            Statement::Rebind(vec![TableOp::Select(vec![
                "V1".into(),
                "V2".into(),
                "V3".into(),
                "Amount".into()
            ])])
        );
    }

    #[test]
    fn test_range_errors() {
        assert!(expand_range("V3", "V1").is_err());
        assert!(expand_range("V1", "W2").is_err());
        assert!(expand_range("V", "V2").is_err());
        assert!(expand_range("V1", "V5000").is_err());
        assert_eq!(expand_range("f09", "f10").unwrap(), vec!["f9", "f10"]);
    }

    #[test]
    fn test_rejects_foreign_code() {
        for source in [
            "import os",
            "df['a'] = open('/etc/passwd')",
            "df.to_csv('out.csv')",
            "df['a'] = df['b'].astype(int)",
            "df['a'] = __import__('os')",
        ] {
            assert!(parse_program(source).is_err(), "{source}");
        }
    }

    #[test]
    fn test_unknown_primitive_and_arity() {
        assert!(matches!(
            parse_program("df['a'] = eval('1')"),
            Err(ExecutionError::UnknownPrimitive(name)) if name == "eval"
        ));
        assert!(matches!(
            parse_program("df['a'] = contains(df['b'])"),
            Err(ExecutionError::Arity { name: "contains", expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_empty_program() {
        assert!(parse_program("  \n# nothing\n").unwrap().statements.is_empty());
    }
}
