//! Human-readable rendering of expression trees
//!
//! Output is deterministic and used in log fields, error messages and
//! expansion reports.

use std::fmt;

use super::builtins::SEQUENCE;
use super::node::{Expr, Lambda, UnaryOp};
use super::value::Value;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Lambda(l) => write!(f, "value({})", l),
            Value::Object(o) => write!(f, "value({})", o.type_name),
            Value::Collection { name, .. } => write!(f, "{}", name),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[std::sync::Arc<Expr>]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params.as_slice() {
            [single] => write!(f, "{} => {}", single.name, self.body),
            params => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p.name)?;
                }
                write!(f, ") => {}", self.body)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant { value, .. } => write!(f, "{}", value),
            Expr::Parameter(p) => write!(f, "{}", p.name),
            Expr::Member { target, member } => match target {
                Some(t) => write!(f, "{}.{}", t, member.name),
                None => write!(f, "{}.{}", member.declaring, member.name),
            },
            Expr::Call {
                target,
                method,
                args,
            } => {
                let generics = if method.generic_args.is_empty() {
                    String::new()
                } else {
                    let names: Vec<String> =
                        method.generic_args.iter().map(|t| t.to_string()).collect();
                    format!("<{}>", names.join(", "))
                };
                match target {
                    Some(t) => {
                        write!(f, "{}.{}{}(", t, method.name, generics)?;
                        write_list(f, args)?;
                        write!(f, ")")
                    }
                    // Extension style for sequence operators
                    None if method.declaring == SEQUENCE && !args.is_empty() => {
                        write!(f, "{}.{}{}(", args[0], method.name, generics)?;
                        write_list(f, &args[1..])?;
                        write!(f, ")")
                    }
                    None if method.host.is_none() && args.len() == 1 => {
                        write!(f, "{}.{}()", args[0], method.name)
                    }
                    None => {
                        write!(f, "{}.{}{}(", method.declaring, method.name, generics)?;
                        write_list(f, args)?;
                        write!(f, ")")
                    }
                }
            }
            Expr::Lambda(l) => write!(f, "{}", l),
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Unary { op, operand, ty } => match op {
                UnaryOp::Not => write!(f, "!{}", operand),
                UnaryOp::Negate => write!(f, "-{}", operand),
                UnaryOp::Convert => write!(f, "({}){}", ty, operand),
            },
            Expr::Conditional {
                test,
                then,
                otherwise,
                ..
            } => write!(f, "({} ? {} : {})", test, then, otherwise),
            Expr::New { ctor, args } => {
                write!(f, "new {{ ")?;
                for (i, (name, arg)) in ctor.members.iter().zip(args.iter()).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", name, arg)?;
                }
                write!(f, " }}")
            }
        }
    }
}
