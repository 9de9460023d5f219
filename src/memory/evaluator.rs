//! Tree evaluation over JSON rows
//!
//! Interprets a translated tree against a [`Dataset`]. Missing fields read
//! as `null`. Numbers compare as `f64`; integer arithmetic stays integral.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value as Json};

use crate::provider::{QueryError, QueryResult};
use crate::tree::{BinaryOp, Builtin, Expr, Lambda, ParamId, TypeRef, UnaryOp};

use super::dataset::Dataset;

/// Evaluates trees against a dataset
pub struct Evaluator<'d> {
    dataset: &'d Dataset,
    env: Vec<(ParamId, Json)>,
}

impl<'d> Evaluator<'d> {
    pub fn new(dataset: &'d Dataset) -> Self {
        Self {
            dataset,
            env: Vec::new(),
        }
    }

    /// Evaluates a query; a sequence yields its rows, a scalar one row
    pub fn run(mut self, tree: &Expr) -> QueryResult<Vec<Json>> {
        match self.eval(tree)? {
            Json::Array(rows) => Ok(rows),
            scalar => Ok(vec![scalar]),
        }
    }

    fn eval(&mut self, node: &Expr) -> QueryResult<Json> {
        match node {
            Expr::Constant { value, .. } => match value {
                crate::tree::Value::Collection { name, .. } => {
                    Ok(Json::Array(self.dataset.rows(name)?.to_vec()))
                }
                other => other.to_json().ok_or_else(|| {
                    QueryError::Execution(format!("Constant '{}' cannot be evaluated", other))
                }),
            },
            Expr::Parameter(p) => self
                .env
                .iter()
                .rev()
                .find(|(id, _)| *id == p.id)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| QueryError::Execution(format!("Parameter '{}' is not bound", p.name))),
            Expr::Member { target, member } => {
                let Some(target) = target else {
                    return Err(QueryError::Execution(format!(
                        "Static member '{}' cannot be evaluated",
                        member.name
                    )));
                };
                Ok(self.eval(target)?.get(&member.name).cloned().unwrap_or(Json::Null))
            }
            Expr::Call { method, args, .. } => {
                let op = Builtin::from_method(method).ok_or_else(|| {
                    QueryError::Execution(format!("Method '{}' is not supported", method.name))
                })?;
                self.call(op, args)
            }
            Expr::Lambda(_) => Err(QueryError::Execution(
                "Lambda outside an operator argument".into(),
            )),
            Expr::Binary {
                op, left, right, ..
            } => self.binary(*op, left, right),
            Expr::Unary { op, operand, ty } => {
                let value = self.eval(operand)?;
                unary(*op, value, ty)
            }
            Expr::Conditional {
                test,
                then,
                otherwise,
                ..
            } => match self.eval(test)? {
                Json::Bool(true) => self.eval(then),
                Json::Bool(false) => self.eval(otherwise),
                other => Err(QueryError::Execution(format!(
                    "Condition evaluated to {}",
                    other
                ))),
            },
            Expr::New { ctor, args } => {
                let mut record = Map::new();
                for (name, arg) in ctor.members.iter().zip(args) {
                    record.insert(name.clone(), self.eval(arg)?);
                }
                Ok(Json::Object(record))
            }
        }
    }

    fn apply(&mut self, lambda: &Lambda, row: Json) -> QueryResult<Json> {
        let Some(param) = lambda.params.first() else {
            return Err(QueryError::Execution("Lambda without parameter".into()));
        };
        self.env.push((param.id, row));
        let result = self.eval(&lambda.body);
        self.env.pop();
        result
    }

    fn sequence(&mut self, source: &Expr) -> QueryResult<Vec<Json>> {
        match self.eval(source)? {
            Json::Array(rows) => Ok(rows),
            // Missing navigation collections behave as empty
            Json::Null => Ok(Vec::new()),
            other => Err(QueryError::Execution(format!("{} is not a sequence", other))),
        }
    }

    fn call(&mut self, op: Builtin, args: &[std::sync::Arc<Expr>]) -> QueryResult<Json> {
        let lambda = || {
            args.get(1).and_then(|a| a.as_lambda()).ok_or_else(|| {
                QueryError::Execution(format!("'{}' expects a lambda argument", op.name()))
            })
        };
        let source = args
            .first()
            .ok_or_else(|| QueryError::Execution(format!("'{}' has no source", op.name())))?;

        match op {
            Builtin::Where => {
                let predicate = lambda()?;
                let mut kept = Vec::new();
                for row in self.sequence(source)? {
                    if self.apply(predicate, row.clone())? == Json::Bool(true) {
                        kept.push(row);
                    }
                }
                Ok(Json::Array(kept))
            }
            Builtin::Select => {
                let selector = lambda()?;
                let rows = self.sequence(source)?;
                let mapped = rows
                    .into_iter()
                    .map(|row| self.apply(selector, row))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(Json::Array(mapped))
            }
            Builtin::Average | Builtin::Sum => {
                let selector = lambda()?;
                let rows = self.sequence(source)?;
                let values = rows
                    .into_iter()
                    .map(|row| self.apply(selector, row))
                    .collect::<QueryResult<Vec<_>>>()?;
                if op == Builtin::Sum {
                    sum_of(&values)
                } else {
                    average_of(&values)
                }
            }
            Builtin::Count => Ok(Json::from(self.sequence(source)?.len() as u64)),
            Builtin::OrderBy | Builtin::OrderByDescending => {
                let key = lambda()?;
                let rows = self.sequence(source)?;
                let mut keyed = rows
                    .into_iter()
                    .map(|row| -> QueryResult<(Json, Json)> {
                        Ok((self.apply(key, row.clone())?, row))
                    })
                    .collect::<QueryResult<Vec<_>>>()?;
                keyed.sort_by(|(a, _), (b, _)| {
                    let ordering = compare_values(a, b);
                    if op == Builtin::OrderByDescending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                });
                Ok(Json::Array(keyed.into_iter().map(|(_, row)| row).collect()))
            }
            Builtin::ToString => {
                let value = self.eval(source)?;
                Ok(Json::String(render(&value)))
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> QueryResult<Json> {
        match op {
            // Short-circuit before evaluating the right side
            BinaryOp::AndAlso | BinaryOp::OrElse => {
                let l = expect_bool(self.eval(left)?)?;
                if l == (op == BinaryOp::OrElse) {
                    return Ok(Json::Bool(l));
                }
                Ok(Json::Bool(expect_bool(self.eval(right)?)?))
            }
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                if op == BinaryOp::Add && (l.is_string() || r.is_string()) {
                    return Ok(Json::String(format!("{}{}", render(&l), render(&r))));
                }
                arithmetic(op, &l, &r)
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                let equal = values_equal(&self.eval(left)?, &self.eval(right)?);
                Ok(Json::Bool(equal == (op == BinaryOp::Equal)))
            }
            _ => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                // Null never satisfies an ordering comparison
                if l.is_null() || r.is_null() {
                    return Ok(Json::Bool(false));
                }
                let ordering = compare_values(&l, &r);
                Ok(Json::Bool(match op {
                    BinaryOp::LessThan => ordering == Ordering::Less,
                    BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
                    BinaryOp::GreaterThan => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }))
            }
        }
    }
}

fn expect_bool(value: Json) -> QueryResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| QueryError::Execution(format!("Expected a boolean, found {}", value)))
}

fn unary(op: UnaryOp, value: Json, ty: &TypeRef) -> QueryResult<Json> {
    match op {
        UnaryOp::Not => Ok(Json::Bool(!expect_bool(value)?)),
        UnaryOp::Negate => {
            if let Some(i) = value.as_i64().and_then(i64::checked_neg) {
                return Ok(Json::from(i));
            }
            match value.as_f64() {
                Some(f) => float(-f),
                None => Err(QueryError::Execution(format!("Cannot negate {}", value))),
            }
        }
        UnaryOp::Convert => match (ty, value.as_f64()) {
            (TypeRef::Double, Some(f)) => float(f),
            (TypeRef::Int, Some(f)) if !value.is_i64() => Ok(Json::from(f.trunc() as i64)),
            (TypeRef::String, _) => Ok(Json::String(render(&value))),
            _ => Ok(value),
        },
    }
}

fn float(f: f64) -> QueryResult<Json> {
    Number::from_f64(f)
        .map(Json::Number)
        .ok_or_else(|| QueryError::Execution(format!("{} is not a finite number", f)))
}

fn arithmetic(op: BinaryOp, l: &Json, r: &Json) -> QueryResult<Json> {
    if let (Some(a), Some(b)) = (l.as_i64(), r.as_i64()) {
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Subtract => a.checked_sub(b),
            BinaryOp::Multiply => a.checked_mul(b),
            _ => a.checked_div(b),
        };
        return result.map(Json::from).ok_or_else(|| {
            QueryError::Execution(format!(
                "Integer overflow or division by zero: {} {} {}",
                a,
                op.symbol(),
                b
            ))
        });
    }
    match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => float(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            _ => a / b,
        }),
        _ => Err(QueryError::Execution(format!(
            "Cannot apply '{}' to {} and {}",
            op.symbol(),
            l,
            r
        ))),
    }
}

fn sum_of(values: &[Json]) -> QueryResult<Json> {
    if values.iter().all(|v| v.is_i64()) {
        let total = values
            .iter()
            .filter_map(Json::as_i64)
            .try_fold(0i64, i64::checked_add)
            .ok_or_else(|| QueryError::Execution("Integer overflow in Sum".into()))?;
        return Ok(Json::from(total));
    }
    float(numbers(values)?.iter().sum())
}

/// Average of an empty sequence is `null`
fn average_of(values: &[Json]) -> QueryResult<Json> {
    if values.is_empty() {
        return Ok(Json::Null);
    }
    let numbers = numbers(values)?;
    float(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

fn numbers(values: &[Json]) -> QueryResult<Vec<f64>> {
    values
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| QueryError::Execution(format!("{} is not a number", v)))
        })
        .collect()
}

/// Numbers are equal by value regardless of representation
fn values_equal(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object
pub(crate) fn compare_values(a: &Json, b: &Json) -> Ordering {
    let rank = |v: &Json| -> u8 {
        match v {
            Json::Null => 0,
            Json::Bool(_) => 1,
            Json::Number(_) => 2,
            Json::String(_) => 3,
            Json::Array(_) => 4,
            Json::Object(_) => 5,
        }
    };

    match (a, b) {
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        (Json::Number(x), Json::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Json::String(x), Json::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Text form used by `ToString` and string concatenation
fn render(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}
