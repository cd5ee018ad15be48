//! The registry of builtin operators, functions, and constants —
//! the initial population every fresh `Engine` starts with.

use crate::environment::Environment;
use crate::error::{EngineError, EngineResult};
use crate::value::{determine_result_type, Value, ValueKind};

fn as_int(v: &Value) -> EngineResult<i32> {
    match v {
        Value::Integer(i) => Ok(*i),
        other => Err(EngineError::fatal(format!(
            "expected INTEGER, found {:?}",
            other
        ))),
    }
}

fn type_error<T>(op: &str, l: &Value, r: &Value) -> EngineResult<T> {
    Err(EngineError::syntax(format!(
        "operator '{op}' not supported between {} and {}",
        l.type_name(),
        r.type_name()
    )))
}

fn empty_compare(op: &str, l: &Value, r: &Value) -> Option<EngineResult<Value>> {
    match (l, r) {
        (Value::Empty, Value::Empty) => Some(Ok(Value::Boolean(matches!(op, "=" | "<=")))),
        (Value::Empty, _) | (_, Value::Empty) => Some(Err(EngineError::syntax(format!(
            "cannot compare EMPTY to {}",
            if matches!(l, Value::Empty) { r.type_name() } else { l.type_name() }
        )))),
        _ => None,
    }
}

macro_rules! arithmetic_op {
    ($name:ident, $symbol:literal, $int_op:expr, $real_op:expr) => {
        pub fn $name(l: &Value, r: &Value) -> EngineResult<Value> {
            match determine_result_type(l, r) {
                ValueKind::Integer => {
                    let (a, b) = (as_int(l)?, as_int(r)?);
                    $int_op(a, b)
                }
                ValueKind::Real => {
                    let (a, b) = (l.to_numeric()?, r.to_numeric()?);
                    Ok(Value::Real($real_op(a, b)))
                }
                _ => type_error($symbol, l, r),
            }
        }
    };
}

arithmetic_op!(op_add_numeric, "+", |a: i32, b: i32| Ok(Value::Integer(a.wrapping_add(b))), |a: f64, b: f64| a + b);
arithmetic_op!(op_sub, "-", |a: i32, b: i32| Ok(Value::Integer(a.wrapping_sub(b))), |a: f64, b: f64| a - b);
arithmetic_op!(op_mul, "*", |a: i32, b: i32| Ok(Value::Integer(a.wrapping_mul(b))), |a: f64, b: f64| a * b);

pub fn op_add(l: &Value, r: &Value) -> EngineResult<Value> {
    if determine_result_type(l, r) == ValueKind::String {
        return Ok(Value::String(format!("{l}{r}")));
    }
    op_add_numeric(l, r)
}

pub fn op_div(l: &Value, r: &Value) -> EngineResult<Value> {
    match determine_result_type(l, r) {
        ValueKind::Integer => {
            let (a, b) = (as_int(l)?, as_int(r)?);
            if b == 0 {
                return Err(EngineError::syntax("division by zero"));
            }
            if a % b == 0 {
                Ok(Value::Integer(a / b))
            } else {
                Ok(Value::Real(a as f64 / b as f64))
            }
        }
        ValueKind::Real => {
            let (a, b) = (l.to_numeric()?, r.to_numeric()?);
            if b == 0.0 {
                return Err(EngineError::syntax("division by zero"));
            }
            Ok(Value::Real(a / b))
        }
        _ => type_error("/", l, r),
    }
}

pub fn op_mod(l: &Value, r: &Value) -> EngineResult<Value> {
    match determine_result_type(l, r) {
        ValueKind::Integer => {
            let (a, b) = (as_int(l)?, as_int(r)?);
            if b == 0 {
                return Err(EngineError::syntax("division by zero"));
            }
            Ok(Value::Integer(a % b))
        }
        ValueKind::Real => {
            let (a, b) = (l.to_numeric()?, r.to_numeric()?);
            Ok(Value::Real(a % b))
        }
        _ => type_error("%", l, r),
    }
}

pub fn op_pow(l: &Value, r: &Value) -> EngineResult<Value> {
    match determine_result_type(l, r) {
        ValueKind::Integer => {
            let (a, b) = (as_int(l)?, as_int(r)?);
            if b >= 0 {
                Ok(Value::Integer(a.wrapping_pow(b as u32)))
            } else {
                Ok(Value::Real((a as f64).powi(b)))
            }
        }
        ValueKind::Real => {
            let (a, b) = (l.to_numeric()?, r.to_numeric()?);
            Ok(Value::Real(a.powf(b)))
        }
        _ => type_error("^", l, r),
    }
}

fn compare(op: &str, l: &Value, r: &Value, f: impl Fn(std::cmp::Ordering) -> bool) -> EngineResult<Value> {
    if let Some(result) = empty_compare(op, l, r) {
        return result;
    }
    match determine_result_type(l, r) {
        ValueKind::Integer | ValueKind::Real => {
            let (a, b) = (l.to_numeric()?, r.to_numeric()?);
            let ord = a.partial_cmp(&b).ok_or_else(|| EngineError::fatal("NaN comparison"))?;
            Ok(Value::Boolean(f(ord)))
        }
        ValueKind::String => {
            let (a, b) = (l.to_string(), r.to_string());
            Ok(Value::Boolean(f(a.cmp(&b))))
        }
        ValueKind::Boolean => {
            let (a, b) = (matches!(l, Value::Boolean(true)), matches!(r, Value::Boolean(true)));
            Ok(Value::Boolean(f(a.cmp(&b))))
        }
        ValueKind::Empty => type_error(op, l, r),
    }
}

pub fn op_lt(l: &Value, r: &Value) -> EngineResult<Value> {
    compare("<", l, r, |o| o == std::cmp::Ordering::Less)
}

pub fn op_gt(l: &Value, r: &Value) -> EngineResult<Value> {
    compare(">", l, r, |o| o == std::cmp::Ordering::Greater)
}

pub fn op_le(l: &Value, r: &Value) -> EngineResult<Value> {
    compare("<=", l, r, |o| o != std::cmp::Ordering::Greater)
}

pub fn op_ge(l: &Value, r: &Value) -> EngineResult<Value> {
    compare(">=", l, r, |o| o != std::cmp::Ordering::Less)
}

pub fn op_eq(l: &Value, r: &Value) -> EngineResult<Value> {
    compare("=", l, r, |o| o == std::cmp::Ordering::Equal)
}

pub fn op_and(l: &Value, r: &Value) -> EngineResult<Value> {
    match (l, r) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a && *b)),
        _ => type_error("AND", l, r),
    }
}

pub fn op_or(l: &Value, r: &Value) -> EngineResult<Value> {
    match (l, r) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a || *b)),
        _ => type_error("OR", l, r),
    }
}

pub fn op_neg(v: &Value) -> EngineResult<Value> {
    match v {
        Value::Integer(i) => Ok(Value::Integer(i.wrapping_neg())),
        Value::Real(r) => Ok(Value::Real(-r)),
        other => Err(EngineError::syntax(format!(
            "cannot negate {}",
            other.type_name()
        ))),
    }
}

fn numeric_arg(name: &str, args: &[Value], index: usize) -> EngineResult<f64> {
    args.get(index)
        .ok_or_else(|| EngineError::syntax(format!("{name}: missing argument {index}")))?
        .to_numeric()
        .map_err(|_| EngineError::syntax(format!("{name}: argument must be numeric")))
}

fn string_arg<'a>(name: &str, args: &'a [Value], index: usize) -> EngineResult<&'a str> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(EngineError::syntax(format!("{name}: argument must be a string"))),
        None => Err(EngineError::syntax(format!("{name}: missing argument {index}"))),
    }
}

fn int_arg(name: &str, args: &[Value], index: usize) -> EngineResult<i32> {
    match args.get(index) {
        Some(Value::Integer(i)) => Ok(*i),
        Some(Value::Real(r)) => Ok(*r as i32),
        Some(_) => Err(EngineError::syntax(format!("{name}: argument must be numeric"))),
        None => Err(EngineError::syntax(format!("{name}: missing argument {index}"))),
    }
}

fn check_arity(name: &str, args: &[Value], expected: usize) -> EngineResult<()> {
    if args.len() != expected {
        return Err(EngineError::syntax(format!(
            "{name}: expected {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

macro_rules! unary_math {
    ($fn_name:ident, $basic_name:literal, $op:expr) => {
        fn $fn_name(args: &[Value]) -> EngineResult<Value> {
            check_arity($basic_name, args, 1)?;
            let x = numeric_arg($basic_name, args, 0)?;
            Ok(Value::Real($op(x)))
        }
    };
}

unary_math!(fn_cos, "COS", f64::cos);
unary_math!(fn_sin, "SIN", f64::sin);
unary_math!(fn_tan, "TAN", f64::tan);
unary_math!(fn_atn, "ATN", f64::atan);
unary_math!(fn_exp, "EXP", f64::exp);
unary_math!(fn_log, "LOG", f64::ln);
unary_math!(fn_sqr, "SQR", f64::sqrt);

fn fn_square(args: &[Value]) -> EngineResult<Value> {
    check_arity("SQUARE", args, 1)?;
    match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(i.wrapping_mul(*i))),
        Value::Real(r) => Ok(Value::Real(r * r)),
        other => Err(EngineError::syntax(format!(
            "SQUARE: argument must be numeric, got {}",
            other.type_name()
        ))),
    }
}

fn fn_abs(args: &[Value]) -> EngineResult<Value> {
    check_arity("ABS", args, 1)?;
    match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(i.wrapping_abs())),
        Value::Real(r) => Ok(Value::Real(r.abs())),
        other => Err(EngineError::syntax(format!(
            "ABS: argument must be numeric, got {}",
            other.type_name()
        ))),
    }
}

fn fn_sgn(args: &[Value]) -> EngineResult<Value> {
    check_arity("SGN", args, 1)?;
    let x = numeric_arg("SGN", args, 0)?;
    Ok(Value::Integer(if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }))
}

fn fn_int(args: &[Value]) -> EngineResult<Value> {
    check_arity("INT", args, 1)?;
    let x = numeric_arg("INT", args, 0)?;
    Ok(Value::Integer(x.floor() as i32))
}

fn fn_pow(args: &[Value]) -> EngineResult<Value> {
    check_arity("POW", args, 2)?;
    op_pow(&args[0], &args[1])
}

fn fn_neg(args: &[Value]) -> EngineResult<Value> {
    check_arity("NEG", args, 1)?;
    op_neg(&args[0])
}

fn fn_not(args: &[Value]) -> EngineResult<Value> {
    check_arity("NOT", args, 1)?;
    match &args[0] {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        other => Err(EngineError::syntax(format!(
            "NOT: argument must be BOOLEAN, got {}",
            other.type_name()
        ))),
    }
}

fn fn_len(args: &[Value]) -> EngineResult<Value> {
    check_arity("LEN", args, 1)?;
    let s = string_arg("LEN", args, 0)?;
    Ok(Value::Integer(s.chars().count() as i32))
}

fn fn_left(args: &[Value]) -> EngineResult<Value> {
    check_arity("LEFT$", args, 2)?;
    let s = string_arg("LEFT$", args, 0)?;
    let n = int_arg("LEFT$", args, 1)?;
    if n < 0 {
        return Err(EngineError::syntax("LEFT$: length must be non-negative"));
    }
    let n = (n as usize).min(s.chars().count());
    Ok(Value::String(s.chars().take(n).collect()))
}

fn fn_right(args: &[Value]) -> EngineResult<Value> {
    check_arity("RIGHT$", args, 2)?;
    let s = string_arg("RIGHT$", args, 0)?;
    let n = int_arg("RIGHT$", args, 1)?;
    if n < 0 {
        return Err(EngineError::syntax("RIGHT$: length must be non-negative"));
    }
    let total = s.chars().count();
    let n = (n as usize).min(total);
    Ok(Value::String(s.chars().skip(total - n).collect()))
}

fn fn_mid(args: &[Value]) -> EngineResult<Value> {
    check_arity("MID$", args, 3)?;
    let s = string_arg("MID$", args, 0)?;
    let start = int_arg("MID$", args, 1)?;
    let len = int_arg("MID$", args, 2)?;
    if start < 1 {
        return Err(EngineError::syntax("MID$: start must be >= 1"));
    }
    if len < 0 {
        return Err(EngineError::syntax("MID$: length must be non-negative"));
    }
    let chars: Vec<char> = s.chars().collect();
    let start0 = (start as usize - 1).min(chars.len());
    let end0 = (start0 + len as usize).min(chars.len());
    Ok(Value::String(chars[start0..end0].iter().collect()))
}

fn fn_str(args: &[Value]) -> EngineResult<Value> {
    check_arity("STR$", args, 1)?;
    match &args[0] {
        Value::Integer(_) | Value::Real(_) => Ok(Value::String(args[0].to_string())),
        other => Err(EngineError::syntax(format!(
            "STR$: argument must be numeric, got {}",
            other.type_name()
        ))),
    }
}

fn fn_val(args: &[Value]) -> EngineResult<Value> {
    check_arity("VAL", args, 1)?;
    let s = string_arg("VAL", args, 0)?;
    match Value::classify_literal(s) {
        Value::Integer(i) => Ok(Value::Integer(i)),
        Value::Real(r) => Ok(Value::Real(r)),
        _ => Ok(Value::Integer(0)),
    }
}

fn fn_asc(args: &[Value]) -> EngineResult<Value> {
    check_arity("ASC", args, 1)?;
    let s = string_arg("ASC", args, 0)?;
    let c = s
        .chars()
        .next()
        .ok_or_else(|| EngineError::syntax("ASC: argument must be non-empty"))?;
    Ok(Value::Integer(c as i32))
}

fn fn_chr(args: &[Value]) -> EngineResult<Value> {
    check_arity("CHR$", args, 1)?;
    let code = int_arg("CHR$", args, 0)?;
    let c = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| EngineError::syntax("CHR$: argument out of range"))?;
    Ok(Value::String(c.to_string()))
}

/// Populate `env` with the initial operators, functions, and constants
/// every fresh engine starts with. `RND` is deliberately absent here —
/// it needs per-engine PRNG state and is special-cased in the
/// evaluator instead of going through this stateless function table.
pub fn install(env: &mut Environment) {
    env.add_binary_operator("+", 4, op_add);
    env.add_binary_operator("-", 4, op_sub);
    env.add_binary_operator("%", 4, op_mod);
    env.add_binary_operator("*", 3, op_mul);
    env.add_binary_operator("/", 3, op_div);
    env.add_binary_operator("^", 2, op_pow);
    env.add_binary_operator("<", 6, op_lt);
    env.add_binary_operator(">", 6, op_gt);
    env.add_binary_operator("<=", 6, op_le);
    env.add_binary_operator(">=", 6, op_ge);
    env.add_binary_operator("=", 7, op_eq);
    env.add_binary_operator("AND", 8, op_and);
    env.add_binary_operator("OR", 9, op_or);
    env.add_unary_operator("NEG", 1, op_neg);

    env.add_function("COS", "cosine of a radian angle", fn_cos).unwrap();
    env.add_function("SIN", "sine of a radian angle", fn_sin).unwrap();
    env.add_function("TAN", "tangent of a radian angle", fn_tan).unwrap();
    env.add_function("ATN", "arctangent, in radians", fn_atn).unwrap();
    env.add_function("EXP", "e raised to a power", fn_exp).unwrap();
    env.add_function("LOG", "natural logarithm", fn_log).unwrap();
    env.add_function("SQR", "square root", fn_sqr).unwrap();
    env.add_function("SQUARE", "x * x", fn_square).unwrap();
    env.add_function("ABS", "absolute value", fn_abs).unwrap();
    env.add_function("SGN", "sign: -1, 0, or 1", fn_sgn).unwrap();
    env.add_function("INT", "truncate toward negative infinity", fn_int).unwrap();
    env.add_function("POW", "b raised to the e-th power", fn_pow).unwrap();
    env.add_function("NEG", "arithmetic negation", fn_neg).unwrap();
    env.add_function("NOT", "logical negation", fn_not).unwrap();
    env.add_function("LEN", "length of a string", fn_len).unwrap();
    env.add_function("LEFT$", "leftmost n characters", fn_left).unwrap();
    env.add_function("RIGHT$", "rightmost n characters", fn_right).unwrap();
    env.add_function("MID$", "substring starting at a 1-based index", fn_mid).unwrap();
    env.add_function("STR$", "numeric value as a string", fn_str).unwrap();
    env.add_function("VAL", "leading numeric value of a string", fn_val).unwrap();
    env.add_function("ASC", "character code of the first character", fn_asc).unwrap();
    env.add_function("CHR$", "single character for a character code", fn_chr).unwrap();

    env.add_constant("PI", "the ratio of a circle's circumference to its diameter", Value::Real(std::f64::consts::PI))
        .unwrap();
    env.add_constant("TRUE", "boolean true", Value::Boolean(true)).unwrap();
    env.add_constant("FALSE", "boolean false", Value::Boolean(false)).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_concatenates_strings() {
        assert_eq!(
            op_add(&Value::String("A".into()), &Value::String("B".into())).unwrap(),
            Value::String("AB".into())
        );
    }

    #[test]
    fn div_by_zero_is_syntax_error() {
        assert!(op_div(&Value::Integer(1), &Value::Integer(0)).is_err());
    }

    #[test]
    fn empty_equals_empty() {
        assert_eq!(op_eq(&Value::Empty, &Value::Empty).unwrap(), Value::Boolean(true));
        assert_eq!(op_lt(&Value::Empty, &Value::Empty).unwrap(), Value::Boolean(false));
        assert_eq!(op_le(&Value::Empty, &Value::Empty).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn empty_compared_to_other_type_is_error() {
        assert!(op_eq(&Value::Empty, &Value::Integer(0)).is_err());
    }

    #[test]
    fn left_and_right_and_mid_match_spec_scenario() {
        assert_eq!(
            fn_left(&[Value::String("HELLO".into()), Value::Integer(3)]).unwrap(),
            Value::String("HEL".into())
        );
        assert_eq!(
            fn_mid(&[Value::String("HELLO".into()), Value::Integer(2), Value::Integer(3)]).unwrap(),
            Value::String("ELL".into())
        );
    }

    #[test]
    fn pow_is_right_associative_friendly() {
        // 2^(3^2) == 512
        let inner = op_pow(&Value::Integer(3), &Value::Integer(2)).unwrap();
        assert_eq!(op_pow(&Value::Integer(2), &inner).unwrap(), Value::Integer(512));
    }
}
