//! The standard operators, functions and constants.

use alloc::{format, string::String};
use core::{cmp::Ordering, f64::consts};

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
};

use super::registry::{Operation, Registry};
use crate::{Error, Value};

type Result<T> = core::result::Result<T, Error>;

pub(super) fn install(registry: Registry) -> Registry {
    let registry = operations(registry);
    let registry = math(registry);
    let registry = collections(registry);
    constants(registry)
}

fn operations(registry: Registry) -> Registry {
    registry
        .with_operation("**", Operation::new(6, |l, r| arith("**", l, r, f64::powf)).right_assoc())
        .with_operation("*", Operation::new(5, |l, r| arith("*", l, r, |a, b| a * b)))
        .with_operation("/", Operation::new(5, divide))
        .with_operation("%", Operation::new(5, remainder))
        .with_operation("<<", Operation::new(5, |l, r| shift("<<", l, r)))
        .with_operation(">>", Operation::new(5, |l, r| shift(">>", l, r)))
        .with_operation("&", Operation::new(5, |l, r| bits("&", l, r, |a, b| a & b)))
        .with_operation("&^", Operation::new(5, |l, r| bits("&^", l, r, |a, b| a & !b)))
        .with_operation("+", Operation::new(4, add))
        .with_operation("-", Operation::new(4, |l, r| arith("-", l, r, |a, b| a - b)))
        .with_operation("|", Operation::new(4, |l, r| bits("|", l, r, |a, b| a | b)))
        .with_operation("^", Operation::new(4, |l, r| bits("^", l, r, |a, b| a ^ b)))
        .with_operation("==", Operation::new(3, |l, r| Ok(Value::Bool(l == r))))
        .with_operation("!=", Operation::new(3, |l, r| Ok(Value::Bool(l != r))))
        .with_operation("<", Operation::new(3, |l, r| Ok(ordered(l, r, Ordering::is_lt))))
        .with_operation("<=", Operation::new(3, |l, r| Ok(ordered(l, r, Ordering::is_le))))
        .with_operation(">", Operation::new(3, |l, r| Ok(ordered(l, r, Ordering::is_gt))))
        .with_operation(">=", Operation::new(3, |l, r| Ok(ordered(l, r, Ordering::is_ge))))
        .with_operation("=~", Operation::new(3, matches))
        .with_operation("&&", Operation::new(2, |l, r| Ok(Value::Bool(l.is_truthy() && r.is_truthy()))))
        .with_operation("||", Operation::new(1, |l, r| Ok(Value::Bool(l.is_truthy() || r.is_truthy()))))
}

fn numbers(op: &str, l: &Value, r: &Value) -> Result<(f64, f64)> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(Error::wrong_type(format!(
            "operator '{op}' expects numbers, found {} and {}",
            l.type_name(),
            r.type_name()
        ))),
    }
}

fn arith(op: &str, l: &Value, r: &Value, f: impl Fn(f64, f64) -> f64) -> Result<Value> {
    let (a, b) = numbers(op, l, r)?;
    Ok(Value::Number(f(a, b)))
}

fn add(l: &Value, r: &Value) -> Result<Value> {
    if let (Value::String(a), Value::String(b)) = (l, r) {
        let mut joined = String::with_capacity(a.len() + b.len());
        joined.push_str(a);
        joined.push_str(b);
        return Ok(Value::String(joined));
    }
    arith("+", l, r, |a, b| a + b)
}

fn divide(l: &Value, r: &Value) -> Result<Value> {
    let (a, b) = numbers("/", l, r)?;
    if b == 0.0 {
        return Err(Error::wrong_request("division by zero"));
    }
    Ok(Value::Number(a / b))
}

fn remainder(l: &Value, r: &Value) -> Result<Value> {
    let (a, b) = numbers("%", l, r)?;
    if b == 0.0 {
        return Err(Error::wrong_request("division by zero"));
    }
    Ok(Value::Number(a % b))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn bits(op: &str, l: &Value, r: &Value, f: impl Fn(i64, i64) -> i64) -> Result<Value> {
    let (a, b) = numbers(op, l, r)?;
    Ok(Value::Number(f(a as i64, b as i64) as f64))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn shift(op: &str, l: &Value, r: &Value) -> Result<Value> {
    let (a, b) = numbers(op, l, r)?;
    if b < 0.0 {
        return Err(Error::wrong_request(format!("negative shift count {b}")));
    }
    let (a, b) = (a as i64, b as u64);
    let shifted = match (op, u32::try_from(b).ok().filter(|&b| b < 64)) {
        ("<<", Some(b)) => a << b,
        ("<<", None) => 0,
        (_, Some(b)) => a >> b,
        (_, None) => a >> 63,
    };
    Ok(Value::Number(shifted as f64))
}

/// Orders numbers with numbers and strings with strings. Any other pairing
/// compares false.
fn ordered(l: &Value, r: &Value, test: fn(Ordering) -> bool) -> Value {
    let ordering = match (l, r) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    Value::Bool(ordering.is_some_and(test))
}

fn matches(l: &Value, r: &Value) -> Result<Value> {
    let (Value::String(text), Value::String(pattern)) = (l, r) else {
        return Ok(Value::Bool(false));
    };
    let regex = regex::Regex::new(pattern)
        .map_err(|e| Error::wrong_request(format!("invalid regular expression: {e}")))?;
    Ok(Value::Bool(regex.is_match(text)))
}

fn number(name: &str, v: &Value) -> Result<f64> {
    v.as_f64().ok_or_else(|| {
        Error::wrong_type(format!("function '{name}' expects a number, found {}", v.type_name()))
    })
}

fn string<'v>(name: &str, v: &'v Value) -> Result<&'v str> {
    v.as_str().ok_or_else(|| {
        Error::wrong_type(format!("function '{name}' expects a string, found {}", v.type_name()))
    })
}

macro_rules! unary_math {
    ($registry:expr, $($name:ident),* $(,)?) => {
        $registry$(.with_function(stringify!($name), |v| Ok(Value::Number(number(stringify!($name), v)?.$name()))))*
    };
}

fn math(registry: Registry) -> Registry {
    let registry = unary_math!(
        registry, abs, acos, acosh, asin, asinh, atan, atanh, cbrt, ceil, cos, cosh, exp, exp2,
        floor, log10, log2, round, sin, sinh, sqrt, tan, tanh, trunc,
    );
    // Rust spells a few of these differently.
    registry
        .with_function("expm1", |v| Ok(Value::Number(number("expm1", v)?.exp_m1())))
        .with_function("log", |v| Ok(Value::Number(number("log", v)?.ln())))
        .with_function("log1p", |v| Ok(Value::Number(number("log1p", v)?.ln_1p())))
        .with_function("pow10", |v| Ok(Value::Number(10f64.powf(number("pow10", v)?))))
        .with_function("factorial", factorial)
        .with_function("not", |v| Ok(Value::Bool(!v.is_truthy())))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn factorial(v: &Value) -> Result<Value> {
    let n = number("factorial", v)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(Error::wrong_request(format!("factorial of {n} is undefined")));
    }
    let n = n.min(171.0) as u64;
    Ok(Value::Number((2..=n).fold(1.0, |acc, k| acc * k as f64)))
}

#[allow(clippy::cast_precision_loss)]
fn collections(registry: Registry) -> Registry {
    registry
        .with_function("length", |v| match v {
            Value::Array(items) => Ok(Value::Number(items.len() as f64)),
            Value::Object(members) => Ok(Value::Number(members.len() as f64)),
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            other => Err(Error::wrong_type(format!(
                "function 'length' expects a string, array or object, found {}",
                other.type_name()
            ))),
        })
        .with_function("size", |v| {
            Ok(Value::Number(match v {
                Value::Null => 0.0,
                Value::Array(items) => items.len() as f64,
                Value::Object(members) => members.len() as f64,
                Value::String(s) => s.len() as f64,
                Value::Bool(_) | Value::Number(_) => 1.0,
            }))
        })
        .with_function("sum", |v| sum("sum", v).map(|(total, _)| Value::Number(total)))
        .with_function("avg", |v| {
            let (total, count) = sum("avg", v)?;
            Ok(Value::Number(if count == 0 { 0.0 } else { total / count as f64 }))
        })
        .with_function("first", |v| match v {
            Value::Array(items) => Ok(items.first().cloned().unwrap_or_default()),
            other => Err(Error::wrong_type(format!(
                "function 'first' expects an array, found {}",
                other.type_name()
            ))),
        })
        .with_function("last", |v| match v {
            Value::Array(items) => Ok(items.last().cloned().unwrap_or_default()),
            other => Err(Error::wrong_type(format!(
                "function 'last' expects an array, found {}",
                other.type_name()
            ))),
        })
        .with_function("b64encode", |v| Ok(STANDARD.encode(string("b64encode", v)?).into()))
        .with_function("b64encoden", |v| Ok(STANDARD_NO_PAD.encode(string("b64encoden", v)?).into()))
        .with_function("b64decode", |v| b64decode("b64decode", &STANDARD, v))
        .with_function("b64decoden", |v| b64decode("b64decoden", &STANDARD_NO_PAD, v))
}

/// Sum and element count of a number or an array of numbers.
fn sum(name: &str, v: &Value) -> Result<(f64, usize)> {
    match v {
        Value::Number(n) => Ok((*n, 1)),
        Value::Array(items) => {
            let mut total = 0.0;
            for item in items {
                total += number(name, item)?;
            }
            Ok((total, items.len()))
        }
        other => Err(Error::wrong_type(format!(
            "function '{name}' expects an array of numbers, found {}",
            other.type_name()
        ))),
    }
}

fn b64decode(name: &str, engine: &impl base64::Engine, v: &Value) -> Result<Value> {
    let bytes = engine
        .decode(string(name, v)?)
        .map_err(|e| Error::wrong_request(format!("function '{name}': {e}")))?;
    String::from_utf8(bytes)
        .map(Value::String)
        .map_err(|e| Error::wrong_request(format!("function '{name}': {e}")))
}

fn constants(registry: Registry) -> Registry {
    registry
        .with_constant("e", consts::E)
        .with_constant("pi", consts::PI)
        .with_constant("phi", 1.618_033_988_749_895)
        .with_constant("sqrt2", consts::SQRT_2)
        .with_constant("sqrte", 1.648_721_270_700_128_2)
        .with_constant("sqrtpi", 1.772_453_850_905_516)
        .with_constant("sqrtphi", 1.272_019_649_514_069)
        .with_constant("ln2", consts::LN_2)
        .with_constant("log2e", consts::LOG2_E)
        .with_constant("ln10", consts::LN_10)
        .with_constant("log10e", consts::LOG10_E)
        .with_constant("true", true)
        .with_constant("false", false)
        .with_constant("null", Value::Null)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use rstest::rstest;

    use super::*;
    use crate::ErrorKind;

    fn call(name: &str, arg: Value) -> Result<Value> {
        let registry = Registry::standard();
        let function = registry.function(name).unwrap();
        function(&arg)
    }

    fn apply(op: &str, l: impl Into<Value>, r: impl Into<Value>) -> Result<Value> {
        let registry = Registry::standard();
        (registry.operation(op).unwrap().apply)(&l.into(), &r.into())
    }

    #[rstest]
    #[case("+", 1.5, 2.0, 3.5)]
    #[case("-", 1.0, 3.0, -2.0)]
    #[case("**", 2.0, 10.0, 1024.0)]
    #[case("%", 7.0, 4.0, 3.0)]
    #[case("<<", 1.0, 4.0, 16.0)]
    #[case(">>", -16.0, 2.0, -4.0)]
    #[case("&^", 7.0, 2.0, 5.0)]
    #[case("^", 6.0, 3.0, 5.0)]
    fn arithmetic(#[case] op: &str, #[case] l: f64, #[case] r: f64, #[case] expected: f64) {
        assert_eq!(apply(op, l, r).unwrap(), Value::Number(expected));
    }

    #[test]
    fn strings_concatenate_and_compare() {
        assert_eq!(apply("+", "ab", "cd").unwrap(), Value::from("abcd"));
        assert_eq!(apply("<", "abc", "abd").unwrap(), Value::Bool(true));
        assert_eq!(apply("=~", "hello", "^h.l+o$").unwrap(), Value::Bool(true));
    }

    #[test]
    fn mismatched_comparisons_are_false() {
        assert_eq!(apply("<", "1", 2.0).unwrap(), Value::Bool(false));
        assert_eq!(apply(">=", Value::Null, 0.0).unwrap(), Value::Bool(false));
        assert_eq!(apply("==", "1", 1.0).unwrap(), Value::Bool(false));
        assert_eq!(apply("!=", "1", 1.0).unwrap(), Value::Bool(true));
    }

    #[test]
    fn arithmetic_errors() {
        assert_eq!(apply("/", 1.0, 0.0).unwrap_err().kind(), ErrorKind::WrongRequest);
        assert_eq!(apply("-", "a", 1.0).unwrap_err().kind(), ErrorKind::WrongType);
        assert_eq!(apply("=~", "a", "(").unwrap_err().kind(), ErrorKind::WrongRequest);
    }

    #[rstest]
    #[case("abs", -2.0, 2.0)]
    #[case("sqrt", 16.0, 4.0)]
    #[case("round", 2.5, 3.0)]
    #[case("round", -2.5, -3.0)]
    #[case("trunc", -2.7, -2.0)]
    #[case("pow10", 3.0, 1000.0)]
    #[case("factorial", 5.0, 120.0)]
    #[case("log2", 8.0, 3.0)]
    fn math_functions(#[case] name: &str, #[case] arg: f64, #[case] expected: f64) {
        assert_eq!(call(name, arg.into()).unwrap(), Value::Number(expected));
    }

    #[test]
    fn collection_functions() {
        let items = Value::Array(vec![1.0.into(), 2.0.into(), 6.0.into()]);
        assert_eq!(call("sum", items.clone()).unwrap(), Value::Number(9.0));
        assert_eq!(call("avg", items.clone()).unwrap(), Value::Number(3.0));
        assert_eq!(call("length", items.clone()).unwrap(), Value::Number(3.0));
        assert_eq!(call("first", items.clone()).unwrap(), Value::Number(1.0));
        assert_eq!(call("last", items).unwrap(), Value::Number(6.0));
        assert_eq!(call("first", Value::Array(vec![])).unwrap(), Value::Null);
        assert_eq!(call("length", "héllo".into()).unwrap(), Value::Number(5.0));
        assert_eq!(call("size", Value::Null).unwrap(), Value::Number(0.0));
        assert_eq!(call("not", 0.0.into()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn base64_functions() {
        assert_eq!(call("b64encode", "lazy".into()).unwrap(), Value::from("bGF6eQ=="));
        assert_eq!(call("b64encoden", "lazy".into()).unwrap(), Value::from("bGF6eQ"));
        assert_eq!(call("b64decode", "bGF6eQ==".into()).unwrap(), Value::from("lazy"));
        assert_eq!(call("b64decoden", "bGF6eQ".into()).unwrap(), Value::from("lazy"));
        assert_eq!(call("b64decode", "***".into()).unwrap_err().kind(), ErrorKind::WrongRequest);
    }

    #[test]
    fn factorial_rejects_fractions() {
        assert_eq!(call("factorial", 2.5.into()).unwrap_err().kind(), ErrorKind::WrongRequest);
        assert_eq!(call("factorial", 0.0.into()).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn constants_are_registered() {
        let registry = Registry::standard();
        assert_eq!(registry.constant("PI"), Some(&Value::Number(consts::PI)));
        assert_eq!(registry.constant("True"), Some(&Value::Bool(true)));
        assert_eq!(registry.constant("null"), Some(&Value::Null));
    }
}
