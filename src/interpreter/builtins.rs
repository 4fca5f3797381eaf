use std::fmt;
use std::io::Write;
use std::rc::Rc;

use super::object::Value;

/// Built-ins report failures as plain messages; the evaluator wraps them
/// with the call site.
pub type NativeFnImpl = fn(Vec<Value>, &mut dyn Write) -> Result<Value, String>;

pub struct NativeFnData {
    name: &'static str,
    func: NativeFnImpl,
    /// None skips the argument-count check for variadic built-ins.
    arity: Option<usize>,
}

#[derive(Clone)]
pub struct NativeFn(Rc<NativeFnData>);

impl NativeFn {
    fn new(name: &'static str, func: NativeFnImpl, arity: Option<usize>) -> Self {
        NativeFn(Rc::new(NativeFnData { name, func, arity }))
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.0.arity
    }

    pub fn call(&self, args: Vec<Value>, out: &mut dyn Write) -> Result<Value, String> {
        (self.0.func)(args, out)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<native fn {}>", self.0.name)
    }
}

impl PartialEq<NativeFn> for NativeFn {
    // Function pointers with identical bodies can be merged by the
    // compiler, so compare the Rc allocations instead.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NativeFn {}

/// The fixed registry installed into every fresh context. Every entry
/// validates its own argument list, so none declares an arity.
pub fn native_functions() -> Vec<NativeFn> {
    vec![
        NativeFn::new("len", builtin_len, None),
        NativeFn::new("print", builtin_print, None),
        NativeFn::new("append", builtin_append, None),
    ]
}

fn builtin_len(args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, String> {
    match args.as_slice() {
        [Value::Str(chars)] => Ok(Value::Int(chars.borrow().len() as i64)),
        [Value::Array(items)] => Ok(Value::Int(items.borrow().len() as i64)),
        [other] => Err(format!(
            "len() expects a STRING or an ARRAY, got {}",
            other.type_name()
        )),
        _ => Err("len() expects exactly one parameter".to_owned()),
    }
}

/// `print(fmt, args...)`: every '#' in fmt is replaced by the inspect form
/// of the matching argument; '%' is reserved and rejected. Returns the
/// substitution count.
fn builtin_print(args: Vec<Value>, out: &mut dyn Write) -> Result<Value, String> {
    let mut args = args.into_iter();
    let format = match args.next() {
        Some(Value::Str(chars)) => chars.borrow().clone(),
        Some(other) => {
            return Err(format!(
                "print() expects a STRING format, got {}",
                other.type_name()
            ))
        }
        None => return Err("print() expects at least one parameter".to_owned()),
    };

    let mut rendered = String::new();
    let mut substituted = 0i64;
    for ch in format {
        match ch {
            '%' => return Err("print() format must not contain '%'".to_owned()),
            '#' => match args.next() {
                Some(value) => {
                    rendered.push_str(&value.to_string());
                    substituted += 1;
                }
                None => {
                    return Err("print() has more '#' placeholders than arguments".to_owned())
                }
            },
            ch => rendered.push(ch),
        }
    }

    if args.next().is_some() {
        return Err("print() has more arguments than '#' placeholders".to_owned());
    }

    writeln!(out, "{}", rendered).map_err(|e| format!("print() cannot write: {}", e))?;
    Ok(Value::Int(substituted))
}

/// `append(target, items...)` mutates the target in place and returns nil.
fn builtin_append(args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, String> {
    let mut args = args.into_iter();
    let target = match args.next() {
        Some(target) => target,
        None => return Err("append() expects at least one parameter".to_owned()),
    };

    match target {
        Value::Str(chars) => {
            for item in args {
                match item {
                    Value::Rune(ch) => chars.borrow_mut().push(ch),
                    other => {
                        return Err(format!(
                            "append() to a STRING takes RUNE items, got {}",
                            other.type_name()
                        ))
                    }
                }
            }
        }
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            for item in args {
                items.push(item);
            }
        }
        other => {
            return Err(format!(
                "append() expects a STRING or an ARRAY, got {}",
                other.type_name()
            ))
        }
    }

    Ok(Value::Nil)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> Vec<u8> {
        vec![]
    }

    #[test]
    fn test_len() {
        let mut out = sink();

        assert_eq!(
            builtin_len(vec![Value::string("żółw")], &mut out),
            Ok(Value::Int(4))
        );
        assert_eq!(
            builtin_len(vec![Value::array(vec![Value::Int(1), Value::Int(2)])], &mut out),
            Ok(Value::Int(2))
        );
        assert!(builtin_len(vec![Value::Int(3)], &mut out).is_err());
        assert!(builtin_len(vec![], &mut out).is_err());
        assert!(builtin_len(vec![Value::Int(1), Value::Int(2)], &mut out).is_err());
    }

    #[test]
    fn test_print_substitution() {
        let mut out = sink();

        let result = builtin_print(
            vec![
                Value::string("x = #, y = #"),
                Value::Int(5),
                Value::string("abc"),
            ],
            &mut out,
        );

        assert_eq!(result, Ok(Value::Int(2)));
        assert_eq!(String::from_utf8(out).unwrap(), "x = 5, y = \"abc\"\n");
    }

    #[test]
    fn test_print_without_placeholders() {
        let mut out = sink();

        let result = builtin_print(vec![Value::string("hello")], &mut out);

        assert_eq!(result, Ok(Value::Int(0)));
        assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
    }

    #[test]
    fn test_print_rejects_percent() {
        let mut out = sink();
        assert!(builtin_print(vec![Value::string("100%")], &mut out).is_err());
    }

    #[test]
    fn test_print_placeholder_count_must_match() {
        let mut out = sink();
        assert!(builtin_print(vec![Value::string("#")], &mut out).is_err());
        assert!(
            builtin_print(vec![Value::string("no placeholder"), Value::Int(1)], &mut out)
                .is_err()
        );
    }

    #[test]
    fn test_append_to_array_mutates_in_place() {
        let mut out = sink();
        let target = Value::array(vec![Value::Int(1)]);

        let result = builtin_append(vec![target.clone(), Value::Int(2), Value::Int(3)], &mut out);

        assert_eq!(result, Ok(Value::Nil));
        assert_eq!(
            target,
            Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_append_to_string_takes_runes_only() {
        let mut out = sink();
        let target = Value::string("ab");

        assert_eq!(
            builtin_append(vec![target.clone(), Value::Rune('c')], &mut out),
            Ok(Value::Nil)
        );
        assert_eq!(target, Value::string("abc"));

        assert!(builtin_append(vec![target, Value::string("d")], &mut out).is_err());
    }
}
