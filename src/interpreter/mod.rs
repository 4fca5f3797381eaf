mod builtins;
mod collation;
mod environment;
mod errors;
mod function;
mod interpreter;
mod object;

pub use builtins::NativeFn;
pub use environment::Environment;
pub use errors::{Error, RuntimeError, RuntimeErrorKind};
pub use function::{Closure, Function};
pub use interpreter::Interpreter;
pub use object::{Exit, Value};

use std::io::{self, Read, Write};

use crate::frontend::Parser;

/// Creates a fresh root environment preloaded with the built-in registry.
pub fn new_context() -> Environment {
    let env = Environment::new();
    for native in builtins::native_functions() {
        let name = native.name();
        env.create(name, Value::Function(Function::Native(native)))
            .expect("builtin names are unique");
    }
    env
}

/// Evaluates source text against the given context, with `print` writing to
/// stdout.
pub fn evaluate(source: &str, context: &Environment, source_name: &str) -> Result<Value, Error> {
    let mut out = io::stdout();
    evaluate_with_output(source, context, source_name, &mut out)
}

/// Same as `evaluate`, with `print` output routed to the given writer.
pub fn evaluate_with_output(
    source: &str,
    context: &Environment,
    source_name: &str,
    out: &mut dyn Write,
) -> Result<Value, Error> {
    let mut parser = Parser::new(source, source_name);
    let program = parser.parse()?;

    let mut interpreter = Interpreter::new(context.clone(), out);
    let value = interpreter.eval_program(&program)?;
    Ok(value)
}

/// Drains the reader and evaluates its contents.
pub fn evaluate_reader(
    reader: &mut dyn Read,
    context: &Environment,
    source_name: &str,
) -> Result<Value, Error> {
    let mut source = String::new();
    reader.read_to_string(&mut source).map_err(Error::Io)?;
    evaluate(&source, context, source_name)
}
