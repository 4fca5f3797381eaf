pub mod frontend;
pub mod interpreter;

pub use interpreter::{
    evaluate, evaluate_reader, evaluate_with_output, new_context, Error, Value,
};
