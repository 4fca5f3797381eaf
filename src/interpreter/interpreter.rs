use std::io::Write;

use crate::frontend::grammar::{Block, Expr, ExprType, Literal, Stmt, StmtType};
use crate::frontend::operator::PrefixOperator;
use crate::frontend::token::Token;

use super::builtins::NativeFn;
use super::environment::Environment;
use super::errors::{RuntimeError, RuntimeErrorKind, RuntimeResult};
use super::function::{Closure, Function};
use super::object::{Exit, Value};

/// Exit markers pass through operand position untouched; every other value
/// stays in the expression pipeline.
macro_rules! propagate_exit {
    ($value:expr) => {
        match $value {
            exit @ Value::Exit(_) => return Ok(exit),
            value => value,
        }
    };
}

pub struct Interpreter<'out> {
    env: Environment,
    out: &'out mut dyn Write,
}

impl<'out> Interpreter<'out> {
    pub fn new(env: Environment, out: &'out mut dyn Write) -> Self {
        Interpreter { env, out }
    }

    fn swap_env(&mut self, mut env: Environment) -> Environment {
        std::mem::swap(&mut self.env, &mut env);
        // The old environment.
        env
    }

    /// Evaluates the program root. A return marker unwraps into the program
    /// result; break and continue have no loop to land in.
    pub fn eval_program(&mut self, program: &Block) -> RuntimeResult<Value> {
        match self.eval_block(program)? {
            Value::Exit(Exit::Return(value)) => Ok(*value),
            Value::Exit(Exit::Break(token)) => Err(RuntimeError::new(
                token,
                RuntimeErrorKind::StrayExit("break"),
            )),
            Value::Exit(Exit::Continue(token)) => Err(RuntimeError::new(
                token,
                RuntimeErrorKind::StrayExit("continue"),
            )),
            value => Ok(value),
        }
    }

    /// Non-implicit blocks run in a fresh child scope; implicit ones run in
    /// the scope they are entered with.
    fn eval_block(&mut self, block: &Block) -> RuntimeResult<Value> {
        if block.implicit {
            return self.eval_statements(block);
        }

        let prev_env = self.env.clone();
        self.env = prev_env.child();
        let result = self.eval_statements(block);
        self.env = prev_env;
        result
    }

    fn eval_statements(&mut self, block: &Block) -> RuntimeResult<Value> {
        let mut result = Value::Nil;

        for stmt in &block.stmts {
            result = self.eval_statement(stmt)?;
            if result.is_exit() {
                break;
            }
        }

        Ok(result)
    }

    fn eval_statement(&mut self, stmt: &Stmt) -> RuntimeResult<Value> {
        match &stmt.stmt {
            StmtType::Expression(expr) => self.eval_expression(expr),
            StmtType::Let(expr) => self.eval_let(expr, &stmt.token),
            StmtType::Return(expr) => {
                let value = propagate_exit!(self.eval_expression(expr)?);
                Ok(Value::Exit(Exit::Return(Box::new(value))))
            }
            StmtType::Break => Ok(Value::Exit(Exit::Break(stmt.token.clone()))),
            StmtType::Continue => Ok(Value::Exit(Exit::Continue(stmt.token.clone()))),
        }
    }

    /// The right-hand side evaluates before the name exists, so
    /// `let x = x;` sees only an outer `x`.
    fn eval_let(&mut self, expr: &Expr, let_token: &Token) -> RuntimeResult<Value> {
        let (name, rhs) = match &expr.expr {
            ExprType::Assignment(lhs, rhs) => match &lhs.expr {
                ExprType::Variable(name) => (name, rhs),
                _ => unreachable!("let binding validated at parse time"),
            },
            _ => unreachable!("let binding validated at parse time"),
        };

        let value = propagate_exit!(self.eval_expression(rhs)?);
        self.env
            .create(name, value.clone())
            .map_err(|kind| RuntimeError::new(let_token.clone(), kind))?;

        Ok(value)
    }

    pub fn eval_expression(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match &expr.expr {
            ExprType::Literal(literal) => Ok(Self::eval_literal(literal)),
            ExprType::Variable(name) => self
                .env
                .resolve(name)
                .map_err(|kind| RuntimeError::new(expr.token.clone(), kind)),
            ExprType::Prefix(op, operand) => self.eval_prefix_operator(*op, operand),
            ExprType::Infix(op, lhs, rhs) => {
                let lhs_value = propagate_exit!(self.eval_expression(lhs)?);
                let rhs_value = propagate_exit!(self.eval_expression(rhs)?);
                Value::apply_infix_op(*op, &lhs_value, &rhs_value)
                    .map_err(|kind| RuntimeError::new(expr.token.clone(), kind))
            }
            ExprType::Assignment(lhs, rhs) => self.eval_assignment(lhs, rhs, &expr.token),
            ExprType::Conditional {
                condition,
                consequent,
                alternative,
            } => self.eval_conditional(condition, consequent, alternative.as_ref()),
            ExprType::Loop {
                init,
                condition,
                step,
                body,
            } => self.eval_loop(init.as_deref(), condition, step.as_deref(), body),
            ExprType::FunctionLiteral(decl) => Ok(Value::Function(Function::Closure(
                Closure::new(decl.clone(), self.env.clone()),
            ))),
            ExprType::Call { callee, args } => self.eval_call(callee, args, &expr.token),
            ExprType::Index {
                subject,
                start,
                end,
            } => self.eval_index(subject, start, end.as_deref()),
            ExprType::ArrayLiteral(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(propagate_exit!(self.eval_expression(element)?));
                }
                Ok(Value::array(items))
            }
        }
    }

    fn eval_literal(literal: &Literal) -> Value {
        match literal {
            Literal::Int(value) => Value::Int(*value),
            Literal::Bool(value) => Value::Bool(*value),
            Literal::Str(value) => Value::string(value),
            Literal::Rune(value) => Value::Rune(*value),
            Literal::Nil => Value::Nil,
        }
    }

    fn eval_prefix_operator(
        &mut self,
        op: PrefixOperator,
        operand: &Expr,
    ) -> RuntimeResult<Value> {
        let value = propagate_exit!(self.eval_expression(operand)?);

        match op {
            PrefixOperator::LogicalNot => match value {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(Self::type_error("BOOL", &other, operand)),
            },
            PrefixOperator::Negate => match value {
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                other => Err(Self::type_error("INT", &other, operand)),
            },
        }
    }

    fn eval_assignment(
        &mut self,
        lhs: &Expr,
        rhs: &Expr,
        op_token: &Token,
    ) -> RuntimeResult<Value> {
        match &lhs.expr {
            ExprType::Variable(name) => {
                let value = propagate_exit!(self.eval_expression(rhs)?);
                self.env
                    .set(name, value.clone())
                    .map_err(|kind| RuntimeError::new(lhs.token.clone(), kind))?;
                Ok(value)
            }
            ExprType::Index {
                subject,
                start,
                end,
            } => {
                if end.is_some() {
                    return Err(RuntimeError::new(
                        op_token.clone(),
                        RuntimeErrorKind::SliceAssignment,
                    ));
                }
                self.eval_index_assignment(subject, start, rhs)
            }
            _ => unreachable!("assignment target validated at parse time"),
        }
    }

    fn eval_index_assignment(
        &mut self,
        subject: &Expr,
        index: &Expr,
        rhs: &Expr,
    ) -> RuntimeResult<Value> {
        let container = propagate_exit!(self.eval_expression(subject)?);
        let index_value = propagate_exit!(self.eval_expression(index)?);

        match &container {
            Value::Str(chars) => {
                let length = chars.borrow().len();
                let i = Self::check_one_index(&index_value, length, index)?;
                let value = propagate_exit!(self.eval_expression(rhs)?);
                match value {
                    Value::Rune(ch) => {
                        chars.borrow_mut()[i] = ch;
                        Ok(Value::Rune(ch))
                    }
                    other => Err(Self::type_error("RUNE", &other, rhs)),
                }
            }
            Value::Array(items) => {
                let length = items.borrow().len();
                let i = Self::check_one_index(&index_value, length, index)?;
                let value = propagate_exit!(self.eval_expression(rhs)?);
                items.borrow_mut()[i] = value.clone();
                Ok(value)
            }
            other => Err(Self::type_error("STRING or ARRAY", other, subject)),
        }
    }

    fn eval_conditional(
        &mut self,
        condition: &Expr,
        consequent: &Block,
        alternative: Option<&Block>,
    ) -> RuntimeResult<Value> {
        let value = propagate_exit!(self.eval_expression(condition)?);
        let truth = match value {
            Value::Bool(b) => b,
            other => return Err(Self::type_error("BOOL", &other, condition)),
        };

        if truth {
            self.eval_block(consequent)
        } else {
            match alternative {
                Some(alternative) => self.eval_block(alternative),
                None => Ok(Value::Nil),
            }
        }
    }

    /// Two scopes per loop: the loop scope holds the initializer binding for
    /// the whole loop, the inner scope hosts the body and is re-used across
    /// iterations.
    fn eval_loop(
        &mut self,
        init: Option<&Stmt>,
        condition: &Expr,
        step: Option<&Expr>,
        body: &Block,
    ) -> RuntimeResult<Value> {
        let prev_env = self.env.clone();
        let loop_scope = prev_env.child();
        let inner_scope = loop_scope.child();

        self.env = loop_scope;
        let result = self.run_loop(init, condition, step, body, &inner_scope);
        self.env = prev_env;
        result
    }

    fn run_loop(
        &mut self,
        init: Option<&Stmt>,
        condition: &Expr,
        step: Option<&Expr>,
        body: &Block,
        inner_scope: &Environment,
    ) -> RuntimeResult<Value> {
        let loop_scope = self.env.clone();

        if let Some(init) = init {
            let value = self.eval_statement(init)?;
            if value.is_exit() {
                return Ok(value);
            }
        }

        let mut result = Value::Nil;
        loop {
            let value = propagate_exit!(self.eval_expression(condition)?);
            let proceed = match value {
                Value::Bool(b) => b,
                other => return Err(Self::type_error("BOOL", &other, condition)),
            };
            if !proceed {
                break;
            }

            self.env = inner_scope.clone();
            let outcome = self.eval_block(body);
            self.env = loop_scope.clone();
            result = outcome?;

            if let Value::Exit(exit) = &result {
                match exit {
                    Exit::Continue(_) => result = Value::Nil,
                    Exit::Break(_) => {
                        result = Value::Nil;
                        break;
                    }
                    // Propagates to the enclosing function without
                    // unwrapping.
                    Exit::Return(_) => break,
                }
            }

            if let Some(step) = step {
                let value = self.eval_expression(step)?;
                if value.is_exit() {
                    return Ok(value);
                }
            }
        }

        Ok(result)
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        call_token: &Token,
    ) -> RuntimeResult<Value> {
        let callee_value = propagate_exit!(self.eval_expression(callee)?);

        // Arguments evaluate left to right in the caller's environment.
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(propagate_exit!(self.eval_expression(arg)?));
        }

        match callee_value {
            Value::Function(Function::Closure(closure)) => {
                self.call_closure(&closure, arg_values, call_token)
            }
            Value::Function(Function::Native(native)) => {
                self.call_native(&native, arg_values, call_token)
            }
            other => Err(Self::type_error("FUNCTION", &other, callee)),
        }
    }

    fn call_closure(
        &mut self,
        closure: &Closure,
        args: Vec<Value>,
        call_token: &Token,
    ) -> RuntimeResult<Value> {
        if closure.arity() != args.len() {
            return Err(RuntimeError::new(
                call_token.clone(),
                RuntimeErrorKind::WrongArity {
                    expected: closure.arity(),
                    got: args.len(),
                },
            ));
        }

        // Parameters bind in a child of the captured environment, not the
        // caller's.
        let param_scope = closure.env().child();
        for (param, arg) in closure.params().iter().zip(args) {
            param_scope
                .create(param, arg)
                .map_err(|kind| RuntimeError::new(call_token.clone(), kind))?;
        }

        let prev_env = self.swap_env(param_scope);
        let result = self.eval_block(closure.body());
        self.swap_env(prev_env);

        match result? {
            Value::Exit(Exit::Return(value)) => Ok(*value),
            Value::Exit(Exit::Break(token)) => Err(RuntimeError::new(
                token,
                RuntimeErrorKind::StrayExit("break"),
            )),
            Value::Exit(Exit::Continue(token)) => Err(RuntimeError::new(
                token,
                RuntimeErrorKind::StrayExit("continue"),
            )),
            value => Ok(value),
        }
    }

    fn call_native(
        &mut self,
        native: &NativeFn,
        args: Vec<Value>,
        call_token: &Token,
    ) -> RuntimeResult<Value> {
        if let Some(expected) = native.arity() {
            if args.len() != expected {
                return Err(RuntimeError::new(
                    call_token.clone(),
                    RuntimeErrorKind::WrongArity {
                        expected,
                        got: args.len(),
                    },
                ));
            }
        }

        native
            .call(args, self.out)
            .map_err(|message| RuntimeError::new(call_token.clone(), RuntimeErrorKind::Builtin(message)))
    }

    fn eval_index(
        &mut self,
        subject: &Expr,
        start: &Expr,
        end: Option<&Expr>,
    ) -> RuntimeResult<Value> {
        let container = propagate_exit!(self.eval_expression(subject)?);
        let start_value = propagate_exit!(self.eval_expression(start)?);

        match end {
            None => match &container {
                Value::Str(chars) => {
                    let chars = chars.borrow();
                    let i = Self::check_one_index(&start_value, chars.len(), start)?;
                    Ok(Value::Rune(chars[i]))
                }
                Value::Array(items) => {
                    let items = items.borrow();
                    let i = Self::check_one_index(&start_value, items.len(), start)?;
                    Ok(items[i].clone())
                }
                other => Err(Self::type_error("STRING or ARRAY", other, subject)),
            },
            // The two-index form copies the half-open range into a new
            // container.
            Some(end_node) => {
                let end_value = propagate_exit!(self.eval_expression(end_node)?);
                match &container {
                    Value::Str(chars) => {
                        let chars = chars.borrow();
                        let (a, b) = Self::check_slice_bounds(
                            &start_value,
                            &end_value,
                            chars.len(),
                            start,
                            end_node,
                        )?;
                        Ok(Value::from_chars(chars[a..b].to_vec()))
                    }
                    Value::Array(items) => {
                        let items = items.borrow();
                        let (a, b) = Self::check_slice_bounds(
                            &start_value,
                            &end_value,
                            items.len(),
                            start,
                            end_node,
                        )?;
                        Ok(Value::array(items[a..b].to_vec()))
                    }
                    other => Err(Self::type_error("STRING or ARRAY", other, subject)),
                }
            }
        }
    }

    fn check_one_index(value: &Value, length: usize, node: &Expr) -> RuntimeResult<usize> {
        let index = match value {
            Value::Int(i) => *i,
            other => return Err(Self::type_error("INT", other, node)),
        };

        if index < 0 || index as usize >= length {
            return Err(RuntimeError::new(
                node.token.clone(),
                RuntimeErrorKind::IndexOutOfBounds { index, length },
            ));
        }

        Ok(index as usize)
    }

    /// `0 <= start < length`, `0 <= end <= length`, `start <= end`. An empty
    /// subject rejects every slice, including 0:0.
    fn check_slice_bounds(
        start: &Value,
        end: &Value,
        length: usize,
        start_node: &Expr,
        end_node: &Expr,
    ) -> RuntimeResult<(usize, usize)> {
        let a = match start {
            Value::Int(i) => *i,
            other => return Err(Self::type_error("INT", other, start_node)),
        };
        let b = match end {
            Value::Int(i) => *i,
            other => return Err(Self::type_error("INT", other, end_node)),
        };

        if a < 0 || b < 0 || a as usize >= length || b as usize > length || a > b {
            return Err(RuntimeError::new(
                start_node.token.clone(),
                RuntimeErrorKind::BadSliceBounds {
                    start: a,
                    end: b,
                    length,
                },
            ));
        }

        Ok((a as usize, b as usize))
    }

    fn type_error(expected: &'static str, got: &Value, node: &Expr) -> RuntimeError {
        RuntimeError::new(
            node.token.clone(),
            RuntimeErrorKind::UnexpectedType {
                expected,
                got: got.type_name(),
                expr: node.to_string(),
            },
        )
    }
}
