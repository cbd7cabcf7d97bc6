// Interpreter to execute the AST

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use crate::ast::{Expression, LogicalOp, Program, Statement, StatementKind};
use crate::diagnostics::DiagnosticSink;
use crate::error::RuntimeError;
use crate::value::Value;

/// Nested calls allowed before a call fails instead of exhausting the host stack.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// Variable bindings of one scope.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn get(&self, name: &str) -> Result<&Value, RuntimeError> {
        self.vars
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }
}

#[derive(Debug)]
struct Function {
    params: Vec<String>,
    body: Vec<Statement>,
}

/// How a statement or block finished.
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    Normal,
    Return(Value),
}

/// Tree-walking interpreter writing program output to `out` and
/// diagnostic records to `sink`.
///
/// Variables and functions persist across [`Interpreter::run`] calls.
pub struct Interpreter<W, S> {
    /// `frames[0]` holds top-level variables; each call pushes an isolated frame.
    frames: Vec<Environment>,
    functions: HashMap<String, Rc<Function>>,
    max_call_depth: usize,
    out: W,
    sink: S,
}

impl<S: DiagnosticSink> Interpreter<io::Stdout, S> {
    pub fn with_stdout(sink: S) -> Self {
        Self::new(io::stdout(), sink)
    }
}

impl<W: Write, S: DiagnosticSink> Interpreter<W, S> {
    pub fn new(out: W, sink: S) -> Self {
        Self {
            frames: vec![Environment::default()],
            functions: HashMap::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            out,
            sink,
        }
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn globals(&self) -> &Environment {
        &self.frames[0]
    }

    pub fn into_parts(self) -> (W, S) {
        (self.out, self.sink)
    }

    /// Execute every top-level statement in order.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for statement in &program.statements {
            match self.execute_statement(statement)? {
                Flow::Normal => {}
                Flow::Return(_) => {
                    return Err(RuntimeError::ReturnOutsideFunction
                        .at(statement.pos.line, statement.pos.col));
                }
            }
        }
        self.out.flush().map_err(RuntimeError::Output)
    }

    fn scope(&self) -> &Environment {
        &self.frames[self.frames.len() - 1]
    }

    fn scope_mut(&mut self) -> &mut Environment {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    fn log(&mut self, line: String) -> Result<(), RuntimeError> {
        self.sink.write(&line).map_err(RuntimeError::Diagnostic)
    }

    fn execute_block(&mut self, block: &[Statement]) -> Result<Flow, RuntimeError> {
        for statement in block {
            if let Flow::Return(value) = self.execute_statement(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<Flow, RuntimeError> {
        tracing::debug!(pos = %statement.pos, statement = statement.kind.name(), "execute");
        self.execute_kind(&statement.kind)
            .map_err(|e| e.at(statement.pos.line, statement.pos.col))
    }

    fn execute_kind(&mut self, kind: &StatementKind) -> Result<Flow, RuntimeError> {
        match kind {
            StatementKind::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.log(format!("[SET] {name} = {value}"))?;
                self.scope_mut().set(name.clone(), value);
            }
            StatementKind::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{value}").map_err(RuntimeError::Output)?;
                self.log(format!("[PRINT] {value}"))?;
            }
            StatementKind::Log(expr) => {
                let value = self.evaluate(expr)?;
                self.log(format!("[LOG] {value}"))?;
            }
            StatementKind::If {
                condition,
                then_block,
                else_block,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute_block(then_block);
                }
                if let Some(else_block) = else_block {
                    return self.execute_block(else_block);
                }
            }
            StatementKind::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            StatementKind::WriteFile { path, content } => {
                let path = self.evaluate_path(path)?;
                let content = self.evaluate(content)?.to_string();
                ensure_parent_dir(&path)?;
                fs::write(&path, content).map_err(|source| RuntimeError::Io {
                    path: path.clone(),
                    source,
                })?;
                self.log(format!("[WRITEFILE] {}", path.display()))?;
            }
            StatementKind::AppendFile { path, content } => {
                let path = self.evaluate_path(path)?;
                let content = self.evaluate(content)?.to_string();
                ensure_parent_dir(&path)?;
                fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .and_then(|mut file| file.write_all(content.as_bytes()))
                    .map_err(|source| RuntimeError::Io {
                        path: path.clone(),
                        source,
                    })?;
                self.log(format!("[APPENDFILE] {}", path.display()))?;
            }
            StatementKind::ReadFile { path, target } => {
                let path = self.evaluate_path(path)?;
                let content = fs::read_to_string(&path).map_err(|source| {
                    if source.kind() == io::ErrorKind::NotFound {
                        RuntimeError::FileNotFound { path: path.clone() }
                    } else {
                        RuntimeError::Io {
                            path: path.clone(),
                            source,
                        }
                    }
                })?;
                self.scope_mut().set(target.clone(), Value::String(content));
                self.log(format!("[READFILE] {} -> {target}", path.display()))?;
            }
            StatementKind::DeleteFile(path) => {
                let path = self.evaluate_path(path)?;
                match fs::remove_file(&path) {
                    Ok(()) => self.log(format!("[DELETEFILE] {}", path.display()))?,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(source) => return Err(RuntimeError::Io { path, source }),
                }
            }
            StatementKind::FunctionDef { name, params, body } => {
                self.functions.insert(
                    name.clone(),
                    Rc::new(Function {
                        params: params.clone(),
                        body: body.clone(),
                    }),
                );
            }
            StatementKind::Call { name, args } => {
                self.call(name, args)?;
            }
            StatementKind::Return(expr) => {
                let value = self.evaluate(expr)?;
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn evaluate_path(&mut self, expr: &Expression) -> Result<PathBuf, RuntimeError> {
        Ok(PathBuf::from(self.evaluate(expr)?.to_string()))
    }

    fn evaluate(&mut self, expr: &Expression) -> Result<Value, RuntimeError> {
        match expr {
            Expression::String(s) => Ok(Value::String(s.clone())),
            Expression::Number(n) => Ok(Value::Integer(*n)),
            Expression::Variable(name) => self.scope().get(name).cloned(),
            Expression::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Value::binary(*op, left, right)
            }
            Expression::Logical { op, left, right } => {
                let left = self.evaluate(left)?.is_truthy();
                let result = match op {
                    LogicalOp::And => left && self.evaluate(right)?.is_truthy(),
                    LogicalOp::Or => left || self.evaluate(right)?.is_truthy(),
                };
                Ok(Value::Boolean(result))
            }
            Expression::Call { name, args } => self.call(name, args),
        }
    }

    /// Invoke a user function in a fresh frame holding only its parameters.
    fn call(&mut self, name: &str, args: &[Expression]) -> Result<Value, RuntimeError> {
        let function = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedFunction {
                name: name.to_string(),
            })?;

        if args.len() != function.params.len() {
            return Err(RuntimeError::ArityMismatch {
                name: name.to_string(),
                expected: function.params.len(),
                found: args.len(),
            });
        }

        // frames[0] is the top level, so depth counts active calls
        if self.frames.len() > self.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                name: name.to_string(),
                limit: self.max_call_depth,
            });
        }

        let mut frame = Environment::default();
        for (param, arg) in function.params.iter().zip(args) {
            let value = self.evaluate(arg)?;
            frame.set(param.clone(), value);
        }

        self.frames.push(frame);
        let result = self.execute_block(&function.body);
        self.frames.pop();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
        }
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<(), RuntimeError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| RuntimeError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
