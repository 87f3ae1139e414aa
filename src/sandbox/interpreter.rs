// Sandbox interpreter
// Walks the statement tree over a private copy of the input, under operation and time budgets

use std::collections::HashMap;
use std::time::Instant;

use super::parser::{AssignOp, BinaryOp, Expr, ReturnValue, Stmt, StmtKind, UnaryOp};
use super::{SandboxError, SandboxLimits};

/// Wall-clock budget is checked once per this many operations
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// One `record(...)` call, unvalidated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStep {
    pub snapshot: Vec<i64>,
    pub highlights: Vec<i64>,
}

/// What the program handed back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Steps(Vec<RawStep>),
    Array(Vec<i64>),
}

enum Flow {
    Normal,
    Break,
    Continue,
    Return(ReturnValue),
}

pub struct Interpreter<'a> {
    arr: Vec<i64>,
    vars: HashMap<String, i64>,
    steps: Vec<RawStep>,
    limits: &'a SandboxLimits,
    operations: u64,
    started: Instant,
}

impl<'a> Interpreter<'a> {
    pub fn new(initial: &[usize], limits: &'a SandboxLimits) -> Self {
        let arr: Vec<i64> = initial.iter().map(|&value| value as i64).collect();
        let mut vars = HashMap::new();
        vars.insert("n".to_string(), arr.len() as i64);

        Interpreter {
            arr,
            vars,
            steps: Vec::new(),
            limits,
            operations: 0,
            started: Instant::now(),
        }
    }

    /// Run the program to completion
    pub fn run(mut self, program: &[Stmt]) -> Result<Output, SandboxError> {
        let value = match self.block(program)? {
            Flow::Return(value) => value,
            Flow::Break | Flow::Continue => {
                return Err(SandboxError::Runtime(
                    "'break' or 'continue' outside of a loop".to_string(),
                ))
            }
            Flow::Normal => ReturnValue::Steps,
        };

        Ok(match value {
            ReturnValue::Steps => Output::Steps(self.steps),
            ReturnValue::Array => Output::Array(self.arr),
        })
    }

    fn tick(&mut self) -> Result<(), SandboxError> {
        self.operations += 1;
        if self.operations > self.limits.max_operations {
            return Err(SandboxError::BudgetExhausted(self.limits.max_operations));
        }
        if self.operations % CLOCK_CHECK_INTERVAL == 0 && self.started.elapsed() > self.limits.timeout() {
            return Err(SandboxError::Timeout(self.limits.timeout()));
        }
        Ok(())
    }

    fn block(&mut self, body: &[Stmt]) -> Result<Flow, SandboxError> {
        for stmt in body {
            match self.statement(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<Flow, SandboxError> {
        self.tick()?;
        let line = stmt.line;

        match &stmt.kind {
            StmtKind::Let(name, value) => {
                let value = self.eval(value, line)?;
                self.vars.insert(name.clone(), value);
            }
            StmtKind::Assign(name, op, value) => {
                let value = self.eval(value, line)?;
                let current = match self.vars.get(name) {
                    Some(&current) => current,
                    None => return Err(runtime(line, format!("unknown variable '{}'", name))),
                };
                let updated = apply_assign(*op, current, value, line)?;
                self.vars.insert(name.clone(), updated);
            }
            StmtKind::SetElement(index, op, value) => {
                let index = self.index(index, line)?;
                let value = self.eval(value, line)?;
                self.arr[index] = apply_assign(*op, self.arr[index], value, line)?;
            }
            StmtKind::Swap(a, b) => {
                let a = self.index(a, line)?;
                let b = self.index(b, line)?;
                self.arr.swap(a, b);
            }
            StmtKind::Record(highlights) => {
                if self.steps.len() >= self.limits.max_snapshots {
                    return Err(runtime(
                        line,
                        format!("more than {} snapshots recorded", self.limits.max_snapshots),
                    ));
                }
                let highlights = highlights
                    .iter()
                    .map(|expr| self.eval(expr, line))
                    .collect::<Result<Vec<_>, _>>()?;
                self.steps.push(RawStep {
                    snapshot: self.arr.clone(),
                    highlights,
                });
            }
            StmtKind::If(cond, then_branch, else_branch) => {
                let branch = if self.eval(cond, line)? != 0 {
                    then_branch
                } else {
                    else_branch
                };
                return self.block(branch);
            }
            StmtKind::While(cond, body) => {
                while self.eval(cond, line)? != 0 {
                    match self.block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            StmtKind::For {
                var,
                start,
                end,
                reverse,
                body,
            } => {
                let start = self.eval(start, line)?;
                let end = self.eval(end, line)?;

                let step: i64 = if *reverse { -1 } else { 1 };
                let mut counter = if *reverse { end.saturating_sub(1) } else { start };
                while (start..end).contains(&counter) {
                    self.tick()?;
                    self.vars.insert(var.clone(), counter);
                    match self.block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    counter = match counter.checked_add(step) {
                        Some(next) => next,
                        None => break,
                    };
                }
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Return(value) => return Ok(Flow::Return(*value)),
        }

        Ok(Flow::Normal)
    }

    /// Evaluate `expr` as a position into `arr`
    fn index(&mut self, expr: &Expr, line: usize) -> Result<usize, SandboxError> {
        let value = self.eval(expr, line)?;
        match usize::try_from(value) {
            Ok(index) if index < self.arr.len() => Ok(index),
            _ => Err(runtime(
                line,
                format!("index {} out of range for {} values", value, self.arr.len()),
            )),
        }
    }

    fn eval(&mut self, expr: &Expr, line: usize) -> Result<i64, SandboxError> {
        self.tick()?;

        match expr {
            Expr::Int(value) => Ok(*value),
            Expr::Var(name) => self
                .vars
                .get(name)
                .copied()
                .ok_or_else(|| runtime(line, format!("unknown variable '{}'", name))),
            Expr::Element(index) => {
                let index = self.index(index, line)?;
                Ok(self.arr[index])
            }
            Expr::Len => Ok(self.arr.len() as i64),
            Expr::Min(a, b) => Ok(self.eval(a, line)?.min(self.eval(b, line)?)),
            Expr::Max(a, b) => Ok(self.eval(a, line)?.max(self.eval(b, line)?)),
            Expr::Unary(UnaryOp::Neg, inner) => self
                .eval(inner, line)?
                .checked_neg()
                .ok_or_else(|| runtime(line, "integer overflow")),
            Expr::Unary(UnaryOp::Not, inner) => Ok((self.eval(inner, line)? == 0) as i64),
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                Ok((self.eval(lhs, line)? != 0 && self.eval(rhs, line)? != 0) as i64)
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                Ok((self.eval(lhs, line)? != 0 || self.eval(rhs, line)? != 0) as i64)
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, line)?;
                let rhs = self.eval(rhs, line)?;
                binary(*op, lhs, rhs, line)
            }
        }
    }
}

fn runtime(line: usize, message: impl std::fmt::Display) -> SandboxError {
    SandboxError::Runtime(format!("line {}: {}", line, message))
}

fn apply_assign(op: AssignOp, current: i64, value: i64, line: usize) -> Result<i64, SandboxError> {
    match op {
        AssignOp::Set => Ok(value),
        AssignOp::Add => binary(BinaryOp::Add, current, value, line),
        AssignOp::Sub => binary(BinaryOp::Sub, current, value, line),
    }
}

fn binary(op: BinaryOp, lhs: i64, rhs: i64, line: usize) -> Result<i64, SandboxError> {
    let overflow = || runtime(line, "integer overflow");

    match op {
        BinaryOp::Add => lhs.checked_add(rhs).ok_or_else(overflow),
        BinaryOp::Sub => lhs.checked_sub(rhs).ok_or_else(overflow),
        BinaryOp::Mul => lhs.checked_mul(rhs).ok_or_else(overflow),
        BinaryOp::Div | BinaryOp::Rem if rhs == 0 => Err(runtime(line, "division by zero")),
        BinaryOp::Div => lhs.checked_div(rhs).ok_or_else(overflow),
        BinaryOp::Rem => lhs.checked_rem(rhs).ok_or_else(overflow),
        BinaryOp::Eq => Ok((lhs == rhs) as i64),
        BinaryOp::NotEq => Ok((lhs != rhs) as i64),
        BinaryOp::Lt => Ok((lhs < rhs) as i64),
        BinaryOp::LtEq => Ok((lhs <= rhs) as i64),
        BinaryOp::Gt => Ok((lhs > rhs) as i64),
        BinaryOp::GtEq => Ok((lhs >= rhs) as i64),
        BinaryOp::And => Ok((lhs != 0 && rhs != 0) as i64),
        BinaryOp::Or => Ok((lhs != 0 || rhs != 0) as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::parser::parse;

    fn run(source: &str, initial: &[usize]) -> Result<Output, SandboxError> {
        let limits = SandboxLimits::default();
        let program = parse(source)?;
        Interpreter::new(initial, &limits).run(&program)
    }

    #[test]
    fn test_records_swaps() {
        let output = run(
            "for i in 0..n { for j in 0..n - i - 1 { if arr[j] > arr[j + 1] { swap(j, j + 1); record(j, j + 1); } } }",
            &[2, 0, 1],
        )
        .unwrap();

        match output {
            Output::Steps(steps) => {
                assert_eq!(steps.len(), 2);
                assert_eq!(steps[0].snapshot, vec![0, 2, 1]);
                assert_eq!(steps[0].highlights, vec![0, 1]);
                assert_eq!(steps[1].snapshot, vec![0, 1, 2]);
            }
            other => panic!("expected steps, got {:?}", other),
        }
    }

    #[test]
    fn test_return_array() {
        let output = run("swap(0, 1);\nreturn arr;\nswap(0, 1);", &[1, 0]).unwrap();
        assert_eq!(output, Output::Array(vec![0, 1]));
    }

    #[test]
    fn test_break_continue_and_reverse_loops() {
        let output = run(
            "let total = 0;\nfor i in rev 0..10 { if i % 2 == 0 { continue; } if i < 4 { break; } total += i; }\narr[0] = total;\nreturn arr;",
            &[0, 1],
        )
        .unwrap();
        // 9 + 7 + 5
        assert_eq!(output, Output::Array(vec![21, 1]));
    }

    #[test]
    fn test_short_circuit_skips_bad_index() {
        let output = run("if 0 && arr[99] { swap(0, 1); }\nreturn arr;", &[1, 0]).unwrap();
        assert_eq!(output, Output::Array(vec![1, 0]));
    }

    #[test]
    fn test_runtime_errors() {
        assert_eq!(
            run("let a = 1;\nlet b = a / 0;", &[0]),
            Err(SandboxError::Runtime("line 2: division by zero".to_string()))
        );
        assert_eq!(
            run("swap(0, 5);", &[0, 1]),
            Err(SandboxError::Runtime("line 1: index 5 out of range for 2 values".to_string()))
        );
        assert_eq!(
            run("x = 1;", &[0]),
            Err(SandboxError::Runtime("line 1: unknown variable 'x'".to_string()))
        );
    }

    #[test]
    fn test_infinite_loop_exhausts_budget() {
        let limits = SandboxLimits {
            max_operations: 10_000,
            ..SandboxLimits::default()
        };
        let program = parse("while 1 { }").unwrap();
        assert_eq!(
            Interpreter::new(&[0, 1], &limits).run(&program),
            Err(SandboxError::BudgetExhausted(10_000))
        );
    }

    #[test]
    fn test_snapshot_limit() {
        let limits = SandboxLimits {
            max_snapshots: 3,
            ..SandboxLimits::default()
        };
        let program = parse("for i in 0..10 { record(); }").unwrap();
        assert!(matches!(
            Interpreter::new(&[0, 1], &limits).run(&program),
            Err(SandboxError::Runtime(_))
        ));
    }

    #[test]
    fn test_program_cannot_touch_input() {
        let input = vec![1, 0];
        let _ = run("swap(0, 1); record();", &input).unwrap();
        assert_eq!(input, vec![1, 0]);
    }
}
