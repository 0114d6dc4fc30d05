// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fail-open condition expression evaluator.
//!
//! Grammar:
//!
//! ```text
//! expr       := "true" | "false" | comparison
//! comparison := operand ("==" | "!=") operand
//! operand    := "env." IDENT | STRING_LITERAL
//! ```
//!
//! `env.NAME` resolves against the task's own environment overrides first,
//! then the process environment, and is "truthy" on its own (no comparison)
//! when the value is set and not empty.
//!
//! Any expression this parser cannot make sense of is treated as `true` —
//! a malformed `condition` must never stop a task from running, only a
//! well-formed `false` does.

use std::env;

/// Evaluate `expr` against `task_env`. Never returns an error: parse
/// failures resolve to `true` (fail-open, never blocking a run on a typo).
pub fn evaluate(expr: &str, task_env: &[(&str, &str)]) -> bool {
    match parse(expr.trim()) {
        Some(Expr::Bool(b)) => b,
        Some(Expr::EnvTruthy(name)) => {
            lookup(&name, task_env).is_some_and(|v| !v.trim().is_empty())
        }
        Some(Expr::Eq(lhs, rhs, negate)) => {
            let equal = resolve(&lhs, task_env) == resolve(&rhs, task_env);
            if negate {
                !equal
            } else {
                equal
            }
        }
        None => true,
    }
}

enum Expr {
    Bool(bool),
    EnvTruthy(String),
    Eq(Operand, Operand, bool),
}

enum Operand {
    Env(String),
    Literal(String),
}

fn resolve(op: &Operand, task_env: &[(&str, &str)]) -> String {
    match op {
        Operand::Env(name) => lookup(name, task_env).unwrap_or_default(),
        Operand::Literal(s) => s.clone(),
    }
}

fn lookup(name: &str, task_env: &[(&str, &str)]) -> Option<String> {
    task_env
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .or_else(|| env::var(name).ok())
}

fn parse(input: &str) -> Option<Expr> {
    if input == "true" {
        return Some(Expr::Bool(true));
    }
    if input == "false" {
        return Some(Expr::Bool(false));
    }

    if let Some((lhs, rhs)) = split_once_op(input, "==") {
        return Some(Expr::Eq(parse_operand(lhs)?, parse_operand(rhs)?, false));
    }
    if let Some((lhs, rhs)) = split_once_op(input, "!=") {
        return Some(Expr::Eq(parse_operand(lhs)?, parse_operand(rhs)?, true));
    }

    if let Some(name) = input.strip_prefix("env.") {
        if !name.is_empty() {
            return Some(Expr::EnvTruthy(name.to_string()));
        }
    }

    None
}

fn split_once_op<'a>(input: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    input
        .split_once(op)
        .map(|(lhs, rhs)| (lhs.trim(), rhs.trim()))
}

fn parse_operand(s: &str) -> Option<Operand> {
    if let Some(name) = s.strip_prefix("env.") {
        if !name.is_empty() {
            return Some(Operand::Env(name.to_string()));
        }
        return None;
    }
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        return Some(Operand::Literal(s[1..s.len() - 1].to_string()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_true_and_false() {
        assert!(evaluate("true", &[]));
        assert!(!evaluate("false", &[]));
    }

    #[test]
    fn env_truthiness_from_task_env() {
        assert!(evaluate("env.DEPLOY", &[("DEPLOY", "1")]));
        assert!(!evaluate("env.DEPLOY", &[("DEPLOY", "")]));
        assert!(!evaluate("env.DEPLOY", &[("DEPLOY", "   ")]));
        assert!(!evaluate("env.DEPLOY", &[]));
    }

    #[test]
    fn equality_and_inequality() {
        assert!(evaluate(
            "env.BRANCH == \"main\"",
            &[("BRANCH", "main")]
        ));
        assert!(!evaluate(
            "env.BRANCH == \"main\"",
            &[("BRANCH", "dev")]
        ));
        assert!(evaluate(
            "env.BRANCH != \"main\"",
            &[("BRANCH", "dev")]
        ));
    }

    #[test]
    fn malformed_expression_fails_open() {
        assert!(evaluate("this is not valid", &[]));
        assert!(evaluate("env.", &[]));
        assert!(evaluate("== \"x\"", &[]));
        assert!(evaluate("", &[]));
    }

    #[test]
    fn task_env_takes_precedence_over_process_env() {
        std::env::set_var("ZR_COND_TEST_VAR", "process-value");
        assert!(evaluate(
            "env.ZR_COND_TEST_VAR == \"task-value\"",
            &[("ZR_COND_TEST_VAR", "task-value")]
        ));
        std::env::remove_var("ZR_COND_TEST_VAR");
    }
}
