//! WASM bindings for simplexsolve
//!
//! JavaScript-friendly wrappers around the parser, compiler, and solver for
//! use in browser-based editors.

use wasm_bindgen::prelude::*;

use crate::compiler::Compiler;
use crate::lexer::Lexer;
use crate::parser::Parser;
use simplexsolve_solver::{SimplexError, Solver};

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Parse source code and return the AST as JSON
#[wasm_bindgen]
pub fn parse(source: &str) -> Result<JsValue, JsValue> {
    let program = Parser::parse(source).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&program).map_err(to_js_error)
}

/// Tokenize source code and return tokens as JSON
#[wasm_bindgen]
pub fn tokenize(source: &str) -> Result<JsValue, JsValue> {
    let tokens: Vec<TokenInfo> = Lexer::tokenize(source)
        .into_iter()
        .map(|t| TokenInfo {
            kind: format!("{:?}", t.kind),
            text: t.text,
            start: t.span.start,
            end: t.span.end,
        })
        .collect();
    serde_wasm_bindgen::to_value(&tokens).map_err(to_js_error)
}

/// Token information for JavaScript
#[derive(serde::Serialize)]
struct TokenInfo {
    kind: String,
    text: String,
    start: usize,
    end: usize,
}

/// Solve a problem and return status, objective, and assignment as JSON
///
/// Unbounded problems are reported through `status`, not as an error.
#[wasm_bindgen]
pub fn solve(source: &str) -> Result<JsValue, JsValue> {
    let problem = Compiler::new().compile_source(source).map_err(to_js_error)?;

    let result = match Solver::new().solve(&problem) {
        Ok(solution) => SolveResult {
            status: "optimal".to_string(),
            objective_value: Some(solution.objective_value),
            iterations: Some(solution.iterations),
            variables: problem
                .variables
                .iter()
                .zip(&solution.values)
                .map(|(name, &value)| VariableResult {
                    name: name.clone(),
                    value,
                })
                .collect(),
            binding_constraints: solution.analysis.binding_constraints,
        },
        Err(SimplexError::Unbounded { .. }) => SolveResult {
            status: "unbounded".to_string(),
            objective_value: None,
            iterations: None,
            variables: Vec::new(),
            binding_constraints: Vec::new(),
        },
        Err(e) => return Err(to_js_error(e)),
    };

    serde_wasm_bindgen::to_value(&result).map_err(to_js_error)
}

/// Solve a problem and return just the optimal assignment
#[wasm_bindgen]
pub fn solve_values(source: &str) -> Result<js_sys::Float64Array, JsValue> {
    let problem = Compiler::new().compile_source(source).map_err(to_js_error)?;
    let solution = Solver::new().solve(&problem).map_err(to_js_error)?;
    Ok(js_sys::Float64Array::from(solution.values.as_slice()))
}

#[derive(serde::Serialize)]
struct SolveResult {
    status: String,
    objective_value: Option<f64>,
    iterations: Option<usize>,
    variables: Vec<VariableResult>,
    binding_constraints: Vec<String>,
}

#[derive(serde::Serialize)]
struct VariableResult {
    name: String,
    value: f64,
}
