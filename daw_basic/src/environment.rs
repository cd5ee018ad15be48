use std::collections::HashMap;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::value::Value;

/// A named, immutable value installed at engine init (PI, TRUE, FALSE, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantEntry {
    pub description: String,
    pub value: Value,
}

/// A fixed-shape array created by `DIM`. `storage` is flat, row-major
/// over `dimensions`, length `dimensions.iter().product()`, all cells
/// `Value::Empty` on creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayEntry {
    pub dimensions: Vec<usize>,
    pub storage: Vec<Value>,
}

impl ArrayEntry {
    fn flat_offset(&self, indices: &[usize]) -> usize {
        let mut offset = 0usize;
        let mut stride = 1usize;
        for (i, idx) in indices.iter().enumerate() {
            offset += idx * stride;
            stride *= self.dimensions[i];
        }
        offset
    }

    pub fn get(&self, indices: &[i32]) -> EngineResult<&Value> {
        let uidx = self.checked_indices(indices)?;
        Ok(&self.storage[self.flat_offset(&uidx)])
    }

    pub fn set(&mut self, indices: &[i32], value: Value) -> EngineResult<()> {
        let uidx = self.checked_indices(indices)?;
        let offset = self.flat_offset(&uidx);
        self.storage[offset] = value;
        Ok(())
    }

    fn checked_indices(&self, indices: &[i32]) -> EngineResult<Vec<usize>> {
        if indices.len() != self.dimensions.len() {
            return Err(EngineError::syntax(format!(
                "array expects {} dimension(s), got {}",
                self.dimensions.len(),
                indices.len()
            )));
        }
        let mut out = Vec::with_capacity(indices.len());
        for (i, &idx) in indices.iter().enumerate() {
            if idx < 0 || idx as usize >= self.dimensions[i] {
                return Err(EngineError::syntax(format!(
                    "array index out of bounds: declared {:?}, requested {:?}",
                    self.dimensions, indices
                )));
            }
            out.push(idx as usize);
        }
        Ok(out)
    }
}

pub type BuiltinFn = fn(&[Value]) -> EngineResult<Value>;

#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub description: &'static str,
    pub callable: BuiltinFn,
}

pub type BinaryOpFn = fn(&Value, &Value) -> EngineResult<Value>;
pub type UnaryOpFn = fn(&Value) -> EngineResult<Value>;

#[derive(Debug, Clone, Copy)]
pub struct BinaryOperatorEntry {
    pub precedence: u8,
    pub callable: BinaryOpFn,
}

#[derive(Debug, Clone, Copy)]
pub struct UnaryOperatorEntry {
    pub precedence: u8,
    pub callable: UnaryOpFn,
}

/// A keyword's statement handler: given the engine and the rest-of-line
/// text after the keyword, perform the statement's effect and return
/// whether the REPL should keep going.
pub type KeywordFn = fn(&mut Engine, &str) -> EngineResult<bool>;

#[derive(Debug, Clone, Copy)]
pub struct KeywordEntry {
    pub callable: KeywordFn,
}

/// Case-insensitive name tables for everything the evaluator and
/// dispatcher look symbols up in. Mirrors the teacher's `REPLGlobals`
/// struct of named tables the REPL reads and writes across
/// evaluations, collapsed to one `Value`-shaped table per name space.
#[derive(Debug, Default)]
pub struct Environment {
    variables: HashMap<String, Value>,
    constants: HashMap<String, ConstantEntry>,
    arrays: HashMap<String, ArrayEntry>,
    functions: HashMap<String, FunctionEntry>,
    keywords: HashMap<String, KeywordEntry>,
    binary_operators: HashMap<String, BinaryOperatorEntry>,
    unary_operators: HashMap<String, UnaryOperatorEntry>,
}

fn canon(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains_key(&canon(name))
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains_key(&canon(name))
    }

    pub fn is_array(&self, name: &str) -> bool {
        self.arrays.contains_key(&canon(name))
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(&canon(name))
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.keywords.contains_key(&canon(name))
    }

    fn reserved(&self, name: &str) -> bool {
        let key = canon(name);
        self.functions.contains_key(&key) || self.keywords.contains_key(&key)
    }

    pub fn add_variable(&mut self, name: &str, value: Value) -> EngineResult<()> {
        let key = canon(name);
        if self.constants.contains_key(&key) || self.reserved(&key) {
            return Err(EngineError::syntax(format!(
                "cannot use '{name}' as a variable name"
            )));
        }
        self.variables.insert(key, value);
        Ok(())
    }

    pub fn add_constant(&mut self, name: &str, description: impl Into<String>, value: Value) -> EngineResult<()> {
        let key = canon(name);
        if self.reserved(&key) {
            return Err(EngineError::syntax(format!(
                "cannot use '{name}' as a constant name"
            )));
        }
        self.variables.remove(&key);
        self.constants.insert(
            key,
            ConstantEntry {
                description: description.into(),
                value,
            },
        );
        Ok(())
    }

    pub fn add_function(&mut self, name: &str, description: &'static str, callable: BuiltinFn) -> EngineResult<()> {
        let key = canon(name);
        if self.keywords.contains_key(&key) {
            return Err(EngineError::fatal(format!(
                "cannot register function '{name}': name already a keyword"
            )));
        }
        self.functions.insert(key, FunctionEntry { description, callable });
        Ok(())
    }

    pub fn add_keyword(&mut self, name: &str, callable: KeywordFn) {
        self.keywords.insert(canon(name), KeywordEntry { callable });
    }

    pub fn add_binary_operator(&mut self, symbol: &str, precedence: u8, callable: BinaryOpFn) {
        self.binary_operators
            .insert(symbol.to_string(), BinaryOperatorEntry { precedence, callable });
    }

    pub fn add_unary_operator(&mut self, symbol: &str, precedence: u8, callable: UnaryOpFn) {
        self.unary_operators
            .insert(symbol.to_string(), UnaryOperatorEntry { precedence, callable });
    }

    pub fn binary_operator(&self, symbol: &str) -> Option<&BinaryOperatorEntry> {
        self.binary_operators.get(symbol)
    }

    pub fn unary_operator(&self, symbol: &str) -> Option<&UnaryOperatorEntry> {
        self.unary_operators.get(symbol)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(&canon(name))
    }

    pub fn keyword(&self, name: &str) -> Option<&KeywordEntry> {
        self.keywords.get(&canon(name))
    }

    /// `DIM name(d1[,d2])`.
    pub fn dim(&mut self, name: &str, dimensions: Vec<usize>) -> EngineResult<()> {
        let key = canon(name);
        if self.reserved(&key) || self.constants.contains_key(&key) {
            return Err(EngineError::syntax(format!(
                "cannot DIM '{name}': name already in use"
            )));
        }
        if self.arrays.contains_key(&key) {
            return Err(EngineError::syntax(format!("array '{name}' already DIMensioned")));
        }
        self.variables.remove(&key);
        let len = dimensions.iter().product();
        self.arrays.insert(
            key,
            ArrayEntry {
                dimensions,
                storage: vec![Value::Empty; len],
            },
        );
        Ok(())
    }

    pub fn array(&self, name: &str) -> Option<&ArrayEntry> {
        self.arrays.get(&canon(name))
    }

    pub fn array_mut(&mut self, name: &str) -> Option<&mut ArrayEntry> {
        self.arrays.get_mut(&canon(name))
    }

    pub fn get_variable_constant(&self, name: &str) -> EngineResult<Value> {
        let key = canon(name);
        if let Some(c) = self.constants.get(&key) {
            return Ok(c.value.clone());
        }
        if let Some(v) = self.variables.get(&key) {
            return Ok(v.clone());
        }
        Err(EngineError::syntax(format!("undefined symbol '{name}'")))
    }

    pub fn set_variable(&mut self, name: &str, value: Value) -> EngineResult<()> {
        let key = canon(name);
        if self.constants.contains_key(&key) {
            return Err(EngineError::syntax(format!("cannot assign to constant '{name}'")));
        }
        if self.reserved(&key) {
            return Err(EngineError::syntax(format!(
                "cannot use '{name}' as a variable name"
            )));
        }
        self.variables.insert(key, value);
        Ok(())
    }

    pub fn remove_variable(&mut self, name: &str) -> EngineResult<()> {
        let key = canon(name);
        if self.variables.remove(&key).is_none() {
            return Err(EngineError::syntax(format!("no such variable '{name}'")));
        }
        Ok(())
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
        self.arrays.clear();
    }

    pub fn list_variables(&self) -> String {
        let mut names: Vec<_> = self.variables.keys().cloned().collect();
        names.sort();
        names
            .into_iter()
            .map(|n| {
                let v = &self.variables[&n];
                format!("{n} = {v}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn list_constants(&self) -> String {
        let mut names: Vec<_> = self.constants.keys().cloned().collect();
        names.sort();
        names
            .into_iter()
            .map(|n| {
                let c = &self.constants[&n];
                format!("{n} = {} ({})", c.value, c.description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn list_functions(&self) -> String {
        let mut names: Vec<_> = self.functions.keys().cloned().collect();
        names.sort();
        names
            .into_iter()
            .map(|n| format!("{n} - {}", self.functions[&n].description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn list_keywords(&self) -> String {
        let mut names: Vec<_> = self.keywords.keys().cloned().collect();
        names.sort();
        names.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn variable_names_are_case_insensitive() {
        let mut env = Environment::new();
        env.set_variable("x", Value::Integer(1)).unwrap();
        assert_eq!(
            env.get_variable_constant("X").unwrap(),
            Value::Integer(1)
        );
    }

    #[test]
    fn dim_rejects_redim() {
        let mut env = Environment::new();
        env.dim("A", vec![3]).unwrap();
        assert!(env.dim("A", vec![4]).is_err());
    }

    #[test]
    fn dim_removes_scalar_shadow() {
        let mut env = Environment::new();
        env.set_variable("A", Value::Integer(5)).unwrap();
        env.dim("A", vec![2]).unwrap();
        assert!(!env.is_variable("A"));
        assert!(env.is_array("A"));
    }

    #[test]
    fn array_round_trips_and_checks_bounds() {
        let mut env = Environment::new();
        env.dim("A", vec![3]).unwrap();
        env.array_mut("A").unwrap().set(&[1], Value::Integer(9)).unwrap();
        assert_eq!(env.array("A").unwrap().get(&[1]).unwrap(), &Value::Integer(9));
        assert!(env.array("A").unwrap().get(&[3]).is_err());
    }

    #[test]
    fn two_dimensional_flat_offset() {
        let mut env = Environment::new();
        env.dim("M", vec![2, 3]).unwrap();
        env.array_mut("M").unwrap().set(&[1, 2], Value::Integer(7)).unwrap();
        assert_eq!(env.array("M").unwrap().get(&[1, 2]).unwrap(), &Value::Integer(7));
        assert_eq!(env.array("M").unwrap().get(&[0, 0]).unwrap(), &Value::Empty);
    }
}
