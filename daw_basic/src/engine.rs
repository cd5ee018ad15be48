use crate::builtins;
use crate::environment::{BuiltinFn, Environment};
use crate::error::EngineResult;
use crate::keywords;
use crate::program::{LoopStack, ProgramStore, ReturnStack};
use crate::rng::StableRng;
use crate::value::Value;

/// The two states a session can be in: typing at the prompt, or
/// stepping through the stored program under a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Immediate,
    Deferred,
}

/// The single-instance owner of the symbol environment, program
/// store, return stack, loop stack, and run mode — what spec.md calls
/// `EngineState` plus its owned tables. `RUN` does not spin up a
/// separate child engine; it flips this same engine's `run_mode` and
/// drives its own cursor, since everything it needs to share with the
/// calling session (variables, arrays, the program text) already lives
/// here in one place.
#[derive(Debug)]
pub struct Engine {
    pub(crate) env: Environment,
    pub(crate) program: ProgramStore,
    pub(crate) return_stack: ReturnStack,
    pub(crate) loop_stack: LoopStack,
    pub(crate) run_mode: RunMode,
    pub(crate) cursor: i32,
    pub(crate) has_syntax_error: bool,
    pub(crate) exiting: bool,
    pub(crate) rng: StableRng,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        builtins::install(&mut env);
        keywords::install(&mut env);
        Engine {
            env,
            program: ProgramStore::new(),
            return_stack: ReturnStack::new(),
            loop_stack: LoopStack::new(),
            run_mode: RunMode::Immediate,
            cursor: -1,
            has_syntax_error: false,
            exiting: false,
            rng: StableRng::from_wall_clock(),
        }
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.run_mode, RunMode::Deferred)
    }

    pub fn current_line(&self) -> i32 {
        self.cursor
    }

    /// Whether the most recent [`Engine::parse_line`]/[`Engine::run`]
    /// raised a SYNTAX error. Cleared at the start of every `run`.
    pub fn has_syntax_error(&self) -> bool {
        self.has_syntax_error
    }

    pub fn reseed_rng(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    pub fn reset(&mut self) {
        let mut env = Environment::new();
        builtins::install(&mut env);
        keywords::install(&mut env);
        self.env = env;
        self.program = ProgramStore::new();
        self.return_stack = ReturnStack::new();
        self.loop_stack = LoopStack::new();
        self.run_mode = RunMode::Immediate;
        self.cursor = -1;
        self.has_syntax_error = false;
        self.exiting = false;
    }

    // --- public API (spec §6) ---

    pub fn add_variable(&mut self, name: &str, value: Value) -> EngineResult<()> {
        self.env.add_variable(name, value)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) -> EngineResult<()> {
        self.env.set_variable(name, value)
    }

    pub fn add_constant(&mut self, name: &str, description: impl Into<String>, value: Value) -> EngineResult<()> {
        self.env.add_constant(name, description, value)
    }

    pub fn add_function(&mut self, name: &str, description: &'static str, callable: BuiltinFn) -> EngineResult<()> {
        self.env.add_function(name, description, callable)
    }

    pub fn get_variable_constant(&self, name: &str) -> EngineResult<Value> {
        self.env.get_variable_constant(name)
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.env.is_variable(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.env.is_constant(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.env.is_function(name)
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.env.is_keyword(name)
    }

    pub fn list_variables(&self) -> String {
        self.env.list_variables()
    }

    pub fn list_constants(&self) -> String {
        self.env.list_constants()
    }

    pub fn list_functions(&self) -> String {
        self.env.list_functions()
    }

    pub fn list_keywords(&self) -> String {
        self.env.list_keywords()
    }

    pub fn add_line(&mut self, number: i32, text: impl Into<String>) {
        self.program.add_line(number, text.into());
    }

    pub fn remove_line(&mut self, number: i32) {
        self.program.remove_line(number);
    }

    pub fn list_program(&mut self) -> String {
        self.program.sort();
        self.program.list_text()
    }

    /// `RUN [n]` per spec §4.8.
    pub fn run(&mut self, line_number: i32) -> EngineResult<bool> {
        self.has_syntax_error = false;
        self.program.sort();
        self.cursor = if line_number >= 0 {
            line_number
        } else {
            self.program.first_real_number().unwrap_or(-1)
        };
        self.continue_running()
    }

    /// `CONT`: resume a deferred run from the line after the one that
    /// last stopped it (via `STOP`).
    pub(crate) fn cont(&mut self) -> EngineResult<bool> {
        self.has_syntax_error = false;
        match self.program.next_number_after(self.cursor) {
            Some(n) => self.cursor = n,
            None => self.cursor = -1,
        }
        self.continue_running()
    }

    /// Drive execution forward from `self.cursor` until the program
    /// ends, a SYNTAX error is raised, `exiting` is set, or a FATAL
    /// error stops the whole session.
    pub(crate) fn continue_running(&mut self) -> EngineResult<bool> {
        self.run_mode = RunMode::Deferred;
        loop {
            if self.cursor < 0 {
                break;
            }
            let current_line = self.cursor;
            let text = match self.program.get(current_line) {
                Some(line) => line.text.clone(),
                None => break,
            };
            let _ = self.env.add_constant(
                "CURRENT_LINE",
                "the line number currently executing",
                Value::Integer(current_line),
            );

            if !self.dispatch_line(&text) {
                self.run_mode = RunMode::Immediate;
                return Ok(false);
            }
            if self.has_syntax_error {
                println!("Error was on line {current_line}");
                break;
            }
            if self.exiting {
                self.exiting = false;
                break;
            }
            // GOTO/GOSUB/RETURN/NEXT jump by setting `cursor` directly
            // during dispatch; only advance linearly when nothing did.
            if self.cursor == current_line {
                match self.program.next_number_after(current_line) {
                    Some(n) => self.cursor = n,
                    None => break,
                }
            }
        }
        self.run_mode = RunMode::Immediate;
        Ok(true)
    }
}
