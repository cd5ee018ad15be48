//! DAW BASIC command-line front end.
//!
//! Usage:
//!   basicr                 # interactive REPL
//!   basicr FILE             # load FILE as numbered program lines, RUN it, exit
//!   basicr -e "CODE"        # feed CODE's lines through immediate mode, exit
//!
//! Grounded on `subset_julia_vm/src/bin/sjulia.rs`: hand-rolled argument
//! parsing (no `clap`), a rustyline-backed interactive loop with a thin
//! keyword/string/number highlighter, and history persisted under the
//! user's home directory the same way that binary reads `$HOME` by hand
//! instead of pulling in the `dirs` crate.

use std::borrow::Cow;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use once_cell::sync::Lazy;
use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Config, Editor, Helper};

use daw_basic::Engine;

const BANNER: &str = "DAW BASIC v0.1\nREADY";

const KEYWORDS: &[&str] = &[
    "NEW", "CLR", "DELETE", "DIM", "LET", "STOP", "CONT", "GOTO", "GOSUB", "RETURN", "PRINT",
    "QUIT", "EXIT", "END", "REM", "LIST", "RUN", "VARS", "FUNCTIONS", "KEYWORDS", "THEN", "IF",
    "FOR", "NEXT", "STEP", "TO", "AND", "OR", "RANDOMIZE",
];

static KEYWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| KEYWORDS.iter().copied().collect());

mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const KEYWORD: &str = "\x1b[38;2;249;38;114m";
    pub const STRING: &str = "\x1b[38;2;230;219;116m";
    pub const NUMBER: &str = "\x1b[38;2;174;129;255m";
    pub const PROMPT: &str = "\x1b[38;2;102;217;239m";
}

fn colors_enabled() -> bool {
    env::var_os("NO_COLOR").is_none()
}

/// Colorize keywords, string literals, and numeric literals in `line`
/// for the interactive prompt. Plain pass-through when `NO_COLOR` is set.
fn highlight_line(line: &str) -> String {
    if !colors_enabled() {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() * 2);
    let bytes = line.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '"' {
            let end = daw_basic_scan::find_end_of_string(&line[i..])
                .map(|e| i + e + 1)
                .unwrap_or(line.len());
            out.push_str(colors::STRING);
            out.push_str(&line[i..end]);
            out.push_str(colors::RESET);
            i = end;
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            out.push_str(colors::NUMBER);
            out.push_str(&line[start..i]);
            out.push_str(colors::RESET);
            continue;
        }
        if c.is_ascii_alphabetic() || c == '$' {
            let start = i;
            while i < bytes.len() && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'$' || bytes[i] == b'_') {
                i += 1;
            }
            let word = &line[start..i];
            if KEYWORD_SET.contains(word.to_ascii_uppercase().as_str()) {
                out.push_str(colors::KEYWORD);
                out.push_str(word);
                out.push_str(colors::RESET);
            } else {
                out.push_str(word);
            }
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

struct BasicHighlighter;

impl Highlighter for BasicHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(highlight_line(line))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(&'s self, prompt: &'p str, _default: bool) -> Cow<'b, str> {
        if colors_enabled() {
            Cow::Owned(format!("{}{}{}", colors::PROMPT, prompt, colors::RESET))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

struct BasicHelper {
    highlighter: BasicHighlighter,
}

impl Helper for BasicHelper {}

impl Completer for BasicHelper {
    type Candidate = String;
}

impl Hinter for BasicHelper {
    type Hint = String;
}

impl Validator for BasicHelper {}

impl Highlighter for BasicHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(&'s self, prompt: &'p str, default: bool) -> Cow<'b, str> {
        self.highlighter.highlight_prompt(prompt, default)
    }

    fn highlight_char(&self, line: &str, pos: usize, kind: CmdKind) -> bool {
        self.highlighter.highlight_char(line, pos, kind)
    }
}

/// `$HOME/.daw_basic`, created on demand. Read by hand rather than
/// pulling in the `dirs` crate, matching the teacher binary's own
/// `dirs_path()` helper.
fn state_dir() -> Option<PathBuf> {
    let home = env::var_os("HOME")?;
    let dir = PathBuf::from(home).join(".daw_basic");
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

fn run_repl() -> ExitCode {
    println!("{BANNER}");

    let mut engine = Engine::new();
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<BasicHelper, DefaultHistory> = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: failed to create REPL editor: {e}");
            return ExitCode::FAILURE;
        }
    };
    rl.set_helper(Some(BasicHelper {
        highlighter: BasicHighlighter,
    }));

    let history_path = state_dir().map(|d| d.join("history.txt"));
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline("] ") {
            Ok(line) => {
                if !engine.parse_line(&line, true) {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(rustyline::error::ReadlineError::Interrupted) => continue,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }
    ExitCode::SUCCESS
}

/// Load `path`'s lines as a numbered program (each line must already
/// be `<number> <statement>`, same as typing them at the prompt) and
/// `RUN` it.
fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{path}': {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut engine = Engine::new();
    for line in source.lines() {
        if !engine.parse_line(line, false) {
            return ExitCode::FAILURE;
        }
    }
    if !engine.parse_line("RUN", false) {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// `-e "CODE"`: feed each of `code`'s lines through immediate mode.
fn run_code(code: &str) -> ExitCode {
    let mut engine = Engine::new();
    for line in code.lines() {
        if !engine.parse_line(line, false) {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match args.as_slice() {
        [_] => run_repl(),
        [_, flag, code] if flag.as_str() == "-e" => run_code(code),
        [_, path] => run_file(path),
        _ => {
            eprintln!("usage: basicr [FILE | -e CODE]");
            ExitCode::FAILURE
        }
    }
}
