//! Keyword statement handlers (spec §4.6) plus the `FOR`/`NEXT` loop
//! completion and the undocumented `RANDOMIZE` statement (spec §9).

use crate::builtins;
use crate::engine::Engine;
use crate::environment::Environment;
use crate::error::{EngineError, EngineResult};
use crate::program::LoopFrame;
use crate::rng::StableRng;
use crate::value::Value;

fn kw_new(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    engine.reset();
    Ok(true)
}

fn kw_clr(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    let rest = rest.trim();
    if rest.is_empty() {
        engine.env.clear_variables();
    } else {
        engine.env.remove_variable(rest)?;
    }
    Ok(true)
}

fn kw_delete(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    let n: i32 = rest
        .trim()
        .parse()
        .map_err(|_| EngineError::syntax("DELETE: expected a line number"))?;
    engine.remove_line(n);
    Ok(true)
}

fn kw_dim(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    let rest = rest.trim();
    let paren_idx = rest
        .find('(')
        .ok_or_else(|| EngineError::syntax("DIM: expected 'name(size[,size])'"))?;
    if !rest.ends_with(')') {
        return Err(EngineError::syntax("DIM: missing closing ')'"));
    }
    let name = rest[..paren_idx].trim();
    let inner = &rest[paren_idx + 1..rest.len() - 1];
    let parts = engine.evaluate_comma_list(inner)?;
    if parts.is_empty() || parts.len() > 2 {
        return Err(EngineError::syntax("DIM: expected 1 or 2 dimensions"));
    }
    let mut dims = Vec::with_capacity(parts.len());
    for v in parts {
        match v {
            Value::Integer(i) if i > 0 => dims.push(i as usize),
            other => {
                return Err(EngineError::syntax(format!(
                    "DIM: dimension must be a positive INTEGER, got {:?}",
                    other
                )))
            }
        }
    }
    engine.env.dim(name, dims)?;
    Ok(true)
}

fn kw_let(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    engine.let_helper(rest, true)
}

fn kw_stop(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    if !engine.is_deferred() {
        return Err(EngineError::syntax("STOP only valid in Deferred mode"));
    }
    println!("BREAK IN {}", engine.current_line());
    engine.exiting = true;
    Ok(true)
}

fn kw_cont(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    if engine.is_deferred() {
        return Err(EngineError::syntax("CONT only valid in Immediate mode"));
    }
    engine.cont()
}

fn kw_goto(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    if !engine.is_deferred() {
        return Err(EngineError::syntax("GOTO only valid in Deferred mode"));
    }
    let n: i32 = rest
        .trim()
        .parse()
        .map_err(|_| EngineError::syntax("GOTO: expected a line number"))?;
    if engine.program.get(n).is_none() {
        return Err(EngineError::syntax(format!("GOTO: undefined line {n}")));
    }
    engine.cursor = n;
    Ok(true)
}

fn kw_gosub(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    if !engine.is_deferred() {
        return Err(EngineError::syntax("GOSUB only valid in Deferred mode"));
    }
    let n: i32 = rest
        .trim()
        .parse()
        .map_err(|_| EngineError::syntax("GOSUB: expected a line number"))?;
    if engine.program.get(n).is_none() {
        return Err(EngineError::syntax(format!("GOSUB: undefined line {n}")));
    }
    engine.return_stack.push(engine.cursor);
    engine.cursor = n;
    Ok(true)
}

fn kw_return(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    if !engine.is_deferred() {
        return Err(EngineError::syntax("RETURN only valid in Deferred mode"));
    }
    let return_line = engine.return_stack.pop()?;
    match engine.program.next_number_after(return_line) {
        Some(n) => engine.cursor = n,
        None => engine.exiting = true,
    }
    Ok(true)
}

fn kw_print(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    if rest.trim().is_empty() {
        println!();
    } else {
        let value = engine.evaluate(rest)?;
        println!("{value}");
    }
    Ok(true)
}

fn kw_quit(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    engine.exiting = true;
    println!("Good bye");
    Ok(true)
}

fn kw_exit(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    engine.exiting = true;
    Ok(true)
}

fn kw_end(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    if !engine.is_deferred() {
        return Err(EngineError::syntax("END only valid in Deferred mode"));
    }
    engine.exiting = true;
    Ok(true)
}

fn kw_rem(_engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    Ok(true)
}

fn kw_list(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    let text = engine.list_program();
    if !text.is_empty() {
        println!("{text}");
    }
    Ok(true)
}

fn kw_run(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    let n = if rest.trim().is_empty() {
        -1
    } else {
        rest.trim()
            .parse()
            .map_err(|_| EngineError::syntax("RUN: expected a line number"))?
    };
    engine.run(n)
}

fn kw_vars(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    let constants = engine.list_constants();
    if !constants.is_empty() {
        println!("{constants}");
    }
    let variables = engine.list_variables();
    if !variables.is_empty() {
        println!("{variables}");
    }
    Ok(true)
}

fn kw_functions(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    println!("{}", engine.list_functions());
    Ok(true)
}

fn kw_keywords(engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    println!("{}", engine.list_keywords());
    Ok(true)
}

fn kw_then(_engine: &mut Engine, _rest: &str) -> EngineResult<bool> {
    Err(EngineError::syntax("THEN without IF"))
}

/// Find the first whole-word occurrence of `word` (already upper-case)
/// in `haystack_upper`, which must also already be upper-case.
fn find_word(haystack_upper: &str, word: &str) -> Option<usize> {
    let bytes = haystack_upper.as_bytes();
    let wlen = word.len();
    let mut start = 0usize;
    while let Some(pos) = haystack_upper[start..].find(word) {
        let idx = start + pos;
        let before_ok = idx == 0 || !bytes[idx - 1].is_ascii_alphanumeric();
        let after_ok = idx + wlen >= bytes.len() || !bytes[idx + wlen].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return Some(idx);
        }
        start = idx + wlen.max(1);
    }
    None
}

/// Scan `rest` for the first `THEN` or `GOTO` at bracket/quote depth
/// zero, returning its start and end (exclusive) byte offsets.
fn find_then_or_goto(rest: &str) -> EngineResult<(usize, usize)> {
    let bytes = rest.as_bytes();
    let mut i = 0usize;
    let mut depth = 0i32;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += daw_basic_scan::find_end_of_string(&rest[i..])? + 1;
                continue;
            }
            b'(' => {
                depth += 1;
                i += 1;
                continue;
            }
            b')' => {
                depth -= 1;
                i += 1;
                continue;
            }
            _ => {}
        }
        if depth == 0 {
            let upper_tail = rest[i..].to_ascii_uppercase();
            for word in ["THEN", "GOTO"] {
                if upper_tail.starts_with(word) {
                    let before_ok = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
                    let after = i + word.len();
                    let after_ok = after >= bytes.len() || !bytes[after].is_ascii_alphanumeric();
                    if before_ok && after_ok {
                        return Ok((i, after));
                    }
                }
            }
        }
        i += 1;
    }
    Err(EngineError::syntax("IF: expected THEN or GOTO"))
}

fn kw_if(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    let (start, end) = find_then_or_goto(rest)?;
    let condition_text = rest[..start].trim();
    let action_text = rest[end..].trim();

    let condition = engine.evaluate(condition_text)?;
    let truthy = match condition {
        Value::Boolean(b) => b,
        other => {
            return Err(EngineError::syntax(format!(
                "IF: condition must be BOOLEAN, got {}",
                other.type_name()
            )))
        }
    };
    if !truthy {
        return Ok(true);
    }

    if action_text.parse::<i32>().is_ok() {
        let goto_stmt = format!("GOTO {action_text}");
        engine.dispatch_statement(&goto_stmt)
    } else {
        engine.dispatch_statement(action_text)
    }
}

fn kw_for(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    if !engine.is_deferred() {
        return Err(EngineError::syntax("FOR only valid in Deferred mode"));
    }
    let eq_idx = rest
        .find('=')
        .ok_or_else(|| EngineError::syntax("FOR: expected 'var = start TO limit'"))?;
    let var = rest[..eq_idx].trim().to_string();
    let after_eq = &rest[eq_idx + 1..];
    let upper = after_eq.to_ascii_uppercase();
    let to_idx = find_word(&upper, "TO").ok_or_else(|| EngineError::syntax("FOR: expected TO"))?;
    let start_text = after_eq[..to_idx].trim();
    let after_to = &after_eq[to_idx + 2..];
    let upper2 = after_to.to_ascii_uppercase();
    let (limit_text, step_text) = match find_word(&upper2, "STEP") {
        Some(step_idx) => (after_to[..step_idx].trim(), Some(after_to[step_idx + 4..].trim())),
        None => (after_to.trim(), None),
    };

    let start_value = engine.evaluate(start_text)?;
    let limit_value = engine.evaluate(limit_text)?;
    let step_value = match step_text {
        Some(s) => engine.evaluate(s)?,
        None => Value::Integer(1),
    };

    let body_line = engine
        .program
        .next_number_after(engine.current_line())
        .ok_or_else(|| EngineError::syntax("FOR: no body after FOR"))?;
    engine.set_variable(&var, start_value)?;
    engine.loop_stack.push(LoopFrame {
        variable: var,
        limit: limit_value,
        step: step_value,
        body_line,
    });
    Ok(true)
}

fn kw_next(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    if !engine.is_deferred() {
        return Err(EngineError::syntax("NEXT only valid in Deferred mode"));
    }
    let var_arg = rest.trim();
    let frame = engine
        .loop_stack
        .top()
        .cloned()
        .ok_or_else(|| EngineError::syntax("NEXT without FOR"))?;
    if !var_arg.is_empty() && !var_arg.eq_ignore_ascii_case(&frame.variable) {
        return Err(EngineError::syntax(format!(
            "NEXT {var_arg}: does not match open FOR {}",
            frame.variable
        )));
    }

    let current = engine.get_variable_constant(&frame.variable)?;
    let next_value = builtins::op_add_numeric(&current, &frame.step)?;
    engine.set_variable(&frame.variable, next_value.clone())?;

    let step_f = frame.step.to_numeric()?;
    let next_f = next_value.to_numeric()?;
    let limit_f = frame.limit.to_numeric()?;
    let still_looping = if step_f >= 0.0 {
        next_f <= limit_f
    } else {
        next_f >= limit_f
    };

    if still_looping {
        engine.cursor = frame.body_line;
    } else {
        engine.loop_stack.pop();
    }
    Ok(true)
}

fn kw_randomize(engine: &mut Engine, rest: &str) -> EngineResult<bool> {
    let rest = rest.trim();
    if rest.is_empty() {
        engine.rng = StableRng::from_wall_clock();
    } else {
        let n: i64 = rest
            .parse()
            .map_err(|_| EngineError::syntax("RANDOMIZE: expected a number"))?;
        engine.reseed_rng(n as u64);
    }
    Ok(true)
}

/// Register every keyword's statement handler.
pub fn install(env: &mut Environment) {
    env.add_keyword("NEW", kw_new);
    env.add_keyword("CLR", kw_clr);
    env.add_keyword("DELETE", kw_delete);
    env.add_keyword("DIM", kw_dim);
    env.add_keyword("LET", kw_let);
    env.add_keyword("STOP", kw_stop);
    env.add_keyword("CONT", kw_cont);
    env.add_keyword("GOTO", kw_goto);
    env.add_keyword("GOSUB", kw_gosub);
    env.add_keyword("RETURN", kw_return);
    env.add_keyword("PRINT", kw_print);
    env.add_keyword("QUIT", kw_quit);
    env.add_keyword("EXIT", kw_exit);
    env.add_keyword("END", kw_end);
    env.add_keyword("REM", kw_rem);
    env.add_keyword("LIST", kw_list);
    env.add_keyword("RUN", kw_run);
    env.add_keyword("VARS", kw_vars);
    env.add_keyword("FUNCTIONS", kw_functions);
    env.add_keyword("KEYWORDS", kw_keywords);
    env.add_keyword("THEN", kw_then);
    env.add_keyword("IF", kw_if);
    env.add_keyword("FOR", kw_for);
    env.add_keyword("NEXT", kw_next);
    env.add_keyword("RANDOMIZE", kw_randomize);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn if_then_branches_on_true() {
        let mut e = Engine::new();
        e.parse_line("10 IF 1<2 THEN 30", false);
        e.parse_line("20 PRINT \"NO\"", false);
        e.parse_line("30 PRINT \"YES\"", false);
        assert!(e.run(-1).unwrap());
    }

    #[test]
    fn gosub_return_balances_stack() {
        let mut e = Engine::new();
        e.parse_line("10 GOSUB 100", false);
        e.parse_line("20 PRINT \"BACK\"", false);
        e.parse_line("30 END", false);
        e.parse_line("100 PRINT \"SUB\"", false);
        e.parse_line("110 RETURN", false);
        assert!(e.run(-1).unwrap());
        assert_eq!(e.return_stack.len(), 0);
    }

    #[test]
    fn return_without_gosub_is_syntax_error() {
        let mut e = Engine::new();
        e.parse_line("10 RETURN", false);
        e.run(-1).unwrap();
        assert!(e.list_program().contains("RETURN"));
    }

    #[test]
    fn immediate_mode_goto_is_syntax_error() {
        let mut e = Engine::new();
        assert!(e.parse_line("GOTO 10", false));
    }

    #[test]
    fn for_next_counts_up() {
        let mut e = Engine::new();
        e.parse_line("10 LET S=0", false);
        e.parse_line("20 FOR I=1 TO 3", false);
        e.parse_line("30 LET S=S+I", false);
        e.parse_line("40 NEXT I", false);
        e.run(-1).unwrap();
        assert_eq!(e.get_variable_constant("S").unwrap(), Value::Integer(6));
    }
}
