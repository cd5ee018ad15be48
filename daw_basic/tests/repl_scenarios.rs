//! End-to-end scenarios from spec.md §8, driven through
//! [`Engine::parse_line`] the way the REPL collaborator would, mirroring
//! the teacher's `tests/code_samples_tests.rs` / `tests/dispatch_tests.rs`
//! split between inline unit tests and cross-module integration tests.

use daw_basic::{Engine, Value};
use pretty_assertions::assert_eq;

fn feed(engine: &mut Engine, lines: &[&str]) {
    for line in lines {
        assert!(engine.parse_line(line, false), "line {line:?} stopped the REPL");
    }
}

#[test]
fn scenario_immediate_expression() {
    let mut e = Engine::new();
    assert_eq!(e.evaluate("1+2*3").unwrap(), Value::Integer(7));
}

#[test]
fn scenario_deferred_let_and_print() {
    let mut e = Engine::new();
    feed(&mut e, &["10 LET X=5", "20 PRINT X*X"]);
    assert!(e.parse_line("RUN", false));
    assert_eq!(e.get_variable_constant("X").unwrap(), Value::Integer(5));
    assert!(!e.has_syntax_error());
}

#[test]
fn scenario_if_then_branches_to_target_line() {
    let mut e = Engine::new();
    feed(
        &mut e,
        &[
            "10 IF 1<2 THEN 30",
            "20 LET RESULT=\"NO\"",
            "30 LET RESULT=\"YES\"",
        ],
    );
    assert!(e.parse_line("RUN", false));
    assert_eq!(e.get_variable_constant("RESULT").unwrap(), Value::String("YES".into()));
}

#[test]
fn scenario_if_false_falls_through() {
    let mut e = Engine::new();
    feed(
        &mut e,
        &[
            "10 IF 1>2 THEN 30",
            "20 LET RESULT=\"FELL THROUGH\" : END",
            "30 LET RESULT=\"JUMPED\"",
        ],
    );
    assert!(e.parse_line("RUN", false));
    assert_eq!(e.get_variable_constant("RESULT").unwrap(), Value::String("FELL THROUGH".into()));
}

#[test]
fn scenario_gosub_return_balances_and_resumes_after_call_site() {
    let mut e = Engine::new();
    feed(
        &mut e,
        &[
            "10 GOSUB 100",
            "20 LET TRACE=TRACE+\"BACK\"",
            "30 END",
            "100 LET TRACE=\"SUB\"",
            "110 RETURN",
        ],
    );
    e.add_variable("TRACE", Value::String(String::new())).unwrap();
    assert!(e.parse_line("RUN", false));
    assert_eq!(e.get_variable_constant("TRACE").unwrap(), Value::String("SUBBACK".into()));
}

#[test]
fn scenario_dim_array_round_trip() {
    let mut e = Engine::new();
    feed(&mut e, &["DIM A(3)", "LET A(0)=10", "LET A(1)=7"]);
    assert_eq!(e.evaluate("A(0)+A(1)").unwrap(), Value::Integer(17));
}

#[test]
fn scenario_string_builtins() {
    let mut e = Engine::new();
    assert_eq!(e.evaluate(r#"LEFT$("HELLO",3)"#).unwrap(), Value::String("HEL".into()));
    assert_eq!(e.evaluate(r#"MID$("HELLO",2,3)"#).unwrap(), Value::String("ELL".into()));
}

#[test]
fn property_program_edits_keep_list_sorted_and_delete_removes_line() {
    let mut e = Engine::new();
    feed(&mut e, &["30 PRINT 3", "10 PRINT 1", "20 PRINT 2"]);
    assert_eq!(e.list_program(), "10\tPRINT 1\n20\tPRINT 2\n30\tPRINT 3");
    e.parse_line("DELETE 20", false);
    assert_eq!(e.list_program(), "10\tPRINT 1\n30\tPRINT 3");
}

#[test]
fn property_evaluate_to_string_round_trips_for_each_numeric_kind() {
    let mut e = Engine::new();
    for expr in ["42", "3.5", "-7"] {
        let v = e.evaluate(expr).unwrap();
        let reparsed = e.evaluate(&v.to_quoted_literal()).unwrap();
        assert_eq!(reparsed, v);
    }
    let s = e.evaluate(r#""HELLO""#).unwrap();
    let reparsed = e.evaluate(&s.to_quoted_literal()).unwrap();
    assert_eq!(reparsed, s);
}

#[test]
fn property_unused_identifier_is_neither_variable_nor_constant() {
    let e = Engine::new();
    assert!(!e.is_variable("UNUSED"));
    assert!(!e.is_constant("UNUSED"));
}

#[test]
fn property_let_then_lookup_round_trips() {
    let mut e = Engine::new();
    e.parse_line("LET X=1", false);
    assert_eq!(e.get_variable_constant("X").unwrap(), e.evaluate("1").unwrap());
}

#[test]
fn property_case_insensitive_same_variable() {
    let mut e1 = Engine::new();
    let mut e2 = Engine::new();
    e1.parse_line("X=1", false);
    e2.parse_line("x=1", false);
    assert_eq!(
        e1.get_variable_constant("x").unwrap(),
        e2.get_variable_constant("X").unwrap()
    );
}

#[test]
fn property_return_without_gosub_is_syntax_error() {
    let mut e = Engine::new();
    e.parse_line("10 RETURN", false);
    assert!(e.parse_line("RUN", false));
    assert!(e.has_syntax_error());
}

#[test]
fn property_immediate_mode_control_flow_keywords_are_syntax_errors() {
    for stmt in ["GOTO 10", "GOSUB 10", "RETURN", "END", "STOP"] {
        let mut e = Engine::new();
        assert!(e.parse_line(stmt, false), "{stmt} should not terminate the REPL");
        assert!(e.has_syntax_error(), "{stmt} should have raised SYNTAX in Immediate mode");
    }
}

#[test]
fn scenario_for_next_loop_accumulates() {
    let mut e = Engine::new();
    feed(&mut e, &["10 LET S=0", "20 FOR I=1 TO 5", "30 LET S=S+I", "40 NEXT I"]);
    assert!(e.parse_line("RUN", false));
    assert_eq!(e.get_variable_constant("S").unwrap(), Value::Integer(15));
}

#[test]
fn scenario_quit_sets_exit_and_prints_goodbye() {
    let mut e = Engine::new();
    assert!(!e.parse_line("QUIT", false));
}

#[test]
fn scenario_new_keyword_resets_program_and_variables() {
    let mut e = Engine::new();
    feed(&mut e, &["10 PRINT 1", "LET X=5"]);
    e.parse_line("NEW", false);
    assert_eq!(e.list_program(), "");
    assert!(!e.is_variable("X"));
}
