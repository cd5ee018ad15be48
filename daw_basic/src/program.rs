use crate::error::{EngineError, EngineResult};
use crate::value::Value;

/// One stored line: a non-negative line number and its source text.
/// The sentinel `(-1, "")` always occupies position 0 and is never
/// executed; it exists so a cursor at "before the first real line" is
/// a valid position rather than a special case.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramLine {
    pub number: i32,
    pub text: String,
}

impl ProgramLine {
    fn sentinel() -> Self {
        ProgramLine {
            number: -1,
            text: String::new(),
        }
    }
}

/// The ordered line store, kept sorted by line number before any
/// execution or `LIST`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramStore {
    lines: Vec<ProgramLine>,
}

impl Default for ProgramStore {
    fn default() -> Self {
        ProgramStore {
            lines: vec![ProgramLine::sentinel()],
        }
    }
}

impl ProgramStore {
    pub fn new() -> Self {
        ProgramStore::default()
    }

    pub fn clear(&mut self) {
        self.lines = vec![ProgramLine::sentinel()];
    }

    pub fn sort(&mut self) {
        self.lines.sort_by_key(|l| l.number);
    }

    /// Insert or replace the line numbered `number`.
    pub fn add_line(&mut self, number: i32, text: String) {
        if let Some(existing) = self.lines.iter_mut().find(|l| l.number == number) {
            existing.text = text;
        } else {
            self.lines.push(ProgramLine { number, text });
        }
        self.sort();
    }

    /// Remove the line numbered `number`, if present.
    pub fn remove_line(&mut self, number: i32) {
        self.lines.retain(|l| l.number != number || l.number == -1);
    }

    pub fn iter_real(&self) -> impl Iterator<Item = &ProgramLine> {
        self.lines.iter().filter(|l| l.number != -1)
    }

    pub fn get(&self, number: i32) -> Option<&ProgramLine> {
        self.lines.iter().find(|l| l.number == number)
    }

    /// The line number to resume at after `number`, or `None` past the
    /// end of the program.
    pub fn next_number_after(&self, number: i32) -> Option<i32> {
        self.sorted_real_numbers()
            .into_iter()
            .find(|&n| n > number)
    }

    pub fn first_real_number(&self) -> Option<i32> {
        self.sorted_real_numbers().into_iter().next()
    }

    fn sorted_real_numbers(&self) -> Vec<i32> {
        let mut nums: Vec<i32> = self.iter_real().map(|l| l.number).collect();
        nums.sort_unstable();
        nums
    }

    pub fn list_text(&self) -> String {
        self.iter_real()
            .map(|l| format!("{}\t{}", l.number, l.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// GOSUB/RETURN call stack. Stores line numbers, not indices into
/// `ProgramStore`, so the stack stays valid across re-sorts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnStack(Vec<i32>);

impl ReturnStack {
    pub fn new() -> Self {
        ReturnStack::default()
    }

    pub fn push(&mut self, line_number: i32) {
        self.0.push(line_number);
    }

    pub fn pop(&mut self) -> EngineResult<i32> {
        self.0
            .pop()
            .ok_or_else(|| EngineError::syntax("RETURN without GOSUB"))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One FOR/NEXT nesting level.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopFrame {
    pub variable: String,
    pub limit: Value,
    pub step: Value,
    pub body_line: i32,
}

/// The stack of currently-open FOR loops, completing the design the
/// source left unfinished (spec.md §9).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStack(Vec<LoopFrame>);

impl LoopStack {
    pub fn new() -> Self {
        LoopStack::default()
    }

    pub fn push(&mut self, frame: LoopFrame) {
        self.0.push(frame);
    }

    pub fn top(&self) -> Option<&LoopFrame> {
        self.0.last()
    }

    pub fn pop(&mut self) -> Option<LoopFrame> {
        self.0.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn program_store_keeps_sentinel_first() {
        let mut store = ProgramStore::new();
        store.add_line(30, "PRINT 3".into());
        store.add_line(10, "PRINT 1".into());
        store.add_line(20, "PRINT 2".into());
        let numbers: Vec<i32> = store.lines.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![-1, 10, 20, 30]);
    }

    #[test]
    fn delete_removes_only_named_line() {
        let mut store = ProgramStore::new();
        store.add_line(10, "A".into());
        store.add_line(20, "B".into());
        store.remove_line(10);
        assert!(store.get(10).is_none());
        assert!(store.get(20).is_some());
    }

    #[test]
    fn next_number_after_skips_to_following_line() {
        let mut store = ProgramStore::new();
        store.add_line(10, "A".into());
        store.add_line(30, "B".into());
        assert_eq!(store.next_number_after(10), Some(30));
        assert_eq!(store.next_number_after(30), None);
    }

    #[test]
    fn return_stack_balances() {
        let mut stack = ReturnStack::new();
        stack.push(10);
        stack.push(20);
        assert_eq!(stack.len(), 2);
        stack.pop().unwrap();
        stack.pop().unwrap();
        assert_eq!(stack.len(), 0);
        assert!(stack.pop().is_err());
    }
}
