//! Per-domain error message stacks.
//!
//! Every fallible operation in this crate, besides returning an
//! [`Err`](crate::error::NrrdError), leaves a narrative of what went wrong
//! on a process-wide stack identified by a short ASCII key (this crate
//! uses [`NRRD`]). Frames are pushed innermost-first, so rendering a stack
//! front-to-back reads from the first failure outward to the caller that
//! gave up.
//!
//! The stacks are shared state guarded by a single mutex; that mutex is
//! the synchronisation boundary promised to multi-threaded callers.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// The message key used by everything in this crate.
pub const NRRD: &str = "nrrd";

fn stacks() -> &'static Mutex<HashMap<String, Vec<String>>> {
    static STACKS: OnceLock<Mutex<HashMap<String, Vec<String>>>> = OnceLock::new();
    STACKS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn lock() -> std::sync::MutexGuard<'static, HashMap<String, Vec<String>>> {
    // a poisoned biff mutex only means some other thread panicked while
    // pushing a message; the map itself is still usable
    match stacks().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Push a message on the stack of the given key.
/// The stack is created on first use.
pub fn add(key: &str, msg: impl Into<String>) {
    let mut map = lock();
    map.entry(key.to_owned()).or_default().push(msg.into());
}

/// Pop the full stack of `src`, push it (preserving order) onto `dest`,
/// then push `msg` onto `dest`.
pub fn move_to(dest: &str, src: &str, msg: impl Into<String>) {
    let mut map = lock();
    let moved = map.remove(src).unwrap_or_default();
    let stack = map.entry(dest.to_owned()).or_default();
    stack.extend(moved);
    stack.push(msg.into());
}

/// Render the stack of `key` as a newline-joined string, newest message
/// last. Empty string when nothing has been recorded.
pub fn get(key: &str) -> String {
    let map = lock();
    match map.get(key) {
        Some(stack) => stack.join("\n"),
        None => String::new(),
    }
}

/// Like [`get`], but also empties the stack (the stack itself survives
/// for later use).
pub fn get_done(key: &str) -> String {
    let mut map = lock();
    match map.get_mut(key) {
        Some(stack) => {
            let msg = stack.join("\n");
            stack.clear();
            msg
        }
        None => String::new(),
    }
}

/// Number of messages currently on the stack of `key`.
pub fn err_num(key: &str) -> usize {
    let map = lock();
    map.get(key).map_or(0, |stack| stack.len())
}

/// Length of the string [`get`] would return for `key`.
pub fn msg_len(key: &str) -> usize {
    let map = lock();
    match map.get(key) {
        Some(stack) if !stack.is_empty() => {
            stack.iter().map(|m| m.len()).sum::<usize>() + stack.len() - 1
        }
        _ => 0,
    }
}

/// Empty the stack of `key` without rendering it.
pub fn clear(key: &str) {
    let mut map = lock();
    if let Some(stack) = map.get_mut(key) {
        stack.clear();
    }
}

/// Drop all stacks.
pub fn clear_all() {
    lock().clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    // biff state is process-wide, so each test uses its own keys

    #[test]
    fn add_get_done() {
        add("t-basic", "alpha: first thing failed");
        add("t-basic", "beta: so did the caller");
        assert_eq!(err_num("t-basic"), 2);
        let msg = get("t-basic");
        assert_eq!(msg, "alpha: first thing failed\nbeta: so did the caller");
        assert_eq!(msg_len("t-basic"), msg.len());

        let done = get_done("t-basic");
        assert_eq!(done, msg);
        assert_eq!(err_num("t-basic"), 0);
        assert_eq!(get("t-basic"), "");
    }

    #[test]
    fn move_preserves_order() {
        add("t-src", "one");
        add("t-src", "two");
        move_to("t-dst", "t-src", "three");
        assert_eq!(err_num("t-src"), 0);
        assert_eq!(get_done("t-dst"), "one\ntwo\nthree");
    }

    #[test]
    fn unknown_key_is_empty() {
        assert_eq!(get("t-nothing"), "");
        assert_eq!(err_num("t-nothing"), 0);
        assert_eq!(msg_len("t-nothing"), 0);
    }

    #[test]
    fn clear_empties() {
        add("t-clear", "msg");
        clear("t-clear");
        assert_eq!(err_num("t-clear"), 0);
    }
}
