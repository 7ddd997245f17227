//! Structured reporting of statistics and running times.
//!
//! Values are reported under string keys into a tree of JSON objects and arrays.
//! Nesting follows the call structure: a context is opened by creating a guard
//! and closed when the guard is dropped.
//! When the reporting guard of the program is dropped, the whole tree is printed to stdout as a single JSON object.
//!
//! Reporting is thread local and disabled unless `enable_reporting` was called on the current thread.
//! All functions are no-ops otherwise, so library code can report unconditionally.

use crate::built_info;
use serde_json::{Map, Value};
use std::cell::RefCell;

pub use serde_json::json;

#[derive(Debug)]
struct Frame {
    // key in the parent object, None for collection items and the root
    key: Option<String>,
    value: Value,
    // frame and everything below is thrown away when popped
    discard: bool,
}

impl Frame {
    fn object(key: Option<String>, discard: bool) -> Frame {
        Frame {
            key,
            value: Value::Object(Map::new()),
            discard,
        }
    }
}

#[derive(Debug)]
struct Reporter {
    stack: Vec<Frame>,
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter {
            stack: vec![Frame::object(None, false)],
        }
    }
}

impl Reporter {
    fn discarding(&self) -> bool {
        self.stack.last().map_or(true, |frame| frame.discard)
    }

    fn push(&mut self, key: Option<String>, value: Value, discard: bool) {
        let discard = discard || self.discarding();
        self.stack.push(Frame { key, value, discard });
    }

    fn report(&mut self, key: String, val: Value) {
        let top = self.stack.last_mut().expect("reporting context stack is empty");
        match &mut top.value {
            Value::Object(object) => {
                let prev = object.insert(key, val);
                if !cfg!(feature = "report-allow-override") && !top.discard {
                    assert!(prev.is_none(), "value reported twice in the same context");
                }
            }
            _ => panic!("Cannot report value on collection"),
        }
    }

    fn pop(&mut self) {
        assert!(self.stack.len() > 1, "tried to pop the root context");
        let Frame { key, value, discard } = self.stack.pop().expect("checked above");
        let parent = self.stack.last_mut().expect("checked above");
        if discard && !parent.discard {
            // end of a blocked section, nothing to attach
            return;
        }
        match (&mut parent.value, key) {
            (Value::Object(object), Some(key)) => {
                object.insert(key, value);
            }
            (Value::Array(collection), None) => collection.push(value),
            _ => panic!("Inconsistent context stack"),
        }
    }
}

thread_local! {
    static REPORTER: RefCell<Option<Reporter>> = RefCell::new(None);
}

fn with_reporter(f: impl FnOnce(&mut Reporter)) {
    REPORTER.with(|reporter| {
        if let Some(reporter) = reporter.borrow_mut().as_mut() {
            f(reporter)
        }
    });
}

/// Closes the context it was created for on drop
#[must_use]
pub struct ContextGuard(());

impl Drop for ContextGuard {
    fn drop(&mut self) {
        with_reporter(Reporter::pop);
    }
}

/// Open a new object under `key`. All values reported while the guard lives end up in it.
pub fn push_context(key: String) -> ContextGuard {
    with_reporter(|r| r.push(Some(key), Value::Object(Map::new()), false));
    ContextGuard(())
}

/// Open a new array under `key`. Values have to be reported into items created through the guard.
pub fn push_collection_context(key: String) -> CollectionContextGuard {
    with_reporter(|r| r.push(Some(key), Value::Array(Vec::new()), false));
    CollectionContextGuard(ContextGuard(()))
}

#[must_use]
pub struct CollectionContextGuard(ContextGuard);

impl CollectionContextGuard {
    /// Append a new object to the collection
    pub fn push_collection_item(&mut self) -> ContextGuard {
        with_reporter(|r| r.push(None, Value::Object(Map::new()), false));
        ContextGuard(())
    }
}

/// Drop everything reported while the guard lives.
pub fn block_reporting() -> ContextGuard {
    with_reporter(|r| r.push(None, Value::Object(Map::new()), true));
    ContextGuard(())
}

/// Report a value under `key` in the current context, and print it to stderr if the `report-to-stderr` feature is active.
pub fn report(key: String, val: Value) {
    if cfg!(feature = "report-to-stderr") {
        eprintln!("{}: {}", key, val);
    }
    report_silent(key, val)
}

pub fn report_silent(key: String, val: Value) {
    with_reporter(|r| r.report(key, val));
}

/// Prints the collected report when dropped
#[must_use]
pub struct ReportingGuard(());

impl Drop for ReportingGuard {
    fn drop(&mut self) {
        REPORTER.with(|reporter| {
            if let Some(mut r) = reporter.borrow_mut().take() {
                assert_eq!(r.stack.len(), 1, "reporting contexts still open");
                if let Some(root) = r.stack.pop() {
                    println!("{}", root.value);
                }
            }
        });
    }
}

#[macro_export]
macro_rules! report {
    ($k:expr, $($json:tt)+) => { $crate::report::report($k.to_string(), $crate::report::json!($($json)+)) };
}

#[macro_export]
macro_rules! report_silent {
    ($k:expr, $($json:tt)+) => { $crate::report::report_silent($k.to_string(), $crate::report::json!($($json)+)) };
}

/// Enable reporting for the current thread and report some general information about the build and the program run.
pub fn enable_reporting(program: &str) -> ReportingGuard {
    REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));

    report!("crate_version", built_info::PKG_VERSION);
    report!("build_target", built_info::TARGET);
    report!("build_profile", built_info::PROFILE);
    report!("feature_flags", built_info::FEATURES_STR);
    report!("build_with_rustc", built_info::RUSTC_VERSION);

    if let Ok(hostname) = std::process::Command::new("hostname").output() {
        report!("hostname", String::from_utf8_lossy(&hostname.stdout).trim());
    }

    report!("program", program);
    let start_time = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc2822)
        .unwrap_or_default();
    report!("start_time", start_time);
    report!("args", std::env::args().collect::<Vec<String>>());

    ReportingGuard(())
}

pub mod benchmark;
pub use benchmark::*;

/// Run `f` with reporting enabled on this thread and return everything it reported.
#[cfg(test)]
pub(crate) fn collect_report(f: impl FnOnce()) -> Value {
    REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));
    f();
    REPORTER.with(|reporter| {
        let mut r = reporter.borrow_mut().take().unwrap();
        assert_eq!(r.stack.len(), 1);
        r.stack.pop().unwrap().value
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_report() {
        let report = collect_report(|| {
            report!("graph", "test");
            {
                let _ctx = push_context("contraction".to_string());
                report!("num_shortcuts", 3);
            }
            {
                let mut queries = push_collection_context("queries".to_string());
                for i in 0..2 {
                    let _item = queries.push_collection_item();
                    report!("from", i);
                }
            }
            {
                let _blocked = block_reporting();
                report!("hidden", true);
                let _ctx = push_context("hidden_ctx".to_string());
                report!("hidden", true);
            }
        });

        assert_eq!(
            report,
            json!({
                "graph": "test",
                "contraction": { "num_shortcuts": 3 },
                "queries": [{ "from": 0 }, { "from": 1 }]
            })
        );
    }

    #[test]
    fn reporting_is_noop_when_disabled() {
        report!("ignored", 1);
        let _ctx = push_context("ignored".to_string());
        REPORTER.with(|reporter| assert!(reporter.borrow().is_none()));
    }
}
