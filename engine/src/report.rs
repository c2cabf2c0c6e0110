//! Utilities for structured reporting of contraction runs.
//!
//! Reporting is off until `enable_reporting` is called, then every `report!` call
//! adds a value to a JSON object which is printed to stdout when the returned guard is dropped.
//! Nested objects and collections are created through RAII context guards,
//! so the structure of the output follows the structure of the code.
//!
//! The reporter is thread local. Values reported from rayon worker threads are lost,
//! only report from the thread driving the contraction.

use crate::built_info;
use serde_json::{Map, Value};
use std::{cell::RefCell, mem::swap};

pub use serde_json::json;

#[derive(Debug)]
enum ContextStackItem {
    Key(String),
    Collection(Vec<Value>),
    Object(Map<String, Value>),
}

#[derive(Debug)]
enum CurrentReportingContext {
    Collection(Vec<Value>),
    Object(Map<String, Value>),
}

#[derive(Debug)]
pub struct Reporter {
    current: CurrentReportingContext,
    context_stack: Vec<ContextStackItem>,
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter {
            current: CurrentReportingContext::Object(Map::new()),
            context_stack: Vec::new(),
        }
    }
}

impl Reporter {
    // Move the current object on the stack and continue with a fresh context under `key`.
    fn open_under_key(&mut self, key: String, fresh: CurrentReportingContext) {
        match &mut self.current {
            CurrentReportingContext::Object(object) => {
                let parent = std::mem::take(object);
                self.context_stack.push(ContextStackItem::Object(parent));
                self.context_stack.push(ContextStackItem::Key(key));
                self.current = fresh;
            }
            CurrentReportingContext::Collection(_) => {
                panic!("Cannot create context at key in collection");
            }
        }
    }

    fn create_collection_item(&mut self) {
        match &mut self.current {
            CurrentReportingContext::Object(_) => {
                panic!("Cannot create collection item in object");
            }
            CurrentReportingContext::Collection(collection) => {
                let items = std::mem::take(collection);
                self.context_stack.push(ContextStackItem::Collection(items));
                self.current = CurrentReportingContext::Object(Map::new());
            }
        }
    }

    fn report(&mut self, key: String, val: Value) {
        match &mut self.current {
            CurrentReportingContext::Object(object) => {
                let prev = object.insert(key, val);
                if !cfg!(feature = "report-allow-override") {
                    assert!(prev.is_none());
                }
            }
            CurrentReportingContext::Collection(_) => {
                panic!("Cannot report value on collection");
            }
        }
    }

    fn pop_context(&mut self) {
        let mut finished = CurrentReportingContext::Object(Map::new());
        swap(&mut self.current, &mut finished);
        let finished = match finished {
            CurrentReportingContext::Object(object) => Value::Object(object),
            CurrentReportingContext::Collection(collection) => Value::Array(collection),
        };

        match self.context_stack.pop().expect("tried to pop from empty context") {
            ContextStackItem::Key(key) => match self.context_stack.pop() {
                Some(ContextStackItem::Object(mut object)) => {
                    let prev = object.insert(key, finished);
                    assert_eq!(prev, None);
                    self.current = CurrentReportingContext::Object(object);
                }
                _ => panic!("Inconsistent context stack"),
            },
            ContextStackItem::Collection(mut collection) => {
                assert!(finished.is_object(), "Cannot insert collection into collection");
                collection.push(finished);
                self.current = CurrentReportingContext::Collection(collection);
            }
            ContextStackItem::Object(_) => panic!("Inconsistent context stack"),
        }
    }
}

thread_local! {
    static REPORTER: RefCell<Option<Reporter>> = const { RefCell::new(None) };
}

#[must_use]
pub struct ContextGuard(());

impl Drop for ContextGuard {
    fn drop(&mut self) {
        REPORTER.with(|reporter| reporter.borrow_mut().as_mut().map(Reporter::pop_context));
    }
}

/// Report all following values into a nested object under `key` until the guard is dropped.
pub fn push_context(key: String) -> ContextGuard {
    REPORTER.with(|reporter| {
        reporter
            .borrow_mut()
            .as_mut()
            .map(|r| r.open_under_key(key, CurrentReportingContext::Object(Map::new())))
    });
    ContextGuard(())
}

#[must_use]
pub struct CollectionContextGuard(());

impl Drop for CollectionContextGuard {
    fn drop(&mut self) {
        REPORTER.with(|reporter| reporter.borrow_mut().as_mut().map(Reporter::pop_context));
    }
}

/// Create an array under `key`. Items are added with `push_collection_item`.
pub fn push_collection_context(key: String) -> CollectionContextGuard {
    REPORTER.with(|reporter| {
        reporter
            .borrow_mut()
            .as_mut()
            .map(|r| r.open_under_key(key, CurrentReportingContext::Collection(Vec::new())))
    });
    CollectionContextGuard(())
}

impl CollectionContextGuard {
    pub fn push_collection_item(&mut self) -> CollectionItemContextGuard {
        REPORTER.with(|reporter| reporter.borrow_mut().as_mut().map(Reporter::create_collection_item));
        CollectionItemContextGuard(self)
    }
}

#[must_use]
pub struct CollectionItemContextGuard<'a>(&'a CollectionContextGuard);

impl<'a> Drop for CollectionItemContextGuard<'a> {
    fn drop(&mut self) {
        REPORTER.with(|reporter| reporter.borrow_mut().as_mut().map(Reporter::pop_context));
    }
}

pub fn report(key: String, val: Value) {
    if cfg!(feature = "report-to-stderr") {
        eprintln!("{}: {}", key, val);
    }
    report_silent(key, val)
}

pub fn report_silent(key: String, val: Value) {
    REPORTER.with(|reporter| reporter.borrow_mut().as_mut().map(|r| r.report(key, val)));
}

#[must_use]
pub struct ReportingGuard(());

impl Drop for ReportingGuard {
    fn drop(&mut self) {
        REPORTER.with(|reporter| {
            if let Some(r) = reporter.borrow_mut().take() {
                assert!(r.context_stack.is_empty());
                if let CurrentReportingContext::Object(object) = r.current {
                    println!("{}", Value::Object(object));
                } else {
                    panic!("broken root object for reporting");
                }
            };
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

/// Start collecting reported values on this thread.
/// Everything will be printed as a single JSON object once the guard is dropped.
pub fn enable_reporting(program: &str) -> ReportingGuard {
    REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));

    report!("program", program);
    report!("version", built_info::PKG_VERSION);
    report!("build_target", built_info::TARGET);
    report!("build_profile", built_info::PROFILE);
    report!("feature_flags", built_info::FEATURES_STR);
    report!("build_with_rustc", built_info::RUSTC_VERSION);
    report!("num_threads", rayon::current_num_threads());

    if let Ok(hostname) = std::process::Command::new("hostname").output() {
        report!("hostname", String::from_utf8_lossy(&hostname.stdout).trim());
    }

    let start_time = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc2822)
        .unwrap_or_default();
    report!("start_time", start_time);
    report!("args", std::env::args().collect::<Vec<String>>());

    ReportingGuard(())
}

#[cfg(test)]
fn take_report() -> Option<Value> {
    REPORTER.with(|reporter| {
        reporter.borrow_mut().take().map(|r| match r.current {
            CurrentReportingContext::Object(object) => Value::Object(object),
            CurrentReportingContext::Collection(collection) => Value::Array(collection),
        })
    })
}

pub mod benchmark;
pub use benchmark::*;
