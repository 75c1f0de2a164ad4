//! Mismatch-logging decorator.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::filter::Filter;

/// Wraps any filter and logs every check whose answer disagrees with ground
/// truth.
///
/// The decorator keeps its own exact reference set and observed min/max range
/// alongside the wrapped filter. A check first asks the wrapped filter, then
/// compares against the reference; disagreements are appended to
/// `dumpset.<refid>.log`. The functional result returned to the caller is
/// always the wrapped filter's answer, and logging failures are swallowed:
/// diagnostics must never change profiling behavior.
#[derive(Debug, Clone)]
pub struct LoggingDecoratorFilter {
    inner: Box<Filter>,
    refid: u64,
    reference: BTreeSet<u64>,
    min: u64,
    max: u64,
    log_dir: PathBuf,
}

impl LoggingDecoratorFilter {
    pub fn new(inner: Box<Filter>, refid: u64) -> Self {
        Self::with_log_dir(inner, refid, ".")
    }

    /// Like [`LoggingDecoratorFilter::new`], with the diagnostic log written
    /// under `log_dir` instead of the working directory.
    pub fn with_log_dir(inner: Box<Filter>, refid: u64, log_dir: impl Into<PathBuf>) -> Self {
        LoggingDecoratorFilter {
            inner,
            refid,
            reference: BTreeSet::new(),
            min: u64::MAX,
            max: 0,
            log_dir: log_dir.into(),
        }
    }

    pub fn refid(&self) -> u64 {
        self.refid
    }

    pub fn inner(&self) -> &Filter {
        &self.inner
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(format!("dumpset.{}.log", self.refid))
    }

    pub fn insert(&mut self, addr: u64) {
        self.inner.insert(addr);
        self.reference.insert(addr);
        if addr < self.min {
            self.min = addr;
        }
        if addr > self.max {
            self.max = addr;
        }
    }

    pub fn check(&self, addr: u64) -> bool {
        let result = self.inner.check(addr);
        let truth = self.reference.contains(&addr);
        if result != truth {
            self.log_mismatch(addr, result, truth);
        }
        result
    }

    fn log_mismatch(&self, addr: u64, result: bool, truth: bool) {
        let in_range = self.min <= addr && addr <= self.max;
        let mut line = format!(
            "{} {} (range:{}) [ ( {:x} ) ^ (",
            result as u32, truth as u32, in_range as u32, addr
        );
        for member in &self.reference {
            line.push_str(&format!(" {member:x}"));
        }
        line.push_str(" ) ]\n");

        let append = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(err) = append {
            tracing::debug!(refid = self.refid, %err, "mismatch log write failed");
        }
    }

    pub fn population(&self) -> u32 {
        self.inner.population()
    }

    pub fn free(&mut self) {
        self.inner.free();
        self.reference.clear();
    }

    pub fn name(&self) -> String {
        format!("dump_{}_{}", self.refid, self.inner.name())
    }
}
