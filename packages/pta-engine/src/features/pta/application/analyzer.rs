//! Analysis entry point
//!
//! Wraps the solver behind a configuration object: pick a context policy,
//! optionally attach taint rules, and run. The same solver serves the
//! context-insensitive and context-sensitive variants; only the selected
//! policy differs.

use crate::errors::AnalysisResult;
use crate::features::pta::application::result::PointerAnalysisResult;
use crate::features::pta::infrastructure::selector::{
    ContextInsensitive, ContextSelector, KCallSite, KObject,
};
use crate::features::pta::infrastructure::solver::Solver;
use crate::features::taint::domain::rules::TaintConfig;
use crate::features::taint::infrastructure::plugin::TaintAnalysis;
use crate::shared::Program;
use std::time::Instant;
use tracing::info;

/// Context-sensitivity policy for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPolicy {
    /// One context for the whole program.
    Insensitive,
    /// k-limited call-string sensitivity.
    CallSite { k: usize },
    /// k-limited object sensitivity.
    Object { k: usize },
}

impl Default for ContextPolicy {
    fn default() -> Self {
        ContextPolicy::Insensitive
    }
}

impl ContextPolicy {
    fn selector(self) -> Box<dyn ContextSelector> {
        match self {
            ContextPolicy::Insensitive => Box::new(ContextInsensitive),
            ContextPolicy::CallSite { k } => Box::new(KCallSite::new(k)),
            ContextPolicy::Object { k } => Box::new(KObject::new(k)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextPolicy::Insensitive => "ci",
            ContextPolicy::CallSite { .. } => "k-call-site",
            ContextPolicy::Object { .. } => "k-object",
        }
    }
}

/// Configuration for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub context: ContextPolicy,
    pub taint: Option<TaintConfig>,
}

impl AnalysisConfig {
    pub fn new(context: ContextPolicy) -> Self {
        Self {
            context,
            taint: None,
        }
    }

    pub fn with_taint(mut self, taint: TaintConfig) -> Self {
        self.taint = Some(taint);
        self
    }
}

/// The whole-program pointer analysis.
pub struct PointerAnalysis {
    config: AnalysisConfig,
}

impl PointerAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Runs the fixpoint over `program` and returns the read-only result.
    pub fn analyze<'p>(&self, program: &'p Program) -> AnalysisResult<PointerAnalysisResult<'p>> {
        let start = Instant::now();
        info!(policy = self.config.context.as_str(), "pointer analysis started");
        let taint = self.config.taint.clone().map(TaintAnalysis::new);
        let solver = Solver::new(program, self.config.context.selector(), taint);
        let mut result = solver.solve()?;
        result.stats.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ProgramBuilder;

    #[test]
    fn default_config_is_context_insensitive() {
        let config = AnalysisConfig::default();
        assert_eq!(config.context, ContextPolicy::Insensitive);
        assert!(config.taint.is_none());
    }

    #[test]
    fn analyze_records_duration() {
        let mut b = ProgramBuilder::new();
        let c = b.add_class("Main");
        let main = b.add_static_method(c, "main", &[]);
        b.set_entry(main);
        let program = b.finish().unwrap();

        let result = PointerAnalysis::new(AnalysisConfig::default())
            .analyze(&program)
            .unwrap();
        assert!(result.stats.duration_ms >= 0.0);
    }
}
