use crate::core::trace::TraceRecorder;
use crate::domain::model::{ExtractionTrace, ProductRecord};
use crate::domain::ports::ExtractionStrategy;

pub type BoxedStrategy<T> = Box<dyn ExtractionStrategy<Output = T>>;

/// Ordered list of strategies tried until one produces a non-empty result.
///
/// Results are never merged: the first strategy with at least one result
/// decides the whole answer.
pub struct StrategyChain<T> {
    strategies: Vec<BoxedStrategy<T>>,
}

impl<T> StrategyChain<T> {
    pub fn new(strategies: Vec<BoxedStrategy<T>>) -> Self {
        Self { strategies }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.label()).collect()
    }

    pub fn run(&self, record: &ProductRecord) -> (Vec<T>, ExtractionTrace) {
        let mut trace = TraceRecorder::new();

        for strategy in &self.strategies {
            let label = strategy.label();
            trace.step(format!("Trying {}", label));

            match strategy.attempt(record, &mut trace) {
                None => trace.step(format!("{}: not applicable", label)),
                Some(found) if found.is_empty() => {
                    trace.enter(label);
                    trace.step(format!("{}: no results, falling back", label));
                }
                Some(found) => {
                    trace.enter(label);
                    trace.step(format!("{}: produced {} result(s)", label, found.len()));
                    let count = found.len();
                    return (found, trace.finish(count));
                }
            }
        }

        trace.step("No strategy produced results");
        (Vec::new(), trace.finish(0))
    }
}
