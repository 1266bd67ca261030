use tracing::debug;

use crate::config::ExtractionTables;

/// One named fallback step: a pure function over whatever a stage has loaded.
pub struct Strategy<C: ?Sized> {
    pub name: &'static str,
    pub run: fn(&C, &ExtractionTables) -> Option<String>,
}

impl<C: ?Sized> Strategy<C> {
    pub const fn new(name: &'static str, run: fn(&C, &ExtractionTables) -> Option<String>) -> Self {
        Self { name, run }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub strategy: &'static str,
    pub value: String,
}

/// Runs `chain` in order and returns the first value produced.
pub fn first_success<C: ?Sized>(
    chain: &[Strategy<C>],
    ctx: &C,
    tables: &ExtractionTables,
) -> Option<Resolved> {
    chain.iter().find_map(|step| {
        let value = (step.run)(ctx, tables)?;
        debug!(strategy = step.name, value = %value, "strategy resolved");
        Some(Resolved {
            strategy: step.name,
            value,
        })
    })
}
