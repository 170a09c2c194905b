use std::collections::{BTreeMap, VecDeque};

use crate::engine::expectation::Expectation;

/// Everything a harness instance keeps between requests.
#[derive(Debug, Default)]
pub(crate) struct HarnessState {
    /// One-shot expectations, consumed from the front.
    pub expectations: VecDeque<Expectation>,
    /// Standing stubs by registration id. Ids only grow, so iteration follows insertion order.
    pub stubs: BTreeMap<usize, Expectation>,
    pub next_stub_id: usize,
    pub pending_requests: usize,
}

impl HarnessState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stub(&mut self, stub: Expectation) -> usize {
        let id = self.next_stub_id;
        self.stubs.insert(id, stub);
        self.next_stub_id += 1;
        id
    }

    pub fn resolve_request(&mut self) {
        self.pending_requests = self.pending_requests.saturating_sub(1);
    }
}
