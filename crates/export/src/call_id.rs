//! Sequential tool-call identifiers.

/// Hands out `call_001`, `call_002`, … in encounter order.
///
/// One allocator per assembled example; ids never depend on storage keys
/// or randomness, so re-exporting the same conversation yields the same ids.
#[derive(Debug, Default)]
pub struct CallIdAllocator {
    issued: usize,
}

impl CallIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next id.
    pub fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("call_{:03}", self.issued)
    }

    /// How many ids have been issued.
    pub fn issued(&self) -> usize {
        self.issued
    }
}
