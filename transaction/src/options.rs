//! Write options for batches and transactions.

use strata_mutation::MutationLayout;

/// Options applied when a batch or transaction commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Ask the service to apply writes it would otherwise refuse.
    pub force_writes: bool,
    /// Order of the mutation list sent at commit.
    pub layout: MutationLayout,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force_writes(mut self, force: bool) -> Self {
        self.force_writes = force;
        self
    }

    pub fn with_layout(mut self, layout: MutationLayout) -> Self {
        self.layout = layout;
        self
    }
}
