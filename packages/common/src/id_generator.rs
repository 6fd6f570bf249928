use std::sync::atomic::{AtomicU64, Ordering};

static DOCUMENT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Allocate a process-unique document id (`doc-1`, `doc-2`, ...)
pub fn next_document_id() -> String {
    let n = DOCUMENT_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("doc-{}", n)
}

/// Sequential ID generator for nodes within a document
#[derive(Clone, Debug)]
pub struct IdGenerator {
    prefix: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.prefix, self.count)
    }

    /// Generate the next ID for which `taken` returns false
    pub fn new_id_where(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = self.new_id();
            if !taken(&id) {
                return id;
            }
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("node")
    }
}
