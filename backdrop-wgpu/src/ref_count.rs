/// Live-consumer counter carried by every pooled effect.
///
/// The counter only counts; pooling and destruction are decided by the pool.
/// `release` is deliberately unguarded: every `retain` must be paired with
/// exactly one `release`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefCount {
    count: i64,
}

impl RefCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn retain(&mut self) {
        self.count += 1;
    }

    pub fn release(&mut self) {
        self.count -= 1;
    }

    pub fn is_free(&self) -> bool {
        self.count == 0
    }
}
