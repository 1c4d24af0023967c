use std::time::Instant;

// drop时输出耗时
pub struct LatencyGuard {
    process_name: String,
    start: Instant,
}

impl LatencyGuard {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed_millis(&self) -> u128 {
        self.start.elapsed().as_millis()
    }
}

impl Drop for LatencyGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        log::info!(
            "{} took {} us, {} ms",
            self.process_name,
            elapsed.as_micros(),
            elapsed.as_millis()
        );
    }
}
