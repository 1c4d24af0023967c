mod latency;
mod time;

pub use latency::LatencyGuard;
pub use self::time::*;
