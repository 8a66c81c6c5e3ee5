/// Source of wall-clock time for deadline checks.
pub trait Clock: Send + Sync {
	/// Current unix time in seconds.
	fn now(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> u64 {
		u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
	}
}
