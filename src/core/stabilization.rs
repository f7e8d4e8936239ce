use crate::config::TimingConfig;
use crate::domain::ports::{Locator, PageAutomation};
use crate::utils::error::Result;
use std::time::Duration;
use tokio::time::Instant;

/// 追蹤連續相同 (且非零) 的讀數
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    threshold: u32,
    last_count: usize,
    stable_streak: u32,
}

impl StabilityTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            last_count: 0,
            stable_streak: 0,
        }
    }

    /// 記錄一次讀數；與上一次相同且非零的讀數累計達到門檻時回傳 true
    pub fn observe(&mut self, count: usize) -> bool {
        if count == self.last_count && count > 0 {
            self.stable_streak += 1;
        } else {
            self.stable_streak = 0;
        }
        self.last_count = count;
        self.stable_streak >= self.threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stabilization {
    Settled { count: usize, polls: u32 },
    /// 逾時不是錯誤：以當下頁面上的內容繼續
    TimedOut { count: usize, polls: u32 },
}

impl Stabilization {
    pub fn count(&self) -> usize {
        match self {
            Self::Settled { count, .. } | Self::TimedOut { count, .. } => *count,
        }
    }
}

/// 定期讀取結果數量，直到連續數次不再變動或逾時
#[derive(Debug, Clone)]
pub struct ResultStabilizationDetector {
    interval: Duration,
    timeout: Duration,
    threshold: u32,
}

impl ResultStabilizationDetector {
    pub fn new(interval: Duration, timeout: Duration, threshold: u32) -> Self {
        Self {
            interval,
            timeout,
            threshold,
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(
            timing.stabilization_interval(),
            timing.stabilization_timeout(),
            timing.stable_reads,
        )
    }

    pub async fn wait(&self, page: &dyn PageAutomation, results: &Locator) -> Result<Stabilization> {
        let start = Instant::now();
        let mut tracker = StabilityTracker::new(self.threshold);
        let mut polls = 0;
        let mut count = 0;

        while start.elapsed() < self.timeout {
            count = page.count(results).await?;
            polls += 1;

            if tracker.observe(count) {
                tracing::debug!("Results settled at {} cards after {} polls", count, polls);
                return Ok(Stabilization::Settled { count, polls });
            }

            page.wait_fixed(self.interval).await;
        }

        tracing::warn!(
            "Results still changing after {:?}; continuing with {} cards",
            self.timeout,
            count
        );
        Ok(Stabilization::TimedOut { count, polls })
    }
}
