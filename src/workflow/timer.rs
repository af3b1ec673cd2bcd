//! 答题计时器
//!
//! 计时任务只在 `TimerGuard` 存活期间运行，guard 被丢弃时任务随之终止，
//! 最后一次发布的秒数保持不变。

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// 计时器配置
#[derive(Debug, Clone, Copy)]
pub struct SessionTimer {
    tick: Duration,
}

impl SessionTimer {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_millis(10)),
        }
    }

    /// 启动计时，返回的 guard 决定计时任务的生命周期
    pub fn start(&self) -> TimerGuard {
        let (tx, rx) = watch::channel(0u64);
        let started = Instant::now();
        let tick = self.tick;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(started.elapsed().as_secs()).is_err() {
                    break;
                }
            }
        });

        debug!("⏱️ 计时开始");
        TimerGuard { handle, rx }
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// 计时任务的所有权
pub struct TimerGuard {
    handle: JoinHandle<()>,
    rx: watch::Receiver<u64>,
}

impl TimerGuard {
    /// 已用秒数
    pub fn elapsed_secs(&self) -> u64 {
        *self.rx.borrow()
    }

    /// 停止计时并返回定格的秒数
    pub fn stop(self) -> u64 {
        self.elapsed_secs()
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("⏱️ 计时停止: {}", format_elapsed(*self.rx.borrow()));
    }
}

/// 显示用时：不足一小时为 `mm:ss`，否则 `h:mm:ss`
pub fn format_elapsed(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(75), "01:15");
        assert_eq!(format_elapsed(3599), "59:59");
        assert_eq!(format_elapsed(3661), "1:01:01");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_counts_seconds() {
        let guard = SessionTimer::default().start();
        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(guard.elapsed_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_guard_stops_updates() {
        let guard = SessionTimer::default().start();
        let mut rx = guard.rx.clone();
        time::sleep(Duration::from_millis(2500)).await;
        let frozen = guard.stop();
        assert_eq!(frozen, 2);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*rx.borrow_and_update(), frozen);
        // 任务终止后发送端被释放
        assert!(rx.changed().await.is_err());
    }
}
