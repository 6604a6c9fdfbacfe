//! 调度器 - 按固定间隔顺序执行所有监控器并发送聚合告警

use crate::monitor::Monitor;
use crate::notification::Notifier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 配置的检查间隔非正数时使用的默认值
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// 等待期间检查停止标志的步长
const SLEEP_STEP: Duration = Duration::from_millis(250);

/// 检查调度器
///
/// 单线程顺序驱动：一个周期内按注册顺序逐个调用监控器，收集所有
/// 失败结果，整个周期最多发送一次聚合通知。下一个周期在上一个周期
/// （包括通知）完全结束后才开始，同一监控器的 check 永远不会并发。
pub struct Scheduler {
    monitors: Vec<Box<dyn Monitor>>,
    notifier: Box<dyn Notifier>,
    interval: Duration,
}

impl Scheduler {
    /// 创建调度器；间隔为零时退回默认的 60 秒
    pub fn new(interval: Duration, notifier: Box<dyn Notifier>) -> Self {
        let interval = if interval.is_zero() {
            warn!(
                default_secs = DEFAULT_INTERVAL.as_secs(),
                "non-positive check interval, using default"
            );
            DEFAULT_INTERVAL
        } else {
            interval
        };

        Self {
            monitors: Vec::new(),
            notifier,
            interval,
        }
    }

    /// 注册一个监控器（检查按注册顺序执行）
    pub fn register(&mut self, monitor: Box<dyn Monitor>) {
        info!(monitor = %monitor.name(), "registering monitor");
        self.monitors.push(monitor);
    }

    /// 已注册的监控器数量
    pub fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    /// 实际生效的检查间隔
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 执行一个完整的检查周期，返回失败的监控器数量
    ///
    /// 单个监控器失败不影响后续监控器；通知发送失败只记录日志，
    /// 不重试，也不影响后续周期。
    pub fn run_cycle(&mut self) -> usize {
        info!("starting check cycle");
        let mut failing = Vec::new();

        for monitor in &mut self.monitors {
            let name = monitor.name();
            let result = monitor.check();
            if result.success {
                debug!(monitor = %name, message = %result.message, "check passed");
            } else {
                match &result.cause {
                    Some(cause) => {
                        warn!(monitor = %name, message = %result.message, cause = %cause, "check failed")
                    }
                    None => warn!(monitor = %name, message = %result.message, "check failed"),
                }
                failing.push(format!("[{}] {}", name, result.message));
            }
        }

        if failing.is_empty() {
            info!("all monitors healthy");
            return 0;
        }

        let count = failing.len();
        let body = format!("以下服务出现异常:\n{}", failing.join("\n"));
        info!(failing = count, "sending aggregated notification");
        if let Err(e) = self.notifier.notify("🚨 服务异常告警", &body) {
            error!(error = %e, "failed to send aggregated notification");
        }

        count
    }

    /// 运行调度循环直到停止标志被置位
    ///
    /// 启动时立即执行一个周期，第一条告警不用等第一个计时器 tick。
    /// 停止是优雅的：正在进行的周期（包括通知）执行完才退出。
    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!(interval_secs = self.interval.as_secs(), "scheduler started");
        self.run_cycle();

        loop {
            if Self::wait(self.interval, shutdown) {
                break;
            }
            self.run_cycle();
        }

        info!("scheduler stopped");
    }

    /// 等待一个间隔，期间轮询停止标志；返回是否应当停止
    fn wait(interval: Duration, shutdown: &AtomicBool) -> bool {
        let deadline = Instant::now() + interval;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(SLEEP_STEP.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::CheckResult;
    use crate::notification::{NotifyError, Notifier};
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    /// 测试用监控器：按脚本依次返回成败
    struct ScriptedMonitor {
        name: String,
        outcomes: Vec<bool>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedMonitor {
        fn new(name: &str, outcomes: Vec<bool>) -> Self {
            Self {
                name: name.to_string(),
                outcomes,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Monitor for ScriptedMonitor {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn check(&mut self) -> CheckResult {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let ok = self.outcomes.get(n).copied().unwrap_or(true);
            if ok {
                CheckResult::ok("fine")
            } else {
                CheckResult::failed(format!("{} broke", self.name))
            }
        }
    }

    /// 测试用通知器：记录每次调用
    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    /// 永远失败的通知器
    struct BrokenNotifier;

    impl Notifier for BrokenNotifier {
        fn notify(&self, _subject: &str, _body: &str) -> Result<(), NotifyError> {
            Err(NotifyError::NoEndpoints)
        }
    }

    #[test]
    fn test_healthy_cycle_sends_nothing() {
        let notifier = RecordingNotifier::default();
        let sent = Arc::clone(&notifier.sent);
        let mut scheduler = Scheduler::new(Duration::from_secs(60), Box::new(notifier));
        scheduler.register(Box::new(ScriptedMonitor::new("a", vec![true])));
        scheduler.register(Box::new(ScriptedMonitor::new("b", vec![true])));

        assert_eq!(scheduler.run_cycle(), 0);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failing_cycle_sends_exactly_one_notification() {
        // Given: 一个周期内两个监控器都失败
        let notifier = RecordingNotifier::default();
        let sent = Arc::clone(&notifier.sent);
        let mut scheduler = Scheduler::new(Duration::from_secs(60), Box::new(notifier));
        scheduler.register(Box::new(ScriptedMonitor::new("a", vec![false])));
        scheduler.register(Box::new(ScriptedMonitor::new("b", vec![false])));

        // When
        assert_eq!(scheduler.run_cycle(), 2);

        // Then: 通知只发一次，两条失败各占一行并标注来源
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (subject, body) = &sent[0];
        assert!(subject.contains("告警"));
        assert!(body.contains("[a] a broke"));
        assert!(body.contains("[b] b broke"));
        assert_eq!(body.lines().count(), 3); // 标题行 + 两条失败
    }

    #[test]
    fn test_one_failure_does_not_stop_later_monitors() {
        let notifier = RecordingNotifier::default();
        let mut scheduler = Scheduler::new(Duration::from_secs(60), Box::new(notifier));

        let first = ScriptedMonitor::new("a", vec![false]);
        let second = ScriptedMonitor::new("b", vec![true]);
        let second_calls = Arc::clone(&second.calls);
        scheduler.register(Box::new(first));
        scheduler.register(Box::new(second));

        scheduler.run_cycle();
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_notifier_failure_does_not_stop_subsequent_cycles() {
        let mut scheduler = Scheduler::new(Duration::from_secs(60), Box::new(BrokenNotifier));
        let monitor = ScriptedMonitor::new("a", vec![false, false]);
        let calls = Arc::clone(&monitor.calls);
        scheduler.register(Box::new(monitor));

        assert_eq!(scheduler.run_cycle(), 1);
        assert_eq!(scheduler.run_cycle(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_interval_falls_back_to_default() {
        let scheduler = Scheduler::new(Duration::ZERO, Box::new(RecordingNotifier::default()));
        assert_eq!(scheduler.interval(), DEFAULT_INTERVAL);
    }

    #[test]
    fn test_positive_interval_is_kept() {
        let scheduler =
            Scheduler::new(Duration::from_secs(5), Box::new(RecordingNotifier::default()));
        assert_eq!(scheduler.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_run_executes_immediate_cycle_then_stops() {
        // Given: 停止标志已经置位
        let notifier = RecordingNotifier::default();
        let sent = Arc::clone(&notifier.sent);
        let mut scheduler = Scheduler::new(Duration::from_secs(60), Box::new(notifier));
        scheduler.register(Box::new(ScriptedMonitor::new("a", vec![false])));

        let shutdown = AtomicBool::new(true);

        // When: run 启动后立刻执行一个周期，然后看到标志退出
        scheduler.run(&shutdown);

        // Then: 启动周期的告警已经发出
        assert_eq!(sent.lock().unwrap().len(), 1);
    }
}
