//! Polling assertion self-tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use vigil_harness::{assert, CheckError, Registry, Suite, POLL_INTERVAL};

pub fn register(registry: &mut Registry) {
    registry.register(
        Suite::<PollingTests>::new()
            .test("waits_for_background_work", PollingTests::waits_for_background_work)
            .test("passes_without_waiting", PollingTests::passes_without_waiting)
            .test("retries_panicking_check", PollingTests::retries_panicking_check)
            .test("reports_last_failure_on_timeout", PollingTests::reports_last_failure_on_timeout),
    );
}

#[derive(Default)]
struct PollingTests {
    ready: Arc<AtomicBool>,
}

impl PollingTests {
    fn waits_for_background_work(&mut self) -> anyhow::Result<()> {
        let setter = Arc::clone(&self.ready);
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            setter.store(true, Ordering::SeqCst);
        });

        let start = Instant::now();
        let ready = Arc::clone(&self.ready);
        assert::within(Duration::from_millis(500), || {
            assert::is_true(ready.load(Ordering::SeqCst), "ready")
        })?;
        assert::is_true(start.elapsed() >= Duration::from_millis(200), "waited for flag")?;

        worker
            .join()
            .map_err(|_| anyhow::anyhow!("background worker panicked"))?;
        Ok(())
    }

    fn passes_without_waiting(&mut self) -> anyhow::Result<()> {
        let start = Instant::now();
        assert::within(Duration::from_secs(1), || assert::equal(1, 1, ""))?;
        assert::is_true(start.elapsed() < POLL_INTERVAL, "no sleep before first attempt")?;
        Ok(())
    }

    fn retries_panicking_check(&mut self) -> anyhow::Result<()> {
        let attempts = AtomicUsize::new(0);
        assert::within(Duration::from_secs(1), || -> anyhow::Result<()> {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                panic!("not ready yet");
            }
            Ok(())
        })?;
        assert::equal(attempts.load(Ordering::SeqCst), 3, "attempts")?;
        Ok(())
    }

    fn reports_last_failure_on_timeout(&mut self) -> anyhow::Result<()> {
        let ready = Arc::clone(&self.ready);
        assert::throws::<CheckError>(
            || {
                assert::within(Duration::from_millis(150), || {
                    assert::is_true(ready.load(Ordering::SeqCst), "ready")
                })?;
                Ok(())
            },
            "Assertions did not pass within 150ms: ready: Expected: `true` Got: `false`",
            "within",
        )?;
        Ok(())
    }
}
