//! Tests for the once-only restart timer.

use std::sync::{Arc, Barrier};
use std::time::Duration;

use crashwatch::config::RestartConfig;
use crashwatch::report::build;
use crashwatch::supervisor::{RestartDecision, RestartState, RestartSupervisor, Terminator};
use crashwatch::{FailureSource, RawFailure, Report};

use super::support::{captured_console, fixed_host, restart_config, CountingTerminator};

fn uncaught() -> Report {
    build(
        FailureSource::UncaughtException,
        &RawFailure::error("fatal"),
        fixed_host(),
    )
}

fn supervisor(config: &RestartConfig) -> (RestartSupervisor, Arc<CountingTerminator>) {
    let terminator = Arc::new(CountingTerminator::default());
    let supervisor = RestartSupervisor::with_terminator(
        config,
        "testbot#0001",
        terminator.clone() as Arc<dyn Terminator>,
    );
    (supervisor, terminator)
}

#[tokio::test(start_paused = true)]
async fn terminates_once_after_delay() {
    let (supervisor, terminator) = supervisor(&restart_config(5));

    assert_eq!(supervisor.state(), RestartState::Idle);
    assert_eq!(supervisor.maybe_restart(&uncaught()), RestartDecision::Scheduled);
    assert_eq!(supervisor.state(), RestartState::Scheduled);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(terminator.calls(), 0, "must not exit before the delay");

    tokio::time::sleep(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(terminator.calls(), 1);
    assert_eq!(terminator.codes(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn second_trigger_is_suppressed() {
    let (supervisor, terminator) = supervisor(&restart_config(5));

    assert_eq!(supervisor.maybe_restart(&uncaught()), RestartDecision::Scheduled);
    assert_eq!(supervisor.maybe_restart(&uncaught()), RestartDecision::Suppressed);
    assert_eq!(supervisor.maybe_restart(&uncaught()), RestartDecision::Suppressed);

    tokio::time::sleep(Duration::from_secs(30)).await;
    tokio::task::yield_now().await;
    assert_eq!(terminator.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn disabled_supervisor_never_terminates() {
    let config = RestartConfig {
        enabled: false,
        ..restart_config(5)
    };
    let (supervisor, terminator) = supervisor(&config);

    assert_eq!(supervisor.maybe_restart(&uncaught()), RestartDecision::Disabled);
    assert_eq!(supervisor.state(), RestartState::Idle);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(terminator.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn custom_exit_code_is_used() {
    let config = RestartConfig {
        exit_code: 75,
        ..restart_config(1)
    };
    let (supervisor, terminator) = supervisor(&config);

    supervisor.maybe_restart(&uncaught());
    tokio::time::sleep(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(terminator.codes(), vec![75]);
}

#[tokio::test]
async fn restart_notice_goes_to_console() {
    let (console, out, err) = captured_console();
    let (supervisor, _terminator) = supervisor(&restart_config(5));
    let supervisor = supervisor.with_console(console);

    supervisor.maybe_restart(&uncaught());
    supervisor.maybe_restart(&uncaught());

    let printed = out.contents();
    assert_eq!(printed.matches("Restarting testbot#0001 in 5 seconds...").count(), 1);
    assert!(err.contents().is_empty());
}

#[test]
fn concurrent_triggers_schedule_exactly_once() {
    let (supervisor, terminator) = supervisor(&restart_config(0));
    let supervisor = Arc::new(supervisor);
    let report = Arc::new(uncaught());
    let barrier = Arc::new(Barrier::new(8));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let supervisor = Arc::clone(&supervisor);
            let report = Arc::clone(&report);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                supervisor.maybe_restart(&report)
            })
        })
        .collect();

    let decisions: Vec<RestartDecision> = threads
        .into_iter()
        .map(|t| t.join().expect("thread panicked"))
        .collect();

    let scheduled = decisions
        .iter()
        .filter(|d| **d == RestartDecision::Scheduled)
        .count();
    assert_eq!(scheduled, 1);
    assert_eq!(decisions.len() - scheduled, 7);

    // Without a runtime the timer runs on a plain thread.
    for _ in 0..200 {
        if terminator.calls() > 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(terminator.calls(), 1);
}
