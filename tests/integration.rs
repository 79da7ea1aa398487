//! Cross-thread and cross-process behavior of the public API.

#![allow(deprecated)] // cargo_bin

use assert_cmd::cargo::cargo_bin;
use file_semaphore::{
    AcquireOptions, LockState, Semaphore, SemaphoreConfig, SemaphoreError, SystemHost,
};
use std::fs;
use std::process::{Command, Stdio};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// PID of a process that has already exited and been reaped.
#[cfg(unix)]
fn dead_pid() -> u32 {
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

#[test]
fn threads_contending_for_fresh_lock_produce_one_winner() {
    const THREADS: usize = 12;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.lock");
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let semaphore = Semaphore::with_defaults(&path).unwrap();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                semaphore.try_acquire(None)
            })
        })
        .collect();

    let mut acquired = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => acquired += 1,
            Err(SemaphoreError::AlreadyLocked { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(acquired, 1);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn child_processes_contending_produce_one_winner() {
    const CHILDREN: usize = 8;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.lock");
    let holder = std::process::id().to_string();

    let children: Vec<_> = (0..CHILDREN)
        .map(|_| {
            Command::new(cargo_bin("file-semaphore"))
                .args(["try", "-q", "--pid", &holder])
                .arg(&path)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .unwrap()
        })
        .collect();

    let codes: Vec<i32> = children
        .into_iter()
        .map(|mut child| child.wait().unwrap().code().unwrap())
        .collect();

    assert_eq!(codes.iter().filter(|&&c| c == 0).count(), 1, "{codes:?}");
    assert!(codes.iter().all(|&c| c == 0 || c == 1), "{codes:?}");
}

#[test]
fn lock_passes_between_two_holders() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("handoff.lock");

    let first = Semaphore::new(&path, SemaphoreConfig::default()).unwrap();
    let second = Semaphore::with_host(&path, SemaphoreConfig::default(), SystemHost::for_pid(1))
        .unwrap();

    first.try_acquire(Some("first")).unwrap();
    match second.try_acquire(None) {
        Err(SemaphoreError::AlreadyLocked { holder_pid, .. }) => {
            assert_eq!(holder_pid, Some(std::process::id()))
        }
        other => panic!("expected AlreadyLocked, got {other:?}"),
    }
    assert_eq!(second.status().state(), LockState::OwnedByOther);

    first.release(false).unwrap();
    let record = second.try_acquire(Some("second")).unwrap();
    assert_eq!(record.pid, 1);
    assert_eq!(first.status().state(), LockState::OwnedByOther);

    second.release(false).unwrap();
}

#[cfg(unix)]
#[test]
fn crashed_holder_is_recovered_after_timeout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("crash.lock");
    let crashed = dead_pid();
    fs::write(&path, format!("pid={crashed}\ntimestamp=1000\ntag=crashed job\n")).unwrap();

    let semaphore = Semaphore::new(
        &path,
        SemaphoreConfig::default().with_stale_timeout(Some(Duration::from_secs(60))),
    )
    .unwrap();

    let status = semaphore.status();
    assert!(status.is_stale);
    assert_eq!(status.holder_running, Some(false));

    let record = semaphore.try_acquire(Some("recovery")).unwrap();
    assert_eq!(record.pid, std::process::id());
    assert_eq!(semaphore.lock_info().unwrap().tag.as_deref(), Some("recovery"));
}

#[test]
fn old_lock_of_running_holder_survives() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("busy.lock");
    let live = std::process::id();
    fs::write(&path, format!("pid={live}\ntimestamp=0\n")).unwrap();

    let other = Semaphore::with_host(
        &path,
        SemaphoreConfig::default().with_stale_timeout(Some(Duration::from_millis(1))),
        SystemHost::for_pid(1),
    )
    .unwrap();

    assert!(other.try_acquire(None).is_err());
    assert!(!other.clean_stale().unwrap());
    assert_eq!(other.lock_info().unwrap().pid, live);
}

#[test]
fn blocking_acquire_across_threads_serializes_work() {
    const WORKERS: usize = 4;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("serial.lock");
    let log = dir.path().join("log.txt");
    fs::write(&log, "").unwrap();

    let config = SemaphoreConfig::default().with_retry_interval(Duration::from_millis(5));
    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let semaphore = Semaphore::new(&path, config.clone()).unwrap();
            let log = log.clone();
            thread::spawn(move || {
                let guard = semaphore
                    .acquire_guard(
                        AcquireOptions::default().with_timeout(Duration::from_secs(30)),
                    )
                    .unwrap();
                let mut content = fs::read_to_string(&log).unwrap();
                content.push_str(&format!("start {worker}\n"));
                fs::write(&log, &content).unwrap();
                thread::sleep(Duration::from_millis(10));
                content.push_str(&format!("end {worker}\n"));
                fs::write(&log, &content).unwrap();
                guard.release().unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Every start is immediately followed by its own end
    let lines: Vec<String> = fs::read_to_string(&log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines.len(), WORKERS * 2);
    for pair in lines.chunks(2) {
        let start = pair[0].strip_prefix("start ").unwrap();
        let end = pair[1].strip_prefix("end ").unwrap();
        assert_eq!(start, end);
    }
}
