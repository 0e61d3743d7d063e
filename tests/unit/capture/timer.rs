use super::*;

#[test]
fn fires_once_after_delay() {
    let (tx, rx) = mpsc::channel();
    let mut task = DeferredTask::schedule(Duration::from_millis(20), move || {
        tx.send(()).unwrap();
    });
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(!task.cancel());
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn cancelled_task_never_runs() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let mut task = DeferredTask::schedule(Duration::from_millis(50), move || {
        flag.store(true, Ordering::SeqCst);
    });
    assert!(task.cancel());
    assert!(!task.cancel());
    std::thread::sleep(Duration::from_millis(150));
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn dropping_the_handle_cancels() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    drop(DeferredTask::schedule(Duration::from_millis(30), move || {
        flag.store(true, Ordering::SeqCst);
    }));
    std::thread::sleep(Duration::from_millis(120));
    assert!(!ran.load(Ordering::SeqCst));
}
