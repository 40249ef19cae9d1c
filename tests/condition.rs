use interlock::{Condition, Error, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Predicate state shared between threads.
///
/// The atomics are read and written only while holding `m`; the mutex
/// provides the ordering, so `Relaxed` is sufficient.
struct Shared {
    m: Mutex,
    cond: Condition,
    flag: AtomicBool,
}

fn shared() -> Arc<Shared> {
    Arc::new(Shared {
        m: Mutex::new().unwrap(),
        cond: Condition::new().unwrap(),
        flag: AtomicBool::new(false),
    })
}

fn spawn_waiter(s: Arc<Shared>, delay: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(delay);
        let _guard = s.m.guard().unwrap();
        while !s.flag.load(Ordering::Relaxed) {
            let signalled = s.cond.wait(&s.m, None).unwrap();
            assert!(signalled, "an unbounded wait can only return signalled");
        }
    })
}

fn spawn_signaller(s: Arc<Shared>, delay: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(delay);
        s.m.lock().unwrap();
        s.flag.store(true, Ordering::Relaxed);
        s.m.unlock().unwrap();
        s.cond.broadcast().unwrap();
    })
}

#[test]
fn test_broadcast_without_waiters() {
    let cond = Condition::new().unwrap();
    cond.broadcast().unwrap();
}

#[test]
fn test_broadcast_is_not_latched() {
    let m = Mutex::new().unwrap();
    let cond = Condition::new().unwrap();

    cond.broadcast().unwrap();

    let _guard = m.guard().unwrap();
    let signalled = cond.wait(&m, Some(Duration::from_millis(50))).unwrap();
    assert!(
        !signalled,
        "a broadcast with no waiters must not satisfy a later wait"
    );
}

#[test]
fn test_wait_and_broadcast() {
    let s = shared();
    let waiter = spawn_waiter(s.clone(), Duration::ZERO);
    let signaller = spawn_signaller(s, Duration::ZERO);
    waiter.join().unwrap();
    signaller.join().unwrap();
}

#[test]
fn test_broadcast_before_wait() {
    let s = shared();
    let signaller = spawn_signaller(s.clone(), Duration::ZERO);
    let waiter = spawn_waiter(s, Duration::from_millis(200));
    waiter.join().unwrap();
    signaller.join().unwrap();
}

#[test]
fn test_wait_before_broadcast() {
    let s = shared();
    let waiter = spawn_waiter(s.clone(), Duration::ZERO);
    let signaller = spawn_signaller(s, Duration::from_millis(200));
    waiter.join().unwrap();
    signaller.join().unwrap();
}

#[test]
fn test_broadcast_wakes_all_waiters() {
    struct Multi {
        m: Mutex,
        cond: Condition,
        flag: AtomicBool,
        woken: AtomicU32,
    }

    let s = Arc::new(Multi {
        m: Mutex::new().unwrap(),
        cond: Condition::new().unwrap(),
        flag: AtomicBool::new(false),
        woken: AtomicU32::new(0),
    });

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let s = s.clone();
            thread::spawn(move || {
                let _guard = s.m.guard().unwrap();
                while !s.flag.load(Ordering::Relaxed) {
                    s.cond.wait(&s.m, None).unwrap();
                }
                s.woken.fetch_add(1, Ordering::Relaxed);
            })
        })
        .collect();

    // Give the waiters time to suspend, then signal exactly once.
    thread::sleep(Duration::from_millis(100));
    s.m.lock().unwrap();
    s.flag.store(true, Ordering::Relaxed);
    s.m.unlock().unwrap();
    s.cond.broadcast().unwrap();

    for waiter in waiters {
        waiter.join().unwrap();
    }
    assert_eq!(s.woken.load(Ordering::Relaxed), 4);
}

#[test]
fn test_handshake_loop() {
    const ITERATIONS: u32 = 6666;

    struct Handshake {
        m: Mutex,
        read_cond: Condition,
        write_cond: Condition,
        read: AtomicU32,
        write: AtomicBool,
    }

    let hs = Arc::new(Handshake {
        m: Mutex::new().unwrap(),
        read_cond: Condition::new().unwrap(),
        write_cond: Condition::new().unwrap(),
        read: AtomicU32::new(0),
        write: AtomicBool::new(false),
    });

    let reader = {
        let hs = hs.clone();
        thread::spawn(move || {
            let mut count = 0u32;
            for _ in 0..ITERATIONS {
                let _guard = hs.m.guard().unwrap();
                while hs.read.load(Ordering::Relaxed) <= count {
                    hs.read_cond.wait(&hs.m, None).unwrap();
                }
                count = hs.read.load(Ordering::Relaxed);
                hs.write.store(true, Ordering::Relaxed);
                hs.write_cond.broadcast().unwrap();
            }
            count
        })
    };

    let writer = {
        let hs = hs.clone();
        thread::spawn(move || {
            let mut count = 0u32;
            for _ in 0..ITERATIONS {
                let _guard = hs.m.guard().unwrap();
                count += 1;
                hs.read.store(count, Ordering::Relaxed);
                hs.read_cond.broadcast().unwrap();
                hs.write.store(false, Ordering::Relaxed);
                while !hs.write.load(Ordering::Relaxed) {
                    hs.write_cond.wait(&hs.m, None).unwrap();
                }
            }
            count
        })
    };

    assert_eq!(
        reader.join().unwrap(),
        ITERATIONS,
        "reader missed a wakeup"
    );
    assert_eq!(
        writer.join().unwrap(),
        ITERATIONS,
        "writer missed a wakeup"
    );
}

#[test]
fn test_timeout_expires() {
    const TIMEOUT: Duration = Duration::from_millis(100);

    let m = Mutex::new().unwrap();
    let never_signalled = Condition::new().unwrap();

    m.lock().unwrap();
    let start = Instant::now();
    let signalled = never_signalled.wait(&m, Some(TIMEOUT)).unwrap();
    let elapsed = start.elapsed();

    assert!(!signalled, "nothing broadcasts; the wait must time out");
    assert!(
        elapsed >= Duration::from_millis(50),
        "wait returned well before the deadline ({elapsed:?})"
    );
    // The mutex is re-locked on return, so release must succeed.
    m.unlock().unwrap();
}

#[test]
fn test_construct_destroy_many() {
    for _ in 0..6666 {
        let cond = Condition::new().unwrap();
        cond.broadcast().unwrap();
    }
}

#[test]
fn test_transfer_moves_ownership() {
    let mut cond = Condition::new().unwrap();
    let cond2 = cond.transfer().unwrap();

    cond2.broadcast().unwrap();
    assert!(matches!(cond.broadcast(), Err(Error::InvalidState)));

    let m = Mutex::new().unwrap();
    let _guard = m.guard().unwrap();
    assert!(matches!(
        cond.wait(&m, Some(Duration::from_millis(10))),
        Err(Error::InvalidState)
    ));

    let signalled = cond2.wait(&m, Some(Duration::from_millis(10))).unwrap();
    assert!(!signalled);
}

#[test]
fn test_double_transfer_fails() {
    let mut cond = Condition::new().unwrap();
    let _cond2 = cond.transfer().unwrap();
    assert!(matches!(cond.transfer(), Err(Error::InvalidState)));
}

#[test]
fn test_wait_on_transferred_mutex_fails() {
    let mut m = Mutex::new().unwrap();
    let _m2 = m.transfer().unwrap();
    let cond = Condition::new().unwrap();
    assert!(matches!(cond.wait(&m, None), Err(Error::InvalidState)));
}
