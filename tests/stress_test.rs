use savak::{bounded, select, unbounded};
use std::collections::HashSet;
use std::thread;

#[test]
#[cfg_attr(miri, ignore)]
fn test_fan_in_from_a_thousand_producers() {
    const PRODUCERS: usize = 1000;
    const PER_PRODUCER: usize = 1000;

    let c = unbounded();

    let mut handles = vec![];
    for p in 0..PRODUCERS {
        let c = c.clone();
        handles.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                c.send(p * PER_PRODUCER + i).unwrap();
            }
        }));
    }

    let mut seen = HashSet::new();
    for _ in 0..PRODUCERS * PER_PRODUCER {
        assert!(seen.insert(c.recv().unwrap()));
    }

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    assert!(c.is_empty());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_per_producer_order_is_preserved() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 5000;

    let c = bounded(16);

    let mut handles = vec![];
    for p in 0..PRODUCERS {
        let c = c.clone();
        handles.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                c.send((p, i)).unwrap();
            }
        }));
    }

    // The merged stream is some interleaving, but each producer's
    // subsequence arrives in its own order.
    let mut next = [0usize; PRODUCERS];
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let (p, i) = c.recv().unwrap();
        assert_eq!(i, next[p]);
        next[p] += 1;
    }

    for h in handles {
        h.join().unwrap();
    }
    assert!(next.iter().all(|&n| n == PER_PRODUCER));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_triangle_pipeline() {
    const ROUNDS: usize = 1_000_000;

    let c = unbounded();
    let d = unbounded();

    let worker = {
        let c = c.clone();
        let d = d.clone();
        thread::spawn(move || {
            while let Ok(v) = c.recv() {
                d.send(v).unwrap();
            }
            d.close();
        })
    };

    for i in 0..ROUNDS {
        c.send(i).unwrap();
        assert_eq!(d.recv(), Ok(i));
    }

    c.close();
    worker.join().unwrap();

    assert!(c.is_closed());
    assert!(d.is_closed());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_select_fan_in_until_both_close() {
    const PER_CHANNEL: usize = 10_000;

    let a = bounded(8);
    let b = bounded(8);

    let pa = {
        let a = a.clone();
        thread::spawn(move || {
            for i in 0..PER_CHANNEL {
                a.send(i).unwrap();
            }
            a.close();
        })
    };
    let pb = {
        let b = b.clone();
        thread::spawn(move || {
            for i in 0..PER_CHANNEL {
                b.send(i).unwrap();
            }
            b.close();
        })
    };

    let mut from_a = 0;
    let mut from_b = 0;
    let mut a_done = false;
    let mut b_done = false;
    while !(a_done && b_done) {
        // a drained channel would win every select, so fall back to
        // plain receives once one side closes
        if a_done {
            match b.recv() {
                Ok(_) => from_b += 1,
                Err(_) => b_done = true,
            }
            continue;
        }
        if b_done {
            match a.recv() {
                Ok(_) => from_a += 1,
                Err(_) => a_done = true,
            }
            continue;
        }
        select! {
            msg = recv(a) => match msg {
                Ok(_) => from_a += 1,
                Err(_) => a_done = true,
            },
            msg = recv(b) => match msg {
                Ok(_) => from_b += 1,
                Err(_) => b_done = true,
            },
        }
    }

    pa.join().unwrap();
    pb.join().unwrap();
    assert_eq!(from_a, PER_CHANNEL);
    assert_eq!(from_b, PER_CHANNEL);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_mpmc_try_recv_spin() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 5000;

    let c = unbounded();
    let count = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];
    for p in 0..PRODUCERS {
        let c = c.clone();
        handles.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                c.send(p * PER_PRODUCER + i).unwrap();
            }
        }));
    }

    let total = PRODUCERS * PER_PRODUCER;
    for _ in 0..CONSUMERS {
        let c = c.clone();
        let count = count.clone();
        handles.push(thread::spawn(move || {
            while count.load(Ordering::Relaxed) < total {
                if c.try_recv().is_ok() {
                    count.fetch_add(1, Ordering::Relaxed);
                } else {
                    thread::yield_now();
                }
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(count.load(Ordering::SeqCst), total);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_select_race_with_jitter() {
    use rand::Rng;
    use std::time::Duration;

    const ROUNDS: usize = 200;

    let a = bounded(1);
    let b = bounded(1);

    let feeder = {
        let a = a.clone();
        let b = b.clone();
        thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for i in 0..ROUNDS {
                let jitter = rng.gen_range(0..100);
                thread::sleep(Duration::from_micros(jitter));
                if rng.gen_bool(0.5) {
                    a.send(i).unwrap();
                } else {
                    b.send(i).unwrap();
                }
            }
            a.close();
            b.close();
        })
    };

    let mut received = 0;
    let mut a_done = false;
    let mut b_done = false;
    while !(a_done && b_done) {
        if a_done {
            match b.recv() {
                Ok(_) => received += 1,
                Err(_) => b_done = true,
            }
            continue;
        }
        if b_done {
            match a.recv() {
                Ok(_) => received += 1,
                Err(_) => a_done = true,
            }
            continue;
        }
        select! {
            msg = recv(a) => match msg {
                Ok(_) => received += 1,
                Err(_) => a_done = true,
            },
            msg = recv(b) => match msg {
                Ok(_) => received += 1,
                Err(_) => b_done = true,
            },
        }
    }

    feeder.join().unwrap();
    assert_eq!(received, ROUNDS);
}
