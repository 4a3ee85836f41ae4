#[cfg(test)]
mod tests {
    use bounded_pool::{
        errors::{Closed, PoolError, TaskError},
        handle::result_channel,
        model::PoolState,
        pool::WorkerPool,
        queue::BoundedQueue,
    };
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            mpsc, Arc,
        },
        thread,
        time::Duration,
    };

    #[test]
    fn test_fifo_order() {
        println!("\n=== TEST: FIFO order ===");
        let q = BoundedQueue::new(8);
        for i in 1..=5 {
            q.push(i).unwrap();
        }
        for i in 1..=5 {
            assert_eq!(q.pop(), Some(i), "pops must match push completion order");
        }
        println!("  ✓ 5 items popped in push order");
    }

    #[test]
    fn test_capacity_blocks_producer() {
        println!("\n=== TEST: full queue blocks push ===");
        let q = Arc::new(BoundedQueue::new(2));
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.len(), 2);

        let pushed = Arc::new(AtomicBool::new(false));
        let producer = {
            let q = q.clone();
            let pushed = pushed.clone();
            thread::spawn(move || {
                q.push(3).unwrap();
                pushed.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert!(
            !pushed.load(Ordering::SeqCst),
            "push at capacity must block until a pop frees space"
        );

        assert_eq!(q.pop(), Some(1));
        producer.join().unwrap();
        assert!(pushed.load(Ordering::SeqCst));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        println!("  ✓ blocked producer resumed after pop");
    }

    #[test]
    fn test_close_unblocks_blocked_producer() {
        println!("\n=== TEST: close wakes blocked producer ===");
        let q = Arc::new(BoundedQueue::new(1));
        q.push(1).unwrap();

        let producer = {
            let q = q.clone();
            thread::spawn(move || q.push(2))
        };

        thread::sleep(Duration::from_millis(100));
        q.close();
        assert_eq!(producer.join().unwrap(), Err(Closed));

        // The racing push enqueued nothing; buffered items stay poppable.
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), None);
        println!("  ✓ push racing with close returned Closed");
    }

    #[test]
    fn test_drain_to_stop() {
        println!("\n=== TEST: drain to end-of-stream ===");
        let q = BoundedQueue::new(8);
        for i in 1..=3 {
            q.push(i).unwrap();
        }
        q.close();
        q.close(); // idempotent

        assert!(q.push(4).is_err(), "push after close must fail");
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
        assert_eq!(q.pop(), None, "end-of-stream never reverses");
        println!("  ✓ pending items drained in order, then None forever");
    }

    #[test]
    fn test_pop_blocks_until_push() {
        println!("\n=== TEST: empty queue blocks pop ===");
        let q = Arc::new(BoundedQueue::new(4));
        let consumer = {
            let q = q.clone();
            thread::spawn(move || q.pop())
        };
        thread::sleep(Duration::from_millis(50));
        q.push(42).unwrap();
        assert_eq!(consumer.join().unwrap(), Some(42));
        println!("  ✓ blocked consumer woken by push");
    }

    #[test]
    fn test_one_shot_set_once() {
        println!("\n=== TEST: one-shot write side ===");
        let (mut promise, mut handle) = result_channel::<i32>();
        assert!(promise.set_value(1).is_ok());
        assert_eq!(
            promise.set_value(2),
            Err(TaskError::AlreadySet),
            "second set must fail"
        );
        assert_eq!(
            promise.set_error(TaskError::Failed("late".into())),
            Err(TaskError::AlreadySet)
        );
        assert_eq!(handle.get(), Ok(1), "first set wins");
        println!("  ✓ exactly one set observed");
    }

    #[test]
    fn test_one_shot_read_once() {
        println!("\n=== TEST: one-shot read side ===");
        let (mut promise, mut handle) = result_channel::<i32>();
        let setter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            promise.set_value(7).unwrap();
        });
        assert_eq!(handle.get(), Ok(7));
        assert_eq!(handle.get(), Err(TaskError::AlreadyConsumed));
        setter.join().unwrap();
        println!("  ✓ get blocked until ready, second get rejected");
    }

    #[test]
    fn test_dropped_promise_resolves_handle() {
        println!("\n=== TEST: abandoned channel ===");
        let (promise, mut handle) = result_channel::<i32>();
        drop(promise);
        assert_eq!(handle.get(), Err(TaskError::ChannelClosed));
        println!("  ✓ reader unblocked with ChannelClosed");
    }

    #[test]
    fn test_get_timeout() {
        println!("\n=== TEST: bounded wait on handle ===");
        let (mut promise, mut handle) = result_channel::<i32>();
        assert_eq!(
            handle.get_timeout(Duration::from_millis(50)),
            Err(TaskError::Timeout)
        );
        promise.set_value(9).unwrap();
        assert_eq!(
            handle.get_timeout(Duration::from_millis(50)),
            Ok(9),
            "handle stays readable after a timeout"
        );
        println!("  ✓ timeout then successful read");
    }

    #[test]
    fn test_pool_squares_scenario() {
        println!("\n=== TEST: W=2 N=1 squares ===");
        let pool = WorkerPool::new(2, 1);
        let handles: Vec<_> = (1..=3u64)
            .map(|i| pool.submit_with_result(move || i * i).unwrap())
            .collect();

        let mut results: Vec<u64> = handles
            .into_iter()
            .map(|mut h| h.get().unwrap())
            .collect();
        results.sort_unstable();
        assert_eq!(results, vec![1, 4, 9]);

        pool.shutdown(true);
        assert_eq!(pool.state(), PoolState::Stopped);
        assert!(pool.submit(|| {}).is_err());
        let metrics = pool.metrics();
        assert_eq!(metrics.completed_tasks, 3);
        assert_eq!(metrics.queued_tasks, 0);
        println!("  ✓ all squares delivered, pool stopped clean");
    }

    #[test]
    fn test_task_isolation() {
        println!("\n=== TEST: failing task does not poison the pool ===");
        // Silence the default hook for the deliberate panic below.
        let _guard = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let pool = WorkerPool::new(2, 8);
        let mut bad = pool
            .submit_with_result(|| -> i32 { panic!("intentional failure") })
            .unwrap();
        let mut good = pool.submit_with_result(|| 5).unwrap();

        match bad.get() {
            Err(TaskError::Panic(msg)) => assert!(msg.contains("intentional failure")),
            other => panic!("expected Panic, got {other:?}"),
        }
        assert_eq!(good.get(), Ok(5), "sibling task unaffected");
        assert_eq!(pool.state(), PoolState::Running);

        pool.shutdown(true);
        let metrics = pool.metrics();
        assert_eq!(metrics.failed_tasks, 1);
        assert_eq!(metrics.completed_tasks, 1);
        println!("  ✓ panic captured into its own handle only");
    }

    #[test]
    fn test_submit_fallible() {
        println!("\n=== TEST: fallible task body ===");
        let pool = WorkerPool::new(1, 4);
        let mut ok = pool
            .submit_fallible(|| Ok::<_, String>(10))
            .unwrap();
        let mut err = pool
            .submit_fallible(|| Err::<i32, _>("boom".to_string()))
            .unwrap();

        assert_eq!(ok.get(), Ok(10));
        assert_eq!(err.get(), Err(TaskError::Failed("boom".into())));
        pool.shutdown(true);
        println!("  ✓ Err routed through the handle as Failed");
    }

    #[test]
    fn test_submit_after_shutdown() {
        println!("\n=== TEST: submission after shutdown ===");
        let pool = WorkerPool::new(1, 4);
        pool.shutdown(true);
        assert_eq!(pool.submit(|| {}), Err(PoolError::Stopped));
        assert!(pool.submit_with_result(|| 1).is_err());
        println!("  ✓ PoolStopped surfaced to the submitter");
    }

    #[test]
    fn test_shutdown_idempotent() {
        println!("\n=== TEST: shutdown idempotency ===");
        let pool = WorkerPool::new(2, 4);
        pool.shutdown(true);
        pool.shutdown(true);
        pool.shutdown(false);
        assert_eq!(pool.state(), PoolState::Stopped);
        println!("  ✓ repeated shutdown is a no-op");
    }

    #[test]
    fn test_forced_shutdown_discards_unstarted() {
        println!("\n=== TEST: forced shutdown ===");
        let pool = WorkerPool::new(1, 4);
        let (started_tx, started_rx) = mpsc::channel();

        let mut running = pool
            .submit_with_result(move || {
                started_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(150));
                1
            })
            .unwrap();
        let buffered: Vec<_> = (0..3)
            .map(|i| pool.submit_with_result(move || i).unwrap())
            .collect();

        // Wait until the single worker is inside the first task, so the rest
        // are still buffered when we force the stop.
        started_rx.recv().unwrap();
        pool.shutdown(false);
        assert_eq!(pool.state(), PoolState::Stopped);

        // The in-flight task is never interrupted; it finished before join.
        assert_eq!(running.get(), Ok(1));
        for mut h in buffered {
            assert_eq!(h.get(), Err(TaskError::ChannelClosed));
        }
        println!("  ✓ in-flight task completed, buffered tasks discarded");
    }

    #[test]
    fn test_drop_joins_workers() {
        println!("\n=== TEST: drop shuts down gracefully ===");
        let mut handle = {
            let pool = WorkerPool::new(2, 4);
            pool.submit_with_result(|| 3).unwrap()
            // drop runs a graceful shutdown, draining the buffered task
        };
        assert_eq!(handle.get(), Ok(3));
        println!("  ✓ buffered task completed before drop returned");
    }
}
