#[cfg(test)]
mod tests {
    use promise_drain::{wait_for_promises, NewThread, Promise, State};
    use std::{thread, time::Duration};
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    enum TestError {
        #[error("code 42")]
        Code42,
        #[error("code 13")]
        Code13,
    }

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn test_promise_async_fulfill() {
        let promise = Promise::<i32, TestError>::new(|fulfill, _| {
            fulfill.fulfill(42);
            Ok(())
        });

        assert!(wait_for_promises(TIMEOUT));
        assert_eq!(promise.value(), Some(42));
        assert_eq!(promise.error(), None);
    }

    #[test]
    fn test_promise_async_reject() {
        let promise = Promise::<i32, TestError>::new(|_, reject| {
            reject.reject(TestError::Code42);
            Ok(())
        });

        assert!(wait_for_promises(TIMEOUT));
        assert_eq!(promise.error(), Some(TestError::Code42));
        assert_eq!(promise.value(), None);
    }

    #[test]
    fn test_promise_async_throw() {
        let promise = Promise::<i32, TestError>::new(|_, _| Err(TestError::Code42));

        assert!(wait_for_promises(TIMEOUT));
        assert_eq!(promise.error(), Some(TestError::Code42));
        assert_eq!(promise.value(), None);
    }

    #[test]
    fn test_promise_async_from_fn() {
        let fulfilled = Promise::<i32, TestError>::from_fn(|| Ok(42));
        let rejected = Promise::<i32, TestError>::from_fn(|| Err(TestError::Code13));

        assert!(wait_for_promises(TIMEOUT));
        assert_eq!(fulfilled.state(), State::Fulfilled(42));
        assert_eq!(rejected.state(), State::Rejected(TestError::Code13));
    }

    #[test]
    fn test_promise_async_first_settlement_wins() {
        let fulfilled_first = Promise::<i32, TestError>::new(|fulfill, reject| {
            fulfill.fulfill(42);
            reject.reject(TestError::Code42);
            Ok(())
        });
        let rejected_first = Promise::<i32, TestError>::new(|fulfill, reject| {
            reject.reject(TestError::Code42);
            fulfill.fulfill(42);
            Ok(())
        });

        assert!(wait_for_promises(TIMEOUT));
        assert_eq!(fulfilled_first.state(), State::Fulfilled(42));
        assert_eq!(rejected_first.state(), State::Rejected(TestError::Code42));
    }

    #[test]
    fn test_promise_async_on_other_threads() {
        let promises: Vec<_> = (0..8)
            .map(|n| {
                Promise::<i32, TestError>::new_on(NewThread::named("worker"), move |fulfill, _| {
                    thread::sleep(Duration::from_millis(10));
                    fulfill.fulfill(n);
                    Ok(())
                })
            })
            .collect();

        assert!(wait_for_promises(TIMEOUT));
        for (n, promise) in promises.iter().enumerate() {
            assert_eq!(promise.value(), Some(n as i32));
        }
    }

    #[test]
    fn test_promise_async_observe_on_main_queue() {
        let (tx, rx) = std::sync::mpsc::channel();
        let promise = Promise::<i32, TestError>::new(|fulfill, _| {
            fulfill.fulfill(42);
            Ok(())
        });
        promise.observe(promise_drain::Queue::main(), move |outcome| {
            tx.send(outcome).unwrap()
        });

        assert!(wait_for_promises(TIMEOUT));
        // Another test's drain may be the one running the callback.
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Ok(42));
    }
}
