#[cfg(test)]
mod tests {
    use promise_drain::{wait_for_promises, Promise, WeakPromise};
    use std::time::Duration;

    // Kept alone in its own binary: another test pumping the main queue could
    // still be holding a finished job when the drain returns.
    #[test]
    fn test_promise_async_no_dealloc_until_fulfilled() {
        let (weak1, weak2): (WeakPromise<i32, ()>, WeakPromise<i32, ()>) = {
            let promise1 = Promise::<i32, ()>::new(|fulfill, _| {
                fulfill.fulfill(42);
                Ok(())
            });
            let promise2 = Promise::<i32, ()>::new(|fulfill, _| {
                fulfill.fulfill(42);
                Ok(())
            });
            let weak1 = promise1.downgrade();
            let weak2 = promise2.downgrade();
            assert!(weak1.upgrade().is_some());
            assert!(weak2.upgrade().is_some());
            (weak1, weak2)
        };

        assert!(weak1.upgrade().is_some());
        assert!(weak2.upgrade().is_some());
        assert!(wait_for_promises(Duration::from_secs(10)));
        assert!(weak1.upgrade().is_none());
        assert!(weak2.upgrade().is_none());
    }
}
