//! A reference single-threaded coroutine runtime: current-task, suspend,
//! resume, and yield, expressed as an ordinary `std::task` executor.
//!
//! The bus depends on a cooperative scheduler providing those four
//! operations but doesn't implement one itself: any scheduler that polls
//! futures and honours `Waker::wake()` can drive [`crate::bus::Bus`]. This
//! module provides one anyway, so the crate's own tests: and callers with
//! no runtime of their own yet: have something to run `async fn`s on
//! without pulling in an async runtime crate.
//!
//! A run queue of task ids plus a `Waker` that re-enqueues its task id on
//! wake is the whole scheduler; `Rc<RefCell<_>>` rather than any lock,
//! since everything here runs on one OS thread.

use std::task::Poll;

/// Suspends the calling task for one turn, then resumes it.
///
/// Used directly by [`crate::bus::Bus::close`], independent of whether the
/// `executor` feature (the reference [`Executor`] below) is enabled: any
/// executor honours this the same way.
pub async fn yield_now() {
    let mut yielded = false;
    std::future::poll_fn(move |cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

#[cfg(feature = "executor")]
mod reference_executor {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::task::{Context, Poll, Wake, Waker};

    /// A runnable unit of work: a boxed, pinned, type-erased future with no
    /// output (the bus's own `async fn`s are spawned and awaited to
    /// completion by test and demo code, so `()`-returning wrapper closures
    /// are typical; see the tests in `tests/`).
    type Task = Pin<Box<dyn Future<Output = ()>>>;

    struct TaskWaker {
        task_id: usize,
        ready_queue: Rc<RefCell<VecDeque<usize>>>,
    }

    // `Executor` is single-threaded; this `Send + Sync` unlocks the
    // `Arc<TaskWaker>` -> `Waker` conversion `std::task::Wake` requires, even
    // though no `TaskWaker` ever actually crosses a thread boundary.
    unsafe impl Send for TaskWaker {}
    unsafe impl Sync for TaskWaker {}

    impl Wake for TaskWaker {
        fn wake(self: Arc<Self>) {
            self.wake_by_ref()
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.ready_queue.borrow_mut().push_back(self.task_id);
        }
    }

    /// A single-threaded, deterministic, cooperative round-robin executor.
    ///
    /// Tasks are polled in the order they become ready; a task that returns
    /// `Poll::Pending` without registering a waker anywhere will never run
    /// again (same contract as any other executor). `run_until_stalled`
    /// drains every currently-runnable task and returns once none remain
    /// ready: the bus's own `close` uses exactly one `yield_now` per call,
    /// so a scenario with no outstanding external wakeup source reaches
    /// quiescence in a bounded number of polls.
    #[derive(Default)]
    pub struct Executor {
        tasks: RefCell<Vec<Option<Task>>>,
        ready_queue: Rc<RefCell<VecDeque<usize>>>,
    }

    impl Executor {
        pub fn new() -> Self {
            Self {
                tasks: RefCell::new(Vec::new()),
                ready_queue: Rc::new(RefCell::new(VecDeque::new())),
            }
        }

        /// Spawn a future, returning its task id. The task is scheduled to
        /// run on the next `run_until_stalled`.
        pub fn spawn(&self, fut: impl Future<Output = ()> + 'static) -> usize {
            let mut tasks = self.tasks.borrow_mut();
            let id = tasks.len();
            tasks.push(Some(Box::pin(fut)));
            self.ready_queue.borrow_mut().push_back(id);
            id
        }

        /// Run every ready task to either completion or its next suspension
        /// point, following wakeups transitively, until no task is
        /// runnable.
        ///
        /// Returns once the ready queue is empty. A bus-only scenario with
        /// finitely many sends/receives/closes always quiesces: each
        /// suspension is released exactly once by a matching
        /// push/pop/close.
        pub fn run_until_stalled(&self) {
            loop {
                let next = self.ready_queue.borrow_mut().pop_front();
                let Some(id) = next else { break };

                let fut = match self.tasks.borrow_mut()[id].take() {
                    Some(fut) => fut,
                    None => continue,
                };

                let waker: Waker = Arc::new(TaskWaker {
                    task_id: id,
                    ready_queue: self.ready_queue.clone(),
                })
                .into();
                let mut cx = Context::from_waker(&waker);

                let mut fut = fut;
                match fut.as_mut().poll(&mut cx) {
                    Poll::Ready(()) => {}
                    Poll::Pending => {
                        self.tasks.borrow_mut()[id] = Some(fut);
                    }
                }
            }
        }

        /// Convenience for tests: spawn a batch of futures and run them to
        /// quiescence.
        pub fn block_on_all(&self, futs: Vec<Pin<Box<dyn Future<Output = ()>>>>) {
            for fut in futs {
                self.spawn(fut);
            }
            self.run_until_stalled();
        }
    }
}

#[cfg(feature = "executor")]
pub use reference_executor::Executor;
