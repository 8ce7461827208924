use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

pub type Task<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Owns consumer state that need not be `Send` and runs queued tasks on
/// whichever thread drives it.
pub struct ConsumerContext<C> {
    state: C,
    tasks: Receiver<Task<C>>,
}

/// Cloneable, `Send` handle used to schedule work on a [`ConsumerContext`]
pub struct ContextHandle<C> {
    tx: Sender<Task<C>>,
}

impl<C> Clone for ContextHandle<C> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<C> ContextHandle<C> {
    /// Queue `task` to run on the consumer's thread at its next
    /// opportunity. Returns false if the context is gone.
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }

    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

impl<C> ConsumerContext<C> {
    pub fn new(state: C) -> (Self, ContextHandle<C>) {
        let (tx, tasks) = unbounded();
        (Self { state, tasks }, ContextHandle { tx })
    }

    /// Run every task queued right now, without blocking.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.tasks.try_recv() {
            task(&mut self.state);
            ran += 1;
        }
        ran
    }

    /// Dispatch tasks until every handle has been dropped.
    pub fn run_until_closed(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.tasks.recv() {
            task(&mut self.state);
            ran += 1;
        }
        ran
    }

    /// Dispatch tasks until `timeout` elapses or every handle is dropped.
    pub fn run_for(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut ran = 0;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.tasks.recv_timeout(remaining) {
                Ok(task) => {
                    task(&mut self.state);
                    ran += 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return ran,
            }
        }
    }

    pub fn state(&self) -> &C {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut C {
        &mut self.state
    }

    pub fn into_state(self) -> C {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::thread;

    #[test]
    fn test_tasks_run_only_when_dispatched() {
        let (mut context, handle) = ConsumerContext::new(Vec::<u32>::new());
        assert!(handle.spawn(|v| v.push(1)));
        assert!(handle.spawn(|v| v.push(2)));

        assert!(context.state().is_empty());
        assert_eq!(handle.pending(), 2);
        assert_eq!(context.run_pending(), 2);
        assert_eq!(context.state(), &vec![1, 2]);
    }

    #[test]
    fn test_state_need_not_be_send() {
        let (mut context, handle) = ConsumerContext::new(Rc::new(0u32));
        let worker = thread::spawn(move || {
            handle.spawn(|rc| *Rc::get_mut(rc).unwrap() += 5);
        });
        worker.join().unwrap();

        assert_eq!(context.run_until_closed(), 1);
        assert_eq!(*context.into_state(), 5);
    }

    #[test]
    fn test_spawn_after_context_dropped() {
        let (context, handle) = ConsumerContext::new(());
        drop(context);
        assert!(!handle.spawn(|_| {}));
    }

    #[test]
    fn test_run_for_returns_at_deadline() {
        let (mut context, _handle) = ConsumerContext::new(());
        let started = Instant::now();
        assert_eq!(context.run_for(Duration::from_millis(20)), 0);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
