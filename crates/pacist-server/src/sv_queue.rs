// sv_queue.rs -- bounded FCFS intake of session requests
//
// The slots semaphore counts free session seats, not free ring entries: a
// seat is taken when the listener enqueues a request and given back only
// when the session that came out of it has fully terminated. That is what
// makes excess clients queue up at push and block the listener until a
// seat opens.

use crossbeam::channel::{bounded, Receiver, Sender};
use log::warn;
use parking_lot::{Condvar, Mutex};

use pacist_common::protocol::ConnectRequest;

/// Counting semaphore over a parking_lot mutex/condvar pair.
pub struct Semaphore {
    count: Mutex<usize>,
    cond: Condvar,
}

impl Semaphore {
    pub fn new(count: usize) -> Semaphore {
        Semaphore {
            count: Mutex::new(count),
            cond: Condvar::new(),
        }
    }

    pub fn acquire(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.cond.wait(&mut count);
        }
        *count -= 1;
    }

    pub fn release(&self) {
        let mut count = self.count.lock();
        *count += 1;
        drop(count);
        self.cond.notify_one();
    }
}

/// Slot-gated producer/consumer queue between the listener and the workers.
///
/// The ring itself is a bounded channel of capacity max_games; since every
/// send is gated by a slot, the channel can never fill up and sends never
/// block on capacity.
pub struct RequestQueue {
    slots: Semaphore,
    tx: Sender<ConnectRequest>,
    rx: Receiver<ConnectRequest>,
}

impl RequestQueue {
    pub fn new(capacity: usize) -> RequestQueue {
        let (tx, rx) = bounded(capacity);
        RequestQueue {
            slots: Semaphore::new(capacity),
            tx,
            rx,
        }
    }

    /// Enqueue a session request; blocks while all session slots are taken.
    pub fn push(&self, req: ConnectRequest) {
        self.slots.acquire();
        if self.tx.send(req).is_err() {
            warn!("request queue closed, dropping session request");
            self.slots.release();
        }
    }

    /// Dequeue the oldest request. Does not free the slot it holds; the
    /// worker calls release_slot once the session ends.
    pub fn pop(&self) -> Option<ConnectRequest> {
        self.rx.recv().ok()
    }

    /// Give a session seat back to the listener.
    pub fn release_slot(&self) {
        self.slots.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn request(n: usize) -> ConnectRequest {
        ConnectRequest {
            req_pipe: format!("/tmp/{n}_request"),
            notif_pipe: format!("/tmp/{n}_notification"),
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = RequestQueue::new(3);
        for n in 0..3 {
            queue.push(request(n));
        }
        for n in 0..3 {
            assert_eq!(queue.pop().unwrap(), request(n));
        }
    }

    #[test]
    fn test_pop_does_not_free_slot() {
        let queue = Arc::new(RequestQueue::new(1));
        queue.push(request(0));
        assert_eq!(queue.pop().unwrap(), request(0));

        // the slot is still owned by the running session, so a second
        // push must block until release_slot
        let (done_tx, done_rx) = bounded(1);
        let q = Arc::clone(&queue);
        thread::spawn(move || {
            q.push(request(1));
            done_tx.send(()).unwrap();
        });

        assert!(done_rx.recv_timeout(Duration::from_millis(200)).is_err());

        queue.release_slot();
        done_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("push should unblock after release_slot");
        assert_eq!(queue.pop().unwrap(), request(1));
    }

    #[test]
    fn test_semaphore_counts() {
        let sem = Arc::new(Semaphore::new(2));
        sem.acquire();
        sem.acquire();

        let (done_tx, done_rx) = bounded(1);
        let s = Arc::clone(&sem);
        thread::spawn(move || {
            s.acquire();
            done_tx.send(()).unwrap();
        });

        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        sem.release();
        done_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("acquire should unblock after release");
    }
}
