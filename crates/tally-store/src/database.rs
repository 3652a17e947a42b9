// crates/tally-store/src/database.rs
//
// In-memory object state with block-level isolation and undo sessions.
//
// Two views of the state are kept:
//
//   working   - mutated by writers, guarded by a reentrant writer gate
//   committed - an immutable copy published whenever no undo session is open
//
// An undo session holds the writer gate from start to commit/undo, so a
// block applied inside a session is exclusive: writers and working-state
// readers on other threads wait until it finishes, while calls made by the
// session's own thread re-enter the gate. Committed readers never wait on a
// session and never observe its intermediate or rolled-back state.
//
// Undo sessions nest: each session snapshots the working state when it
// starts. Committing a session drops its snapshot (changes fold into the
// parent session, if any); undoing restores the snapshot. A session dropped
// without an explicit decision is undone.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};

struct Working<S> {
    state: S,
    undo_stack: Vec<S>,
}

/// Object state with an exclusive writer gate, undo support, and a
/// committed view for readers.
pub struct ObjectDatabase<S> {
    working: ReentrantMutex<RefCell<Working<S>>>,
    committed: RwLock<Arc<S>>,
}

impl<S: Clone> ObjectDatabase<S> {
    /// Wrap an initial state.
    pub fn new(state: S) -> Self {
        Self {
            committed: RwLock::new(Arc::new(state.clone())),
            working: ReentrantMutex::new(RefCell::new(Working {
                state,
                undo_stack: Vec::new(),
            })),
        }
    }

    /// Run `f` against the working state.
    ///
    /// Inside an undo session on this thread this sees the session's changes;
    /// on any other thread it waits until the session ends.
    /// Must not call back into the database from inside `f`.
    pub fn with_read_lock<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.working.lock();
        let working = guard.borrow();
        f(&working.state)
    }

    /// Run `f` against the working state with exclusive access.
    ///
    /// Outside any undo session the result is published to committed readers
    /// before this returns. Must not call back into the database from inside
    /// `f`.
    pub fn with_write_lock<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let guard = self.working.lock();
        let mut working = guard.borrow_mut();
        let out = f(&mut working.state);
        if working.undo_stack.is_empty() {
            self.publish(&working.state);
        }
        out
    }

    /// Run `f` against the last committed state.
    ///
    /// Never blocks on an open undo session.
    pub fn with_committed<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let view = self.committed();
        f(&view)
    }

    /// The last committed state.
    pub fn committed(&self) -> Arc<S> {
        self.committed.read().clone()
    }

    /// Clone the last committed state.
    pub fn snapshot(&self) -> S {
        S::clone(&self.committed())
    }

    /// Replace the whole state, discarding any pending undo snapshots.
    ///
    /// Used when restoring from a persisted checkpoint.
    pub fn reset(&self, state: S) {
        let guard = self.working.lock();
        let mut working = guard.borrow_mut();
        working.undo_stack.clear();
        self.publish(&state);
        working.state = state;
    }

    /// Number of open undo sessions.
    pub fn undo_depth(&self) -> usize {
        let guard = self.working.lock();
        let depth = guard.borrow().undo_stack.len();
        depth
    }

    /// Begin an undo session that snapshots the working state and holds the
    /// writer gate until it is committed or undone.
    pub fn start_undo_session(&self) -> UndoSession<'_, S> {
        let guard = self.working.lock();
        let depth = {
            let mut working = guard.borrow_mut();
            let snapshot = working.state.clone();
            working.undo_stack.push(snapshot);
            working.undo_stack.len()
        };
        UndoSession {
            db: self,
            guard,
            depth,
            finished: false,
        }
    }

    /// Run `f` inside an undo session: commit on `Ok`, roll back on `Err`.
    pub fn transaction<R, E>(&self, f: impl FnOnce() -> Result<R, E>) -> Result<R, E> {
        let session = self.start_undo_session();
        match f() {
            Ok(value) => {
                session.commit();
                Ok(value)
            }
            Err(e) => {
                session.undo();
                Err(e)
            }
        }
    }

    fn publish(&self, state: &S) {
        *self.committed.write() = Arc::new(state.clone());
    }
}

impl<S> std::fmt::Debug for ObjectDatabase<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDatabase").finish_non_exhaustive()
    }
}

fn pop_snapshot<S>(working: &mut Working<S>, depth: usize) -> Option<S> {
    if working.undo_stack.len() != depth {
        tracing::error!(
            "Undo session closed out of order (depth {}, stack {})",
            depth,
            working.undo_stack.len()
        );
    }
    working.undo_stack.truncate(depth);
    working.undo_stack.pop()
}

/// Guard for one level of the undo stack. Holds the writer gate.
#[must_use = "an undo session is rolled back when dropped"]
pub struct UndoSession<'a, S: Clone> {
    db: &'a ObjectDatabase<S>,
    guard: ReentrantMutexGuard<'a, RefCell<Working<S>>>,
    depth: usize,
    finished: bool,
}

impl<S: Clone> UndoSession<'_, S> {
    /// Keep all changes made since the session started. Closing the outermost
    /// session publishes them.
    pub fn commit(mut self) {
        self.finished = true;
        let mut working = self.guard.borrow_mut();
        pop_snapshot(&mut working, self.depth);
        if working.undo_stack.is_empty() {
            self.db.publish(&working.state);
        }
    }

    /// Restore the state captured when the session started.
    pub fn undo(mut self) {
        self.finished = true;
        self.rollback();
    }

    fn rollback(&self) {
        let mut working = self.guard.borrow_mut();
        if let Some(snapshot) = pop_snapshot(&mut working, self.depth) {
            tracing::debug!("Rolling back undo session at depth {}", self.depth);
            working.state = snapshot;
        }
    }
}

impl<S: Clone> Drop for UndoSession<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_commit_keeps_changes() {
        let db = ObjectDatabase::new(0u64);
        let session = db.start_undo_session();
        db.with_write_lock(|s| *s = 5);
        session.commit();
        assert_eq!(db.snapshot(), 5);
        assert_eq!(db.undo_depth(), 0);
    }

    #[test]
    fn test_undo_restores_snapshot() {
        let db = ObjectDatabase::new(vec![1, 2, 3]);
        let session = db.start_undo_session();
        db.with_write_lock(|s| s.push(4));
        db.with_write_lock(|s| s.remove(0));
        session.undo();
        assert_eq!(db.snapshot(), vec![1, 2, 3]);
        assert_eq!(db.with_read_lock(|s| s.clone()), vec![1, 2, 3]);
    }

    #[test]
    fn test_drop_rolls_back() {
        let db = ObjectDatabase::new(1u64);
        {
            let _session = db.start_undo_session();
            db.with_write_lock(|s| *s = 99);
        }
        assert_eq!(db.with_read_lock(|s| *s), 1);
        assert_eq!(db.undo_depth(), 0);
    }

    #[test]
    fn test_nested_sessions() {
        let db = ObjectDatabase::new(0u64);
        let outer = db.start_undo_session();
        db.with_write_lock(|s| *s = 1);

        let inner = db.start_undo_session();
        db.with_write_lock(|s| *s = 2);
        inner.commit();
        assert_eq!(db.with_read_lock(|s| *s), 2);
        // Nothing is published until the outermost session closes.
        assert_eq!(db.snapshot(), 0);

        outer.undo();
        assert_eq!(db.with_read_lock(|s| *s), 0);
        assert_eq!(db.snapshot(), 0);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = ObjectDatabase::new(10i64);
        let result: Result<(), String> = db.transaction(|| {
            db.with_write_lock(|s| *s -= 3);
            Err("boom".to_string())
        });
        assert!(result.is_err());
        assert_eq!(db.snapshot(), 10);

        let result: Result<i64, String> = db.transaction(|| Ok(db.with_write_lock(|s| {
            *s -= 3;
            *s
        })));
        assert_eq!(result, Ok(7));
        assert_eq!(db.snapshot(), 7);
    }

    #[test]
    fn test_write_outside_session_is_published() {
        let db = ObjectDatabase::new(0u64);
        db.with_write_lock(|s| *s = 3);
        assert_eq!(db.with_committed(|s| *s), 3);
        db.reset(8);
        assert_eq!(db.snapshot(), 8);
        assert_eq!(db.with_read_lock(|s| *s), 8);
    }

    #[test]
    fn test_committed_view_hides_open_session() {
        let db = Arc::new(ObjectDatabase::new(0u64));
        let session = db.start_undo_session();
        db.with_write_lock(|s| *s = 42);

        let seen = {
            let db = db.clone();
            thread::spawn(move || db.with_committed(|s| *s))
                .join()
                .unwrap()
        };
        assert_eq!(seen, 0);

        session.undo();
        assert_eq!(db.snapshot(), 0);
    }

    #[test]
    fn test_rollback_keeps_writes_queued_behind_session() {
        let db = Arc::new(ObjectDatabase::new(0u64));
        let session = db.start_undo_session();
        db.with_write_lock(|s| *s = 1);

        let (started_tx, started_rx) = mpsc::channel();
        let writer = {
            let db = db.clone();
            thread::spawn(move || {
                started_tx.send(()).unwrap();
                // Blocks on the writer gate until the session closes.
                db.with_write_lock(|s| *s += 10);
            })
        };
        started_rx.recv().unwrap();

        session.undo();
        writer.join().unwrap();

        // The other thread's write lands after the rollback instead of being
        // erased by it.
        assert_eq!(db.snapshot(), 10);
        assert_eq!(db.undo_depth(), 0);
    }

    #[test]
    fn test_readers_never_observe_torn_pair() {
        // Writers keep the two halves equal; a torn read would see them differ.
        let db = Arc::new(ObjectDatabase::new((0u64, 0u64)));

        let writer = {
            let db = db.clone();
            thread::spawn(move || {
                for i in 0..10_000u64 {
                    let session = db.start_undo_session();
                    db.with_write_lock(|s| s.0 += 1);
                    db.with_write_lock(|s| s.1 += 1);
                    if i % 2 == 0 {
                        session.commit();
                    } else {
                        session.undo();
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|i| {
                let db = db.clone();
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        let (a, b) = if i % 2 == 0 {
                            db.with_committed(|s| *s)
                        } else {
                            db.with_read_lock(|s| *s)
                        };
                        assert_eq!(a, b);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(db.snapshot(), (5_000, 5_000));
    }
}
