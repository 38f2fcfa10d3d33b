use crate::concurrency::deadlock::DeadlockDetector;
use crate::concurrency::lock_manager::{LockManager, LockMode};
use crate::concurrency::transaction::TransactionId;
use crate::storage::page::PageId;
use crate::default_logger;
use std::collections::{HashMap, HashSet};

fn tids() -> (TransactionId, TransactionId, TransactionId) {
    (
        TransactionId::new(1),
        TransactionId::new(2),
        TransactionId::new(3),
    )
}

#[test]
fn exclusive_excludes_everyone_else() {
    let lm = LockManager::new(&default_logger());
    let (t1, t2, _) = tids();
    let p = PageId::new(7, 0);

    assert!(lm.try_acquire(t1, p, LockMode::Exclusive));
    assert!(!lm.try_acquire(t2, p, LockMode::Shared));
    assert!(!lm.try_acquire(t2, p, LockMode::Exclusive));
    // re-requests by the holder are granted
    assert!(lm.try_acquire(t1, p, LockMode::Exclusive));
    assert!(lm.try_acquire(t1, p, LockMode::Shared));
    assert_eq!(lm.lock_mode(t1, p), Some(LockMode::Exclusive));

    assert!(lm.release(t1, p));
    assert!(lm.try_acquire(t2, p, LockMode::Shared));
}

#[test]
fn shared_locks_coexist() {
    let lm = LockManager::new(&default_logger());
    let (t1, t2, t3) = tids();
    let p = PageId::new(7, 1);

    assert!(lm.try_acquire(t1, p, LockMode::Shared));
    assert!(lm.try_acquire(t2, p, LockMode::Shared));
    assert!(lm.try_acquire(t3, p, LockMode::Shared));
    assert!(!lm.try_acquire(t3, p, LockMode::Exclusive));
    for t in &[t1, t2, t3] {
        assert_eq!(lm.lock_mode(*t, p), Some(LockMode::Shared));
    }
}

#[test]
fn sole_shared_holder_upgrades_in_place() {
    let lm = LockManager::new(&default_logger());
    let (t1, t2, _) = tids();
    let p = PageId::new(7, 2);

    assert!(lm.try_acquire(t1, p, LockMode::Shared));
    assert!(lm.try_acquire(t1, p, LockMode::Exclusive));
    assert_eq!(lm.lock_mode(t1, p), Some(LockMode::Exclusive));
    assert!(!lm.try_acquire(t2, p, LockMode::Shared));
    assert_eq!(lm.pages_locked_by(t1), vec![p]);
}

#[test]
fn contested_upgrade_is_denied() {
    let lm = LockManager::new(&default_logger());
    let (t1, t2, _) = tids();
    let p = PageId::new(7, 3);

    assert!(lm.try_acquire(t1, p, LockMode::Shared));
    assert!(lm.try_acquire(t2, p, LockMode::Shared));
    assert!(!lm.try_acquire(t1, p, LockMode::Exclusive));
    assert!(!lm.try_acquire(t2, p, LockMode::Exclusive));
    assert_eq!(lm.lock_mode(t1, p), Some(LockMode::Shared));

    lm.release(t2, p);
    assert!(lm.try_acquire(t1, p, LockMode::Exclusive));
}

#[test]
fn release_all_forgets_transaction() {
    let lm = LockManager::new(&default_logger());
    let (t1, t2, _) = tids();
    let pages: Vec<PageId> = (0..4).map(|n| PageId::new(9, n)).collect();

    for p in &pages {
        assert!(lm.try_acquire(t1, *p, LockMode::Exclusive));
    }
    assert!(!lm.release(t2, pages[0]));

    let mut released = lm.release_all(t1);
    released.sort();
    assert_eq!(released, pages);
    for p in &pages {
        assert!(!lm.holds_lock(t1, *p));
        assert!(lm.try_acquire(t2, *p, LockMode::Exclusive));
    }
    assert!(lm.release_all(t1).is_empty());
}

#[test]
fn crossed_waits_form_a_cycle() {
    let lm = LockManager::new(&default_logger());
    let (t1, t2, t3) = tids();
    let a = PageId::new(3, 0);
    let b = PageId::new(3, 1);

    assert!(lm.try_acquire(t1, a, LockMode::Exclusive));
    assert!(lm.try_acquire(t2, b, LockMode::Exclusive));
    assert!(!lm.try_acquire(t1, b, LockMode::Shared));
    assert!(lm.find_deadlock(t1).is_none());

    assert!(!lm.try_acquire(t2, a, LockMode::Shared));
    let cycle = lm.find_deadlock(t2).expect("t1 and t2 wait on each other");
    assert_eq!(cycle, vec![t2, t1]);

    // a bystander waiting on t1 is not part of the cycle
    assert!(!lm.try_acquire(t3, a, LockMode::Shared));
    assert!(lm.find_deadlock(t3).is_none());

    lm.release_all(t2);
    assert!(lm.find_deadlock(t1).is_none());
    assert!(lm.try_acquire(t1, b, LockMode::Shared));
}

#[test]
fn detector_follows_long_cycles() {
    let t: Vec<TransactionId> = (0..4).map(TransactionId::new).collect();
    let mut graph: HashMap<TransactionId, HashSet<TransactionId>> = HashMap::new();
    for i in 0..4 {
        graph
            .entry(t[i])
            .or_default()
            .insert(t[(i + 1) % 4]);
    }
    assert_eq!(
        DeadlockDetector::find_cycle(&graph, t[0]),
        Some(vec![t[0], t[1], t[2], t[3]])
    );

    if let Some(edges) = graph.get_mut(&t[3]) {
        edges.clear();
    }
    assert_eq!(DeadlockDetector::find_cycle(&graph, t[0]), None);
}
