use crate::buffer::lru_replacer::LruReplacer;
use crate::buffer::replace::Replacer;
use crate::storage::page::PageId;

fn pid(n: u32) -> PageId {
    PageId::new(1, n)
}

#[test]
fn test_lru_replacer() {
    let mut lru_replacer = LruReplacer::new(7);
    for i in 1..=6 {
        lru_replacer.record_access(pid(i));
    }
    lru_replacer.record_access(pid(1));
    assert_eq!(lru_replacer.size(), 6);

    assert_eq!(lru_replacer.victim(), Some(pid(2)));
    assert_eq!(lru_replacer.victim(), Some(pid(3)));
    assert_eq!(lru_replacer.victim(), Some(pid(4)));

    lru_replacer.pin(pid(5));
    lru_replacer.pin(pid(6));
    assert_eq!(lru_replacer.size(), 1);
    assert!(lru_replacer.is_pinned(pid(5)));

    // accesses to a pinned page do not make it evictable
    lru_replacer.record_access(pid(5));
    assert_eq!(lru_replacer.size(), 1);

    lru_replacer.unpin(pid(6));

    assert_eq!(lru_replacer.victim(), Some(pid(1)));
    assert_eq!(lru_replacer.victim(), Some(pid(6)));
    assert_eq!(lru_replacer.victim(), None);

    lru_replacer.unpin(pid(5));
    assert_eq!(lru_replacer.lru_order(), vec![pid(5)]);
    lru_replacer.remove(pid(5));
    assert_eq!(lru_replacer.size(), 0);
}
