//! Priority ordering tests.

use super::*;

#[test]
fn test_priority_order() {
    let q = queue(QueueType::PriorityWithDuplicates);
    add(q.as_ref(), "A", 1);
    add(q.as_ref(), "B", 5);
    add(q.as_ref(), "C", 3);

    assert_eq!(drain(q.as_ref()), vec!["B", "C", "A"]);
}

#[test]
fn test_arrival_order_within_level() {
    let q = queue(QueueType::PriorityWithDuplicates);
    for body in ["first", "second", "third"] {
        add(q.as_ref(), body, 4);
    }
    add(q.as_ref(), "urgent", 8);

    assert_eq!(drain(q.as_ref()), vec!["urgent", "first", "second", "third"]);
}

#[test]
fn test_duplicates_coexist() {
    let q = queue(QueueType::PriorityWithDuplicates);
    assert!(add(q.as_ref(), "x", 1).is_some());
    assert!(add(q.as_ref(), "x", 1).is_some());
    assert_eq!(q.num_messages(), 2);
}

#[test]
fn test_clamp_above_max() {
    let q = queue_with(QueueOptions::new(QueueType::PriorityWithDuplicates).with_max_priority(5));
    let m = q.add_message("over", 0, 6).unwrap().unwrap();
    add(q.as_ref(), "top", 5);
    add(q.as_ref(), "low", 4);

    assert_eq!(m.priority(), 5);
    assert_eq!(drain(q.as_ref()), vec!["over", "top", "low"]);
}

#[test]
fn test_priority_zero() {
    let q = queue(QueueType::PriorityWithDuplicates);
    add(q.as_ref(), "zero", 0);
    add(q.as_ref(), "one", 1);
    assert_eq!(drain(q.as_ref()), vec!["one", "zero"]);
}

#[test]
fn test_negative_priority_rejected() {
    let q = queue(QueueType::PriorityMergingDuplicates);
    assert_eq!(
        q.add_message("x", 0, -3).unwrap_err(),
        LineUpError::InvalidPriority(-3)
    );
    assert_eq!(q.num_messages(), 0);
}

#[test]
fn test_invalid_max_priority() {
    let options = QueueOptions::new(QueueType::PriorityWithDuplicates).with_max_priority(-1);
    assert!(matches!(
        build_queue(options),
        Err(LineUpError::InvalidOptions(_))
    ));
}

#[test]
fn test_delete_by_id() {
    let q = queue(QueueType::PriorityWithDuplicates);
    let a = add(q.as_ref(), "a", 3).unwrap();
    add(q.as_ref(), "b", 1);

    assert!(q.delete_message(a));
    assert!(!q.delete_message(a));
    assert_eq!(q.num_messages(), 1);
    assert_eq!(drain(q.as_ref()), vec!["b"]);
}

#[test]
fn test_timed_get_wakes_on_add() {
    let q = queue(QueueType::PriorityWithDuplicates);
    let getter = {
        let q = Arc::clone(&q);
        thread::spawn(move || q.get_message(Duration::from_secs(5)))
    };

    thread::sleep(Duration::from_millis(20));
    add(q.as_ref(), "late", 2);
    assert_eq!(getter.join().unwrap().unwrap().body(), "late");
    assert_eq!(q.num_messages(), 0);
}

#[test]
fn test_timed_get_wakes_on_close() {
    let q = queue(QueueType::PriorityMergingDuplicates);
    let getter = {
        let q = Arc::clone(&q);
        thread::spawn(move || q.get_message(Duration::from_secs(10)))
    };

    thread::sleep(Duration::from_millis(20));
    let start = Instant::now();
    q.close();
    assert!(getter.join().unwrap().is_none());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_clear_then_reuse() {
    let q = queue(QueueType::PriorityWithDuplicates);
    add(q.as_ref(), "a", 9);
    add(q.as_ref(), "b", 2);
    q.clear();

    assert_eq!(q.num_messages(), 0);
    assert!(q.get_message(Duration::ZERO).is_none());
    add(q.as_ref(), "c", 1);
    assert_eq!(drain(q.as_ref()), vec!["c"]);
}
