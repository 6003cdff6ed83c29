use std::cell::Cell;
use std::panic;

use crate::{control_flow, current_exception, r#try, rethrow, throw, ALL_EXCEPTIONS};

#[test]
fn throw_and_catch() {
    r#try(|| {
        throw!(1, "Test exception");
    })
    .catch(1, |exception| {
        assert_eq!(exception.message(), Some("Test exception"));
        assert_eq!(exception.code(), 1);
        assert_eq!(current_exception(), *exception);
    })
    .end();
}

#[test]
fn completed_region_returns_value() {
    let value = r#try(|| 17).catch_all(|_| 0).end();
    assert_eq!(value, 17);
    assert!(!current_exception().is_active());
}

#[test]
fn catch_all_matches_any_code() {
    for code in [1, -1, 255, i32::MAX, i32::MIN] {
        let caught = r#try(|| throw!(code, "code {code}"))
            .catch(ALL_EXCEPTIONS, |exception| exception.code())
            .end();
        assert_eq!(caught, code);
    }
}

#[test]
fn first_matching_clause_wins() {
    let chosen = r#try(|| throw!(5))
        .catch(4, |_| "four")
        .catch(5, |_| "five")
        .catch(ALL_EXCEPTIONS, |_| "all")
        .catch(5, |_| "five again")
        .end();
    assert_eq!(chosen, "five");
}

#[test]
fn later_clauses_are_not_evaluated() {
    let calls = Cell::new(0);
    r#try(|| throw!(2))
        .catch(2, |_| calls.set(calls.get() + 1))
        .catch(ALL_EXCEPTIONS, |_| calls.set(calls.get() + 10))
        .end();
    assert_eq!(calls.get(), 1);
}

#[test]
fn state_cleared_after_handling() {
    r#try(|| throw!(9, "stale"))
        .catch(9, |_| ())
        .end();
    assert_eq!(current_exception().code(), 0);
    assert_eq!(current_exception().message(), None);

    r#try(|| throw!(10))
        .catch(10, |exception| assert_eq!(exception.message(), None))
        .end();
}

#[test]
fn nested_unwinds_through_inner_region() {
    let inner_rest = Cell::new(false);
    let inner_handler = Cell::new(false);

    r#try(|| {
        r#try(|| {
            throw!(7, "from inner");
            #[allow(unreachable_code)]
            inner_rest.set(true);
        })
        .catch(8, |_| inner_handler.set(true))
        .end();
        unreachable!("the inner region rethrows");
    })
    .catch(7, |exception| {
        assert_eq!(exception.code(), 7);
        assert_eq!(exception.message(), Some("from inner"));
    })
    .end();

    assert!(!inner_rest.get());
    assert!(!inner_handler.get());
    assert_eq!(control_flow::depth(), 0);
}

#[test]
fn throw_in_handler_replaces_exception() {
    r#try(|| {
        r#try(|| throw!(3, "First exception"))
            .catch(3, |exception| {
                assert_eq!(exception.message(), Some("First exception"));
                throw!(4, "Second exception");
            })
            .catch(4, |_| panic!("a handler's throw leaves its own region"))
            .end();
    })
    .catch(4, |exception| {
        assert_eq!(exception.code(), 4);
        assert_eq!(exception.message(), Some("Second exception"));
    })
    .end();
}

fn third_level() {
    throw!(5, "Third level exception");
}

fn second_level() {
    third_level();
}

fn first_level() {
    r#try(second_level)
        .catch(5, |exception| {
            assert_eq!(exception.message(), Some("Third level exception"));
            assert_eq!(exception.code(), 5);
            throw!(6, "First level rethrown exception");
        })
        .end();
}

#[test]
fn nested_function_calls() {
    r#try(first_level)
        .catch(6, |exception| {
            assert_eq!(exception.message(), Some("First level rethrown exception"));
            assert_eq!(exception.code(), 6);
        })
        .end();
}

#[test]
fn unmatched_region_rethrows_unchanged() {
    r#try(|| {
        let region = r#try(|| throw!(11, "pass it on")).catch(12, |_| ());
        assert!(region.is_unhandled());
        region.end();
    })
    .catch(11, |exception| {
        assert_eq!(exception.message(), Some("pass it on"));
    })
    .end();
}

#[test]
fn explicit_rethrow_from_handler() {
    r#try(|| {
        r#try(|| throw!(13, "again"))
            .catch_all(|_| rethrow!())
            .end();
    })
    .catch(13, |exception| assert_eq!(exception.message(), Some("again")))
    .end();

    r#try(|| {
        r#try(|| throw!(14))
            .catch_all(|_| rethrow())
            .end();
    })
    .catch(14, |_| ())
    .end();
}

#[test]
fn many_cycles_leave_nothing_behind() {
    for i in 1..=10_000 {
        let message = r#try(|| throw!(i, "cycle {i}"))
            .catch(i, |exception| exception.message().map(str::len))
            .end();
        assert_eq!(message, Some(format!("cycle {i}").len()));
        assert!(!current_exception().is_active());
    }
    assert_eq!(control_flow::depth(), 0);
}

#[test]
fn panics_are_not_caught() {
    let result = panic::catch_unwind(|| {
        r#try(|| panic::resume_unwind(Box::new(99_u8)))
            .catch_all(|_| unreachable!("panics are not exceptions"))
            .end();
    });
    assert_eq!(result.unwrap_err().downcast_ref::<u8>(), Some(&99));
    assert_eq!(control_flow::depth(), 0);
}

#[test]
fn threads_do_not_interfere() {
    let workers: Vec<_> = (0..2)
        .map(|worker| {
            std::thread::spawn(move || {
                for round in 0..1_000 {
                    let code = 100 + worker;
                    r#try(|| throw!(code, "worker {worker} round {round}"))
                        .catch(code, |exception| {
                            assert_eq!(exception.code(), code);
                            assert_eq!(
                                exception.message(),
                                Some(format!("worker {worker} round {round}").as_str())
                            );
                        })
                        .end();
                    assert_eq!(control_flow::depth(), 0);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}

struct CleanupRunsRegion;

impl Drop for CleanupRunsRegion {
    fn drop(&mut self) {
        let value = r#try(|| 1).catch_all(|_| 0).end();
        assert_eq!(value, 1);
    }
}

#[test]
fn destructor_regions_keep_exception_in_flight() {
    let caught = r#try(|| {
        let _cleanup = CleanupRunsRegion;
        throw!(5, "in flight");
    })
    .catch(5, |exception| exception.message().map(str::to_owned))
    .end();
    assert_eq!(caught.as_deref(), Some("in flight"));
    assert!(!current_exception().is_active());
}

struct CleanupCatchesItsOwn;

impl Drop for CleanupCatchesItsOwn {
    fn drop(&mut self) {
        r#try(|| throw!(99, "cleanup failure"))
            .catch(99, |_| ())
            .end();
    }
}

#[test]
fn destructor_exceptions_do_not_replace_exception_in_flight() {
    r#try(|| {
        let _cleanup = CleanupCatchesItsOwn;
        throw!(6, "original");
    })
    .catch(99, |_| panic!("the cleanup's exception was already handled"))
    .catch(6, |exception| assert_eq!(exception.message(), Some("original")))
    .end();
}

#[test]
fn dropped_region_rethrows() {
    let caught = r#try(|| {
        let _ = r#try(|| throw!(15, "never ended"));
        unreachable!("dropping an unhandled region rethrows");
    })
    .catch(15, |exception| exception.message().map(str::to_owned))
    .end();
    assert_eq!(caught.as_deref(), Some("never ended"));
}

#[test]
fn dropped_handled_region_is_quiet() {
    let _ = r#try(|| throw!(16)).catch(16, |_| ());
    let _ = r#try(|| 3);
    assert_eq!(control_flow::depth(), 0);
}
