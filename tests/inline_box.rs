//! Integration tests for the inline-box crate.
//!
//! ## Ownership
//! - `test_move_drops_once`: Moving a box never drops the value twice
//! - `test_moves_keep_behavior`: Dispatch after moves matches dispatch before
//! - `test_reassignment_replaces_cleanly`: Exactly one old value is dropped and
//!   exactly one new value is live
//! - `test_collection_of_boxes`: Boxes of mixed concrete types in a `Vec`
//!
//! ## Projection
//! - `test_diamond_dispatches_to_most_derived`: A composite exposing the
//!   interface through an inner part at a non-zero offset
//!
//! - `test_into_boxed_hands_back_projected_value` (feature `alloc`): Only
//!   unsized-coerced values move to the heap
//!
//! ## Scenario
//! - `test_ibase_scenario`: Box `Base1`, then `Base2`, then `VBase3` with an
//!   instrumented drop log
//!
//! ## Panics
//! - `test_set_with_builds_before_dropping_previous`
//! - `test_panicking_init_keeps_previous_value`
//! - `test_panicking_destructor_still_stores_new_value`
//!
//! ## Errors and Threads
//! - `test_error_box_with_thiserror`
//! - `test_error_box_with_derive_more`
//! - `test_send_sync_box_crosses_threads`
//! - `test_auto_traits_carry_to_concrete_type`: `dyn Trait + Send` only
//!   accepts `Send` implementors

use std::{
    cell::RefCell,
    mem::offset_of,
    panic::{AssertUnwindSafe, catch_unwind},
    rc::Rc,
};

use inline_box::{CoerceFrom, prelude::*};

/// Records the names of dropped values, in drop order.
#[derive(Clone, Default)]
struct DropLog(Rc<RefCell<Vec<&'static str>>>);

impl DropLog {
    fn record(&self, name: &'static str) {
        self.0.borrow_mut().push(name);
    }

    fn entries(&self) -> Vec<&'static str> {
        self.0.borrow().clone()
    }
}

trait IBase {
    fn impl_signature(&self) -> i32;
}

inline_capacity! {
    dyn IBase => { size: 32, align: 8 };
}

struct Base1 {
    signature: Box<i32>,
    log: DropLog,
}

impl Base1 {
    fn new(log: &DropLog) -> Self {
        Self {
            signature: Box::new(1),
            log: log.clone(),
        }
    }
}

impl IBase for Base1 {
    fn impl_signature(&self) -> i32 {
        *self.signature
    }
}

impl Drop for Base1 {
    fn drop(&mut self) {
        self.log.record("Base1");
    }
}

struct Base2 {
    log: DropLog,
}

impl IBase for Base2 {
    fn impl_signature(&self) -> i32 {
        2
    }
}

impl Drop for Base2 {
    fn drop(&mut self) {
        self.log.record("Base2");
    }
}

struct VBase1 {
    log: DropLog,
}

impl IBase for VBase1 {
    fn impl_signature(&self) -> i32 {
        3
    }
}

impl Drop for VBase1 {
    fn drop(&mut self) {
        self.log.record("VBase1");
    }
}

struct VBase2 {
    log: DropLog,
}

impl IBase for VBase2 {
    fn impl_signature(&self) -> i32 {
        4
    }
}

impl Drop for VBase2 {
    fn drop(&mut self) {
        self.log.record("VBase2");
    }
}

/// The part of [`VBase3`] that overrides both of its bases.
struct Diamond {
    signature: i32,
}

impl IBase for Diamond {
    fn impl_signature(&self) -> i32 {
        self.signature
    }
}

/// Built from both `VBase1` and `VBase2`, but seen as an `IBase` through its
/// own [`Diamond`] part.
#[repr(C)]
struct VBase3 {
    left: VBase1,
    right: VBase2,
    own: Diamond,
}

impl VBase3 {
    fn new(log: &DropLog) -> Self {
        Self {
            left: VBase1 { log: log.clone() },
            right: VBase2 { log: log.clone() },
            own: Diamond { signature: 5 },
        }
    }
}

impl Drop for VBase3 {
    fn drop(&mut self) {
        self.left.log.record("VBase3");
    }
}

// SAFETY: The returned pointer is derived from `ptr` and points to the `own`
// field, which lives exactly as long as the `VBase3` it belongs to.
unsafe impl CoerceFrom<VBase3> for dyn IBase {
    fn coerce(ptr: core::ptr::NonNull<VBase3>) -> core::ptr::NonNull<Self> {
        // SAFETY: Offsetting to a field stays inside the same allocation.
        let own = unsafe { ptr.byte_add(offset_of!(VBase3, own)) };
        own.cast::<Diamond>()
    }
}

#[test]
fn test_move_drops_once() {
    let log = DropLog::default();

    let b: InlineBox<dyn IBase> = InlineBox::new(Base1::new(&log));
    let a = b;
    assert_eq!(a.impl_signature(), 1);
    assert!(log.entries().is_empty());
    drop(a);
    assert_eq!(log.entries(), ["Base1"]);

    let mut first: InlineBox<dyn IBase> = InlineBox::new(Base2 { log: log.clone() });
    let mut second: InlineBox<dyn IBase> = InlineBox::new(VBase1 { log: log.clone() });
    core::mem::swap(&mut first, &mut second);
    assert_eq!(first.impl_signature(), 3);
    assert_eq!(second.impl_signature(), 2);
    let replaced = core::mem::replace(&mut first, second);
    assert_eq!(first.impl_signature(), 2);
    assert_eq!(replaced.impl_signature(), 3);
    assert_eq!(log.entries(), ["Base1"]);

    drop(replaced);
    drop(first);
    assert_eq!(log.entries(), ["Base1", "VBase1", "Base2"]);
}

#[test]
fn test_moves_keep_behavior() {
    fn pass_through(boxed: InlineBox<dyn IBase>) -> InlineBox<dyn IBase> {
        boxed
    }

    let log = DropLog::default();
    let original: InlineBox<dyn IBase> = InlineBox::new(VBase2 { log: log.clone() });
    let before = original.impl_signature();

    let mut slot = Some(pass_through(original));
    let moved = slot.take();
    assert!(slot.is_none());
    let moved = moved.map(pass_through);

    assert_eq!(moved.as_ref().map(|b| b.impl_signature()), Some(before));
    drop(moved);
    assert_eq!(log.entries(), ["VBase2"]);
}

#[test]
fn test_reassignment_replaces_cleanly() {
    let log = DropLog::default();

    let mut boxed: InlineBox<dyn IBase> = InlineBox::new(Base1::new(&log));
    boxed.set(Base2 { log: log.clone() });
    assert_eq!(log.entries(), ["Base1"]);
    assert_eq!(boxed.impl_signature(), 2);

    boxed = InlineBox::new(VBase1 { log: log.clone() });
    assert_eq!(log.entries(), ["Base1", "Base2"]);
    assert_eq!(boxed.impl_signature(), 3);

    boxed.set_with(|| Base1::new(&log));
    assert_eq!(log.entries(), ["Base1", "Base2", "VBase1"]);
    assert_eq!(boxed.impl_signature(), 1);

    drop(boxed);
    assert_eq!(log.entries(), ["Base1", "Base2", "VBase1", "Base1"]);
}

#[test]
fn test_diamond_dispatches_to_most_derived() {
    let log = DropLog::default();
    let diamond: InlineBox<dyn IBase> = InlineBox::new(VBase3::new(&log));

    assert_eq!(diamond.impl_signature(), 5);

    let interface = diamond.as_ptr().cast::<u8>();
    let storage = diamond.storage_ptr();
    assert_ne!(interface, storage);
    assert_eq!(
        interface as usize - storage as usize,
        offset_of!(VBase3, own)
    );

    // The projection is recomputed after a move.
    let moved = vec![diamond];
    assert_eq!(moved[0].impl_signature(), 5);
    assert_eq!(
        moved[0].as_ptr().cast::<u8>() as usize - moved[0].storage_ptr() as usize,
        offset_of!(VBase3, own)
    );

    drop(moved);
    assert_eq!(log.entries(), ["VBase3", "VBase1", "VBase2"]);
}

#[cfg(feature = "alloc")]
#[test]
fn test_into_boxed_hands_back_projected_value() {
    let log = DropLog::default();

    let projected: InlineBox<dyn IBase> = InlineBox::new(VBase3::new(&log));
    assert!(!projected.is_unsize());
    let projected = match projected.into_boxed() {
        Ok(_) => panic!("a projected value must not move to the heap"),
        Err(projected) => projected,
    };
    assert!(log.entries().is_empty());
    assert_eq!(projected.impl_signature(), 5);
    drop(projected);
    assert_eq!(log.entries(), ["VBase3", "VBase1", "VBase2"]);

    let plain: InlineBox<dyn IBase> = InlineBox::new(Base2 { log: log.clone() });
    assert!(plain.is_unsize());
    let boxed: Box<dyn IBase> = match plain.into_boxed() {
        Ok(boxed) => boxed,
        Err(_) => panic!("an unsized value must move to the heap"),
    };
    assert_eq!(boxed.impl_signature(), 2);
    drop(boxed);
    assert_eq!(log.entries(), ["VBase3", "VBase1", "VBase2", "Base2"]);
}

#[test]
fn test_ibase_scenario() {
    let log = DropLog::default();

    let mut boxed: InlineBox<dyn IBase> = InlineBox::new(Base1::new(&log));
    assert_eq!(boxed.impl_signature(), 1);

    boxed = InlineBox::new(Base2 { log: log.clone() });
    assert_eq!(boxed.impl_signature(), 2);

    boxed = InlineBox::new(VBase3::new(&log));
    assert_eq!(boxed.impl_signature(), 5);

    assert_eq!(log.entries(), ["Base1", "Base2"]);
    drop(boxed);
    assert_eq!(
        log.entries(),
        ["Base1", "Base2", "VBase3", "VBase1", "VBase2"]
    );
}

#[test]
fn test_collection_of_boxes() {
    let log = DropLog::default();

    let mut boxes: Vec<InlineBox<dyn IBase>> = Vec::new();
    boxes.push(InlineBox::new(Base1::new(&log)));
    boxes.push(InlineBox::new(VBase1 { log: log.clone() }));
    boxes.push(InlineBox::new(VBase3::new(&log)));
    boxes.push(InlineBox::new(VBase2 { log: log.clone() }));
    boxes.push(InlineBox::new(Base2 { log: log.clone() }));

    let signatures: Vec<i32> = boxes.iter().map(|b| b.impl_signature()).collect();
    assert_eq!(signatures, [1, 3, 5, 4, 2]);

    boxes.sort_by_key(|b| b.impl_signature());
    let signatures: Vec<i32> = boxes.iter().map(|b| b.impl_signature()).collect();
    assert_eq!(signatures, [1, 2, 3, 4, 5]);

    let removed = boxes.remove(1);
    assert_eq!(removed.impl_signature(), 2);
    drop(removed);
    assert_eq!(log.entries(), ["Base2"]);

    drop(boxes);
    assert_eq!(
        log.entries(),
        ["Base2", "Base1", "VBase1", "VBase2", "VBase3", "VBase1", "VBase2"]
    );
}

#[test]
fn test_set_with_builds_before_dropping_previous() {
    let log = DropLog::default();
    let mut boxed: InlineBox<dyn IBase> = InlineBox::new(Base1::new(&log));

    boxed.set_with(|| {
        assert!(log.entries().is_empty());
        Base2 { log: log.clone() }
    });
    assert_eq!(log.entries(), ["Base1"]);
    assert_eq!(boxed.impl_signature(), 2);
}

#[test]
fn test_panicking_init_keeps_previous_value() {
    let log = DropLog::default();
    let mut boxed: InlineBox<dyn IBase> = InlineBox::new(Base2 { log: log.clone() });

    let result = catch_unwind(AssertUnwindSafe(|| {
        boxed.set_with(|| -> Base1 { panic!("initialization failed") });
    }));
    assert!(result.is_err());

    assert!(log.entries().is_empty());
    assert_eq!(boxed.impl_signature(), 2);
    drop(boxed);
    assert_eq!(log.entries(), ["Base2"]);
}

#[test]
fn test_panicking_destructor_still_stores_new_value() {
    struct Bomb {
        log: DropLog,
    }

    impl IBase for Bomb {
        fn impl_signature(&self) -> i32 {
            -1
        }
    }

    impl Drop for Bomb {
        fn drop(&mut self) {
            self.log.record("Bomb");
            panic!("destructor failed");
        }
    }

    let log = DropLog::default();
    let mut boxed: InlineBox<dyn IBase> = InlineBox::new(Bomb { log: log.clone() });

    let result = catch_unwind(AssertUnwindSafe(|| {
        boxed.set(Base2 { log: log.clone() });
    }));
    assert!(result.is_err());

    assert_eq!(log.entries(), ["Bomb"]);
    assert_eq!(boxed.impl_signature(), 2);
    drop(boxed);
    assert_eq!(log.entries(), ["Bomb", "Base2"]);
}

/// An interface for application errors that can be returned without
/// allocating.
trait AppError: core::error::Error + Send + Sync {}

inline_capacity! {
    dyn AppError => { size: 48, align: 8 };
}

mod with_thiserror {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum ParseError {
        #[error("invalid digit {0:?}")]
        InvalidDigit(char),
        #[error("empty input")]
        Empty,
    }

    #[derive(Error, Debug)]
    #[error("failed to load setting {key}")]
    pub struct SettingError {
        pub key: &'static str,
        #[source]
        pub source: ParseError,
    }

    impl super::AppError for ParseError {}
    impl super::AppError for SettingError {}
}

#[test]
fn test_error_box_with_thiserror() {
    use with_thiserror::{ParseError, SettingError};

    fn parse(input: &str) -> Result<u32, InlineBox<dyn AppError>> {
        if input.is_empty() {
            return Err(InlineBox::new(ParseError::Empty));
        }
        input.chars().try_fold(0u32, |acc, c| match c.to_digit(10) {
            Some(digit) => Ok(acc * 10 + digit),
            None => Err(InlineBox::new(SettingError {
                key: "retries",
                source: ParseError::InvalidDigit(c),
            })),
        })
    }

    assert_eq!(parse("42").ok(), Some(42));

    let empty = parse("").unwrap_err();
    assert_eq!(empty.to_string(), "empty input");
    assert!(core::error::Error::source(&empty).is_none());

    let invalid = parse("4x").unwrap_err();
    assert_eq!(invalid.to_string(), "failed to load setting retries");
    let source = core::error::Error::source(&invalid).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("invalid digit 'x'"));
    assert!(format!("{invalid:?}").starts_with("SettingError"));

    // The inline box is itself an error and converts into a boxed one.
    let boxed: Box<dyn core::error::Error + Send + Sync> = invalid.into();
    assert_eq!(boxed.to_string(), "failed to load setting retries");
}

mod with_derive_more {
    use derive_more::{Display, Error, From};

    #[derive(Error, Debug, Display)]
    pub enum DatabaseError {
        #[display("Connection timeout after {seconds}s")]
        ConnectionTimeout { seconds: u64 },
    }

    #[derive(Error, Debug, Display, From)]
    pub enum ServiceError {
        #[display("Database error")]
        Database(#[error(source)] DatabaseError),
    }

    impl super::AppError for DatabaseError {}
    impl super::AppError for ServiceError {}
}

#[test]
fn test_error_box_with_derive_more() {
    use with_derive_more::{DatabaseError, ServiceError};

    fn query() -> Result<(), DatabaseError> {
        Err(DatabaseError::ConnectionTimeout { seconds: 30 })
    }

    fn handle() -> Result<(), InlineBox<dyn AppError>> {
        query().map_err(|error| InlineBox::new(ServiceError::from(error)))
    }

    let error = handle().unwrap_err();
    assert_eq!(error.to_string(), "Database error");
    let source = core::error::Error::source(&error).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("Connection timeout after 30s"));

    let mut chain = Vec::new();
    let mut current: Option<&dyn core::error::Error> = Some(&error);
    while let Some(error) = current {
        chain.push(error.to_string());
        current = error.source();
    }
    assert_eq!(chain, ["Database error", "Connection timeout after 30s"]);
}

#[test]
fn test_send_sync_box_crosses_threads() {
    trait Job {
        fn run(&self) -> u64;
    }

    inline_capacity! {
        dyn Job + Send + Sync => { size: 16, align: 8 };
    }

    struct Sum(u32, u32);
    impl Job for Sum {
        fn run(&self) -> u64 {
            u64::from(self.0) + u64::from(self.1)
        }
    }

    struct Square(u64);
    impl Job for Square {
        fn run(&self) -> u64 {
            self.0 * self.0
        }
    }

    let jobs: Vec<InlineBox<dyn Job + Send + Sync>> =
        vec![InlineBox::new(Sum(2, 3)), InlineBox::new(Square(4))];

    let shared = &jobs;
    let total: u64 = std::thread::scope(|scope| {
        let handles: Vec<_> = shared
            .iter()
            .map(|job| scope.spawn(move || job.run()))
            .collect();
        handles.into_iter().filter_map(|h| h.join().ok()).sum()
    });
    assert_eq!(total, 21);

    let moved = std::thread::spawn(move || jobs.iter().map(|job| job.run()).collect::<Vec<_>>())
        .join()
        .ok();
    assert_eq!(moved, Some(vec![5, 16]));
}

#[test]
fn test_auto_traits_carry_to_concrete_type() {
    trait Task {
        fn run(&self) -> u64;
    }

    inline_capacity! {
        dyn Task + Send => { size: 16, align: 8 };
    }

    struct Owned(u64);
    impl Task for Owned {
        fn run(&self) -> u64 {
            self.0
        }
    }

    /// Not `Send`, but would fit.
    struct Shared(Rc<u64>);
    impl Task for Shared {
        fn run(&self) -> u64 {
            *self.0
        }
    }

    static_assertions::assert_impl_all!(dyn Task + Send: CoerceFrom<Owned>);
    static_assertions::assert_not_impl_any!(dyn Task + Send: CoerceFrom<Shared>);

    let task: InlineBox<dyn Task + Send> = InlineBox::new(Owned(9));
    let result = std::thread::spawn(move || task.run()).join().ok();
    assert_eq!(result, Some(9));
    assert_eq!(Shared(Rc::new(4)).run(), 4);
}
