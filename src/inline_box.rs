use core::{
    alloc::Layout,
    borrow::{Borrow, BorrowMut},
    ops::{Deref, DerefMut},
};

use inline_box_internals::CoerceFrom;

use crate::Capacity;

/// Limits field access to the [`InlineBox`] type, so the only way to create
/// one is through the checked constructor in this module.
mod limit_field_access {
    use inline_box_internals::{CoerceFrom, RawInlineBox};

    use crate::{Capacity, validity::ValidBox};

    /// An owned value of some type implementing the interface `I`, stored
    /// inline.
    ///
    /// [`InlineBox<dyn Trait>`](InlineBox) is the counterpart of
    /// `Box<dyn Trait>` that does not allocate: the value lives inside the box
    /// itself, in a buffer whose size and alignment were declared for
    /// `dyn Trait` with [`inline_capacity!`]. Any type implementing the trait that fits into
    /// that buffer can be stored. Types that do not fit are rejected at
    /// compile time.
    ///
    /// The box is an ordinary Rust value. Moving it moves the stored value
    /// along with it, and dropping it drops the stored value exactly once.
    /// Calls go through [`Deref`](core::ops::Deref) to `I`, using ordinary
    /// dynamic dispatch.
    ///
    /// # Examples
    ///
    /// ```
    /// use inline_box::{InlineBox, inline_capacity};
    ///
    /// trait Shape {
    ///     fn area(&self) -> f64;
    /// }
    ///
    /// inline_capacity! {
    ///     dyn Shape => { size: 16, align: 8 };
    /// }
    ///
    /// struct Square(f64);
    /// impl Shape for Square {
    ///     fn area(&self) -> f64 {
    ///         self.0 * self.0
    ///     }
    /// }
    ///
    /// struct Rect(f64, f64);
    /// impl Shape for Rect {
    ///     fn area(&self) -> f64 {
    ///         self.0 * self.1
    ///     }
    /// }
    ///
    /// let shapes: Vec<InlineBox<dyn Shape>> = vec![
    ///     InlineBox::new(Square(2.0)),
    ///     InlineBox::new(Rect(2.0, 3.0)),
    /// ];
    /// let total: f64 = shapes.iter().map(|shape| shape.area()).sum();
    /// assert_eq!(total, 10.0);
    /// ```
    ///
    /// A type larger than the declared capacity does not compile:
    ///
    /// ```compile_fail
    /// use inline_box::{InlineBox, inline_capacity};
    ///
    /// trait Shape {
    ///     fn area(&self) -> f64;
    /// }
    ///
    /// inline_capacity! {
    ///     dyn Shape => { size: 16, align: 8 };
    /// }
    ///
    /// struct Polygon([f64; 8]);
    /// impl Shape for Polygon {
    ///     fn area(&self) -> f64 {
    ///         0.0
    ///     }
    /// }
    ///
    /// let polygon: InlineBox<dyn Shape> = InlineBox::new(Polygon([0.0; 8]));
    /// ```
    ///
    /// Neither does a type that is more strictly aligned than the capacity:
    ///
    /// ```compile_fail
    /// use inline_box::{InlineBox, inline_capacity};
    ///
    /// trait Shape {}
    ///
    /// inline_capacity! {
    ///     dyn Shape => { size: 64, align: 8 };
    /// }
    ///
    /// #[repr(align(32))]
    /// struct Aligned(u8);
    /// impl Shape for Aligned {}
    ///
    /// let aligned: InlineBox<dyn Shape> = InlineBox::new(Aligned(0));
    /// ```
    ///
    /// Or a type that does not implement the interface:
    ///
    /// ```compile_fail
    /// use inline_box::{InlineBox, inline_capacity};
    ///
    /// trait Shape {}
    ///
    /// inline_capacity! {
    ///     dyn Shape => { size: 16, align: 8 };
    /// }
    ///
    /// struct Unrelated;
    ///
    /// let unrelated: InlineBox<dyn Shape> = InlineBox::new(Unrelated);
    /// ```
    ///
    /// [`inline_capacity!`]: crate::inline_capacity
    #[repr(transparent)]
    pub struct InlineBox<I: ?Sized + Capacity> {
        /// # Safety
        ///
        /// The following safety invariant is guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. The raw box was created for a concrete type `C` for which
        ///    `ValidBox<I, C>::VALUE` holds.
        raw: RawInlineBox<I, I::Storage>,
    }

    impl<I: ?Sized + Capacity> InlineBox<I> {
        /// Creates a new [`InlineBox`] holding the value returned by `init`.
        ///
        /// The value is written straight into the inline buffer. If `init`
        /// panics, no box is created and nothing is dropped.
        ///
        /// Fails to compile if [`ValidBox<I, C>`](ValidBox) does not hold.
        ///
        /// # Examples
        ///
        /// ```
        /// use inline_box::{InlineBox, inline_capacity};
        ///
        /// trait Counter {
        ///     fn count(&self) -> usize;
        /// }
        ///
        /// inline_capacity! {
        ///     dyn Counter => { size: 64, align: 8 };
        /// }
        ///
        /// struct Words([u8; 48], usize);
        /// impl Counter for Words {
        ///     fn count(&self) -> usize {
        ///         self.1
        ///     }
        /// }
        ///
        /// let counter: InlineBox<dyn Counter> = InlineBox::emplace(|| Words([0; 48], 3));
        /// assert_eq!(counter.count(), 3);
        /// ```
        #[inline]
        #[must_use]
        pub fn emplace<C, F>(init: F) -> Self
        where
            I: CoerceFrom<C>,
            C: 'static,
            F: FnOnce() -> C,
        {
            const { ValidBox::<I, C>::assert() };

            // SAFETY:
            // 1. `ValidBox::<I, C>::FITS_CAPACITY` was asserted above
            // 2. `ValidBox::<I, C>::ALIGNED_WITH_CAPACITY` was asserted above
            let raw = unsafe { RawInlineBox::new_with(init) };

            // SAFETY:
            // 1. `ValidBox::<I, C>::VALUE` was asserted above
            Self { raw }
        }

        /// Returns a reference to the inner [`RawInlineBox`].
        #[inline]
        pub(crate) fn as_raw(&self) -> &RawInlineBox<I, I::Storage> {
            &self.raw
        }

        /// Returns a mutable reference to the inner [`RawInlineBox`].
        #[inline]
        pub(crate) fn as_raw_mut(&mut self) -> &mut RawInlineBox<I, I::Storage> {
            // SAFETY: The raw box offers no way to replace its value through a
            // mutable reference, so the invariant is upheld.
            &mut self.raw
        }

        /// Consumes the [`InlineBox`] and returns the inner [`RawInlineBox`].
        #[cfg(feature = "alloc")]
        #[inline]
        pub(crate) fn into_raw(self) -> RawInlineBox<I, I::Storage> {
            // SAFETY: We are destroying `self`, so we no longer need to uphold
            // any safety invariants.
            self.raw
        }

        /// Wraps a raw box that was taken out of an [`InlineBox`] by
        /// [`InlineBox::into_raw`].
        ///
        /// # Safety
        ///
        /// 1. `raw` must have been returned by `into_raw` and not replaced
        ///    since.
        #[cfg(feature = "alloc")]
        #[inline]
        pub(crate) unsafe fn from_raw(raw: RawInlineBox<I, I::Storage>) -> Self {
            // SAFETY:
            // 1. The `InlineBox` that `raw` was taken from upheld the invariant
            Self { raw }
        }
    }
}

pub use limit_field_access::InlineBox;

impl<I: ?Sized + Capacity> InlineBox<I> {
    /// Creates a new [`InlineBox`] holding `value`.
    ///
    /// Fails to compile if [`ValidBox<I, C>`](crate::validity::ValidBox) does
    /// not hold.
    #[inline]
    #[must_use]
    pub fn new<C>(value: C) -> Self
    where
        I: CoerceFrom<C>,
        C: 'static,
    {
        Self::emplace(move || value)
    }

    /// Replaces the stored value with `value`, which may have a different
    /// concrete type.
    ///
    /// The previous value is dropped before the new one is stored. If its
    /// destructor panics, the new value is stored regardless.
    ///
    /// # Examples
    ///
    /// ```
    /// use inline_box::{InlineBox, inline_capacity};
    ///
    /// trait Named {
    ///     fn name(&self) -> &'static str;
    /// }
    ///
    /// inline_capacity! {
    ///     dyn Named => { size: 8, align: 8 };
    /// }
    ///
    /// struct Alpha;
    /// impl Named for Alpha {
    ///     fn name(&self) -> &'static str {
    ///         "alpha"
    ///     }
    /// }
    ///
    /// struct Beta(u32);
    /// impl Named for Beta {
    ///     fn name(&self) -> &'static str {
    ///         "beta"
    ///     }
    /// }
    ///
    /// let mut named: InlineBox<dyn Named> = InlineBox::new(Alpha);
    /// assert_eq!(named.name(), "alpha");
    /// named.set(Beta(7));
    /// assert_eq!(named.name(), "beta");
    /// ```
    #[inline]
    pub fn set<C>(&mut self, value: C)
    where
        I: CoerceFrom<C>,
        C: 'static,
    {
        *self = Self::new(value);
    }

    /// Replaces the stored value with the value returned by `init`.
    ///
    /// The order differs from destroying the old value and then constructing
    /// the new one in place: `init` runs first, into a fresh buffer, while the
    /// previous value is still alive. Only then is the previous value dropped
    /// and the new one moved in. So if `init` panics, the box keeps its
    /// previous value and is never left empty. `init` can also observe state
    /// that the previous value releases when it is dropped, and will see it
    /// still held.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::cell::Cell;
    ///
    /// use inline_box::{InlineBox, inline_capacity};
    ///
    /// trait Slot {}
    ///
    /// inline_capacity! {
    ///     dyn Slot => { size: 8, align: 8 };
    /// }
    ///
    /// thread_local! {
    ///     static LIVE: Cell<u32> = const { Cell::new(0) };
    /// }
    ///
    /// struct Held;
    /// impl Slot for Held {}
    /// impl Drop for Held {
    ///     fn drop(&mut self) {
    ///         LIVE.set(LIVE.get() - 1);
    ///     }
    /// }
    ///
    /// fn held() -> Held {
    ///     LIVE.set(LIVE.get() + 1);
    ///     Held
    /// }
    ///
    /// let mut slot: InlineBox<dyn Slot> = InlineBox::emplace(held);
    /// slot.set_with(|| {
    ///     // The previous value has not been dropped yet.
    ///     assert_eq!(LIVE.get(), 1);
    ///     held()
    /// });
    /// assert_eq!(LIVE.get(), 1);
    /// ```
    #[inline]
    pub fn set_with<C, F>(&mut self, init: F)
    where
        I: CoerceFrom<C>,
        C: 'static,
        F: FnOnce() -> C,
    {
        *self = Self::emplace(init);
    }

    /// Returns a raw pointer to the stored value as an `I`.
    ///
    /// The pointer is invalidated when the box is moved, reassigned or
    /// dropped.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const I {
        self.as_raw().as_ptr().as_ptr().cast_const()
    }

    /// Returns a raw mutable pointer to the stored value as an `I`.
    ///
    /// The pointer is invalidated when the box is moved, reassigned or
    /// dropped.
    #[inline]
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut I {
        self.as_raw_mut().as_ptr().as_ptr()
    }

    /// Returns a pointer to the first byte of the inline buffer.
    ///
    /// The stored value starts here. [`InlineBox::as_ptr`] may point further
    /// in, when the interface is implemented by a part of the value.
    #[inline]
    #[must_use]
    pub fn storage_ptr(&self) -> *const u8 {
        self.as_raw().storage_ptr().as_ptr().cast_const()
    }

    /// Returns the [`core::any::type_name`] of the stored value.
    ///
    /// Intended for diagnostics only: the returned name is not guaranteed to
    /// be unique or stable.
    ///
    /// # Examples
    ///
    /// ```
    /// use inline_box::{InlineBox, inline_capacity};
    ///
    /// trait Shape {}
    ///
    /// inline_capacity! {
    ///     dyn Shape => { size: 8, align: 8 };
    /// }
    ///
    /// struct Dot;
    /// impl Shape for Dot {}
    ///
    /// let dot: InlineBox<dyn Shape> = InlineBox::new(Dot);
    /// assert!(dot.concrete_type_name().ends_with("Dot"));
    /// ```
    #[inline]
    #[must_use]
    pub fn concrete_type_name(&self) -> &'static str {
        self.as_raw().concrete_type_name()
    }

    /// Returns the [`Layout`] of the stored value.
    #[inline]
    #[must_use]
    pub fn concrete_layout(&self) -> Layout {
        self.as_raw().concrete_layout()
    }

    /// Moves the stored value to the heap.
    ///
    /// This only works when the value was stored through the built-in unsized
    /// coercion, which is what [`inline_capacity!`](crate::inline_capacity)
    /// generates. A value exposed through one of its parts by a hand-written
    /// [`CoerceFrom`] implementation cannot be freed through the pointer to
    /// that part, so the box is handed back unchanged in `Err`.
    ///
    /// # Examples
    ///
    /// ```
    /// use inline_box::{InlineBox, inline_capacity};
    ///
    /// trait Shape {
    ///     fn area(&self) -> f64;
    /// }
    ///
    /// inline_capacity! {
    ///     dyn Shape => { size: 8, align: 8 };
    /// }
    ///
    /// struct Square(f64);
    /// impl Shape for Square {
    ///     fn area(&self) -> f64 {
    ///         self.0 * self.0
    ///     }
    /// }
    ///
    /// let inline: InlineBox<dyn Shape> = InlineBox::new(Square(3.0));
    /// let boxed: Option<Box<dyn Shape>> = inline.into_boxed().ok();
    /// assert_eq!(boxed.map(|shape| shape.area()), Some(9.0));
    /// ```
    #[cfg(feature = "alloc")]
    #[cfg_attr(docsrs, doc(cfg(feature = "alloc")))]
    pub fn into_boxed(self) -> Result<alloc::boxed::Box<I>, Self> {
        self.into_raw().into_boxed().map_err(|raw| {
            // SAFETY:
            // 1. `raw` was just returned by `into_raw` and handed back as is
            unsafe { Self::from_raw(raw) }
        })
    }

    /// Returns `true` when the stored value is exposed as `I` through the
    /// built-in unsized coercion, so that [`InlineBox::as_ptr`] and
    /// [`InlineBox::storage_ptr`] point to the same byte.
    #[inline]
    #[must_use]
    pub fn is_unsize(&self) -> bool {
        self.as_raw().is_unsize()
    }
}

impl<I: ?Sized + Capacity> Deref for InlineBox<I> {
    type Target = I;

    #[inline]
    fn deref(&self) -> &I {
        self.as_raw().as_ref()
    }
}

impl<I: ?Sized + Capacity> DerefMut for InlineBox<I> {
    #[inline]
    fn deref_mut(&mut self) -> &mut I {
        self.as_raw_mut().as_mut()
    }
}

impl<I: ?Sized + Capacity> AsRef<I> for InlineBox<I> {
    #[inline]
    fn as_ref(&self) -> &I {
        self
    }
}

impl<I: ?Sized + Capacity> AsMut<I> for InlineBox<I> {
    #[inline]
    fn as_mut(&mut self) -> &mut I {
        self
    }
}

impl<I: ?Sized + Capacity> Borrow<I> for InlineBox<I> {
    #[inline]
    fn borrow(&self) -> &I {
        self
    }
}

impl<I: ?Sized + Capacity> BorrowMut<I> for InlineBox<I> {
    #[inline]
    fn borrow_mut(&mut self) -> &mut I {
        self
    }
}

impl<I: ?Sized + Capacity + core::fmt::Debug> core::fmt::Debug for InlineBox<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&**self, f)
    }
}

impl<I: ?Sized + Capacity + core::fmt::Display> core::fmt::Display for InlineBox<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&**self, f)
    }
}

impl<I: ?Sized + Capacity + core::error::Error> core::error::Error for InlineBox<I> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        (**self).source()
    }
}
