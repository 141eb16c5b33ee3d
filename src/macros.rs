/// Declares the inline capacity of one or more interface types.
///
/// Each declaration names a trait object type, optionally with auto-trait
/// bounds, and the size and alignment of the inline buffer reserved for it.
/// An optional `min_size` sets [`Capacity::MIN_SIZE`](crate::Capacity::MIN_SIZE).
///
/// For every declaration the macro generates:
///
/// - an implementation of [`Capacity`](crate::Capacity) for the trait object
///   type, with an [`InlineStorage<size, align>`](crate::InlineStorage) buffer
/// - an implementation of [`CoerceFrom<C>`](crate::CoerceFrom) for every
///   `C: Trait + 'static`, using the built-in unsized coercion
///
/// Because both implementations are for the trait object type, the trait must
/// be defined in the crate invoking the macro.
///
/// The trait is named by a plain path of identifiers followed by auto-trait
/// bounds. Generic traits (`dyn Handler<u32>`) and lifetime bounds
/// (`dyn Trait + 'a`) are not accepted; write the [`Capacity`](crate::Capacity)
/// and [`CoerceFrom`](crate::CoerceFrom) implementations by hand for those, as
/// shown below.
///
/// The alignment must be a power of two no larger than 4096, and the size must
/// be non-zero. Both are checked at compile time.
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
/// trait Named {
///     fn name(&self) -> &str;
/// }
///
/// inline_capacity! {
///     /// Room for small shapes.
///     dyn Shape => { size: 32, align: 8 };
///     dyn Shape + Send + Sync => { size: 32, align: 8 };
///     dyn Named => { size: 24, align: 8, min_size: 1 };
/// }
///
/// struct Square(f64);
/// impl Shape for Square {
///     fn area(&self) -> f64 {
///         self.0 * self.0
///     }
/// }
///
/// let local: InlineBox<dyn Shape> = InlineBox::new(Square(2.0));
/// let shared: InlineBox<dyn Shape + Send + Sync> = InlineBox::new(Square(3.0));
/// assert_eq!(local.area() + shared.area(), 13.0);
/// ```
///
/// Alignments that are not a power of two are rejected:
///
/// ```compile_fail
/// use inline_box::inline_capacity;
///
/// trait Shape {}
///
/// inline_capacity! {
///     dyn Shape => { size: 32, align: 12 };
/// }
/// ```
///
/// So are zero-sized declarations:
///
/// ```compile_fail
/// use inline_box::inline_capacity;
///
/// trait Shape {}
///
/// inline_capacity! {
///     dyn Shape => { size: 0, align: 8 };
/// }
/// ```
///
/// Generic traits do not match the macro:
///
/// ```compile_fail
/// use inline_box::inline_capacity;
///
/// trait Handler<T> {}
///
/// inline_capacity! {
///     dyn Handler<u32> => { size: 16, align: 8 };
/// }
/// ```
///
/// They are declared by hand instead:
///
/// ```
/// use core::ptr::NonNull;
///
/// use inline_box::{Capacity, CoerceFrom, InlineBox, InlineStorage};
///
/// trait Handler<T> {
///     fn handle(&self, value: T) -> T;
/// }
///
/// impl Capacity for dyn Handler<u32> {
///     type Storage = InlineStorage<16, 8>;
/// }
///
/// // SAFETY: The unsized coercion keeps the address and provenance of `ptr`,
/// // and the bounds on `C` carry every auto trait and lifetime of the
/// // interface.
/// unsafe impl<C: Handler<u32> + 'static> CoerceFrom<C> for dyn Handler<u32> {
///     const IS_UNSIZE: bool = true;
///
///     fn coerce(ptr: NonNull<C>) -> NonNull<Self> {
///         ptr
///     }
/// }
///
/// struct Double;
/// impl Handler<u32> for Double {
///     fn handle(&self, value: u32) -> u32 {
///         value * 2
///     }
/// }
///
/// let handler: InlineBox<dyn Handler<u32>> = InlineBox::new(Double);
/// assert_eq!(handler.handle(21), 42);
/// ```
#[macro_export]
macro_rules! inline_capacity {
    () => {};
    (
        $(#[$meta:meta])*
        dyn $($path:ident)::+ $(+ $extra:ident)* => {
            size: $size:expr,
            align: $align:expr
            $(, min_size: $min_size:expr)?
            $(,)?
        }
        $(; $($rest:tt)*)?
    ) => {
        const _: () = ::core::assert!(
            $size > 0,
            ::core::concat!(
                "inline capacity of `dyn ",
                ::core::stringify!($($path)::+ $(+ $extra)*),
                "` must be non-zero"
            )
        );

        $(#[$meta])*
        impl $crate::Capacity for dyn $($path)::+ $(+ $extra)* {
            type Storage = $crate::InlineStorage<{ $size }, { $align }>;
            $(const MIN_SIZE: usize = $min_size;)?
        }

        // SAFETY: `CoerceUnsize::unsize` performs the built-in unsized coercion,
        // which keeps the address and provenance of `ptr` and only attaches the
        // vtable of `__C`. `__C` is bound by the same auto traits as the
        // interface and is `'static`.
        unsafe impl<__C> $crate::CoerceFrom<__C> for dyn $($path)::+ $(+ $extra)*
        where
            __C: $($path)::+ $(+ $extra)* + 'static,
        {
            const IS_UNSIZE: bool = true;

            #[inline]
            fn coerce(ptr: $crate::__private::NonNull<__C>) -> $crate::__private::NonNull<Self> {
                <$crate::__private::NonNull<__C> as $crate::__private::unsize::CoerceUnsize<Self>>::unsize(
                    ptr,
                    $crate::__private::unsize::Coercion!(to dyn $($path)::+ $(+ $extra)*),
                )
            }
        }

        $($crate::inline_capacity! { $($rest)* })?
    };
}
