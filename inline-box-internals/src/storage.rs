//! Inline memory that a [`RawInlineBox`] stores its value in.
//!
//! Stable Rust cannot write `#[repr(align(N))]` for a generic `N`, so the
//! alignment of [`InlineStorage<SIZE, ALIGN>`] comes from a zero-length array
//! of a marker type. [`SupportedAlignment`] maps each power of two up to
//! 4096 to such a marker. Any other alignment value (including zero) has no
//! marker and is rejected by the compiler.
//!
//! [`RawInlineBox`]: crate::RawInlineBox

use core::{cell::UnsafeCell, mem::MaybeUninit, ptr::NonNull};

/// Type-level representation of an alignment value.
///
/// Only used through its [`SupportedAlignment`] implementations.
#[derive(Clone, Copy, Debug)]
pub struct Alignment<const ALIGN: usize>;

/// Implemented for every [`Alignment`] value that an [`InlineStorage`] can
/// have.
pub trait SupportedAlignment {
    /// Zero-sized type whose alignment equals the alignment value.
    type Marker: Copy;
}

/// Declares one zero-sized aligned marker type per supported alignment.
macro_rules! supported_alignments {
    ($($marker:ident => $align:literal),* $(,)?) => {
        $(
            #[doc = concat!("Zero-sized marker aligned to ", stringify!($align), " bytes.")]
            #[derive(Clone, Copy, Debug)]
            #[repr(align($align))]
            pub struct $marker;

            impl SupportedAlignment for Alignment<$align> {
                type Marker = $marker;
            }
        )*
    };
}

supported_alignments!(
    Align1 => 1,
    Align2 => 2,
    Align4 => 4,
    Align8 => 8,
    Align16 => 16,
    Align32 => 32,
    Align64 => 64,
    Align128 => 128,
    Align256 => 256,
    Align512 => 512,
    Align1024 => 1024,
    Align2048 => 2048,
    Align4096 => 4096,
);

/// Memory that can hold a single value of any type that fits into [`SIZE`]
/// bytes with an alignment dividing [`ALIGN`].
///
/// [`SIZE`]: Storage::SIZE
/// [`ALIGN`]: Storage::ALIGN
///
/// # Safety
///
/// Implementors must guarantee:
///
/// 1. [`Storage::as_ptr`] returns a pointer valid for reads and writes of
///    [`SIZE`] bytes, aligned to [`ALIGN`], for as long as the borrow of
///    `self` lasts, even though the borrow is shared.
/// 2. Moving a value of the storage type moves those bytes verbatim, so a
///    value written through the pointer is relocated together with the
///    storage.
/// 3. The storage type has no drop glue of its own that reads the bytes.
pub unsafe trait Storage: Sized {
    /// Number of usable bytes.
    const SIZE: usize;
    /// Alignment of the first byte.
    const ALIGN: usize;

    /// Creates storage with uninitialized contents.
    fn uninit() -> Self;

    /// Returns a pointer to the first byte of the storage.
    fn as_ptr(&self) -> NonNull<u8>;
}

/// A buffer of `SIZE` bytes aligned to `ALIGN` bytes.
///
/// The bytes sit behind an [`UnsafeCell`], because the value stored in them
/// may itself contain interior mutability that is reached through a shared
/// reference to the container.
#[repr(C)]
pub struct InlineStorage<const SIZE: usize, const ALIGN: usize>
where
    Alignment<ALIGN>: SupportedAlignment,
{
    /// Zero-length array that forces the alignment of the whole struct.
    _align: [<Alignment<ALIGN> as SupportedAlignment>::Marker; 0],
    /// The storage itself.
    bytes: UnsafeCell<[MaybeUninit<u8>; SIZE]>,
}

impl<const SIZE: usize, const ALIGN: usize> InlineStorage<SIZE, ALIGN>
where
    Alignment<ALIGN>: SupportedAlignment,
{
    /// Creates storage with uninitialized contents.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _align: [],
            bytes: UnsafeCell::new([MaybeUninit::uninit(); SIZE]),
        }
    }
}

impl<const SIZE: usize, const ALIGN: usize> Default for InlineStorage<SIZE, ALIGN>
where
    Alignment<ALIGN>: SupportedAlignment,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize, const ALIGN: usize> core::fmt::Debug for InlineStorage<SIZE, ALIGN>
where
    Alignment<ALIGN>: SupportedAlignment,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InlineStorage")
            .field("size", &SIZE)
            .field("align", &ALIGN)
            .finish_non_exhaustive()
    }
}

// SAFETY:
// 1. `UnsafeCell::get` hands out a pointer that may be written through a shared
//    borrow. It covers the `SIZE` bytes of the array, and the zero-length
//    `_align` array at offset 0 of the `#[repr(C)]` struct makes the struct (and
//    therefore its first byte) aligned to `ALIGN`.
// 2. The struct consists of `MaybeUninit<u8>` bytes only, which are moved
//    verbatim.
// 3. Neither `MaybeUninit` nor the marker types have drop glue.
unsafe impl<const SIZE: usize, const ALIGN: usize> Storage for InlineStorage<SIZE, ALIGN>
where
    Alignment<ALIGN>: SupportedAlignment,
{
    const ALIGN: usize = ALIGN;
    const SIZE: usize = SIZE;

    #[inline]
    fn uninit() -> Self {
        Self::new()
    }

    #[inline]
    fn as_ptr(&self) -> NonNull<u8> {
        let ptr: *mut u8 = self.bytes.get().cast::<u8>();
        // SAFETY: `UnsafeCell::get` derives the pointer from a reference, so it
        // is never null.
        unsafe { NonNull::new_unchecked(ptr) }
    }
}
