//! Object header - prefixed before every instance payload
//!
//! Layout: `[ObjectHeader][payload ...]`, one allocation. The data pointer
//! handed to destructors and the C ABI is the first payload byte.

use core::ptr::NonNull;
use std::sync::atomic::AtomicU32;

use crate::types::TypeRef;

/// Alignment of every object block, and so of every payload
pub const OBJECT_ALIGN: usize = core::mem::align_of::<ObjectHeader>();

/// Bytes taken by the header before the payload starts
pub const HEADER_SIZE: usize = core::mem::size_of::<ObjectHeader>();

/// Counts above this abort the process rather than wrap
pub(crate) const MAX_REFCOUNT: u32 = i32::MAX as u32;

#[repr(C, align(16))]
pub struct ObjectHeader {
    pub(crate) refcount: AtomicU32,
    /// Total block size, header included
    pub(crate) size: usize,
    /// Exact (most-derived) type of the instance
    pub(crate) type_info: TypeRef,
}

impl ObjectHeader {
    #[inline]
    pub(crate) fn new(type_info: TypeRef, size: usize) -> Self {
        Self {
            refcount: AtomicU32::new(1),
            size,
            type_info,
        }
    }

    /// Header for a data pointer
    ///
    /// # Safety
    /// `data` must be the data pointer of a live object.
    #[inline]
    pub unsafe fn from_data(data: NonNull<u8>) -> NonNull<Self> {
        NonNull::new_unchecked(data.as_ptr().sub(HEADER_SIZE) as *mut Self)
    }

    /// First payload byte of the object this header starts
    #[inline]
    pub fn data_ptr(header: NonNull<Self>) -> NonNull<u8> {
        // SAFETY: the payload starts right after the header in the same block
        unsafe { NonNull::new_unchecked((header.as_ptr() as *mut u8).add(HEADER_SIZE)) }
    }

    #[inline]
    pub fn type_info(&self) -> &TypeRef {
        &self.type_info
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn payload_len(&self) -> usize {
        self.size - HEADER_SIZE
    }
}
