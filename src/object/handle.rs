//! Reference-counted object handle
//!
//! `Object` owns one share of an instance. Cloning retains, dropping
//! releases; the release that reaches zero runs the destructor chain and
//! frees the block. Counts are atomic so handles may cross threads; the
//! payload itself is not synchronized.

use core::fmt;
use core::ptr::NonNull;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::sync::atomic::{self, Ordering};

use super::header::{ObjectHeader, HEADER_SIZE, MAX_REFCOUNT, OBJECT_ALIGN};
use crate::error::{Result, RuntimeError};
use crate::hash::{IdentityKeys, KeyPolicy};
use crate::logging::{log_allocation, log_deallocation, trace};
use crate::types::{TypeDescriptor, TypeRef, TypeRegistry};

pub struct Object {
    ptr: NonNull<ObjectHeader>,
}

// Refcount updates are atomic; payload access is the caller's concern
unsafe impl Send for Object {}
unsafe impl Sync for Object {}

impl Object {
    /// Allocate an instance of `ty` occupying `size` bytes, header included.
    ///
    /// Bytes beyond the header and the type's own payload are trailing
    /// storage. The payload is zeroed; the count starts at 1.
    pub fn allocate(size: usize, ty: &TypeRef) -> Result<Self> {
        if !ty.is_composite() {
            return Err(RuntimeError::invalid_argument(format!(
                "cannot allocate instance of {} type '{}'",
                ty.kind(),
                ty.name()
            )));
        }
        let needed = instance_size(ty)?;
        if size < needed {
            return Err(RuntimeError::invalid_argument(format!(
                "size {} too small for '{}' (needs {})",
                size,
                ty.name(),
                needed
            )));
        }

        let layout = Layout::from_size_align(size, OBJECT_ALIGN)
            .map_err(|_| RuntimeError::allocation_failed(format!("object of {} bytes", size)))?;

        // SAFETY: layout has non-zero size (at least HEADER_SIZE)
        let raw = unsafe { alloc_zeroed(layout) } as *mut ObjectHeader;
        let ptr = NonNull::new(raw)
            .ok_or_else(|| RuntimeError::allocation_failed(format!("object of {} bytes", size)))?;

        // SAFETY: fresh block, suitably sized and aligned for the header
        unsafe { ptr.as_ptr().write(ObjectHeader::new(TypeRef::clone(ty), size)) };

        log_allocation(size, raw as *const u8, ty.name());
        Ok(Self { ptr })
    }

    /// Instance of `ty` with exactly the type's payload size
    pub fn new(ty: &TypeRef) -> Result<Self> {
        Self::allocate(instance_size(ty)?, ty)
    }

    /// Instance of the registry's root type with `size` bytes in total
    pub fn allocate_root(size: usize, registry: &TypeRegistry) -> Result<Self> {
        Self::allocate(size, registry.root())
    }

    /// Instance of `ty` whose payload starts with `value`.
    ///
    /// The type's destructor chain becomes responsible for dropping `value`.
    pub fn with_value<T: Send + Sync>(ty: &TypeRef, value: T) -> Result<Self> {
        if core::mem::align_of::<T>() > OBJECT_ALIGN || core::mem::size_of::<T>() > ty.size() {
            return Err(RuntimeError::invalid_argument(format!(
                "value does not fit the layout of '{}'",
                ty.name()
            )));
        }
        let object = Self::new(ty)?;
        // SAFETY: payload is at least size_of::<T>() bytes and OBJECT_ALIGN-aligned
        unsafe { object.data_ptr().cast::<T>().as_ptr().write(value) };
        Ok(object)
    }

    #[inline]
    fn header(&self) -> &ObjectHeader {
        // SAFETY: header is valid while this handle holds a share
        unsafe { self.ptr.as_ref() }
    }

    /// Add a share (the `retain` operation)
    #[inline]
    pub fn retain(&self) -> Self {
        // SAFETY: this handle keeps the object alive
        unsafe { increment(self.ptr) };
        Self { ptr: self.ptr }
    }

    /// Give up this share (the `release` operation)
    #[inline]
    pub fn release(self) {
        drop(self)
    }

    /// Current count, for diagnostics
    #[inline]
    pub fn refcount(&self) -> u32 {
        self.header().refcount.load(Ordering::Acquire)
    }

    /// Exact type the instance was allocated as
    #[inline]
    pub fn type_descriptor(&self) -> &TypeRef {
        self.header().type_info()
    }

    /// True when the instance's type is `ty` or derives from it
    pub fn is_instance_of(&self, ty: &TypeDescriptor) -> bool {
        self.type_descriptor().is_descendant_or_equal(ty)
    }

    /// First payload byte
    #[inline]
    pub fn data_ptr(&self) -> NonNull<u8> {
        ObjectHeader::data_ptr(self.ptr)
    }

    /// Payload bytes, trailing storage included
    pub fn payload(&self) -> &[u8] {
        // SAFETY: payload_len bytes follow the header inside the block
        unsafe { core::slice::from_raw_parts(self.data_ptr().as_ptr(), self.header().payload_len()) }
    }

    /// Mutable payload, only while this is the sole share
    pub fn payload_mut(&mut self) -> Option<&mut [u8]> {
        if self.refcount() != 1 {
            return None;
        }
        let len = self.header().payload_len();
        // SAFETY: unique share, so no other handle can observe the payload
        Some(unsafe { core::slice::from_raw_parts_mut(self.data_ptr().as_ptr(), len) })
    }

    /// Payload viewed as a `T`
    ///
    /// # Safety
    /// The payload must hold an initialized `T` at offset 0.
    pub unsafe fn payload_as<T>(&self) -> &T {
        debug_assert!(core::mem::size_of::<T>() <= self.header().payload_len());
        debug_assert!(core::mem::align_of::<T>() <= OBJECT_ALIGN);
        self.data_ptr().cast::<T>().as_ref()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }

    /// Hand the share to a raw data pointer without releasing it
    #[inline]
    pub fn into_raw(self) -> NonNull<u8> {
        let data = self.data_ptr();
        core::mem::forget(self);
        data
    }

    /// Reclaim a share previously passed out by `into_raw`
    ///
    /// # Safety
    /// `data` must come from `into_raw` and that share must not be reused.
    #[inline]
    pub unsafe fn from_raw(data: NonNull<u8>) -> Self {
        Self {
            ptr: ObjectHeader::from_data(data),
        }
    }

    /// Retain through a raw data pointer
    ///
    /// # Safety
    /// `data` must be the data pointer of a live object.
    pub unsafe fn retain_raw(data: NonNull<u8>) {
        increment(ObjectHeader::from_data(data));
    }

    /// Release through a raw data pointer
    ///
    /// # Safety
    /// `data` must be the data pointer of a live object whose share the
    /// caller owns; the pointer may dangle afterwards.
    pub unsafe fn release_raw(data: NonNull<u8>) {
        drop(Self::from_raw(data));
    }

    /// Count behind a raw data pointer
    ///
    /// # Safety
    /// `data` must be the data pointer of a live object.
    pub unsafe fn refcount_raw(data: NonNull<u8>) -> u32 {
        ObjectHeader::from_data(data).as_ref().refcount.load(Ordering::Acquire)
    }
}

/// Smallest block holding the header and `ty`'s payload
fn instance_size(ty: &TypeDescriptor) -> Result<usize> {
    HEADER_SIZE.checked_add(ty.size()).ok_or_else(|| {
        RuntimeError::allocation_failed(format!(
            "instance of '{}' ({} byte payload) exceeds the address space",
            ty.name(),
            ty.size()
        ))
    })
}

/// Increment (hot path)
#[inline(always)]
unsafe fn increment(header: NonNull<ObjectHeader>) {
    let old = header.as_ref().refcount.fetch_add(1, Ordering::Relaxed);
    if old > MAX_REFCOUNT {
        std::process::abort();
    }
}

/// Run each level's destructor, most-derived first, then free the block
#[cold]
#[inline(never)]
unsafe fn destroy(header: NonNull<ObjectHeader>) {
    let data = ObjectHeader::data_ptr(header);
    let size = header.as_ref().size;

    trace!(event = "object_destroy", address = ?data.as_ptr(), type_name = %header.as_ref().type_info.name());

    for level in header.as_ref().type_info.ancestors() {
        if let Some(destructor) = level.destructor() {
            destructor(data);
        }
    }

    // Drops the header's share of the type
    core::ptr::drop_in_place(header.as_ptr());

    let layout = Layout::from_size_align_unchecked(size, OBJECT_ALIGN);
    dealloc(header.as_ptr() as *mut u8, layout);
    log_deallocation(size, header.as_ptr() as *const u8);
}

impl Clone for Object {
    #[inline]
    fn clone(&self) -> Self {
        self.retain()
    }
}

impl Drop for Object {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: this handle owns one share
        unsafe {
            let old = self.ptr.as_ref().refcount.fetch_sub(1, Ordering::Release);
            debug_assert!(old > 0, "refcount underflow");

            if old == 1 {
                // Synchronize with all previous decrements
                atomic::fence(Ordering::Acquire);
                destroy(self.ptr);
            }
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("address", &self.data_ptr())
            .field("type", self.type_descriptor().name())
            .field("refcount", &self.refcount())
            .finish()
    }
}

impl KeyPolicy<Object> for IdentityKeys {
    #[inline]
    fn hash_key(&self, key: &Object) -> u64 {
        crate::hash::mix_address(key.ptr.as_ptr() as usize)
    }

    #[inline]
    fn key_eq(&self, a: &Object, b: &Object) -> bool {
        a.ptr_eq(b)
    }
}
