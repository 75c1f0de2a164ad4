//! C-callable runtime surface.
//!
//! Generated code calls these symbols for filters that live out-of-line:
//! exact sets and range sets on the heap, and the process-wide hash table.
//! Handles are raw pointers to boxed filters; the caller owns them between
//! the `_new` and `_free` calls, exactly one `_free` per handle.

use depprof_sig::{init_global_table, ExactSetFilter, GlobalHashTableFilter, RangeFilter};

/// Process-level initialization: sizes the global hash table. Safe to call
/// more than once; only the first call allocates.
#[no_mangle]
pub extern "C" fn ddp_prof_init(table_size: u32) {
    init_global_table(table_size);
}

/// Allocates a fresh exact set.
#[no_mangle]
pub extern "C" fn ddp_set_new() -> *mut ExactSetFilter {
    Box::into_raw(Box::new(ExactSetFilter::new()))
}

/// # Safety
///
/// `set` must be a live handle from [`ddp_set_new`].
#[no_mangle]
pub unsafe extern "C" fn ddp_set_insert(set: *mut ExactSetFilter, addr: u64) {
    if let Some(set) = set.as_mut() {
        set.insert(addr);
    }
}

/// # Safety
///
/// `set` must be a live handle from [`ddp_set_new`].
#[no_mangle]
pub unsafe extern "C" fn ddp_set_check(addr: u64, set: *const ExactSetFilter) -> u32 {
    match set.as_ref() {
        Some(set) => u32::from(set.check(addr)),
        None => 0,
    }
}

/// # Safety
///
/// `set` must be a live handle from [`ddp_set_new`].
#[no_mangle]
pub unsafe extern "C" fn ddp_set_population(set: *const ExactSetFilter) -> u32 {
    match set.as_ref() {
        Some(set) => set.population(),
        None => 0,
    }
}

/// # Safety
///
/// `set` must be a live handle from [`ddp_set_new`], not freed before.
#[no_mangle]
pub unsafe extern "C" fn ddp_set_free(set: *mut ExactSetFilter) {
    if !set.is_null() {
        drop(Box::from_raw(set));
    }
}

/// Allocates a fresh range set.
#[no_mangle]
pub extern "C" fn ddp_range_new() -> *mut RangeFilter {
    Box::into_raw(Box::new(RangeFilter::new()))
}

/// # Safety
///
/// `set` must be a live handle from [`ddp_range_new`].
#[no_mangle]
pub unsafe extern "C" fn ddp_range_insert(set: *mut RangeFilter, addr: u64) {
    if let Some(set) = set.as_mut() {
        set.insert(addr);
    }
}

/// # Safety
///
/// `set` must be a live handle from [`ddp_range_new`].
#[no_mangle]
pub unsafe extern "C" fn ddp_range_check(addr: u64, set: *const RangeFilter) -> u32 {
    match set.as_ref() {
        Some(set) => u32::from(set.check(addr)),
        None => 0,
    }
}

/// # Safety
///
/// `set` must be a live handle from [`ddp_range_new`], not freed before.
#[no_mangle]
pub unsafe extern "C" fn ddp_range_free(set: *mut RangeFilter) {
    if !set.is_null() {
        drop(Box::from_raw(set));
    }
}

/// Inserts into the process-wide hash table.
#[no_mangle]
pub extern "C" fn ddp_ht_insert(addr: u64) {
    GlobalHashTableFilter::new().insert(addr);
}

/// Checks the process-wide hash table.
#[no_mangle]
pub extern "C" fn ddp_ht_check(addr: u64) -> u32 {
    u32::from(GlobalHashTableFilter::new().check(addr))
}

/// Population helper for 32-bit banked filter storage.
///
/// # Safety
///
/// `words` must point to `len` readable `u32` elements.
#[no_mangle]
pub unsafe extern "C" fn ddp_count_bits(words: *const u32, len: u32) -> u32 {
    if words.is_null() {
        return 0;
    }
    let slice = std::slice::from_raw_parts(words, len as usize);
    slice.iter().map(|w| w.count_ones()).sum()
}
