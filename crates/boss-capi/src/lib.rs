//! The external C ABI: opaque handles over [`boss_core::Expression`] and
//! [`boss_core::Symbol`] plus the accessor functions a non-Rust caller links
//! against. Deliberately thin -- this exists so a C or C++ caller can build
//! and inspect expressions and run them through a [`BootstrapEngine`], not
//! to expose the full Rust API. See `DESIGN.md`.
//!
//! Opaque handles are raw pointers to the Rust types themselves (no
//! second wrapper allocation); a caller must treat them as opaque and pass
//! them back only to the functions declared here.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use boss_core::{CloneReason, Expression, Symbol};
use boss_bootstrap::{BootstrapConfig, BootstrapEngine};

/// `bool = 0, long = 1, double = 2, string = 3, symbol = 4, complex = 5`.
///
/// Narrower numeric kinds (`I8`, `I32`, `F32`) are coerced to `long`/`double`
/// at this boundary, since the external ABI only distinguishes one integer
/// width and one floating width.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossExpressionTypeId {
    Bool = 0,
    Long = 1,
    Double = 2,
    String = 3,
    Symbol = 4,
    Complex = 5,
}

/// # Safety
/// `name` must be a valid, null-terminated, UTF-8 string pointer.
#[no_mangle]
pub unsafe extern "C" fn symbol_name_to_new_boss_symbol(name: *const c_char) -> *mut Symbol {
    let name = CStr::from_ptr(name).to_string_lossy().into_owned();
    Box::into_raw(Box::new(Symbol::new(name)))
}

/// # Safety
/// `symbol` must be a valid pointer from [`symbol_name_to_new_boss_symbol`]
/// or [`get_head_from_boss_expression`]; ownership does not transfer.
#[no_mangle]
pub unsafe extern "C" fn symbol_to_new_string(symbol: *const Symbol) -> *mut c_char {
    owned_cstring((*symbol).as_str())
}

#[no_mangle]
pub extern "C" fn long_to_new_boss_expression(value: i64) -> *mut Expression {
    Box::into_raw(Box::new(Expression::I64(value)))
}

#[no_mangle]
pub extern "C" fn double_to_new_boss_expression(value: f64) -> *mut Expression {
    Box::into_raw(Box::new(Expression::F64(value)))
}

/// # Safety
/// `string` must be a valid, null-terminated, UTF-8 string pointer.
#[no_mangle]
pub unsafe extern "C" fn string_to_new_boss_expression(string: *const c_char) -> *mut Expression {
    let s = CStr::from_ptr(string).to_string_lossy().into_owned();
    Box::into_raw(Box::new(Expression::String(s)))
}

/// # Safety
/// `name` must be a valid, null-terminated, UTF-8 string pointer.
#[no_mangle]
pub unsafe extern "C" fn symbol_name_to_new_boss_expression(name: *const c_char) -> *mut Expression {
    let s = CStr::from_ptr(name).to_string_lossy().into_owned();
    Box::into_raw(Box::new(Expression::Symbol(Symbol::new(s))))
}

/// # Safety
/// `head` must be a valid pointer from [`symbol_name_to_new_boss_symbol`];
/// ownership transfers and it must not be used again. `arguments` must point
/// to `cardinality` valid, non-null `Expression` pointers, each owning what
/// it points to; ownership of every one of them transfers into the returned
/// expression.
#[no_mangle]
pub unsafe extern "C" fn new_complex_boss_expression(
    head: *mut Symbol,
    cardinality: usize,
    arguments: *mut *mut Expression,
) -> *mut Expression {
    let head = *Box::from_raw(head);
    let slice = std::slice::from_raw_parts(arguments, cardinality);
    let args = slice
        .iter()
        .map(|&ptr| *Box::from_raw(ptr))
        .collect::<Vec<_>>();
    Box::into_raw(Box::new(Expression::complex(head, args)))
}

/// # Safety
/// `arg` must be a valid pointer to a live `Expression`; ownership does not
/// transfer.
#[no_mangle]
pub unsafe extern "C" fn get_boss_expression_type_id(arg: *const Expression) -> usize {
    let id = match &*arg {
        Expression::Bool(_) => BossExpressionTypeId::Bool,
        Expression::I8(_) | Expression::I32(_) | Expression::I64(_) => BossExpressionTypeId::Long,
        Expression::F32(_) | Expression::F64(_) => BossExpressionTypeId::Double,
        Expression::String(_) => BossExpressionTypeId::String,
        Expression::Symbol(_) => BossExpressionTypeId::Symbol,
        Expression::Complex(_) => BossExpressionTypeId::Complex,
    };
    id as usize
}

/// # Safety
/// `arg` must point to a live `Expression::Bool`; ownership does not
/// transfer.
#[no_mangle]
pub unsafe extern "C" fn get_bool_value_from_boss_expression(arg: *const Expression) -> bool {
    matches!(&*arg, Expression::Bool(true))
}

/// # Safety
/// `arg` must point to a live integer-kind `Expression`; ownership does not
/// transfer.
#[no_mangle]
pub unsafe extern "C" fn get_long_value_from_boss_expression(arg: *const Expression) -> i64 {
    match &*arg {
        Expression::I8(v) => i64::from(*v),
        Expression::I32(v) => i64::from(*v),
        Expression::I64(v) => *v,
        _ => 0,
    }
}

/// # Safety
/// `arg` must point to a live float-kind `Expression`; ownership does not
/// transfer.
#[no_mangle]
pub unsafe extern "C" fn get_double_value_from_boss_expression(arg: *const Expression) -> f64 {
    match &*arg {
        Expression::F32(v) => f64::from(*v),
        Expression::F64(v) => *v,
        _ => 0.0,
    }
}

/// # Safety
/// `arg` must point to a live `Expression::String`; ownership does not
/// transfer. The returned string is newly allocated and owned by the
/// caller, who must free it with [`free_boss_string`].
#[no_mangle]
pub unsafe extern "C" fn get_new_string_value_from_boss_expression(arg: *const Expression) -> *mut c_char {
    match &*arg {
        Expression::String(s) => owned_cstring(s),
        _ => ptr::null_mut(),
    }
}

/// # Safety
/// `arg` must point to a live `Expression::Symbol`; ownership does not
/// transfer. The returned string is newly allocated and owned by the
/// caller, who must free it with [`free_boss_string`].
#[no_mangle]
pub unsafe extern "C" fn get_new_symbol_name_from_boss_expression(arg: *const Expression) -> *mut c_char {
    match &*arg {
        Expression::Symbol(s) => owned_cstring(s.as_str()),
        _ => ptr::null_mut(),
    }
}

/// # Safety
/// `arg` must point to a live `Expression::Complex`; ownership does not
/// transfer. The returned symbol is a new, caller-owned handle.
#[no_mangle]
pub unsafe extern "C" fn get_head_from_boss_expression(arg: *const Expression) -> *mut Symbol {
    match &*arg {
        Expression::Complex(c) => Box::into_raw(Box::new(c.head().clone())),
        _ => ptr::null_mut(),
    }
}

/// # Safety
/// `arg` must point to a live `Expression::Complex`; ownership does not
/// transfer.
#[no_mangle]
pub unsafe extern "C" fn get_argument_count_from_boss_expression(arg: *const Expression) -> usize {
    match &*arg {
        Expression::Complex(c) => c.arguments().len(),
        _ => 0,
    }
}

/// # Safety
/// `arg` must point to a live `Expression::Complex`; ownership does not
/// transfer. Each returned argument is a new, owned copy; the array
/// itself must eventually be released with [`free_boss_arguments`], and
/// each element with [`free_boss_expression`].
#[no_mangle]
pub unsafe extern "C" fn get_arguments_from_boss_expression(arg: *const Expression) -> *mut *mut Expression {
    let Expression::Complex(c) = &*arg else {
        return ptr::null_mut();
    };
    let view = c.arguments();
    let owned: Vec<*mut Expression> = view
        .iter()
        .map(|r| Box::into_raw(Box::new(r.to_owned_with(CloneReason::ConversionToCBossExpression))))
        .collect();
    alloc_length_prefixed(owned)
}

/// # Safety
/// `arg` must be a valid, non-null pointer from any `*_to_new_boss_expression`
/// or `new_complex_boss_expression` constructor; ownership transfers and it
/// must not be used again.
#[no_mangle]
pub unsafe extern "C" fn boss_evaluate(arg: *mut Expression) -> *mut Expression {
    let expression = *Box::from_raw(arg);
    let mut engine = BootstrapEngine::new(BootstrapConfig::default());
    let result = match engine.evaluate(expression) {
        Ok(value) => value,
        Err(e) => Expression::complex(
            "ErrorWhenEvaluatingExpression",
            vec![Expression::String(e.to_string())],
        ),
    };
    Box::into_raw(Box::new(result))
}

/// # Safety
/// `expression` must be a valid, non-null pointer from this module's
/// constructors or accessors, not already freed.
#[no_mangle]
pub unsafe extern "C" fn free_boss_expression(expression: *mut Expression) {
    if !expression.is_null() {
        drop(Box::from_raw(expression));
    }
}

/// # Safety
/// `arguments` must be a pointer previously returned by
/// [`get_arguments_from_boss_expression`]; every element must already have
/// been freed (or never need freeing) before this call releases the array
/// itself.
#[no_mangle]
pub unsafe extern "C" fn free_boss_arguments(arguments: *mut *mut Expression) {
    free_length_prefixed(arguments);
}

/// # Safety
/// `symbol` must be a valid, non-null pointer from this module's
/// constructors or accessors, not already freed.
#[no_mangle]
pub unsafe extern "C" fn free_boss_symbol(symbol: *mut Symbol) {
    if !symbol.is_null() {
        drop(Box::from_raw(symbol));
    }
}

/// # Safety
/// `string` must be a pointer previously returned by a `get_new_*` function
/// in this module, not already freed.
#[no_mangle]
pub unsafe extern "C" fn free_boss_string(string: *mut c_char) {
    if !string.is_null() {
        drop(CString::from_raw(string));
    }
}

fn owned_cstring(s: &str) -> *mut c_char {
    CString::new(s).unwrap_or_else(|_| CString::new("<invalid utf-8>").unwrap()).into_raw()
}

/// Allocates `items` with a hidden length word at index `-1`, so the thin
/// pointer `free_boss_arguments` receives (matching the declared C
/// signature, which carries no count) can still recover how many elements
/// to walk.
fn alloc_length_prefixed(items: Vec<*mut Expression>) -> *mut *mut Expression {
    let len = items.len();
    let mut buf = Vec::with_capacity(len + 1);
    buf.push(len as *mut Expression);
    buf.extend(items);
    let boxed = buf.into_boxed_slice();
    let raw = Box::into_raw(boxed) as *mut *mut Expression;
    // SAFETY: `raw` points at the length word; offsetting by one element
    // yields the data pointer callers receive.
    unsafe { raw.add(1) }
}

/// # Safety
/// `data` must be a pointer returned by [`alloc_length_prefixed`], or null.
unsafe fn free_length_prefixed(data: *mut *mut Expression) {
    if data.is_null() {
        return;
    }
    let base = data.sub(1);
    let len = *base as usize;
    let slice = std::ptr::slice_from_raw_parts_mut(base, len + 1);
    drop(Box::from_raw(slice));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn round_trips_long_value() {
        let expr = long_to_new_boss_expression(42);
        unsafe {
            assert_eq!(get_boss_expression_type_id(expr), BossExpressionTypeId::Long as usize);
            assert_eq!(get_long_value_from_boss_expression(expr), 42);
            free_boss_expression(expr);
        }
    }

    #[test]
    fn complex_expression_reports_head_and_arguments() {
        unsafe {
            let head = symbol_name_to_new_boss_symbol(c"Plus".as_ptr());
            let mut args = vec![long_to_new_boss_expression(1), long_to_new_boss_expression(2)];
            let complex = new_complex_boss_expression(head, args.len(), args.as_mut_ptr());

            assert_eq!(get_boss_expression_type_id(complex), BossExpressionTypeId::Complex as usize);
            assert_eq!(get_argument_count_from_boss_expression(complex), 2);

            let head_handle = get_head_from_boss_expression(complex);
            let name = symbol_to_new_string(head_handle);
            assert_eq!(CStr::from_ptr(name).to_str().unwrap(), "Plus");
            free_boss_string(name);
            free_boss_symbol(head_handle);

            let returned = get_arguments_from_boss_expression(complex);
            assert_eq!(get_long_value_from_boss_expression(*returned), 1);
            assert_eq!(get_long_value_from_boss_expression(*returned.add(1)), 2);
            free_boss_expression(*returned);
            free_boss_expression(*returned.add(1));
            free_boss_arguments(returned);

            free_boss_expression(complex);
        }
    }
}
