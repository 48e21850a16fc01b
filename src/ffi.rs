//! FFI bridge (§4.10, C10): a single process-wide handle to a dynamically
//! loaded user library, resolved lazily and cached. Every call marshals its
//! arguments according to a type signature string — `'S'` means "symbol
//! handle, passed as a C string pointer", anything else means "32-bit
//! integer" — and interprets the return value per the signature's final
//! letter.
//!
//! Plain C functions have per-parameter signatures (`uint32_t f(uint32_t,
//! uint32_t)` and so on); there is no single fixed ABI that can stand in for
//! all of them. Souffle builds a `ffi_cif` per type signature and calls
//! through it with `ffi_call` (`Interpreter.cpp`'s `callDll`); `libffi` is
//! that same approach's Rust binding, so a call interface is built fresh
//! from `signature` and used once per call, exactly like the original.

use libffi::middle::{Arg, Cif, CodePtr, Type};
use libloading::{Library, Symbol};
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::sync::OnceLock;

use crate::domain::RamDomain;
use crate::symbol::SymbolTable;

/// Resolved once per process and reused for every subsequent `UserDefinedOperator`
/// call (§4.10 "Maintains a single process-wide handle").
pub struct FfiBridge {
    library: OnceLock<Library>,
    path: String,
}

/// One marshalled call argument, owned for the duration of the call so the
/// `Arg` built from it (a borrow into this storage) stays valid until
/// `ffi_call` returns. `Str` keeps both the pointer `ffi_call` reads and the
/// `CString` that pointer is borrowed from, so the bytes behind it outlive
/// the call.
enum ArgStorage {
    Int(u32),
    Str { ptr: *const c_char, owner: CString },
}

impl FfiBridge {
    pub fn new(path: impl Into<String>) -> Self {
        FfiBridge {
            library: OnceLock::new(),
            path: path.into(),
        }
    }

    fn library(&self) -> &Library {
        self.library.get_or_init(|| {
            unsafe { Library::new(&self.path) }
                .unwrap_or_else(|e| panic!("failed to load FFI library {:?}: {e}", self.path))
        })
    }

    /// Marshals `args` per `signature` (all but its last letter), builds a
    /// call interface descriptor (`ffi_cif`) matching that signature, calls
    /// `name` through the loaded library, and maps the raw return value back
    /// per the signature's final letter (§6 "FFI").
    pub fn call(
        &self,
        symbols: &SymbolTable,
        name: &str,
        signature: &str,
        args: &[RamDomain],
    ) -> RamDomain {
        assert_eq!(
            signature.len(),
            args.len() + 1,
            "FFI signature length must be arity+1"
        );
        let param_sig = &signature[..args.len()];
        let return_sig = signature.chars().last().unwrap();

        let storage: Vec<ArgStorage> = param_sig
            .chars()
            .zip(args.iter())
            .map(|(letter, &value)| {
                if letter == 'S' {
                    let owner = CString::new(symbols.resolve(value))
                        .expect("FFI string argument contains NUL");
                    let ptr = owner.as_ptr();
                    ArgStorage::Str { ptr, owner }
                } else {
                    ArgStorage::Int(value as u32)
                }
            })
            .collect();

        let arg_types: Vec<Type> = param_sig
            .chars()
            .map(|letter| if letter == 'S' { Type::pointer() } else { Type::u32() })
            .collect();

        let ffi_args: Vec<Arg> = storage
            .iter()
            .map(|s| match s {
                ArgStorage::Int(i) => Arg::new(i),
                ArgStorage::Str { ptr, .. } => Arg::new(ptr),
            })
            .collect();

        let library = self.library();
        let symbol: Symbol<*mut c_void> = unsafe {
            library
                .get(name.as_bytes())
                .unwrap_or_else(|e| panic!("FFI symbol {name:?} not found: {e}"))
        };
        let code_ptr = CodePtr::from_ptr(*symbol as *const c_void);

        if return_sig == 'N' {
            let cif = Cif::new(arg_types, Type::u32());
            let result: u32 = unsafe { cif.call(code_ptr, &ffi_args) };
            result as RamDomain
        } else {
            let cif = Cif::new(arg_types, Type::pointer());
            let result: *mut c_char = unsafe { cif.call(code_ptr, &ffi_args) };
            let cstr = unsafe { CStr::from_ptr(result) };
            symbols.lookup(cstr.to_string_lossy().as_ref())
        }
    }
}
