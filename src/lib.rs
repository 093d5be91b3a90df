//! RPATH/RUNPATH inspection and rewriting for ELF binaries.
//!
//! Shells out to `readelf -d` to read the dynamic section and to `patchelf`
//! to rewrite it, rather than parsing ELF structures in-process. The search
//! path list is kept in linker search order throughout; a list read with
//! [`get_rpaths`] and written back with [`patch_rpaths`] round-trips exactly.

mod command;
mod rpath;
mod writable;

pub use command::{run, CommandFailed};
pub use rpath::{get_rpaths, parse_dynamic_section, patch_rpaths};
pub use writable::{make_writable, WritableGuard};
