//! Reading and rewriting RPATH/RUNPATH entries using readelf and patchelf.

use anyhow::Result;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;

use crate::command::run;
use crate::writable::make_writable;

/// Read the rpath/runpath search list embedded in an ELF binary.
///
/// Returns the paths in linker search order. A binary without an RPATH or
/// RUNPATH entry yields an empty list; that is the common case, not an error.
///
/// # Errors
///
/// Returns an error if `readelf` is not installed or exits non-zero (e.g.
/// the file does not exist or is not an ELF binary).
pub fn get_rpaths(elf_path: &Path) -> Result<Vec<String>> {
    let out = run("readelf", [OsStr::new("-d"), elf_path.as_os_str()], None)?;
    Ok(parse_dynamic_section(&out))
}

/// Parse `readelf -d` output for the first RPATH or RUNPATH entry.
///
/// Example readelf output:
/// ```text
/// Dynamic section at offset 0x2d0e0 contains 28 entries:
///   Tag        Type                         Name/Value
///  0x000000000000000f (RPATH)             Library rpath: [/xxx:/yyy]
/// ```
///
/// Only one entry of either kind is expected; the first match wins and no
/// further lines are scanned. No match means no search-path override.
#[must_use = "parsed search paths should be used"]
pub fn parse_dynamic_section(output: &str) -> Vec<String> {
    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if !parts.contains(&"(RPATH)") && !parts.contains(&"(RUNPATH)") {
            continue;
        }
        let Some(last) = parts.last() else { continue };
        let txt = last.strip_prefix('[').unwrap_or(last);
        let txt = txt.strip_suffix(']').unwrap_or(txt);
        if txt.is_empty() {
            return Vec::new();
        }
        return txt.split(':').map(str::to_string).collect();
    }

    Vec::new()
}

/// Replace an ELF binary's rpath/runpath list with `rpaths`.
///
/// Elements are joined with `:` in the given order and must not themselves
/// contain `:`. An empty list removes the entry entirely. The file is made
/// writable for the duration of the patch; its original mode is restored
/// even when patchelf fails.
///
/// # Errors
///
/// Returns [`CommandFailed`](crate::CommandFailed) if patchelf exits
/// non-zero, or an io error if it cannot be spawned or the file's
/// permissions cannot be changed.
pub fn patch_rpaths(elf_path: &Path, rpaths: &[String]) -> Result<()> {
    // Pin ORIGIN to the literal placeholder in the child environment. When
    // patchelf is installed behind an env-expanding wrapper, $ORIGIN would
    // otherwise be substituted (to an empty string) before the linker ever
    // sees it. Per-call only; the process environment is never mutated.
    let mut env: HashMap<String, String> = std::env::vars().collect();
    env.insert("ORIGIN".to_string(), "$ORIGIN".to_string());

    let _guard = make_writable(elf_path)?;

    if rpaths.is_empty() {
        run(
            "patchelf",
            [OsStr::new("--remove-rpath"), elf_path.as_os_str()],
            Some(&env),
        )?;
    } else {
        let joined = rpaths.join(":");
        run(
            "patchelf",
            [
                OsStr::new("--set-rpath"),
                OsStr::new(&joined),
                elf_path.as_os_str(),
            ],
            Some(&env),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rpath_entry() {
        let output = "0x000000000000000f (RPATH) Library rpath: [/usr/lib:/opt/lib]";
        assert_eq!(parse_dynamic_section(output), vec!["/usr/lib", "/opt/lib"]);
    }

    #[test]
    fn test_parse_runpath_entry() {
        let output = r#"
Dynamic section at offset 0x2d0e0 contains 28 entries:
  Tag        Type                         Name/Value
 0x0000000000000001 (NEEDED)             Shared library: [libc.so.6]
 0x000000000000001d (RUNPATH)            Library runpath: [/a:/b:/c]
 0x000000000000000c (INIT)               0x5000
"#;
        assert_eq!(parse_dynamic_section(output), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_parse_single_path() {
        let output = " 0x000000000000000f (RPATH)             Library rpath: [$ORIGIN/../lib]";
        assert_eq!(parse_dynamic_section(output), vec!["$ORIGIN/../lib"]);
    }

    #[test]
    fn test_parse_no_entry_is_empty() {
        let output = r#"
Dynamic section at offset 0x2d0e0 contains 2 entries:
 0x0000000000000001 (NEEDED)             Shared library: [libc.so.6]
 0x000000000000000c (INIT)               0x5000
"#;
        assert!(parse_dynamic_section(output).is_empty());
    }

    #[test]
    fn test_parse_first_match_wins() {
        let output = r#"
 0x000000000000000f (RPATH)             Library rpath: [/first]
 0x000000000000001d (RUNPATH)           Library runpath: [/second]
"#;
        assert_eq!(parse_dynamic_section(output), vec!["/first"]);
    }

    #[test]
    fn test_parse_preserves_order_and_values() {
        let output = " 0x000000000000000f (RPATH) Library rpath: [/z:/a:/m]";
        assert_eq!(parse_dynamic_section(output), vec!["/z", "/a", "/m"]);
    }
}
