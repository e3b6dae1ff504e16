//! Precomputed table of standard-library names.
//!
//! Validity checks never ask the interpreter; they consult this table (or a
//! test double) through the `NamespaceOracle` seam.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Answers whether a top-level name is provided by the language runtime.
pub trait NamespaceOracle: Send + Sync {
    fn is_known(&self, name: &str) -> bool;
}

/// Oracle backed by the static standard-library table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdlibOracle;

impl StdlibOracle {
    pub fn new() -> Self {
        Self
    }
}

impl NamespaceOracle for StdlibOracle {
    fn is_known(&self, name: &str) -> bool {
        STDLIB_MODULES.contains(name)
    }
}

static STDLIB_MODULES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STDLIB_NAMES.iter().copied().collect());

/// Top-level standard-library module names (CPython 3.11).
const STDLIB_NAMES: &[&str] = &[
    // Text, data, and algorithms
    "base64",
    "binascii",
    "bisect",
    "bz2",
    "calendar",
    "codecs",
    "collections",
    "configparser",
    "copy",
    "copyreg",
    "csv",
    "dataclasses",
    "datetime",
    "decimal",
    "difflib",
    "enum",
    "fractions",
    "functools",
    "gettext",
    "graphlib",
    "gzip",
    "hashlib",
    "heapq",
    "hmac",
    "html",
    "itertools",
    "json",
    "locale",
    "lzma",
    "math",
    "numbers",
    "operator",
    "pickle",
    "pickletools",
    "pprint",
    "queue",
    "random",
    "re",
    "reprlib",
    "secrets",
    "statistics",
    "string",
    "stringprep",
    "struct",
    "textwrap",
    "types",
    "typing",
    "unicodedata",
    "uuid",
    "zlib",
    "zoneinfo",
    // Runtime and language services
    "__future__",
    "abc",
    "ast",
    "atexit",
    "builtins",
    "cmath",
    "code",
    "codeop",
    "compileall",
    "contextlib",
    "contextvars",
    "dis",
    "gc",
    "importlib",
    "inspect",
    "keyword",
    "marshal",
    "py_compile",
    "pyclbr",
    "pydoc",
    "site",
    "symtable",
    "sys",
    "sysconfig",
    "token",
    "tokenize",
    "trace",
    "traceback",
    "tracemalloc",
    "warnings",
    "weakref",
    // Files and operating system
    "argparse",
    "ctypes",
    "errno",
    "fcntl",
    "filecmp",
    "fileinput",
    "fnmatch",
    "getopt",
    "getpass",
    "glob",
    "grp",
    "io",
    "mmap",
    "os",
    "pathlib",
    "platform",
    "posixpath",
    "pty",
    "pwd",
    "resource",
    "shlex",
    "shutil",
    "signal",
    "stat",
    "tempfile",
    "termios",
    "tty",
    // Concurrency and IPC
    "asyncio",
    "concurrent",
    "multiprocessing",
    "sched",
    "select",
    "selectors",
    "socket",
    "socketserver",
    "ssl",
    "subprocess",
    "threading",
    "time",
    "timeit",
    // Internet, persistence, and interchange formats
    "email",
    "ftplib",
    "http",
    "imaplib",
    "ipaddress",
    "mimetypes",
    "quopri",
    "smtplib",
    "sqlite3",
    "tarfile",
    "tomllib",
    "urllib",
    "wave",
    "webbrowser",
    "wsgiref",
    "xml",
    "xmlrpc",
    "zipapp",
    "zipfile",
    "zipimport",
    // Development, debugging, and testing
    "bdb",
    "cProfile",
    "doctest",
    "faulthandler",
    "linecache",
    "logging",
    "pdb",
    "pkgutil",
    "plistlib",
    "profile",
    "pstats",
    "runpy",
    "shelve",
    "unittest",
    "venv",
    // GUI
    "tkinter",
    "turtle",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_modules_are_known() {
        let oracle = StdlibOracle::new();
        for name in ["os", "sys", "typing", "collections", "__future__"] {
            assert!(oracle.is_known(name), "{name} should be in the table");
        }
    }

    #[test]
    fn external_packages_are_not_known() {
        let oracle = StdlibOracle::new();
        for name in ["requests", "numpy", "django", ""] {
            assert!(!oracle.is_known(name), "{name} should not be in the table");
        }
    }

    #[test]
    fn table_has_no_duplicates() {
        assert_eq!(STDLIB_NAMES.len(), STDLIB_MODULES.len());
    }
}
