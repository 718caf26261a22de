//! # Utility Functions Module
//!
//! Small helpers for building external tool command lines.
//!
//! Gli argomenti sono `OsString`: i path arrivano ai tool byte per byte, anche
//! quando il nome del file non è UTF-8 valido.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// ```rust,ignore
/// let packages = to_string_vec(["jpegoptim", "pngquant", "gifsicle"]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// A value that can be passed as one tool argument
pub trait ToArg {
    fn to_arg(&self) -> OsString;
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> OsString {
        (**self).to_arg()
    }
}

impl ToArg for str {
    fn to_arg(&self) -> OsString {
        OsString::from(self)
    }
}

impl ToArg for String {
    fn to_arg(&self) -> OsString {
        OsString::from(self)
    }
}

impl ToArg for OsStr {
    fn to_arg(&self) -> OsString {
        self.to_os_string()
    }
}

impl ToArg for OsString {
    fn to_arg(&self) -> OsString {
        self.clone()
    }
}

impl ToArg for Path {
    fn to_arg(&self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

impl ToArg for PathBuf {
    fn to_arg(&self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

macro_rules! numeric_arg {
    ($($t:ty),*) => {
        $(impl ToArg for $t {
            fn to_arg(&self) -> OsString {
                OsString::from(self.to_string())
            }
        })*
    };
}

numeric_arg!(u8, u32, u64, usize);

/// `prefix` followed by the raw bytes of `path` (`-sOutputFile=<path>`)
pub fn prefixed_path_arg(prefix: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(prefix);
    arg.push(path);
    arg
}

/// First frame of a multi-frame image, ImageMagick `path[0]` syntax
pub fn first_frame_arg(path: &Path) -> OsString {
    let mut arg = path.as_os_str().to_os_string();
    arg.push("[0]");
    arg
}

/// Build an argument vector from strings, numbers and paths.
///
/// ```rust,ignore
/// let args = args![format!("-O{}", level), input, "-o", output];
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$($crate::utils::ToArg::to_arg(&$item)),*]
    };
}
