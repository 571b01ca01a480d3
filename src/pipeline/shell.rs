//! Shell-argument escaping and the page-number output template.
//!
//! The rasterizer writes one file per page from a printf-style template
//! (`<dir>/%04d.jpg`). When the command line goes through a shell, the `%`
//! of that placeholder collides with `cmd.exe` variable expansion, so the
//! Windows escaper refuses `%` anywhere in an argument. [`OutputPattern`]
//! therefore builds the template with an interim character in place of
//! the `%`, escapes it, and only then restores the placeholder.
//!
//! The rasterizer expands the whole template, directory included, so a
//! literal `%` in the directory is written as `%%`.

use crate::error::Pdf2ImgError;
use std::path::{Path, PathBuf};

/// Stands in for the placeholder's `%` while the template is escaped.
/// A control character cannot occur in a sane file-system path.
const INTERIM: char = '\u{1A}';

/// Zero-padded page-number placeholder understood by Ghostscript.
const PLACEHOLDER_SPEC: &str = "04d";

/// Quoting rules of a host shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlavor {
    /// `sh`-compatible: single-quote everything.
    Posix,
    /// `cmd.exe`: double quotes, with expansion characters rejected.
    Windows,
}

impl ShellFlavor {
    pub fn host() -> Self {
        if cfg!(windows) {
            ShellFlavor::Windows
        } else {
            ShellFlavor::Posix
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ShellFlavor::Posix => "sh",
            ShellFlavor::Windows => "cmd.exe",
        }
    }

    /// Quote one argument so the shell passes it through verbatim.
    pub fn escape(&self, arg: &str) -> Result<String, Pdf2ImgError> {
        match self {
            ShellFlavor::Posix => escape_posix(arg),
            ShellFlavor::Windows => escape_windows(arg),
        }
    }

    /// Escape every argument and join them with spaces.
    pub fn join<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Result<String, Pdf2ImgError> {
        let escaped = args
            .into_iter()
            .map(|a| self.escape(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(escaped.join(" "))
    }

    fn reject(&self, arg: &str, ch: char) -> Pdf2ImgError {
        Pdf2ImgError::UnescapableArgument {
            arg: arg.to_string(),
            shell: self.name(),
            ch,
        }
    }
}

fn escape_posix(arg: &str) -> Result<String, Pdf2ImgError> {
    if let Some(ch) = arg.chars().find(|&c| c == '\0') {
        return Err(ShellFlavor::Posix.reject(arg, ch));
    }
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    Ok(out)
}

fn escape_windows(arg: &str) -> Result<String, Pdf2ImgError> {
    // `|` cannot be neutralised reliably once cmd.exe re-parses the line;
    // `%` and `!` expand even inside double quotes.
    if let Some(ch) = arg
        .chars()
        .find(|c| matches!(c, '"' | '%' | '!' | '|' | '\0' | '\n' | '\r'))
    {
        return Err(ShellFlavor::Windows.reject(arg, ch));
    }
    let mut out = String::with_capacity(arg.len() + 4);
    out.push('"');
    out.push_str(arg);
    // A trailing backslash would escape the closing quote.
    let trailing = arg.chars().rev().take_while(|&c| c == '\\').count();
    out.extend(std::iter::repeat_n('\\', trailing));
    out.push('"');
    Ok(out)
}

/// Where the rasterizer writes its page files: `<dir>/%04d.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPattern {
    dir: PathBuf,
    extension: String,
}

impl OutputPattern {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Directory the page files land in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The template as passed directly to the rasterizer, e.g. `/w/x/%04d.jpg`.
    pub fn template(&self) -> Result<String, Pdf2ImgError> {
        self.with_marker('%')
    }

    /// The template escaped for `flavor`, with the `%` placeholder intact.
    pub fn escaped(&self, flavor: ShellFlavor) -> Result<String, Pdf2ImgError> {
        let interim = self.with_marker(INTERIM)?;
        if interim.matches(INTERIM).count() != 1 {
            return Err(flavor.reject(&interim.replace(INTERIM, "%"), INTERIM));
        }
        Ok(flavor.escape(&interim)?.replace(INTERIM, "%"))
    }

    fn with_marker(&self, marker: char) -> Result<String, Pdf2ImgError> {
        let dir = self.dir.to_str().ok_or_else(|| {
            Pdf2ImgError::io(
                &self.dir,
                std::io::Error::new(std::io::ErrorKind::InvalidData, "path is not valid UTF-8"),
            )
        })?;
        let name = format!("{marker}{PLACEHOLDER_SPEC}.{}", self.extension);
        let full = Path::new(&dir.replace('%', "%%")).join(name);
        Ok(full.to_string_lossy().into_owned())
    }
}
