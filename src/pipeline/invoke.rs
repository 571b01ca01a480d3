//! Rasterizer invocation: build the Ghostscript command line and run it.
//!
//! The command is always rendered as an escaped shell line, even when the
//! process is spawned directly. That line is what gets logged and what
//! error messages carry, and rendering it first means an argument the host
//! shell could not quote is refused before anything is launched.

use crate::config::{GhostscriptConfig, LaunchMode};
use crate::error::Pdf2ImgError;
use crate::pipeline::shell::{OutputPattern, ShellFlavor};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Keep error messages readable when the tool is chatty on stderr.
const MAX_STDERR_BYTES: usize = 4096;

/// A fully-resolved rasterizer command: PDF in, numbered page images out.
#[derive(Debug, Clone)]
pub struct RasterizerCommand {
    program: String,
    flags: Vec<String>,
    output: OutputPattern,
    input: String,
}

impl RasterizerCommand {
    /// Ghostscript invocation rendering `input` at `dpi` into `output`.
    pub fn ghostscript(
        config: &GhostscriptConfig,
        input: &Path,
        output: OutputPattern,
        dpi: u32,
    ) -> Result<Self, Pdf2ImgError> {
        let flags = vec![
            "-dBATCH".to_string(),
            "-dNOPAUSE".to_string(),
            "-dSAFER".to_string(),
            "-q".to_string(),
            "-sDEVICE=jpeg".to_string(),
            format!("-dJPEGQ={}", config.jpeg_quality),
            format!("-r{dpi}"),
            format!("-sPAPERSIZE={}", config.paper_size),
            "-dFIXEDMEDIA".to_string(),
            "-dPDFFitPage".to_string(),
        ];
        Ok(Self {
            program: utf8(&config.executable)?.to_string(),
            flags,
            output,
            input: utf8(input)?.to_string(),
        })
    }

    /// Where the pages are written once [`run`](Self::run) succeeds.
    pub fn output(&self) -> &OutputPattern {
        &self.output
    }

    /// Arguments as handed to the process when spawned directly.
    pub fn args(&self) -> Result<Vec<String>, Pdf2ImgError> {
        let mut args = self.flags.clone();
        args.push("-o".to_string());
        args.push(self.output.template()?);
        args.push(self.input.clone());
        Ok(args)
    }

    /// The full command line, every part escaped for `flavor`.
    pub fn render(&self, flavor: ShellFlavor) -> Result<String, Pdf2ImgError> {
        let head = flavor.join(
            std::iter::once(self.program.as_str())
                .chain(self.flags.iter().map(String::as_str))
                .chain(std::iter::once("-o")),
        )?;
        let pattern = self.output.escaped(flavor)?;
        let input = flavor.escape(&self.input)?;
        Ok(format!("{head} {pattern} {input}"))
    }

    /// Run to completion. Blocks the calling thread; no timeout is applied.
    pub fn run(&self, launch: LaunchMode) -> Result<(), Pdf2ImgError> {
        let line = self.render(ShellFlavor::host())?;
        info!("Running rasterizer: {}", line);

        let mut command = match launch {
            LaunchMode::Direct => {
                let mut c = Command::new(&self.program);
                c.args(self.args()?);
                c
            }
            LaunchMode::Shell => shell_command(&line),
        };

        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Pdf2ImgError::ToolLaunchFailed {
                command: line.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(Pdf2ImgError::ToolFailed {
                command: line,
                status: output.status.to_string(),
                stderr: truncate_lossy(&output.stderr, MAX_STDERR_BYTES),
            });
        }

        debug!(
            "Rasterizer finished: {} bytes stdout, {} bytes stderr",
            output.stdout.len(),
            output.stderr.len()
        );
        Ok(())
    }
}

#[cfg(unix)]
fn shell_command(line: &str) -> Command {
    let mut c = Command::new("sh");
    c.arg("-c").arg(line);
    c
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    use std::os::windows::process::CommandExt;
    let mut c = Command::new("cmd");
    c.arg("/C").raw_arg(line);
    c
}

fn utf8(path: &Path) -> Result<&str, Pdf2ImgError> {
    path.to_str().ok_or_else(|| {
        Pdf2ImgError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "path is not valid UTF-8"),
        )
    })
}

fn truncate_lossy(bytes: &[u8], max: usize) -> String {
    let start = bytes.len().saturating_sub(max);
    String::from_utf8_lossy(&bytes[start..]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DpiMap;
    use std::path::PathBuf;

    fn config() -> GhostscriptConfig {
        GhostscriptConfig {
            executable: PathBuf::from("/usr/bin/gs"),
            workdir: PathBuf::from("/tmp"),
            dpi: DpiMap::GHOSTSCRIPT,
            jpeg_quality: 90,
            paper_size: "a4".to_string(),
            composite_inset: 0,
            launch: LaunchMode::Direct,
        }
    }

    fn command(input: &str) -> RasterizerCommand {
        RasterizerCommand::ghostscript(
            &config(),
            Path::new(input),
            OutputPattern::new("/tmp/pdf2jpg_0123", "jpg"),
            300,
        )
        .unwrap()
    }

    #[test]
    fn fixed_flag_set() {
        let args = command("/data/in.pdf").args().unwrap();
        for flag in [
            "-dBATCH",
            "-dNOPAUSE",
            "-dSAFER",
            "-q",
            "-sDEVICE=jpeg",
            "-dJPEGQ=90",
            "-r300",
            "-sPAPERSIZE=a4",
            "-dFIXEDMEDIA",
            "-dPDFFitPage",
        ] {
            assert!(args.iter().any(|a| a == flag), "missing {flag}: {args:?}");
        }
    }

    #[test]
    fn output_then_input_close_the_argument_list() {
        let args = command("/data/in.pdf").args().unwrap();
        let n = args.len();
        assert_eq!(args[n - 3], "-o");
        assert!(args[n - 2].ends_with("%04d.jpg"), "{}", args[n - 2]);
        assert_eq!(args[n - 1], "/data/in.pdf");
    }

    #[test]
    fn rendered_posix_line_escapes_every_part() {
        let line = command("/data/my report.pdf")
            .render(ShellFlavor::Posix)
            .unwrap();
        assert!(line.starts_with("'/usr/bin/gs' '-dBATCH' "), "{line}");
        assert!(line.contains("'-r300'"), "{line}");
        assert!(line.contains(" '-o' '/tmp/pdf2jpg_0123/%04d.jpg' "), "{line}");
        assert!(line.ends_with(" '/data/my report.pdf'"), "{line}");
    }

    #[test]
    fn rendered_windows_line_rejects_pipes() {
        let err = command("/data/a|b.pdf")
            .render(ShellFlavor::Windows)
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::UnescapableArgument { ch: '|', .. }));
    }

    #[test]
    fn truncate_keeps_tail() {
        assert_eq!(truncate_lossy(b"abcdef", 3), "def");
        assert_eq!(truncate_lossy(b"ab", 3), "ab");
    }

    #[test]
    fn launch_failure_carries_command_line() {
        let mut cfg = config();
        cfg.executable = PathBuf::from("/definitely/not/ghostscript");
        let cmd = RasterizerCommand::ghostscript(
            &cfg,
            Path::new("/data/in.pdf"),
            OutputPattern::new("/tmp/pdf2jpg_0123", "jpg"),
            30,
        )
        .unwrap();
        match cmd.run(LaunchMode::Direct).unwrap_err() {
            Pdf2ImgError::ToolLaunchFailed { command, .. } => {
                assert!(command.contains("/definitely/not/ghostscript"));
                assert!(command.contains("-r30"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
