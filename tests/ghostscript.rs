//! Process-engine integration tests.
//!
//! A generated shell script stands in for Ghostscript: it records its
//! arguments, then copies prepared JPEG fixtures to the `-o` template the
//! way `gs` would name its output. No real Ghostscript is needed.
#![cfg(unix)]

use edgequake_pdf2img::{
    as_one_async, as_one_per_page_async, build_engine, EngineConfig, ErrorCategory,
    GhostscriptConfig, GhostscriptPdfImage, LaunchMode, Pdf2ImgError, PdfImage, PdfInput,
    SizeClass,
};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::{BufReader, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Tests in this file run one at a time: exec'ing a freshly written script
/// fails with ETXTBSY if another thread forks while it is still open.
static SERIAL: Mutex<()> = Mutex::new(());

/// Scratch layout: `fixtures/` (page JPEGs), `work/` (engine root),
/// `gs` (the fake rasterizer), `args.log`, and `doc.pdf`.
struct Harness {
    root: TempDir,
    _serial: MutexGuard<'static, ()>,
}

impl Harness {
    /// `pages` are (width, height) of the JPEGs the fake tool will emit.
    fn new(pages: &[(u32, u32)]) -> Self {
        init_tracing();
        let serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let root = tempfile::tempdir().unwrap();
        let fixtures = root.path().join("fixtures");
        std::fs::create_dir(&fixtures).unwrap();
        std::fs::create_dir(root.path().join("work")).unwrap();
        for (i, (w, h)) in pages.iter().enumerate() {
            RgbImage::from_pixel(*w, *h, Rgb([30, 60, 90]))
                .save_with_format(fixtures.join(format!("{:03}.jpg", i + 1)), ImageFormat::Jpeg)
                .unwrap();
        }
        std::fs::write(root.path().join("doc.pdf"), b"%PDF-1.7\n% fake\n").unwrap();

        let h = Self {
            root,
            _serial: serial,
        };
        h.write_tool(&format!(
            r#"#!/bin/sh
printf '%s\n' "$@" > '{log}'
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
done
n=1
for f in '{fixtures}'/*.jpg; do
  [ -e "$f" ] || continue
  cp "$f" "$(printf "$out" "$n")"
  n=$((n + 1))
done
"#,
            log = h.log_path().display(),
            fixtures = fixtures.display(),
        ));
        h
    }

    fn write_tool(&self, script: &str) {
        let tool = self.tool();
        std::fs::write(&tool, script).unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn tool(&self) -> PathBuf {
        self.root.path().join("gs")
    }

    fn work(&self) -> PathBuf {
        self.root.path().join("work")
    }

    fn pdf(&self) -> PdfInput {
        PdfInput::from(self.root.path().join("doc.pdf"))
    }

    fn log_path(&self) -> PathBuf {
        self.root.path().join("args.log")
    }

    fn logged_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_path())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    fn engine(&self) -> GhostscriptPdfImage {
        self.engine_with(LaunchMode::Direct)
    }

    fn engine_with(&self, launch: LaunchMode) -> GhostscriptPdfImage {
        let config = GhostscriptConfig::builder(self.tool(), self.work())
            .launch(launch)
            .build()
            .expect("valid config");
        GhostscriptPdfImage::new(config).expect("engine")
    }

    fn work_entries(&self) -> usize {
        std::fs::read_dir(self.work()).unwrap().count()
    }
}

/// Decode with the image crate, independently of the descriptor's claims.
fn decode(stream: &mut dyn edgequake_pdf2img::ImageStream) -> (ImageFormat, u32, u32) {
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).unwrap();
    let format = image::guess_format(&bytes).unwrap();
    let img = image::load(BufReader::new(std::io::Cursor::new(bytes)), format).unwrap();
    (format, img.width(), img.height())
}

// ── as_one_per_page ──────────────────────────────────────────────────────────

#[test]
fn per_page_returns_every_page_in_order() {
    let h = Harness::new(&[(40, 60), (40, 60)]);
    let mut pages = h
        .engine()
        .as_one_per_page(&h.pdf(), SizeClass::Normal)
        .expect("conversion should succeed");

    assert_eq!(pages.page_numbers().collect::<Vec<_>>(), vec![1, 2]);
    for page in pages.iter_mut() {
        let img = &mut page.image;
        assert_eq!((img.width(), img.height()), (40, 60));
        assert_eq!(img.mime_type(), "image/jpeg");
        assert_eq!(decode(img.stream()), (ImageFormat::Jpeg, 40, 60));
    }

    let args = h.logged_args();
    assert!(args.contains(&"-r300".to_string()), "{args:?}");
    assert!(args.contains(&"-sDEVICE=jpeg".to_string()), "{args:?}");
    assert!(args.contains(&"-dJPEGQ=90".to_string()), "{args:?}");
    assert_eq!(args.last().unwrap(), &h.root.path().join("doc.pdf").display().to_string());

    let workdir = pages.workdir().unwrap().to_path_buf();
    assert!(workdir.starts_with(h.work()));
    assert!(workdir.join("0001.jpg").is_file());
    pages.cleanup().unwrap();
    assert!(!workdir.exists());
}

#[test]
fn thumbnail_uses_thumbnail_dpi() {
    let h = Harness::new(&[(9, 14)]);
    let pages = h
        .engine()
        .as_one_per_page(&h.pdf(), SizeClass::Thumbnail)
        .unwrap();
    assert_eq!(pages.len(), 1);
    assert!(h.logged_args().contains(&"-r30".to_string()));
    pages.cleanup().unwrap();
}

#[test]
fn pages_are_ordered_numerically_past_nine() {
    let sizes: Vec<(u32, u32)> = (1..=11).map(|i| (10, i)).collect();
    let h = Harness::new(&sizes);
    let pages = h.engine().as_one_per_page(&h.pdf(), SizeClass::Normal).unwrap();
    let heights: Vec<u32> = pages.iter().map(|p| p.image.height()).collect();
    assert_eq!(heights, (1..=11).collect::<Vec<_>>());
    pages.cleanup().unwrap();
}

#[test]
fn in_memory_pdf_is_written_into_the_workdir() {
    let h = Harness::new(&[(8, 8)]);
    let bytes = std::fs::read(h.root.path().join("doc.pdf")).unwrap();
    let pages = h
        .engine()
        .as_one_per_page(&PdfInput::from_reader(&bytes[..]).unwrap(), SizeClass::Normal)
        .unwrap();

    let workdir = pages.workdir().unwrap().to_path_buf();
    assert_eq!(
        h.logged_args().last().unwrap(),
        &workdir.join("input.pdf").display().to_string()
    );
    assert_eq!(pages.len(), 1);
    pages.cleanup().unwrap();
}

#[test]
fn shell_launch_mode_produces_the_same_pages() {
    let h = Harness::new(&[(12, 20), (12, 20)]);
    let pages = h
        .engine_with(LaunchMode::Shell)
        .as_one_per_page(&h.pdf(), SizeClass::Normal)
        .unwrap();
    assert_eq!(pages.len(), 2);
    assert!(h.logged_args().iter().any(|a| a.ends_with("%04d.jpg")));
    pages.cleanup().unwrap();
}

#[test]
fn percent_in_workdir_root_is_not_expanded() {
    let h = Harness::new(&[(16, 24), (16, 24)]);
    let root = h.root.path().join("jobs_100%done").join("w%d");
    std::fs::create_dir_all(&root).unwrap();

    for launch in [LaunchMode::Direct, LaunchMode::Shell] {
        let config = GhostscriptConfig::builder(h.tool(), &root)
            .launch(launch)
            .build()
            .unwrap();
        let pages = GhostscriptPdfImage::new(config)
            .unwrap()
            .as_one_per_page(&h.pdf(), SizeClass::Normal)
            .unwrap_or_else(|e| panic!("{launch:?}: {e}"));

        assert_eq!(pages.page_numbers().collect::<Vec<_>>(), vec![1, 2]);
        let workdir = pages.workdir().unwrap().to_path_buf();
        assert!(workdir.starts_with(&root), "{}", workdir.display());
        assert!(workdir.join("0002.jpg").is_file());
        assert!(
            h.logged_args().iter().any(|a| a.contains("jobs_100%%done/w%%d/")),
            "{:?}",
            h.logged_args()
        );
        pages.cleanup().unwrap();
    }
    assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    assert!(!h.root.path().join("jobs_1001one").exists());
}

#[test]
fn repeated_conversions_are_idempotent_in_size() {
    let h = Harness::new(&[(25, 35), (25, 35)]);
    let engine = h.engine();
    let a = engine.as_one_per_page(&h.pdf(), SizeClass::Normal).unwrap();
    let b = engine.as_one_per_page(&h.pdf(), SizeClass::Normal).unwrap();

    let dims = |p: &edgequake_pdf2img::RenderedPages| {
        p.iter()
            .map(|pg| (pg.page, pg.image.width(), pg.image.height()))
            .collect::<Vec<_>>()
    };
    assert_eq!(dims(&a), dims(&b));
    assert_ne!(a.workdir(), b.workdir());
    a.cleanup().unwrap();
    b.cleanup().unwrap();
    assert_eq!(h.work_entries(), 0);
}

// ── as_one ───────────────────────────────────────────────────────────────────

#[test]
fn as_one_stacks_pages_and_removes_workdir() {
    let h = Harness::new(&[(40, 60), (30, 50)]);
    let mut one = h
        .engine()
        .as_one(&h.pdf(), SizeClass::Normal)
        .expect("composite should succeed");

    assert_eq!((one.width(), one.height()), (40, 110));
    assert_eq!(one.mime_type(), "image/jpeg");
    assert_eq!(decode(one.stream()), (ImageFormat::Jpeg, 40, 110));
    assert_eq!(h.work_entries(), 0);
}

#[test]
fn as_one_of_uniform_pages_is_double_height() {
    let h = Harness::new(&[(99, 140), (99, 140)]);
    let one = h.engine().as_one(&h.pdf(), SizeClass::Thumbnail).unwrap();
    assert_eq!((one.width(), one.height()), (99, 280));
}

#[tokio::test]
async fn runtime_selected_engine_runs_on_the_blocking_pool() {
    let h = Harness::new(&[(10, 10), (10, 6)]);
    let config = GhostscriptConfig::builder(h.tool(), h.work()).build().unwrap();
    let engine: Arc<dyn PdfImage> =
        Arc::from(build_engine(EngineConfig::Ghostscript(config)).unwrap());

    let pages = as_one_per_page_async(engine.clone(), h.pdf(), SizeClass::Normal)
        .await
        .unwrap();
    assert_eq!(pages.len(), 2);
    pages.cleanup().unwrap();

    let one = as_one_async(engine, h.pdf(), SizeClass::Thumbnail)
        .await
        .unwrap();
    assert_eq!((one.width(), one.height()), (10, 16));
    assert_eq!(h.work_entries(), 0);
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[test]
fn non_zero_exit_is_an_external_tool_error_with_the_command() {
    let h = Harness::new(&[(8, 8)]);
    h.write_tool("#!/bin/sh\necho 'Error: /undefined in --file--' >&2\nexit 3\n");

    let err = h
        .engine()
        .as_one_per_page(&h.pdf(), SizeClass::Normal)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::ExternalTool);
    match &err {
        Pdf2ImgError::ToolFailed {
            command, stderr, ..
        } => {
            assert!(command.contains(&h.tool().display().to_string()), "{command}");
            assert!(command.contains("'-r300'"), "{command}");
            assert!(stderr.contains("/undefined"), "{stderr}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.work_entries(), 0, "failed conversions leave nothing behind");
}

#[test]
fn silent_tool_without_output_is_an_error() {
    let h = Harness::new(&[(8, 8)]);
    h.write_tool("#!/bin/sh\nexit 0\n");
    let err = h
        .engine()
        .as_one(&h.pdf(), SizeClass::Normal)
        .unwrap_err();
    assert!(matches!(err, Pdf2ImgError::NoPagesRendered { .. }), "{err}");
    assert_eq!(h.work_entries(), 0);
}

#[test]
fn corrupt_page_output_fails_the_whole_request() {
    let h = Harness::new(&[(8, 8)]);
    h.write_tool(
        "#!/bin/sh\nfor a in \"$@\"; do prev_out=\"$out\"; out=\"$a\"; done\n\
         d=$(dirname \"$prev_out\")\nprintf 'junk' > \"$d/0001.jpg\"\n",
    );
    let err = h
        .engine()
        .as_one_per_page(&h.pdf(), SizeClass::Normal)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnsupportedImage, "{err}");
}

#[test]
fn unknown_size_is_rejected_before_anything_runs() {
    let h = Harness::new(&[(8, 8)]);
    let err = "poster".parse::<SizeClass>().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(!h.log_path().exists());
    assert_eq!(h.work_entries(), 0);
}

#[test]
fn construction_rejects_bad_paths() {
    let h = Harness::new(&[]);
    let missing = GhostscriptConfig::builder(h.root.path().join("no-gs"), h.work()).build();
    assert!(matches!(missing, Err(Pdf2ImgError::NotExecutable { .. })));

    let not_dir = GhostscriptConfig::builder(h.tool(), h.root.path().join("doc.pdf")).build();
    assert!(matches!(not_dir, Err(Pdf2ImgError::NotADirectory { .. })));
}

#[test]
fn missing_pdf_is_io_error() {
    let h = Harness::new(&[(8, 8)]);
    let err = h
        .engine()
        .as_one_per_page(&PdfInput::from(Path::new("/definitely/not/here.pdf")), SizeClass::Normal)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);
    assert!(!h.log_path().exists());
}
