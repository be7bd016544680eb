//! Page rasterization through the poppler `pdftoppm` tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context as _;
use tracing::info;

use crate::config::RasterConfig;
use crate::foundation::error::{RecapError, RecapResult};
use crate::plan::project::pdf_base_name;
use crate::providers::PageRasterizer;

const SCRATCH_PREFIX: &str = "page";

/// [`PageRasterizer`] backed by the system `pdftoppm` binary.
#[derive(Clone, Debug)]
pub struct PdftoppmRasterizer {
    dpi: u32,
    format: String,
}

impl PdftoppmRasterizer {
    /// Create a rasterizer from config (`format` is `jpeg` or `png`).
    pub fn new(cfg: &RasterConfig) -> RecapResult<Self> {
        if !matches!(cfg.format.as_str(), "jpeg" | "png") {
            return Err(RecapError::validation(format!(
                "unsupported raster format '{}'",
                cfg.format
            )));
        }
        Ok(Self {
            dpi: cfg.dpi,
            format: cfg.format.clone(),
        })
    }

    fn output_extension(&self) -> &'static str {
        if self.format == "png" { "png" } else { "jpg" }
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    #[tracing::instrument(skip(self))]
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> RecapResult<Vec<PathBuf>> {
        if !pdf.is_file() {
            return Err(RecapError::missing_input(pdf));
        }
        let base = pdf_base_name(pdf);
        let scratch = out_dir.join(format!(".raster-{base}"));
        if scratch.exists() {
            std::fs::remove_dir_all(&scratch)
                .with_context(|| format!("clear scratch dir '{}'", scratch.display()))?;
        }
        std::fs::create_dir_all(&scratch)
            .with_context(|| format!("create scratch dir '{}'", scratch.display()))?;

        let out = Command::new("pdftoppm")
            .arg(format!("-{}", self.format))
            .args(["-r", &self.dpi.to_string()])
            .arg(pdf)
            .arg(scratch.join(SCRATCH_PREFIX))
            .output()
            .map_err(|e| {
                RecapError::media(format!(
                    "failed to spawn pdftoppm (is poppler installed and on PATH?): {e}"
                ))
            })?;
        if !out.status.success() {
            return Err(RecapError::media(format!(
                "pdftoppm failed for '{}': {}",
                pdf.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let mut pages = Vec::new();
        for entry in std::fs::read_dir(&scratch)
            .with_context(|| format!("list scratch dir '{}'", scratch.display()))?
        {
            let path = entry.context("read scratch dir entry")?.path();
            let is_page = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.output_extension());
            if !is_page {
                continue;
            }
            let number = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| scratch_page_number(s, SCRATCH_PREFIX));
            if let Some(n) = number {
                pages.push((n, path));
            }
        }
        pages.sort_by_key(|(n, _)| *n);

        let mut images = Vec::with_capacity(pages.len());
        for (n, src) in pages {
            let dst = out_dir.join(page_image_name(&base, n, &self.format));
            std::fs::rename(&src, &dst)
                .with_context(|| format!("move page image to '{}'", dst.display()))?;
            images.push(dst);
        }
        std::fs::remove_dir_all(&scratch)
            .with_context(|| format!("remove scratch dir '{}'", scratch.display()))?;

        info!(pages = images.len(), dir = %out_dir.display(), "rasterized pdf");
        Ok(images)
    }
}

/// Page number of a `pdftoppm` output stem such as `page-07`.
pub(crate) fn scratch_page_number(stem: &str, prefix: &str) -> Option<u32> {
    stem.strip_prefix(prefix)?.strip_prefix('-')?.parse().ok()
}

/// Final page image name: `<base>_page_NNN.<format>` with a 1-based page number.
pub(crate) fn page_image_name(base: &str, page: u32, format: &str) -> String {
    format!("{base}_page_{page:03}.{format}")
}

/// Return `true` when `pdftoppm` can be invoked from `PATH`.
pub fn is_pdftoppm_on_path() -> bool {
    Command::new("pdftoppm")
        .arg("-v")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/providers/pdftoppm.rs"]
mod tests;
