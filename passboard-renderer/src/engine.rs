//! Tera rendering engine: [`TemplateEngine`] and [`Renderer`].
//!
//! Templates are registered under their output-style name (`listing.html`),
//! so Tera's default autoescaping for `.html` applies to record fields.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use passboard_core::types::Record;
use passboard_core::RegionMarker;

use crate::context::ListingContext;
use crate::error::RenderError;
use crate::region::{locate_region, replace_region};

/// Name of the card listing template.
pub const LISTING_TEMPLATE: &str = "listing.html";

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[(LISTING_TEMPLATE, include_str!("templates/listing.html.tera"))];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

/// `Cards/Listing.html.tera` → `cards/listing.html`.
fn normalize_template_name(path: &Path) -> String {
    let name = path.to_string_lossy().replace('\\', "/").to_lowercase();
    match name.strip_suffix(".tera") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    files.sort();
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert((*name).to_string(), (*content).to_string());
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that override embedded
/// defaults; `listing.html.tera` replaces the card listing.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render the card listing for `ctx`.
    pub fn render_listing(&self, ctx: &ListingContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(LISTING_TEMPLATE, &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders records into the listing region of a document.
///
/// Create once per process and reuse; it holds the compiled templates.
pub struct Renderer {
    engine: TemplateEngine,
    marker: RegionMarker,
}

impl Renderer {
    /// Renderer with embedded templates only.
    pub fn new(marker: RegionMarker) -> Result<Self, RenderError> {
        Self::with_template_dir(marker, None)
    }

    /// Renderer whose templates may be overridden from `template_dir`.
    pub fn with_template_dir(marker: RegionMarker, template_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Renderer {
            engine: TemplateEngine::new(template_dir)?,
            marker,
        })
    }

    pub fn marker(&self) -> &RegionMarker {
        &self.marker
    }

    /// Render one card per record, in the given order.
    pub fn render_listing(&self, records: &[Record]) -> Result<String, RenderError> {
        self.engine.render_listing(&ListingContext::from_records(records))
    }

    /// Return `document` with its listing region replaced by the rendered
    /// cards. Bytes outside the region are preserved exactly.
    ///
    /// Fails with a structural [`RenderError`] when the region is missing,
    /// ambiguous or unclosed; no partial output is produced.
    pub fn render_document(&self, document: &str, records: &[Record]) -> Result<String, RenderError> {
        let region = locate_region(document, &self.marker)?;
        let listing = self.render_listing(records)?;
        let indent = region.indent(document);
        let inner = indent_block(&listing, indent);
        Ok(replace_region(document, &region, &inner, self.marker.label.as_deref()))
    }
}

/// Place each listing line one level under the region's own indentation.
fn indent_block(listing: &str, indent: &str) -> String {
    let child = format!("{indent}  ");
    let mut out = String::from("\n");
    for line in listing.lines() {
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(&child);
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(indent);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
