use std::io::{self, Write};

use curator_catalog::ProductGroup;
use curator_core::{Handle, MissingInput};
use curator_session::{Notice, Presenter};

/// Plain-text presenter writing to any `Write` sink.
///
/// `Presenter` methods cannot fail, so the first write error is kept and
/// surfaced through [`TextPresenter::finish`].
#[derive(Debug)]
pub struct TextPresenter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Write one line unless an earlier write already failed.
    pub fn line(&mut self, text: impl AsRef<str>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", text.as_ref()) {
            self.error = Some(e);
        }
    }

    /// Flush and return the first write error, if any.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn render(&mut self, groups: &[ProductGroup], is_selected: &dyn Fn(&Handle) -> bool) {
        if groups.is_empty() {
            self.line("no products in the uploaded files");
            return;
        }

        for g in groups {
            let mark = if is_selected(&g.handle) { "[x]" } else { "[ ]" };
            let title = if g.title.is_empty() { "(untitled)" } else { g.title.as_str() };
            self.line(format!("{mark} {}  {title}", g.handle));
            match &g.image_src {
                Some(src) => self.line(format!("      image: {src}")),
                None => self.line("      image: none"),
            }
            if g.variants.is_empty() {
                self.line("      no stocked variants");
            }
            for v in &g.variants {
                self.line(format!("      {}: {}", v.sku, v.quantity));
            }
        }
    }

    fn prompt(&mut self, missing: MissingInput) {
        self.line(format!("upload {missing} to continue"));
    }

    fn notify(&mut self, notice: &Notice) {
        match notice {
            Notice::FileSkipped(f) => self.line(format!("warning: skipped {}: {}", f.name, f.reason)),
            Notice::UploadRejected(err) => self.line(format!("error: upload rejected: {err}")),
            Notice::DuplicateSkus(skus) => {
                let list: Vec<_> = skus.iter().map(|s| s.as_str()).collect();
                self.line(format!(
                    "warning: inventory lists these SKUs more than once: {}",
                    list.join(", ")
                ));
            }
        }
    }
}
