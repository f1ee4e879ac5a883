use std::path::PathBuf;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn unique_temp_path(suffix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!("praster_{suffix}_{}_{}", process::id(), nanos));
    path
}

pub(crate) struct FixturePage {
    width: f32,
    height: f32,
    content: String,
    annotations: Vec<FixtureAnnotation>,
}

/// `/Square` annotation whose normal appearance fills its whole rect.
struct FixtureAnnotation {
    rgb: [f32; 3],
    rect: [f32; 4],
}

impl FixturePage {
    pub(crate) fn blank(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            content: String::new(),
            annotations: Vec::new(),
        }
    }

    pub(crate) fn filled(width: f32, height: f32, rgb: [f32; 3]) -> Self {
        Self::blank(width, height).with_rect(rgb, [0.0, 0.0, width, height])
    }

    pub(crate) fn text(width: f32, height: f32, text: &str) -> Self {
        let escaped = escape_literal_string(text);
        Self {
            width,
            height,
            content: format!("BT /F1 14 Tf 20 {} Td ({escaped}) Tj ET", height - 40.0),
            annotations: Vec::new(),
        }
    }

    /// Adds a filled rectangle `[x, y, w, h]` in PDF user space (origin at the
    /// bottom-left corner).
    pub(crate) fn with_rect(mut self, [r, g, b]: [f32; 3], [x, y, w, h]: [f32; 4]) -> Self {
        if !self.content.is_empty() {
            self.content.push('\n');
        }
        self.content
            .push_str(&format!("{r} {g} {b} rg {x} {y} {w} {h} re f"));
        self
    }

    /// Adds an annotation covering `[x, y, w, h]`. Its color only shows up if
    /// the renderer draws annotation appearance streams.
    pub(crate) fn with_square_annotation(mut self, rgb: [f32; 3], rect: [f32; 4]) -> Self {
        self.annotations.push(FixtureAnnotation { rgb, rect });
        self
    }
}

pub(crate) fn build_pdf(pages: &[FixturePage]) -> Vec<u8> {
    // Object ids are 1-based positions in `objects`; the page tree slot is
    // filled once the page ids are known.
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        String::new(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut page_ids = Vec::with_capacity(pages.len());
    for page in pages {
        let page_id = objects.len() + 1;
        let content_id = page_id + 1;
        page_ids.push(page_id);
        objects.push(String::new());
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            page.content.len(),
            page.content
        ));

        let mut annot_ids = Vec::with_capacity(page.annotations.len());
        for annotation in &page.annotations {
            let annot_id = objects.len() + 1;
            let appearance_id = annot_id + 1;
            annot_ids.push(format!("{annot_id} 0 R"));

            let [x, y, w, h] = annotation.rect;
            let [r, g, b] = annotation.rgb;
            objects.push(format!(
                "<< /Type /Annot /Subtype /Square /F 4 /Rect [{x} {y} {} {}] /AP << /N {appearance_id} 0 R >> >>",
                x + w,
                y + h
            ));
            let appearance = format!("{r} {g} {b} rg 0 0 {w} {h} re f");
            objects.push(format!(
                "<< /Type /XObject /Subtype /Form /BBox [0 0 {w} {h}] /Length {} >>\nstream\n{appearance}\nendstream",
                appearance.len()
            ));
        }

        let annots = if annot_ids.is_empty() {
            String::new()
        } else {
            format!(" /Annots [{}]", annot_ids.join(" "))
        };
        objects[page_id - 1] = format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R{annots} >>",
            page.width, page.height
        );
    }

    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    objects[1] = format!(
        "<< /Type /Pages /Kids [{kids}] /Count {} >>",
        pages.len()
    );

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::new();
    for (index, object) in objects.iter().enumerate() {
        let object_id = index + 1;
        offsets.push(bytes.len());
        bytes.extend_from_slice(format!("{object_id} 0 obj\n{object}\nendobj\n").as_bytes());
    }

    let xref_start = bytes.len();
    bytes.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    bytes.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        bytes.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }

    bytes.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );

    bytes
}

fn escape_literal_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }

    out
}
