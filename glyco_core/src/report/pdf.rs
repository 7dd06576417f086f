//! Minimal PDF writer.
//!
//! Supports exactly what the report needs: fixed-size pages, text in the two
//! standard Helvetica faces, stroked lines and RGB raster images. Streams are
//! written uncompressed.

use crate::{Error, Result};
use std::fmt::Write as _;

/// ISO A4 in PDF user units
pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
}

/// Handle to an image embedded in a document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageId(usize);

/// Decoded raster image stored as packed 8-bit RGB
#[derive(Clone, Debug)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    rgb: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        color: Rgb,
        text: String,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: Rgb,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: ImageId,
    },
}

/// Document under construction
#[derive(Debug, Default)]
pub struct PdfDocument {
    pages: Vec<Vec<DrawOp>>,
    images: Vec<EmbeddedImage>,
}

impl PdfDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new page; later draw calls land on it
    pub fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Vec<DrawOp>] {
        &self.pages
    }

    pub fn image(&self, id: ImageId) -> &EmbeddedImage {
        &self.images[id.0]
    }

    fn push(&mut self, op: DrawOp) -> Result<()> {
        let page = self
            .pages
            .last_mut()
            .ok_or_else(|| Error::Report("drawing before any page was added".into()))?;
        page.push(op);
        Ok(())
    }

    pub fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        color: Rgb,
    ) -> Result<()> {
        self.push(DrawOp::Text {
            x,
            y,
            size,
            font,
            color,
            text: text.to_string(),
        })
    }

    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Rgb) -> Result<()> {
        self.push(DrawOp::Line {
            from,
            to,
            thickness,
            color,
        })
    }

    pub fn draw_image(&mut self, image: ImageId, x: f32, y: f32, width: f32, height: f32) -> Result<()> {
        self.push(DrawOp::Image {
            x,
            y,
            width,
            height,
            image,
        })
    }

    /// Decode an encoded image (PNG) and register it with the document
    pub fn embed_image(&mut self, encoded: &[u8]) -> Result<ImageId> {
        let decoded = image::load_from_memory(encoded)?.to_rgb8();
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Report("image has no pixels".into()));
        }
        self.images.push(EmbeddedImage {
            width,
            height,
            rgb: decoded.into_raw(),
        });
        Ok(ImageId(self.images.len() - 1))
    }

    /// Serialize the document
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(Error::Report("document has no pages".into()));
        }

        // 1 catalog, 2 page tree, 3-4 fonts, then images, then page/content pairs
        let first_image = 5;
        let first_page = first_image + self.images.len();
        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| first_page + i * 2).collect();

        let mut out = ObjectWriter::new();

        out.object(1, b"<< /Type /Catalog /Pages 2 0 R >>");

        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        out.object(
            2,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                self.pages.len()
            )
            .as_bytes(),
        );

        out.object(
            3,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        out.object(
            4,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
        );

        for (i, img) in self.images.iter().enumerate() {
            let header = format!(
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Length {} >>",
                img.width,
                img.height,
                img.rgb.len()
            );
            out.stream(first_image + i, &header, &img.rgb);
        }

        let xobjects: String = (0..self.images.len())
            .map(|i| format!("/Im{} {} 0 R", i, first_image + i))
            .collect::<Vec<_>>()
            .join(" ");

        for (ops, &page_id) in self.pages.iter().zip(&page_ids) {
            let content_id = page_id + 1;
            out.object(
                page_id,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R /F2 4 0 R >> /XObject << {} >> >> /Contents {} 0 R >>",
                    PAGE_WIDTH, PAGE_HEIGHT, xobjects, content_id
                )
                .as_bytes(),
            );

            let content = content_stream(ops);
            out.stream(
                content_id,
                &format!("<< /Length {} >>", content.len()),
                content.as_bytes(),
            );
        }

        Ok(out.finish(first_page + self.pages.len() * 2))
    }
}

fn content_stream(ops: &[DrawOp]) -> String {
    let mut s = String::new();
    for op in ops {
        // Writing to a String cannot fail
        let _ = match op {
            DrawOp::Text {
                x,
                y,
                size,
                font,
                color,
                text,
            } => writeln!(
                s,
                "BT /{} {} Tf {} {} {} rg {:.2} {:.2} Td ({}) Tj ET",
                font.resource_name(),
                size,
                color.0,
                color.1,
                color.2,
                x,
                y,
                escape_text(text)
            ),
            DrawOp::Line {
                from,
                to,
                thickness,
                color,
            } => writeln!(
                s,
                "q {} {} {} RG {} w {:.2} {:.2} m {:.2} {:.2} l S Q",
                color.0, color.1, color.2, thickness, from.0, from.1, to.0, to.1
            ),
            DrawOp::Image {
                x,
                y,
                width,
                height,
                image,
            } => writeln!(
                s,
                "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /Im{} Do Q",
                width, height, x, y, image.0
            ),
        };
    }
    s
}

/// Escape a string literal for WinAnsi text. Characters WinAnsiEncoding
/// cannot show become `?`.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            _ => match win_ansi_byte(c) {
                Some(byte) => {
                    let _ = write!(escaped, "\\{:03o}", byte);
                }
                None => escaped.push('?'),
            },
        }
    }
    escaped
}

/// WinAnsiEncoding byte for a character above ASCII
fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\u{a0}'..='\u{ff}' => c as u8,
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        _ => return None,
    };
    Some(byte)
}

/// Tracks byte offsets for the cross-reference table
struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl ObjectWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, dict: &str, data: &[u8]) {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(format!("{} 0 obj\n{}\nstream\n", id, dict).as_bytes());
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, object_count: usize) -> Vec<u8> {
        self.offsets.sort_by_key(|(id, _)| *id);
        let xref_offset = self.buf.len();

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", object_count);
        for (_, offset) in &self.offsets {
            let _ = write!(xref, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            object_count, xref_offset
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}
