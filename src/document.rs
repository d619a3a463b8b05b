//! Paginated PDF assembly
//!
//! Every [`RenderedImage`] becomes one page, in input order. Page size is an
//! explicit choice ([`PageSizing`]): either each page matches its own image
//! (1 px = 1 pt) or every page has one fixed size with the image stretched
//! over it.

use crate::model::{Document, RenderedImage};
use crate::workdir::WorkDir;
use crate::{Error, Result};
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::str::FromStr;

const IMAGE_NAME: &str = "Im0";

/// Page size policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSizing {
    /// Page size equals the image's pixel size
    #[default]
    MatchImage,
    /// Fixed page size in points; images are stretched to fill it
    Fixed { width: u32, height: u32 },
}

impl PageSizing {
    pub const LETTER: PageSizing = PageSizing::Fixed {
        width: 612,
        height: 792,
    };
    pub const A4: PageSizing = PageSizing::Fixed {
        width: 595,
        height: 842,
    };

    fn page_size(&self, image: &RenderedImage) -> (u32, u32) {
        match *self {
            PageSizing::MatchImage => (image.width(), image.height()),
            PageSizing::Fixed { width, height } => (width, height),
        }
    }
}

impl FromStr for PageSizing {
    type Err = String;

    /// `image`, `letter`, `a4` or `<width>x<height>` in points
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" | "match" => Ok(PageSizing::MatchImage),
            "letter" => Ok(PageSizing::LETTER),
            "a4" => Ok(PageSizing::A4),
            other => {
                let (w, h) = other
                    .split_once('x')
                    .ok_or_else(|| format!("expected image, letter, a4 or WxH, got {:?}", s))?;
                let width: u32 = w.parse().map_err(|_| format!("bad page width {:?}", w))?;
                let height: u32 = h.parse().map_err(|_| format!("bad page height {:?}", h))?;
                if width == 0 || height == 0 {
                    return Err("page size must be non-zero".into());
                }
                Ok(PageSizing::Fixed { width, height })
            }
        }
    }
}

/// Builds one PDF per call; holds configuration only.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    sizing: PageSizing,
    spool: Option<WorkDir>,
}

impl DocumentBuilder {
    pub fn new(sizing: PageSizing) -> Self {
        Self { sizing, spool: None }
    }

    /// Write the document through a temporary file in `dir` before reading it
    /// back. The file is removed whether or not the build succeeds.
    pub fn spool_to(mut self, dir: WorkDir) -> Self {
        self.spool = Some(dir);
        self
    }

    pub fn sizing(&self) -> PageSizing {
        self.sizing
    }

    pub fn build(&self, images: &[RenderedImage]) -> Result<Document> {
        if images.is_empty() {
            return Err(Error::DocumentBuild("No images to assemble".into()));
        }

        let mut doc = lopdf::Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(images.len());

        for image in images {
            let raster = Raster::decode(image.png())?;
            if raster.width != image.width() || raster.height != image.height() {
                return Err(Error::DocumentBuild(format!(
                    "Image {} declares {}x{} but holds {}x{}",
                    image.source_index(),
                    image.width(),
                    image.height(),
                    raster.width,
                    raster.height
                )));
            }

            let (page_width, page_height) = self.sizing.page_size(image);
            let image_id = raster.add_to(&mut doc);

            // Scale the unit square to the page and paint the image into it
            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            int(page_width),
                            0.into(),
                            0.into(),
                            int(page_height),
                            0.into(),
                            0.into(),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), int(page_width), int(page_height)],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        IMAGE_NAME => image_id,
                    },
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(page_count as i64),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let bytes = match &self.spool {
            Some(dir) => {
                let file = dir.temp_file("pdf")?;
                let mut out = BufWriter::new(File::create(file.path())?);
                doc.save_to(&mut out)
                    .map_err(|e| Error::DocumentBuild(format!("Failed to write PDF: {}", e)))?;
                out.flush()?;
                drop(out);
                fs::read(file.path())?
            }
            None => {
                let mut buffer = Vec::new();
                doc.save_to(&mut buffer)
                    .map_err(|e| Error::DocumentBuild(format!("Failed to write PDF: {}", e)))?;
                buffer
            }
        };

        debug!("Assembled {} page(s), {} bytes", page_count, bytes.len());
        Ok(Document { bytes, page_count })
    }
}

fn int(value: u32) -> Object {
    Object::Integer(i64::from(value))
}

/// Decoded 8-bit pixels split into color and alpha planes
struct Raster {
    width: u32,
    height: u32,
    color_space: &'static str,
    pixels: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl Raster {
    fn decode(png_bytes: &[u8]) -> Result<Self> {
        let mut decoder = png::Decoder::new(png_bytes);
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        buf.truncate(info.buffer_size());

        let (color_space, channels, has_alpha) = match info.color_type {
            png::ColorType::Rgb => ("DeviceRGB", 3, false),
            png::ColorType::Rgba => ("DeviceRGB", 4, true),
            png::ColorType::Grayscale => ("DeviceGray", 1, false),
            png::ColorType::GrayscaleAlpha => ("DeviceGray", 2, true),
            png::ColorType::Indexed => {
                return Err(Error::DocumentBuild("Palette PNG was not expanded".into()))
            }
        };

        if !has_alpha {
            return Ok(Raster {
                width: info.width,
                height: info.height,
                color_space,
                pixels: buf,
                alpha: None,
            });
        }

        let color_channels = channels - 1;
        let pixel_count = buf.len() / channels;
        let mut pixels = Vec::with_capacity(pixel_count * color_channels);
        let mut alpha = Vec::with_capacity(pixel_count);
        for px in buf.chunks_exact(channels) {
            pixels.extend_from_slice(&px[..color_channels]);
            alpha.push(px[color_channels]);
        }

        Ok(Raster {
            width: info.width,
            height: info.height,
            color_space,
            pixels,
            alpha: Some(alpha),
        })
    }

    /// Add the image (and its soft mask) as XObjects; streams are left raw
    /// for `Document::compress` to deflate.
    fn add_to(self, doc: &mut lopdf::Document) -> ObjectId {
        let (width, height) = (int(self.width), int(self.height));
        let smask_id = self.alpha.map(|alpha| {
            doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width.clone(),
                    "Height" => height.clone(),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            ))
        });

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => self.color_space,
            "BitsPerComponent" => 8,
        };
        if let Some(id) = smask_id {
            dict.set("SMask", id);
        }
        doc.add_object(Stream::new(dict, self.pixels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_of(width: u32, height: u32, color: png::ColorType) -> Vec<u8> {
        let channels = match color {
            png::ColorType::Rgb => 3,
            png::ColorType::Rgba => 4,
            png::ColorType::Grayscale => 1,
            png::ColorType::GrayscaleAlpha => 2,
            png::ColorType::Indexed => 1,
        };
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            let data = vec![0x80u8; (width * height) as usize * channels];
            writer.write_image_data(&data).unwrap();
        }
        out
    }

    fn image(width: u32, height: u32, index: usize) -> RenderedImage {
        RenderedImage::from_png(png_of(width, height, png::ColorType::Rgba), index).unwrap()
    }

    fn media_boxes(bytes: &[u8]) -> Vec<Vec<i64>> {
        let doc = lopdf::Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_object(*id).unwrap().as_dict().unwrap();
                page.get(b"MediaBox")
                    .unwrap()
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|o| o.as_i64().unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn pages_follow_image_sizes_in_order() {
        let images = vec![image(30, 40, 0), image(50, 20, 1), image(10, 10, 2)];
        let doc = DocumentBuilder::new(PageSizing::MatchImage).build(&images).unwrap();
        assert_eq!(doc.page_count, 3);
        assert!(doc.bytes.starts_with(b"%PDF-"));
        assert_eq!(
            media_boxes(&doc.bytes),
            vec![vec![0, 0, 30, 40], vec![0, 0, 50, 20], vec![0, 0, 10, 10]]
        );
    }

    #[test]
    fn fixed_sizing_uses_one_page_size() {
        let images = vec![image(30, 40, 0), image(50, 20, 1)];
        let doc = DocumentBuilder::new(PageSizing::LETTER).build(&images).unwrap();
        assert_eq!(
            media_boxes(&doc.bytes),
            vec![vec![0, 0, 612, 792], vec![0, 0, 612, 792]]
        );
    }

    #[test]
    fn opaque_and_gray_images_are_accepted() {
        let rgb = RenderedImage::from_png(png_of(4, 4, png::ColorType::Rgb), 0).unwrap();
        let gray = RenderedImage::from_png(png_of(4, 4, png::ColorType::GrayscaleAlpha), 1).unwrap();
        let doc = DocumentBuilder::new(PageSizing::MatchImage).build(&[rgb, gray]).unwrap();
        assert_eq!(doc.page_count, 2);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = DocumentBuilder::default().build(&[]).unwrap_err();
        assert!(matches!(err, Error::DocumentBuild(_)));
    }

    #[test]
    fn spooled_build_leaves_no_files() {
        let root = std::env::temp_dir().join(format!("tweetpress-spool-{}", std::process::id()));
        let builder = DocumentBuilder::new(PageSizing::MatchImage).spool_to(WorkDir::new(&root));
        let doc = builder.build(&[image(8, 8, 0)]).unwrap();
        assert_eq!(doc.page_count, 1);
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn builder_reports_its_sizing() {
        assert_eq!(DocumentBuilder::default().sizing(), PageSizing::MatchImage);
        let builder = DocumentBuilder::new("a4".parse().unwrap());
        assert_eq!(builder.sizing(), PageSizing::A4);
    }

    #[test]
    fn page_sizing_parses() {
        assert_eq!("image".parse::<PageSizing>().unwrap(), PageSizing::MatchImage);
        assert_eq!("A4".parse::<PageSizing>().unwrap(), PageSizing::A4);
        assert_eq!(
            "800x600".parse::<PageSizing>().unwrap(),
            PageSizing::Fixed {
                width: 800,
                height: 600
            }
        );
        assert!("0x5".parse::<PageSizing>().is_err());
        assert!("huge".parse::<PageSizing>().is_err());
    }
}
