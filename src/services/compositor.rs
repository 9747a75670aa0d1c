//! Deterministic placement of a product cutout and brand logo on a generated
//! scene.

use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::Deserialize;
use strum::{Display, EnumString};

const LOGO_PADDING: i64 = 40;
const SHADOW_OFFSET: i64 = 6;
const SHADOW_BLUR_SIGMA: f32 = 10.0;

/// Pose of the persona's right hand, derived from the request's interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HandPose {
    /// Hand raised near the mouth.
    Drinking,
    /// Hand resting near the waist.
    Holding,
}

impl HandPose {
    /// Anything other than "drinking" is treated as holding.
    pub fn from_interaction(interaction: &str) -> Self {
        Self::from_str(interaction.trim()).unwrap_or(Self::Holding)
    }

    /// Top-left anchor for the product, as a fraction of the scene size.
    fn anchor(&self, width: u32, height: u32) -> (i64, i64) {
        let (fx, fy) = match self {
            Self::Drinking => (0.58, 0.42),
            Self::Holding => (0.62, 0.58),
        };
        (
            (width as f64 * fx) as i64,
            (height as f64 * fy) as i64,
        )
    }
}

/// Corner the logo is placed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogoPosition {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Overlays brand assets onto generated images.
#[derive(Clone)]
pub struct Compositor {
    product: Option<Arc<RgbaImage>>,
    logo: Option<Arc<RgbaImage>>,
    product_scale: f32,
    logo_scale: f32,
    logo_position: LogoPosition,
}

impl Compositor {
    pub fn new(
        product: Option<RgbaImage>,
        logo: Option<RgbaImage>,
        product_scale: f32,
        logo_scale: f32,
        logo_position: LogoPosition,
    ) -> Self {
        Self {
            product: product.map(Arc::new),
            logo: logo.map(Arc::new),
            product_scale,
            logo_scale,
            logo_position,
        }
    }

    /// Load brand assets from disk. Returns `None` when neither asset is configured.
    pub fn from_paths(
        product_path: Option<&Path>,
        logo_path: Option<&Path>,
        product_scale: f32,
        logo_scale: f32,
        logo_position: LogoPosition,
    ) -> Result<Option<Self>, CompositeError> {
        if product_path.is_none() && logo_path.is_none() {
            return Ok(None);
        }

        let product = product_path.map(load_asset).transpose()?;
        let logo = logo_path.map(load_asset).transpose()?;

        Ok(Some(Self::new(
            product,
            logo,
            product_scale,
            logo_scale,
            logo_position,
        )))
    }

    /// Apply the configured overlays to an encoded image, returning PNG bytes.
    pub fn compose(&self, base: &[u8], interaction: &str) -> Result<Vec<u8>, CompositeError> {
        let mut canvas = image::load_from_memory(base)
            .map_err(CompositeError::Decode)?
            .to_rgba8();

        if let Some(product) = &self.product {
            place_product_in_hand(
                &mut canvas,
                product,
                HandPose::from_interaction(interaction),
                self.product_scale,
            );
        }

        if let Some(logo) = &self.logo {
            place_logo(&mut canvas, logo, self.logo_position, self.logo_scale);
        }

        encode_png(canvas)
    }
}

fn load_asset(path: &Path) -> Result<RgbaImage, CompositeError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| CompositeError::Asset {
            path: path.display().to_string(),
            source,
        })
}

/// Resize to `scale` of `canvas_width`, keeping the aspect ratio.
fn scale_to_width(asset: &RgbaImage, canvas_width: u32, scale: f32) -> RgbaImage {
    let new_width = ((canvas_width as f32 * scale) as u32).max(1);
    let aspect = asset.height() as f32 / asset.width().max(1) as f32;
    let new_height = ((new_width as f32 * aspect) as u32).max(1);
    imageops::resize(asset, new_width, new_height, FilterType::Lanczos3)
}

/// Black silhouette of `asset` with its alpha softened.
fn drop_shadow(asset: &RgbaImage) -> RgbaImage {
    let mut shadow = asset.clone();
    for pixel in shadow.pixels_mut() {
        pixel.0[0] = 0;
        pixel.0[1] = 0;
        pixel.0[2] = 0;
    }
    imageops::blur(&shadow, SHADOW_BLUR_SIGMA)
}

pub fn place_product_in_hand(
    canvas: &mut RgbaImage,
    product: &RgbaImage,
    pose: HandPose,
    scale: f32,
) {
    let product = scale_to_width(product, canvas.width(), scale);
    let (x, y) = pose.anchor(canvas.width(), canvas.height());

    let shadow = drop_shadow(&product);
    imageops::overlay(canvas, &shadow, x + SHADOW_OFFSET, y + SHADOW_OFFSET);
    imageops::overlay(canvas, &product, x, y);
}

pub fn place_logo(canvas: &mut RgbaImage, logo: &RgbaImage, position: LogoPosition, scale: f32) {
    let logo = scale_to_width(logo, canvas.width(), scale);
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let (lw, lh) = (logo.width() as i64, logo.height() as i64);

    let (x, y) = match position {
        LogoPosition::TopLeft => (LOGO_PADDING, LOGO_PADDING),
        LogoPosition::TopRight => (cw - lw - LOGO_PADDING, LOGO_PADDING),
        LogoPosition::BottomLeft => (LOGO_PADDING, ch - lh - LOGO_PADDING),
        LogoPosition::BottomRight => (cw - lw - LOGO_PADDING, ch - lh - LOGO_PADDING),
    };

    imageops::overlay(canvas, &logo, x, y);
}

fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>, CompositeError> {
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Png)
        .map_err(CompositeError::Encode)?;
    Ok(out.into_inner())
}

#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    #[error("Failed to load brand asset {path}: {source}")]
    Asset {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to decode generated image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode composited image: {0}")]
    Encode(#[source] image::ImageError),
}
