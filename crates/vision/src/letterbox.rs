use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use ndarray::{Array, ArrayD, IxDyn};

/// Per-frame record of the letterbox transform. Produced once right before
/// inference and read back when mapping boxes into source coordinates; the
/// next frame's geometry supersedes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxGeometry {
    /// Uniform source-to-padded scale, identical on both axes.
    pub scale: f32,
    /// Pixel offset of the scaled image inside the padded square.
    pub pad_x: u32,
    pub pad_y: u32,
    pub padded_w: u32,
    pub padded_h: u32,
    pub source_w: u32,
    pub source_h: u32,
}

/// Axis-aligned rectangle in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Corner-form float rectangle in padded (network input) pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Fits arbitrary RGB frames into a fixed network-input square, preserving
/// aspect ratio and padding the remainder with a fill color.
///
/// Buffers are reused across frames.
pub struct Letterboxer {
    input_size: (u32, u32),
    fill_color: [u8; 3],
    rgb_buffer: Vec<u8>,
    letterboxed_buffer: Vec<u8>,
}

impl Letterboxer {
    pub fn new(input_size: (u32, u32), fill_color: [u8; 3]) -> Self {
        Self {
            input_size,
            fill_color,
            rgb_buffer: Vec::with_capacity(1920 * 1080 * 3),
            letterboxed_buffer: vec![0u8; (input_size.0 * input_size.1 * 3) as usize],
        }
    }

    /// Letterbox one RGB frame and normalize it into a `[1, 3, H, W]` f32
    /// tensor scaled to `[0, 1]`. Returns the tensor together with the
    /// geometry needed to invert the transform.
    pub fn letterbox(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<(ArrayD<f32>, LetterboxGeometry)> {
        if width == 0 || height == 0 {
            anyhow::bail!("Source image has zero extent: {}x{}", width, height);
        }

        let expected_size = (width * height * 3) as usize;
        if pixels.len() != expected_size {
            anyhow::bail!(
                "Buffer size mismatch: expected {}, got {} bytes",
                expected_size,
                pixels.len()
            );
        }

        let (target_w, target_h) = self.input_size;
        let scale = (target_w as f32 / width as f32).min(target_h as f32 / height as f32);
        let new_width = ((width as f32 * scale).round() as u32).clamp(1, target_w);
        let new_height = ((height as f32 * scale).round() as u32).clamp(1, target_h);

        // Remainder split evenly, odd leftover pixel on the trailing side.
        let pad_x = (target_w - new_width) / 2;
        let pad_y = (target_h - new_height) / 2;

        self.rgb_buffer.clear();
        self.rgb_buffer.extend_from_slice(pixels);

        let src = Image::from_slice_u8(width, height, &mut self.rgb_buffer, PixelType::U8x3)?;
        let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        for px in self.letterboxed_buffer.chunks_exact_mut(3) {
            px.copy_from_slice(&self.fill_color);
        }

        let resized_data = resized.buffer();
        let stride = target_w * 3;

        for y in 0..new_height {
            let src_row = (y * new_width * 3) as usize;
            let dst_row = ((y + pad_y) * stride + pad_x * 3) as usize;

            self.letterboxed_buffer[dst_row..dst_row + (new_width * 3) as usize]
                .copy_from_slice(&resized_data[src_row..src_row + (new_width * 3) as usize]);
        }

        let tensor = Self::normalize(&self.letterboxed_buffer, target_w, target_h)?;

        let geometry = LetterboxGeometry {
            scale,
            pad_x,
            pad_y,
            padded_w: target_w,
            padded_h: target_h,
            source_w: width,
            source_h: height,
        };

        Ok((tensor, geometry))
    }

    fn normalize(buffer: &[u8], width: u32, height: u32) -> anyhow::Result<ArrayD<f32>> {
        let width = width as usize;
        let height = height as usize;
        let spatial = width * height;

        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in buffer.chunks_exact(3).enumerate() {
            output[i] = px[0] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[2] as f32 / 255.0;
        }

        Ok(Array::from_shape_vec(
            IxDyn(&[1, 3, height, width]),
            output,
        )?)
    }
}

/// Map a corner-form box from padded space back into source-image pixels.
///
/// Padding offsets are removed, corners divided by the uniform scale, rounded
/// half-away-from-zero, and the result clipped to the source bounds. Returns
/// `None` when the clipped extent collapses to zero or less; callers discard
/// such candidates rather than treating them as errors.
pub fn from_letterbox(rect: RectF, geometry: &LetterboxGeometry) -> Option<Rect> {
    let x0 = (rect.x - geometry.pad_x as f32) / geometry.scale;
    let y0 = (rect.y - geometry.pad_y as f32) / geometry.scale;
    let x1 = (rect.x + rect.width - geometry.pad_x as f32) / geometry.scale;
    let y1 = (rect.y + rect.height - geometry.pad_y as f32) / geometry.scale;

    let ix = (x0.round() as i32).max(0);
    let iy = (y0.round() as i32).max(0);
    let iw = (x1.round() as i32).min(geometry.source_w as i32) - ix;
    let ih = (y1.round() as i32).min(geometry.source_h as i32) - iy;

    if iw <= 0 || ih <= 0 {
        return None;
    }

    Some(Rect {
        x: ix,
        y: iy,
        width: iw,
        height: ih,
    })
}
