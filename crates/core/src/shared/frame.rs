use ndarray::{ArrayView3, ArrayViewMut3};

/// A single camera/video/image frame: contiguous RGB bytes in row-major order.
///
/// Color-space conversion (the camera's native BGR/YUV) happens at I/O
/// boundaries only; everything downstream sees RGB.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// An all-black RGB frame, used as the canvas for the "black cover" overlay.
    pub fn black(width: u32, height: u32, index: usize) -> Self {
        Self::new(
            vec![0; (width as usize) * (height as usize) * 3],
            width,
            height,
            3,
            index,
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Runs `draw` over the pixels as an [`image::RgbImage`] without copying them.
    /// Returns `None`, leaving the frame untouched, unless it is 3-channel RGB.
    pub fn with_rgb_image<R>(
        &mut self,
        draw: impl FnOnce(&mut image::RgbImage) -> R,
    ) -> Option<R> {
        if self.channels != 3 || self.data.len() != self.shape_len() {
            return None;
        }
        let data = std::mem::take(&mut self.data);
        let mut img = image::RgbImage::from_raw(self.width, self.height, data)?;
        let out = draw(&mut img);
        self.data = img.into_raw();
        Some(out)
    }

    /// Horizontally flipped copy, turning a camera image into a mirror view.
    pub fn mirrored(&self) -> Frame {
        let channels = self.channels as usize;
        let row_len = self.width as usize * channels;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_len) {
            for pixel in row.chunks_exact(channels).rev() {
                data.extend_from_slice(pixel);
            }
        }
        Frame::new(data, self.width, self.height, self.channels, self.index)
    }

    /// Bilinear resize to exactly `width` × `height`. Requires a 3-channel frame.
    pub fn resized(&self, width: u32, height: u32) -> Result<Frame, &'static str> {
        if self.channels != 3 {
            return Err("resize requires a 3-channel RGB frame");
        }
        if width == 0 || height == 0 {
            return Err("resize target must be non-empty");
        }
        let img = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or("frame data does not match its dimensions")?;
        let out =
            image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
        Ok(Frame::new(out.into_raw(), width, height, 3, self.index))
    }

    fn shape_len(&self) -> usize {
        let (h, w, c) = self.shape();
        h * w * c
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
