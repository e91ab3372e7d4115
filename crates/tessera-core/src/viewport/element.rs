use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};

/// An RGBA drawing surface owned by an element.
#[derive(Clone, Debug, Default)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Resize to `width` x `height`. Contents are discarded when the size
    /// changes, the way a canvas is cleared by assigning its dimensions.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::new(width, height);
        }
    }

    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.image.pixels_mut() {
            *px = color;
        }
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.fill(Rgba([0, 0, 0, 0]));
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }
}

/// Host element a viewport draws into.
///
/// Client size is in CSS pixels; the surface is sized in device pixels by
/// the engine when the viewport is laid out.
#[derive(Clone, Debug)]
pub struct Element {
    pub id: String,
    pub client_width: f64,
    pub client_height: f64,
    pub tab_index: Option<i32>,
    attributes: BTreeMap<String, String>,
    surface: Surface,
}

impl Element {
    pub fn new(id: impl Into<String>, client_width: f64, client_height: f64) -> Self {
        Self {
            id: id.into(),
            client_width,
            client_height,
            tab_index: None,
            attributes: BTreeMap::new(),
            surface: Surface::default(),
        }
    }

    pub fn set_client_size(&mut self, width: f64, height: f64) {
        self.client_width = width;
        self.client_height = height;
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_owned(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }
}
