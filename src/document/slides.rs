//! Presentation document: slides, shapes and speaker notes

use super::{DocumentError, TextSource};
use crate::block::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideDeck {
    pub slides: Vec<Slide>,
}

/// One slide; shapes are walked before the speaker notes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// A text frame on a slide (title, body placeholder, text box)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub name: Option<String>,
    pub paragraphs: Vec<String>,
}

impl SlideDeck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slide(mut self, slide: Slide) -> Self {
        self.slides.push(slide);
        self
    }

    fn slot(&self, address: &Address) -> Option<&String> {
        match address.segments()?.as_slice() {
            [("slide", s), ("shape", h), ("p", p)] => {
                self.slides.get(*s)?.shapes.get(*h)?.paragraphs.get(*p)
            }
            [("slide", s), ("note", p)] => self.slides.get(*s)?.notes.get(*p),
            _ => None,
        }
    }

    fn slot_mut(&mut self, address: &Address) -> Option<&mut String> {
        match address.segments()?.as_slice() {
            [("slide", s), ("shape", h), ("p", p)] => self
                .slides
                .get_mut(*s)?
                .shapes
                .get_mut(*h)?
                .paragraphs
                .get_mut(*p),
            [("slide", s), ("note", p)] => self.slides.get_mut(*s)?.notes.get_mut(*p),
            _ => None,
        }
    }
}

impl Slide {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shape(mut self, paragraphs: &[&str]) -> Self {
        self.shapes.push(Shape {
            name: None,
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }
}

impl TextSource for SlideDeck {
    fn positions(&self) -> Vec<Address> {
        let mut positions = Vec::new();
        for (s, slide) in self.slides.iter().enumerate() {
            for (h, shape) in slide.shapes.iter().enumerate() {
                for p in 0..shape.paragraphs.len() {
                    positions.push(Address::from_path(&[("slide", s), ("shape", h), ("p", p)]));
                }
            }
            for n in 0..slide.notes.len() {
                positions.push(Address::from_path(&[("slide", s), ("note", n)]));
            }
        }
        positions
    }

    fn read(&self, address: &Address) -> Result<String, DocumentError> {
        self.slot(address)
            .cloned()
            .ok_or_else(|| DocumentError::UnknownAddress(address.clone()))
    }

    fn write(&mut self, address: &Address, text: &str) -> Result<(), DocumentError> {
        let slot = self
            .slot_mut(address)
            .ok_or_else(|| DocumentError::UnknownAddress(address.clone()))?;
        *slot = text.to_string();
        Ok(())
    }
}
