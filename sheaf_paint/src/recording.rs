// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`Canvas`] that records every call as a display list.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Rect, Stroke};
use peniko::Fill;
use sheaf_core::tree::{ImageKey, PictureId};

use crate::canvas::{Brush, Canvas, LayerStyle};

/// One recorded canvas call.
#[derive(Clone, Debug)]
pub enum Command {
    /// [`Canvas::push_clip`].
    PushClip {
        /// Path space to the canvas.
        transform: Affine,
        /// Clip geometry.
        path: BezPath,
        /// Winding rule.
        rule: Fill,
    },
    /// [`Canvas::pop_clip`].
    PopClip,
    /// [`Canvas::push_layer`].
    PushLayer {
        /// How the layer composites.
        style: LayerStyle,
        /// Bounds space to the canvas.
        transform: Affine,
        /// Layer bounds.
        bounds: Rect,
    },
    /// [`Canvas::pop_layer`].
    PopLayer,
    /// [`Canvas::fill`].
    Fill {
        /// Path space to the canvas.
        transform: Affine,
        /// Winding rule.
        rule: Fill,
        /// Paint.
        brush: Brush,
        /// Geometry.
        path: BezPath,
    },
    /// [`Canvas::stroke`].
    Stroke {
        /// Path space to the canvas.
        transform: Affine,
        /// Stroke style.
        stroke: Stroke,
        /// Paint.
        brush: Brush,
        /// Geometry.
        path: BezPath,
    },
    /// [`Canvas::fill_text`].
    FillText {
        /// Text space to the canvas.
        transform: Affine,
        /// Pen origin.
        origin: Point,
        /// Font size.
        font_size: f64,
        /// Characters.
        text: String,
        /// Paint.
        brush: Brush,
    },
    /// [`Canvas::draw_image`].
    DrawImage {
        /// Image space to the canvas.
        transform: Affine,
        /// Decoded image.
        image: ImageKey,
        /// Destination rectangle.
        dest: Rect,
    },
    /// [`Canvas::draw_picture`].
    DrawPicture {
        /// Picture space to the canvas.
        transform: Affine,
        /// Recorded content.
        picture: PictureId,
    },
}

/// The variant of a [`Command`], for counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// [`Command::PushClip`].
    PushClip,
    /// [`Command::PopClip`].
    PopClip,
    /// [`Command::PushLayer`].
    PushLayer,
    /// [`Command::PopLayer`].
    PopLayer,
    /// [`Command::Fill`].
    Fill,
    /// [`Command::Stroke`].
    Stroke,
    /// [`Command::FillText`].
    FillText,
    /// [`Command::DrawImage`].
    DrawImage,
    /// [`Command::DrawPicture`].
    DrawPicture,
}

impl Command {
    /// Returns the variant.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::PushClip { .. } => CommandKind::PushClip,
            Self::PopClip => CommandKind::PopClip,
            Self::PushLayer { .. } => CommandKind::PushLayer,
            Self::PopLayer => CommandKind::PopLayer,
            Self::Fill { .. } => CommandKind::Fill,
            Self::Stroke { .. } => CommandKind::Stroke,
            Self::FillText { .. } => CommandKind::FillText,
            Self::DrawImage { .. } => CommandKind::DrawImage,
            Self::DrawPicture { .. } => CommandKind::DrawPicture,
        }
    }
}

/// Returns whether every push in `commands` is matched by a pop of the same
/// kind, in order.
fn balanced(commands: &[Command]) -> bool {
    let mut open: Vec<CommandKind> = Vec::new();
    for c in commands {
        match c.kind() {
            CommandKind::PushClip | CommandKind::PushLayer => open.push(c.kind()),
            CommandKind::PopClip => {
                if open.pop() != Some(CommandKind::PushClip) {
                    return false;
                }
            }
            CommandKind::PopLayer => {
                if open.pop() != Some(CommandKind::PushLayer) {
                    return false;
                }
            }
            _ => {}
        }
    }
    open.is_empty()
}

/// Records canvas calls into a display list.
///
/// Top-level calls go to [`commands`](Self::commands); calls made between
/// [`begin_picture`](Canvas::begin_picture) and
/// [`end_picture`](Canvas::end_picture) go to that picture.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<Command>,
    pictures: Vec<(PictureId, Vec<Command>)>,
    recording: Vec<Vec<Command>>,
    released: Vec<PictureId>,
    next_picture: u32,
}

impl RecordingCanvas {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the top-level commands.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns how many top-level commands are of `kind`.
    #[must_use]
    pub fn count(&self, kind: CommandKind) -> usize {
        self.commands.iter().filter(|c| c.kind() == kind).count()
    }

    /// Returns the commands of a recorded picture.
    #[must_use]
    pub fn picture(&self, id: PictureId) -> Option<&[Command]> {
        self.pictures
            .iter()
            .find(|(p, _)| *p == id)
            .map(|(_, c)| c.as_slice())
    }

    /// Returns how many pictures have been recorded and not released.
    #[must_use]
    pub fn picture_count(&self) -> usize {
        self.pictures.len()
    }

    /// Returns the pictures released so far.
    #[must_use]
    pub fn released(&self) -> &[PictureId] {
        &self.released
    }

    /// Returns whether the top level and every picture close all the scopes
    /// they open, and no recording is left open.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.recording.is_empty()
            && balanced(&self.commands)
            && self.pictures.iter().all(|(_, c)| balanced(c))
    }

    /// Discards the top-level commands, keeping recorded pictures.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    fn target(&mut self) -> &mut Vec<Command> {
        match self.recording.last_mut() {
            Some(picture) => picture,
            None => &mut self.commands,
        }
    }
}

impl Canvas for RecordingCanvas {
    fn push_clip(&mut self, transform: Affine, path: &BezPath, rule: Fill) {
        self.target().push(Command::PushClip {
            transform,
            path: path.clone(),
            rule,
        });
    }

    fn pop_clip(&mut self) {
        self.target().push(Command::PopClip);
    }

    fn push_layer(&mut self, style: &LayerStyle, transform: Affine, bounds: Rect) {
        self.target().push(Command::PushLayer {
            style: style.clone(),
            transform,
            bounds,
        });
    }

    fn pop_layer(&mut self) {
        self.target().push(Command::PopLayer);
    }

    fn fill(&mut self, transform: Affine, rule: Fill, brush: &Brush, path: &BezPath) {
        self.target().push(Command::Fill {
            transform,
            rule,
            brush: brush.clone(),
            path: path.clone(),
        });
    }

    fn stroke(&mut self, transform: Affine, stroke: &Stroke, brush: &Brush, path: &BezPath) {
        self.target().push(Command::Stroke {
            transform,
            stroke: stroke.clone(),
            brush: brush.clone(),
            path: path.clone(),
        });
    }

    fn fill_text(&mut self, transform: Affine, origin: Point, font_size: f64, text: &str, brush: &Brush) {
        self.target().push(Command::FillText {
            transform,
            origin,
            font_size,
            text: text.to_string(),
            brush: brush.clone(),
        });
    }

    fn draw_image(&mut self, transform: Affine, image: ImageKey, dest: Rect) {
        self.target().push(Command::DrawImage {
            transform,
            image,
            dest,
        });
    }

    fn begin_picture(&mut self) {
        self.recording.push(Vec::new());
    }

    fn end_picture(&mut self) -> PictureId {
        let Some(commands) = self.recording.pop() else {
            panic!("end_picture without a matching begin_picture");
        };
        let id = PictureId(self.next_picture);
        self.next_picture += 1;
        self.pictures.push((id, commands));
        id
    }

    fn draw_picture(&mut self, transform: Affine, picture: PictureId) {
        self.target().push(Command::DrawPicture { transform, picture });
    }

    fn release_picture(&mut self, picture: PictureId) {
        self.pictures.retain(|(p, _)| *p != picture);
        self.released.push(picture);
    }
}

#[cfg(test)]
mod tests {
    use peniko::color::palette::css;

    use super::*;

    fn red() -> Brush {
        Brush::Solid(css::RED)
    }

    #[test]
    fn pictures_capture_nested_calls() {
        let mut c = RecordingCanvas::new();
        c.begin_picture();
        c.fill(Affine::IDENTITY, Fill::NonZero, &red(), &BezPath::new());
        let pic = c.end_picture();
        c.draw_picture(Affine::IDENTITY, pic);
        assert_eq!(c.count(CommandKind::Fill), 0, "the fill belongs to the picture");
        assert_eq!(c.count(CommandKind::DrawPicture), 1);
        assert_eq!(c.picture(pic).map(<[Command]>::len), Some(1));
        assert!(c.is_balanced());
    }

    #[test]
    fn mismatched_pops_are_unbalanced() {
        let mut c = RecordingCanvas::new();
        c.push_clip_rect(Affine::IDENTITY, Rect::new(0.0, 0.0, 1.0, 1.0));
        c.pop_layer();
        assert!(!c.is_balanced());

        let mut c = RecordingCanvas::new();
        c.push_layer(
            &LayerStyle::Group {
                blend: peniko::BlendMode::default(),
                alpha: 0.5,
            },
            Affine::IDENTITY,
            Rect::ZERO,
        );
        assert!(!c.is_balanced(), "an open layer is unbalanced");
        c.pop_layer();
        assert!(c.is_balanced());
    }

    #[test]
    fn open_recording_is_unbalanced() {
        let mut c = RecordingCanvas::new();
        c.begin_picture();
        assert!(!c.is_balanced());
    }

    #[test]
    fn release_drops_the_picture() {
        let mut c = RecordingCanvas::new();
        c.begin_picture();
        let pic = c.end_picture();
        assert_eq!(c.picture_count(), 1);
        c.release_picture(pic);
        assert_eq!(c.picture_count(), 0);
        assert_eq!(c.released(), &[pic]);
    }
}
