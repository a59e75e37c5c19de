use eframe::egui;
use egui::{Align2, Color32, FontId, Response, Sense, Ui, Vec2, Widget};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::AVATAR_SIZE_F32;

/// A round placeholder avatar, colored from a hash of its seed and marked
/// with the seed's first letter.
pub struct AvatarPlaceholder<'a> {
    seed: &'a str,
    size: f32,
}

impl<'a> AvatarPlaceholder<'a> {
    pub fn new(seed: &'a str) -> AvatarPlaceholder<'a> {
        AvatarPlaceholder {
            seed,
            size: AVATAR_SIZE_F32,
        }
    }

    pub fn size(mut self, size: f32) -> AvatarPlaceholder<'a> {
        self.size = size;
        self
    }
}

pub(crate) fn seed_color(seed: &str) -> Color32 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    let [r, g, b, ..] = hasher.finish().to_le_bytes();
    // keep it away from black so the letter stays readable
    Color32::from_rgb(r | 0x40, g | 0x40, b | 0x40)
}

impl Widget for AvatarPlaceholder<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(self.size), Sense::hover());
        let radius = self.size / 2.0;
        ui.painter()
            .circle_filled(rect.center(), radius, seed_color(self.seed));

        let letter: String = self
            .seed
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default();
        ui.painter().text(
            rect.center(),
            Align2::CENTER_CENTER,
            letter,
            FontId::proportional(radius),
            Color32::WHITE,
        );

        response
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_seed_color_is_stable() {
        assert_eq!(seed_color("rust"), seed_color("rust"));
        let c = seed_color("gaming");
        assert!(c.r() >= 0x40 && c.g() >= 0x40 && c.b() >= 0x40);
    }
}
