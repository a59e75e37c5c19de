use eframe::{egui, epaint};
use egui::{Color32, CursorIcon, Pos2, Response, Sense, Shape, Ui, Vec2, Widget};
use epaint::{PathShape, Stroke};

const ARROW_SIZE: f32 = 16.0;

pub(crate) const UPVOTED_COLOR: Color32 = Color32::from_rgb(0xff, 0x45, 0x00);
pub(crate) const DOWNVOTED_COLOR: Color32 = Color32::from_rgb(0x71, 0x93, 0xff);
const IDLE_COLOR: Color32 = Color32::from_rgb(0x8d, 0x7f, 0x73);

/// An up or down vote arrow, filled in when it reflects the viewer's vote
pub struct VoteArrow {
    up: bool,
    active: bool,
    enabled: bool,
}

impl VoteArrow {
    pub fn up(active: bool) -> VoteArrow {
        VoteArrow {
            up: true,
            active,
            enabled: true,
        }
    }

    pub fn down(active: bool) -> VoteArrow {
        VoteArrow {
            up: false,
            active,
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> VoteArrow {
        self.enabled = enabled;
        self
    }

    fn color(&self) -> Color32 {
        match (self.active, self.up) {
            (true, true) => UPVOTED_COLOR,
            (true, false) => DOWNVOTED_COLOR,
            (false, _) => IDLE_COLOR,
        }
    }

    fn paint(&self, ui: &mut Ui, corner: Pos2) {
        let s = ARROW_SIZE;
        // an arrow pointing up; flipped vertically for down
        let outline = [
            (0.5, 0.0),
            (1.0, 0.5),
            (0.75, 0.5),
            (0.75, 1.0),
            (0.25, 1.0),
            (0.25, 0.5),
            (0.0, 0.5),
        ];
        let points = outline
            .iter()
            .map(|(x, y)| {
                let y = if self.up { *y } else { 1.0 - y };
                Pos2 {
                    x: corner.x + x * s,
                    y: corner.y + y * s,
                }
            })
            .collect();

        let color = self.color();
        ui.painter().add(Shape::Path(PathShape {
            points,
            closed: true,
            fill: if self.active {
                color
            } else {
                Color32::TRANSPARENT
            },
            stroke: Stroke { width: 1.0, color },
        }));
    }
}

impl Widget for VoteArrow {
    fn ui(self, ui: &mut Ui) -> Response {
        let padding = ui.spacing().button_padding;
        let space = Vec2 {
            x: ARROW_SIZE + padding.x * 2.0,
            y: ARROW_SIZE + padding.y * 2.0,
        };
        let sense = if self.enabled {
            Sense::click()
        } else {
            Sense::hover()
        };
        let (rect, response) = ui.allocate_exact_size(space, sense);
        let shift = if response.is_pointer_button_down_on() {
            1.0
        } else {
            0.0
        };
        let pos = Pos2 {
            x: rect.min.x + padding.x,
            y: rect.min.y + padding.y + if self.up { -shift } else { shift },
        };
        self.paint(ui, ui.painter().round_pos_to_pixels(pos));

        if self.enabled {
            response.on_hover_cursor(CursorIcon::PointingHand)
        } else {
            response
        }
    }
}
