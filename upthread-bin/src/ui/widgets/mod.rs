mod avatar;
pub use avatar::AvatarPlaceholder;

mod vote_arrow;
pub use vote_arrow::VoteArrow;
#[cfg(test)]
pub(crate) use vote_arrow::{DOWNVOTED_COLOR, UPVOTED_COLOR};

use eframe::egui::{Label, Response, RichText, Sense, Ui};

/// A footer item on a post card. Display only.
pub fn footer_item(ui: &mut Ui, text: &str) -> Response {
    ui.add(Label::new(RichText::new(text).small().weak()).sense(Sense::hover()))
}
