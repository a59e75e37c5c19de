use super::widgets::{footer_item, AvatarPlaceholder, VoteArrow};
use crate::date_ago::date_ago;
use eframe::egui;
use egui::{CursorIcon, Frame, Label, Margin, RichText, Sense, Ui};
use upthread_lib::{Post, PostCard, QuerySnapshot, Route, VoteOutcome, VoteSink, GLOBALS};

/// Render one post card. Returns where to go if the user clicked through.
///
/// `post` is None while the post itself is still loading.
pub(super) fn render(ui: &mut Ui, card: &mut PostCard, post: Option<&Post>) -> Option<Route> {
    // no point fetching votes for a post we cannot show yet
    let snapshot = match post {
        Some(_) => GLOBALS.watch_query(card.query_key()),
        None => None,
    };
    let response = draw(ui, card, post, snapshot.as_ref(), &*GLOBALS);
    if let (Some(outcome), Some(post)) = (response.vote, post) {
        tracing::debug!("Vote on {}: {:?}", post.id, outcome);
    }
    response.navigate
}

/// What the user did to a card this frame
#[derive(Debug, Default)]
struct CardResponse {
    navigate: Option<Route>,
    vote: Option<VoteOutcome>,
}

fn draw(
    ui: &mut Ui,
    card: &mut PostCard,
    post: Option<&Post>,
    snapshot: Option<&QuerySnapshot>,
    sink: &dyn VoteSink,
) -> CardResponse {
    let post = match post {
        Some(p) => p,
        None => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading...");
            });
            return CardResponse::default();
        }
    };

    let viewer = sink.viewer();
    if card.sync(snapshot, viewer.as_ref()) {
        tracing::trace!("{} vote state is now {:?}", post.id, card.vote_state());
    }
    let count = PostCard::display_count(snapshot);
    let vote_error = snapshot.and_then(|s| s.error().map(|e| e.to_owned()));
    let state = card.vote_state();

    let mut navigate: Option<Route> = None;
    let mut vote: Option<VoteOutcome> = None;

    // true while the pointer is over something that handles its own clicks
    let mut consumed = false;

    let inner = Frame::group(ui.style())
        .inner_margin(Margin::same(8.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal_top(|ui| {
                ui.vertical(|ui| {
                    ui.set_width(36.0);
                    let enabled = !card.is_in_flight();

                    let up = ui.add(VoteArrow::up(state.is_upvoted()).enabled(enabled));
                    match (count, &vote_error) {
                        (Some(c), _) => {
                            ui.label(RichText::new(c.to_string()).strong());
                        }
                        (None, Some(e)) => {
                            ui.label("?").on_hover_text(e);
                        }
                        (None, None) => {
                            ui.spinner();
                        }
                    }
                    let down = ui.add(VoteArrow::down(state.is_downvoted()).enabled(enabled));

                    consumed |= up.hovered() || down.hovered();
                    if up.clicked() {
                        vote = Some(card.cast_vote(true, sink));
                    } else if down.clicked() {
                        vote = Some(card.cast_vote(false, sink));
                    }
                });

                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        if let Some(topic) = post.topic() {
                            ui.add(AvatarPlaceholder::new(topic).size(20.0));
                            let response = ui
                                .add(
                                    Label::new(RichText::new(format!("r/{}", topic)).strong())
                                        .sense(Sense::click()),
                                )
                                .on_hover_cursor(CursorIcon::PointingHand);
                            consumed |= response.hovered();
                            if response.clicked() {
                                navigate = Some(Route::Subreddit(topic.to_owned()));
                            }
                        }
                        ui.label(
                            RichText::new(format!(
                                "Posted by u/{} {}",
                                post.username,
                                date_ago(post.created_at)
                            ))
                            .small()
                            .weak(),
                        );
                    });

                    ui.add_space(4.0);
                    ui.label(RichText::new(&post.title).heading());
                    if !post.body.is_empty() {
                        ui.label(&post.body);
                    }
                    if let Some(image) = post.image() {
                        let response = ui.hyperlink_to("Image", image);
                        consumed |= response.hovered();
                    }

                    ui.add_space(4.0);
                    ui.horizontal(|ui| {
                        let comments = match post.comment_count() {
                            1 => "1 Comment".to_owned(),
                            n => format!("{} Comments", n),
                        };
                        footer_item(ui, &comments);
                        footer_item(ui, "Award");
                        footer_item(ui, "Share");
                        footer_item(ui, "Save");
                        footer_item(ui, "...");
                    });
                });
            });
        });

    // The rest of the card is one big link
    let rect = inner.response.rect;
    if !consumed && navigate.is_none() && ui.rect_contains_pointer(rect) {
        ui.ctx()
            .output_mut(|o| o.cursor_icon = CursorIcon::PointingHand);
        if ui.input(|i| i.pointer.primary_clicked()) {
            navigate = Some(post.route());
        }
    }

    CardResponse { navigate, vote }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ui::widgets::{DOWNVOTED_COLOR, UPVOTED_COLOR};
    use egui::epaint::{ClippedShape, PathShape, Shape};
    use egui::{
        CentralPanel, Color32, Context, Event, FullOutput, Modifiers, Pos2, PointerButton,
        RawInput, Rect, Vec2,
    };
    use std::cell::RefCell;
    use std::sync::Arc;
    use time::OffsetDateTime;
    use upthread_lib::{
        Error, Mutation, PostId, QueryData, QueryStatus, Viewer, Vote, VoteState,
    };

    struct TestSink {
        viewer: Option<Viewer>,
        submitted: RefCell<Vec<Mutation>>,
    }

    impl VoteSink for TestSink {
        fn viewer(&self) -> Option<Viewer> {
            self.viewer.clone()
        }

        fn notify(&self, _message: String) {}

        fn submit(&self, mutation: Mutation) -> Result<u64, Error> {
            let mut submitted = self.submitted.borrow_mut();
            submitted.push(mutation);
            Ok(submitted.len() as u64)
        }
    }

    /// One card driven through egui frames without a window
    struct Harness {
        ctx: Context,
        card: PostCard,
        post: Post,
        snapshot: QuerySnapshot,
        sink: TestSink,
    }

    impl Harness {
        fn new(votes: &[(&str, bool)]) -> Harness {
            let id = PostId(7);
            Harness {
                ctx: Context::default(),
                card: PostCard::new(id),
                post: Post {
                    id,
                    title: "Hello upthread".to_owned(),
                    body: "First post".to_owned(),
                    image: None,
                    username: "author".to_owned(),
                    created_at: OffsetDateTime::now_utc(),
                    subreddit: vec![],
                    comments: vec![],
                },
                snapshot: QuerySnapshot {
                    status: QueryStatus::Ready,
                    data: Some(QueryData::Votes(Arc::new(
                        votes.iter().map(|(u, up)| Vote::new(u, *up)).collect(),
                    ))),
                    generation: 1,
                    stale: false,
                    mutations_applied: 0,
                },
                sink: TestSink {
                    viewer: Some(Viewer {
                        name: "u1".to_owned(),
                    }),
                    submitted: RefCell::new(vec![]),
                },
            }
        }

        fn frame(&mut self, events: Vec<Event>) -> (CardResponse, FullOutput) {
            let input = RawInput {
                screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))),
                events,
                ..Default::default()
            };
            let mut response = CardResponse::default();
            let ctx = self.ctx.clone();
            let output = ctx.run(input, |ctx| {
                CentralPanel::default().show(ctx, |ui| {
                    response = draw(
                        ui,
                        &mut self.card,
                        Some(&self.post),
                        Some(&self.snapshot),
                        &self.sink,
                    );
                });
            });
            (response, output)
        }

        /// Hover, press and release at `pos`, one frame each
        fn click(&mut self, pos: Pos2) -> Vec<CardResponse> {
            let button = |pressed| Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed,
                modifiers: Modifiers::default(),
            };
            vec![
                self.frame(vec![Event::PointerMoved(pos)]).0,
                self.frame(vec![button(true)]).0,
                self.frame(vec![button(false)]).0,
            ]
        }
    }

    fn flatten(shape: &Shape, out: &mut Vec<Shape>) {
        match shape {
            Shape::Vec(shapes) => shapes.iter().for_each(|s| flatten(s, out)),
            s => out.push(s.clone()),
        }
    }

    fn shapes(output: &FullOutput) -> Vec<Shape> {
        let mut out = vec![];
        for ClippedShape { shape, .. } in output.shapes.iter() {
            flatten(shape, &mut out);
        }
        out
    }

    /// The two vote arrows as painted, up first
    fn arrows(output: &FullOutput) -> Vec<PathShape> {
        shapes(output)
            .into_iter()
            .filter_map(|s| match s {
                Shape::Path(p) if p.closed && p.points.len() == 7 => Some(p),
                _ => None,
            })
            .collect()
    }

    fn center(path: &PathShape) -> Pos2 {
        Rect::from_points(&path.points).center()
    }

    fn text_center(output: &FullOutput, text: &str) -> Option<Pos2> {
        shapes(output).into_iter().find_map(|s| match s {
            Shape::Text(t) if t.galley.text() == text => {
                Some(t.galley.rect.translate(t.pos.to_vec2()).center())
            }
            _ => None,
        })
    }

    #[test]
    fn test_arrow_click_votes_without_navigating() {
        let mut harness = Harness::new(&[]);
        let (_, output) = harness.frame(vec![]);
        let up = arrows(&output);
        assert_eq!(up.len(), 2);

        let responses = harness.click(center(&up[0]));

        assert!(responses.iter().all(|r| r.navigate.is_none()));
        assert!(responses
            .iter()
            .any(|r| r.vote == Some(VoteOutcome::Submitted)));
        assert_eq!(
            *harness.sink.submitted.borrow(),
            vec![Mutation::AddVote {
                post_id: PostId(7),
                username: "u1".to_owned(),
                upvote: true,
            }]
        );
        assert!(harness.card.is_in_flight());
    }

    #[test]
    fn test_down_arrow_click_downvotes() {
        let mut harness = Harness::new(&[]);
        let (_, output) = harness.frame(vec![]);
        let arrows = arrows(&output);

        let responses = harness.click(center(&arrows[1]));

        assert!(responses.iter().all(|r| r.navigate.is_none()));
        let submitted = harness.sink.submitted.borrow();
        assert!(matches!(
            submitted.as_slice(),
            [Mutation::AddVote { upvote: false, .. }]
        ));
    }

    #[test]
    fn test_title_click_opens_post() {
        let mut harness = Harness::new(&[]);
        let (_, output) = harness.frame(vec![]);
        let title = text_center(&output, "Hello upthread");
        assert!(title.is_some());

        let responses = harness.click(title.unwrap_or(Pos2::ZERO));

        assert!(responses
            .iter()
            .any(|r| r.navigate == Some(Route::Post(PostId(7)))));
        assert!(responses.iter().all(|r| r.vote.is_none()));
        assert!(harness.sink.submitted.borrow().is_empty());
    }

    #[test]
    fn test_arrows_follow_vote_state() {
        let mut harness = Harness::new(&[("u1", true), ("u2", false)]);
        let (_, output) = harness.frame(vec![]);
        assert_eq!(harness.card.vote_state(), VoteState::Upvoted);
        let fills: Vec<Color32> = arrows(&output).iter().map(|p| p.fill).collect();
        assert_eq!(fills, vec![UPVOTED_COLOR, Color32::TRANSPARENT]);

        let mut harness = Harness::new(&[("u1", false)]);
        let (_, output) = harness.frame(vec![]);
        let fills: Vec<Color32> = arrows(&output).iter().map(|p| p.fill).collect();
        assert_eq!(fills, vec![Color32::TRANSPARENT, DOWNVOTED_COLOR]);

        let mut harness = Harness::new(&[("u2", true)]);
        let (_, output) = harness.frame(vec![]);
        let fills: Vec<Color32> = arrows(&output).iter().map(|p| p.fill).collect();
        assert_eq!(fills, vec![Color32::TRANSPARENT, Color32::TRANSPARENT]);
    }

    #[test]
    fn test_clicking_own_vote_again_is_ignored() {
        let mut harness = Harness::new(&[("u1", true)]);
        let (_, output) = harness.frame(vec![]);
        let arrows = arrows(&output);

        let responses = harness.click(center(&arrows[0]));

        assert!(responses
            .iter()
            .any(|r| r.vote == Some(VoteOutcome::AlreadyVoted)));
        assert!(responses.iter().all(|r| r.navigate.is_none()));
        assert!(harness.sink.submitted.borrow().is_empty());
    }
}
