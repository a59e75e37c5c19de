use super::{post_card, Page, UpthreadUi};
use eframe::egui;
use egui::{Context, RichText, ScrollArea, Ui};
use upthread_lib::{PostCard, PostId, QueryKey, Route, GLOBALS};

pub(super) fn update(app: &mut UpthreadUi, _ctx: &Context, ui: &mut Ui) {
    match app.page.clone() {
        Page::Feed => {
            ui.heading("Home");
            render_list(app, ui, QueryKey::PostList);
        }
        Page::Subreddit(topic) => {
            ui.heading(format!("r/{}", topic));
            render_list(app, ui, QueryKey::PostsByTopic(topic));
        }
        Page::Post(id) => render_single(app, ui, id),
    }
}

fn render_list(app: &mut UpthreadUi, ui: &mut Ui, key: QueryKey) {
    let snapshot = match GLOBALS.watch_query(key) {
        Some(s) => s,
        None => return,
    };

    if let Some(e) = snapshot.error() {
        ui.label(RichText::new(format!("Could not load posts: {}", e)).weak());
    }

    let posts = match snapshot.posts() {
        Some(p) => p.clone(),
        None => {
            if snapshot.is_loading() {
                ui.spinner();
            }
            return;
        }
    };

    if posts.is_empty() {
        ui.label("No posts yet.");
        return;
    }

    let mut navigate: Option<Route> = None;
    ScrollArea::vertical()
        .id_source("post_list")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for post in posts.iter() {
                let card = app.card(post.id);
                if let Some(route) = post_card::render(ui, card, Some(post)) {
                    navigate = Some(route);
                }
                ui.add_space(6.0);
            }
        });

    if let Some(route) = navigate {
        app.open(route);
    }
}

fn render_single(app: &mut UpthreadUi, ui: &mut Ui, id: PostId) {
    let snapshot = GLOBALS.watch_query(QueryKey::Post(id));

    let post = match snapshot.as_ref().and_then(|s| s.post()) {
        Some(Some(p)) => Some(p.clone()),
        Some(None) => {
            ui.label(format!("Post {} does not exist.", id));
            return;
        }
        None => {
            if let Some(e) = snapshot.as_ref().and_then(|s| s.error()) {
                ui.label(RichText::new(format!("Could not load post: {}", e)).weak());
                return;
            }
            None
        }
    };

    let card: &mut PostCard = app.card(id);
    if let Some(route) = post_card::render(ui, card, post.as_deref()) {
        app.open(route);
    }
}
