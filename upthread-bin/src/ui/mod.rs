mod feed;
mod post_card;
mod widgets;

use eframe::egui;
use egui::{Align, Context, Label, Layout, RichText, Sense, TextEdit, Ui, Visuals};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use upthread_lib::{Error, PostCard, PostId, Route, RunState, ToOverlordMessage, GLOBALS};

const ROUTE_KEY: &str = "route";

pub fn run() -> Result<(), Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_app_id("upthread")
            .with_inner_size([700.0, 900.0])
            .with_min_inner_size([480.0, 400.0]),
        default_theme: if GLOBALS.settings.read().dark_mode {
            eframe::Theme::Dark
        } else {
            eframe::Theme::Light
        },
        centered: true,
        vsync: true,
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "upthread",
        options,
        Box::new(|cc| Box::new(UpthreadUi::new(cc))),
    ) {
        tracing::error!("Eframe error: {}", e);
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
enum Page {
    Feed,
    Subreddit(String),
    Post(PostId),
}

impl From<Route> for Page {
    fn from(route: Route) -> Page {
        match route {
            Route::Home => Page::Feed,
            Route::Subreddit(topic) => Page::Subreddit(topic),
            Route::Post(id) => Page::Post(id),
        }
    }
}

impl Page {
    fn route(&self) -> Route {
        match self {
            Page::Feed => Route::Home,
            Page::Subreddit(topic) => Route::Subreddit(topic.clone()),
            Page::Post(id) => Route::Post(*id),
        }
    }
}

struct UpthreadUi {
    page: Page,
    history: Vec<Page>,

    // Per-post vote controllers, kept for as long as the app runs
    cards: HashMap<PostId, PostCard>,

    username_input: String,
    dark_mode: bool,
    next_frame: Instant,
}

impl UpthreadUi {
    fn new(cc: &eframe::CreationContext<'_>) -> UpthreadUi {
        // Wake up when the overlord has something new for us
        let ctx = cc.egui_ctx.clone();
        tokio::spawn(async move {
            loop {
                GLOBALS.notify_ui_redraw.notified().await;
                ctx.request_repaint();
            }
        });

        let page = cc
            .storage
            .and_then(|s| eframe::get_value::<String>(s, ROUTE_KEY))
            .and_then(|r| Route::parse(&r))
            .map(Page::from)
            .unwrap_or(Page::Feed);

        let dark_mode = GLOBALS.settings.read().dark_mode;
        cc.egui_ctx.set_visuals(if dark_mode {
            Visuals::dark()
        } else {
            Visuals::light()
        });

        UpthreadUi {
            page,
            history: vec![],
            cards: HashMap::new(),
            username_input: GLOBALS.settings.read().last_username.clone().unwrap_or_default(),
            dark_mode,
            next_frame: Instant::now(),
        }
    }

    fn card(&mut self, post_id: PostId) -> &mut PostCard {
        self.cards
            .entry(post_id)
            .or_insert_with(|| PostCard::new(post_id))
    }

    fn open(&mut self, route: Route) {
        tracing::debug!("Navigating to {}", route);
        self.set_page(Page::from(route));
    }

    fn set_page(&mut self, page: Page) {
        if self.page != page {
            tracing::trace!("PUSHING HISTORY: {:?}", &self.page);
            self.history.push(self.page.clone());
            self.page = page;
        }
    }

    fn back(&mut self) {
        if let Some(page) = self.history.pop() {
            tracing::trace!("POPPING HISTORY: {:?}", &page);
            self.page = page;
        } else {
            tracing::trace!("HISTORY STUCK ON NONE");
        }
    }

    fn top_panel(&mut self, ctx: &Context, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.history.is_empty(), egui::Button::new("< Back"))
                .clicked()
            {
                self.back();
            }
            if ui
                .add(Label::new(RichText::new("upthread").heading().strong()).sense(Sense::click()))
                .clicked()
            {
                self.set_page(Page::Feed);
            }
            if ui.button("Refresh").clicked() {
                let _ = GLOBALS.to_overlord.send(ToOverlordMessage::RefreshAll);
            }

            let runstate = *GLOBALS.read_runstate.borrow();
            if runstate != RunState::Online {
                ui.label(RichText::new(runstate.to_string()).weak());
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let theme_label = if self.dark_mode { "Light" } else { "Dark" };
                if ui.button(theme_label).clicked() {
                    self.dark_mode = !self.dark_mode;
                    ctx.set_visuals(if self.dark_mode {
                        Visuals::dark()
                    } else {
                        Visuals::light()
                    });
                    GLOBALS.settings.write().dark_mode = self.dark_mode;
                    let _ = GLOBALS.to_overlord.send(ToOverlordMessage::SaveSettings);
                }

                match GLOBALS.session.viewer() {
                    Some(viewer) => {
                        if ui.button("Sign out").clicked() {
                            let _ = GLOBALS.to_overlord.send(ToOverlordMessage::SignOut);
                        }
                        ui.label(format!("u/{}", viewer.name));
                    }
                    None => {
                        let sign_in = ui.button("Sign in").clicked();
                        let response = ui.add(
                            TextEdit::singleline(&mut self.username_input)
                                .hint_text("username")
                                .desired_width(120.0),
                        );
                        let entered =
                            response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        if sign_in || entered {
                            let _ = GLOBALS
                                .to_overlord
                                .send(ToOverlordMessage::SignIn(self.username_input.clone()));
                        }
                    }
                }
            });
        });
    }

    fn status_panel(&mut self, ui: &mut Ui) {
        let messages = GLOBALS.status_queue.read().read_all();
        if ui
            .add(Label::new(RichText::new(&messages[0]).strong()).sense(Sense::click()))
            .clicked()
        {
            GLOBALS.status_queue.write().dismiss(0);
        }
        if ui
            .add(Label::new(RichText::new(&messages[1]).small()).sense(Sense::click()))
            .clicked()
        {
            GLOBALS.status_queue.write().dismiss(1);
        }
        if ui
            .add(Label::new(RichText::new(&messages[2]).weak().small()).sense(Sense::click()))
            .clicked()
        {
            GLOBALS.status_queue.write().dismiss(2);
        }
    }
}

impl eframe::App for UpthreadUi {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let (max_fps, status_lifetime) = {
            let settings = GLOBALS.settings.read();
            (settings.max_fps.max(1) as f32, settings.status_message_lifetime())
        };

        // Wait until the next frame
        let now = Instant::now();
        if self.next_frame > now {
            std::thread::sleep(self.next_frame - now);
        }
        self.next_frame = Instant::now() + Duration::from_secs_f32(1.0 / max_fps);

        // Redraw at least once per second
        ctx.request_repaint_after(Duration::from_secs(1));

        if GLOBALS.is_shutting_down() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        GLOBALS.status_queue.write().expire(status_lifetime);

        if ctx.input(|i| i.pointer.button_clicked(egui::PointerButton::Extra1)) {
            self.back();
        }

        egui::TopBottomPanel::top("top-panel").show(ctx, |ui| {
            self.top_panel(ctx, ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.status_panel(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            feed::update(self, ctx, ui);
        });
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, ROUTE_KEY, &self.page.route().to_string());
    }
}
