use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::annotation::BoundingBox;
use crate::fetch::{FetchEvent, Fetcher, FrameCache};
use crate::interaction::{to_surface, PointerEvent, RectangleController};
use crate::overlay;
use crate::session::Session;
use crate::store::AnnotationStore;

// ── App ─────────────────────────────────────────────────────────────────────

pub struct LabelerApp {
    store: AnnotationStore,
    session: Session,
    controller: RectangleController,
    fetcher: Fetcher,
    frames: FrameCache<egui::TextureHandle>,
    last_error: Option<String>,
}

impl LabelerApp {
    pub fn new(store: AnnotationStore, fetcher: Fetcher) -> Self {
        fetcher.request_metadata();
        Self {
            store,
            session: Session::new(),
            controller: RectangleController::new(),
            fetcher,
            frames: FrameCache::new(),
            last_error: None,
        }
    }

    fn current_frame(&self) -> u32 {
        self.session.current_frame()
    }

    fn ensure_frame(&mut self) {
        if self.session.metadata().is_none() {
            return;
        }
        let index = self.current_frame();
        if self.frames.begin(index) {
            self.fetcher.request_frame(index);
        }
    }

    fn apply_fetch_events(&mut self, ctx: &egui::Context) {
        for event in self.fetcher.poll() {
            match event {
                FetchEvent::Metadata(Ok(metadata)) => {
                    self.session.set_metadata(metadata);
                    self.ensure_frame();
                }
                FetchEvent::Metadata(Err(err)) => {
                    tracing::warn!(%err, "cannot load video metadata");
                    self.session.set_load_error(err.to_string());
                }
                FetchEvent::Frame { index, result } => {
                    // Stored under the requested index even if the user
                    // has moved on; the canvas only shows the current one.
                    let texture = result
                        .map(|image| {
                            ctx.load_texture(
                                format!("frame-{index}"),
                                image,
                                egui::TextureOptions::LINEAR,
                            )
                        })
                        .inspect_err(|err| {
                            tracing::warn!(index, %err, "cannot load frame");
                            self.last_error = Some(format!("Frame {index}: {err}"));
                        });
                    if texture.is_ok() {
                        tracing::info!(index, "frame loaded");
                    }
                    self.frames.finish(index, texture);
                }
            }
        }
    }

    fn go_previous(&mut self) {
        if self.session.previous() {
            self.frame_changed();
        }
    }

    fn go_next(&mut self) {
        if self.session.next() {
            self.frame_changed();
        }
    }

    fn frame_changed(&mut self) {
        self.controller.cancel();
        self.ensure_frame();
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        ui.heading(self.session.title());
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.session.can_go_previous(), egui::Button::new("Previous Frame"))
                .clicked()
            {
                self.go_previous();
            }
            if ui
                .add_enabled(self.session.can_go_next(), egui::Button::new("Next Frame"))
                .clicked()
            {
                self.go_next();
            }
            if let Some(count) = self.session.frame_count() {
                ui.separator();
                ui.label(format!("Frame {} / {}", self.current_frame() + 1, count));
            }
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(self.fetcher.source().describe());
            ui.separator();
            ui.label(format!("{} annotated frames", self.store.annotated_frames()));
            if let Some(err) = &self.last_error {
                ui.separator();
                ui.colored_label(ui.visuals().error_fg_color, err);
            }
        });
    }

    fn box_list(&mut self, ui: &mut egui::Ui) {
        let frame = self.current_frame();
        let mut delete = None;

        ui.heading("Bounding Boxes");
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::remainder())
            .column(Column::auto())
            .body(|mut body| {
                for (i, bbox) in self.store.get_boxes(frame).iter().enumerate() {
                    body.row(22.0, |mut row| {
                        row.col(|ui| {
                            ui.label(describe_box(i, bbox));
                        });
                        row.col(|ui| {
                            if ui.small_button("🗑").on_hover_text("Delete box").clicked() {
                                delete = Some(i);
                            }
                        });
                    });
                }
            });

        if let Some(index) = delete {
            self.store.delete_box(frame, index);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let frame = self.current_frame();
        let Some(texture) = self.frames.get(frame) else {
            ui.centered_and_justified(|ui| {
                if self.session.metadata().is_none() {
                    ui.label("Waiting for video metadata…");
                } else if self.frames.is_loading(frame) {
                    ui.spinner();
                } else {
                    ui.label(format!("Frame {frame} is unavailable"));
                }
            });
            return;
        };

        // Drawn at natural size so display and image pixels coincide.
        let natural = texture.size_vec2();
        let texture_id = texture.id();

        egui::ScrollArea::both()
            .drag_to_scroll(false)
            .auto_shrink(false)
            .show(ui, |ui| {
                let (response, painter) = ui.allocate_painter(natural, egui::Sense::drag());
                let surface = response.rect;
                painter.image(
                    texture_id,
                    surface,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );

                let (pressed, released, latest) = ui.input(|i| {
                    (
                        i.pointer.primary_pressed(),
                        i.pointer.primary_released(),
                        i.pointer.latest_pos(),
                    )
                });
                let events = gesture_events(
                    pressed && response.hovered(),
                    released,
                    latest,
                    surface,
                    surface.intersect(ui.clip_rect()),
                    self.controller.is_dragging(),
                );
                for event in events {
                    self.controller.dispatch(event, frame, &mut self.store);
                }
                if self.controller.is_dragging() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
                }

                let boxes = self.store.get_boxes(frame);
                let items = overlay::overlay_boxes(boxes, self.controller.live_box());
                overlay::paint(&painter, surface, &items);
            });
    }
}

/// Translates one frame of raw pointer input into gesture events.
///
/// `surface` is the full drawing surface and sets the coordinate origin;
/// `visible` is the part of it on screen, which is where presses count and
/// where leaving cancels the drag. `pressed` must already be filtered to
/// presses that hit the surface.
fn gesture_events(
    pressed: bool,
    released: bool,
    latest: Option<egui::Pos2>,
    surface: egui::Rect,
    visible: egui::Rect,
    mut dragging: bool,
) -> Vec<PointerEvent> {
    let inside = latest
        .filter(|pos| visible.contains(*pos))
        .map(|pos| to_surface((pos.x, pos.y), (surface.min.x, surface.min.y)));

    let mut events = Vec::new();
    if pressed {
        if let Some(at) = inside {
            events.push(PointerEvent::Press(at));
            dragging = true;
        }
    } else if dragging {
        match inside {
            Some(at) => events.push(PointerEvent::Move(at)),
            None => {
                events.push(PointerEvent::Leave);
                dragging = false;
            }
        }
    }
    if released && dragging {
        events.push(PointerEvent::Release);
    }
    events
}

fn describe_box(position: usize, bbox: &BoundingBox) -> String {
    format!(
        "Bounding Box {} - ({}, {}) to ({}, {})",
        position + 1,
        bbox.x.round(),
        bbox.y.round(),
        bbox.right().round(),
        bbox.bottom().round()
    )
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for LabelerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_fetch_events(ctx);

        // Keyboard shortcuts
        let (left, right, escape) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if left {
            self.go_previous();
        }
        if right {
            self.go_next();
        }
        if escape {
            self.controller.cancel();
        }

        egui::TopBottomPanel::top("navigation").show(ctx, |ui| self.top_bar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));

        if !self.store.get_boxes(self.current_frame()).is_empty() {
            egui::SidePanel::right("boxes")
                .default_width(320.0)
                .show(ctx, |ui| self.box_list(ui));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::central_panel(&ctx.style()).fill(egui::Color32::from_gray(40)))
            .show(ctx, |ui| self.canvas(ui));
    }
}
