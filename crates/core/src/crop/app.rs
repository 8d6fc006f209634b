//! Main crop tool application.
//!
//! This module contains the `CropTool` struct which implements the
//! `eframe::App` trait for the interactive crop window.

use super::pointer::CanvasLayout;
use super::rendering::{MASK_ALPHA, draw_handles, draw_mask, draw_outline, selection_on_screen};
use super::session::{CropSession, CursorHint};
use super::settings::Settings;
use super::state::{CropOutcome, UiState, WorkEvent};
use super::units::Resolution;
use crate::error::{AppError, Result};
use crate::export;
use crate::store::{
    self, DecodedImage, LocalStore, PhotoSource, UploadPayload, UploadReceipt,
};
use eframe::egui;
use image::DynamicImage;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread;

const WINDOW_W: f32 = 1360.0;
const WINDOW_H: f32 = 960.0;

/// Viewport budget for the crop canvas: most of the window, hard-capped at
/// 1000x800.
fn canvas_budget() -> (i32, i32) {
    (
        (WINDOW_W * 0.9).min(1000.0) as i32,
        (WINDOW_H * 0.75).min(800.0) as i32,
    )
}

/// The interactive crop window.
///
/// Displays the loaded image on a scaled canvas, lets the user draw, move
/// and resize the crop selection, and exports the committed selection at
/// native resolution into the upload store.
pub struct CropTool {
    // Image state
    image_texture: Option<egui::TextureHandle>,
    /// Pre-converted image data for fast texture upload
    color_image: Option<egui::ColorImage>,
    source: DynamicImage,
    source_name: String,

    // Crop state
    session: CropSession,

    // Controls
    resolution_input: String,
    filename_input: String,

    // Gallery state
    gallery: Vec<String>,
    gallery_error: Option<String>,
    gallery_requested: bool,

    // Async work state
    state: UiState,
    rx: Receiver<WorkEvent>,
    tx: Sender<WorkEvent>,

    store: Arc<LocalStore>,
    settings: Settings,
    pub result: Arc<Mutex<CropOutcome>>,
}

impl CropTool {
    /// Creates a new crop tool instance for an already decoded image.
    ///
    /// # Arguments
    /// * `decoded` - The image to crop, with its source name
    /// * `store` - Upload store shared with background workers
    /// * `settings` - User settings (print density)
    /// * `initial_output` - Output filename override, if the caller has one
    /// * `result` - Shared result container for returning the receipt
    pub fn new(
        decoded: DecodedImage,
        store: Arc<LocalStore>,
        settings: Settings,
        initial_output: Option<String>,
        result: Arc<Mutex<CropOutcome>>,
    ) -> Result<Self> {
        let (tx, rx) = channel();
        let (max_w, max_h) = canvas_budget();
        let session = CropSession::open(decoded.width(), decoded.height(), max_w, max_h)?;

        // Pre-convert the image for fast texture upload; this is the
        // expensive step, so it happens before the UI loop starts.
        let color_image = Self::to_color_image(&decoded.image);
        let filename_input =
            initial_output.unwrap_or_else(|| store::default_output_name(&decoded.name));

        Ok(Self {
            image_texture: None,
            color_image: Some(color_image),
            source: decoded.image,
            source_name: decoded.name,
            session,
            resolution_input: settings.resolution.get().to_string(),
            filename_input,
            gallery: Vec::new(),
            gallery_error: None,
            gallery_requested: false,
            state: UiState::Idle,
            rx,
            tx,
            store,
            settings,
            result,
        })
    }

    fn to_color_image(image: &DynamicImage) -> egui::ColorImage {
        let buffer = image.to_rgba8();
        let size = [image.width() as usize, image.height() as usize];
        let pixels = buffer.as_flat_samples();
        egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice())
    }

    /// Exports the committed selection and stores it under the chosen name.
    ///
    /// The extraction and upload run on a background thread; the UI thread
    /// never blocks. Progress is reported back through the event channel and
    /// always reaches a terminal state.
    fn submit_crop(&mut self) {
        let sampling = match self.session.commit() {
            Ok(s) => s,
            Err(e) => {
                self.state = UiState::Error(e.to_string());
                return;
            }
        };

        // Persist settings before kicking off the save
        if let Err(e) = self.settings.save() {
            eprintln!("Warning: Failed to save settings: {}", e);
        }

        let filename = if self.filename_input.trim().is_empty() {
            store::default_output_name(&self.source_name)
        } else {
            self.filename_input.trim().to_string()
        };

        self.state = UiState::Busy("Saving crop...".to_string());

        let tx = self.tx.clone();
        let source = self.source.clone();
        let store = self.store.clone();

        // Spawn background thread for async work
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();

            match runtime {
                Ok(rt) => {
                    rt.block_on(async {
                        let bytes = match export::extract_png(&source, &sampling) {
                            Ok(b) => b,
                            Err(e) => {
                                let _ = tx.send(WorkEvent::SaveFailed(format!(
                                    "Crop extraction failed: {}",
                                    e
                                )));
                                return;
                            }
                        };

                        match store.upload(UploadPayload::Png { filename, bytes }).await {
                            Ok(receipt) => {
                                let _ = tx.send(WorkEvent::Saved(receipt));
                            }
                            Err(e) => {
                                let _ = tx.send(WorkEvent::SaveFailed(e.to_string()));
                            }
                        }
                    });
                }
                Err(e) => {
                    let _ = tx.send(WorkEvent::SaveFailed(format!(
                        "Failed to create async runtime: {}",
                        e
                    )));
                }
            }
        });
    }

    /// Requests the gallery listing from a background worker.
    fn request_gallery(&mut self) {
        self.gallery_requested = true;

        let tx = self.tx.clone();
        let store = self.store.clone();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();

            match runtime {
                Ok(rt) => rt.block_on(async {
                    match store.list().await {
                        Ok(names) => {
                            let _ = tx.send(WorkEvent::Gallery(names));
                        }
                        Err(e) => {
                            let _ = tx.send(WorkEvent::GalleryFailed(e.to_string()));
                        }
                    }
                }),
                Err(e) => {
                    let _ = tx.send(WorkEvent::GalleryFailed(e.to_string()));
                }
            }
        });
    }

    /// Loads a stored upload into a fresh crop session, off-thread.
    fn request_stored_load(&mut self, name: String) {
        self.state = UiState::Busy(format!("Loading {}...", name));

        let tx = self.tx.clone();
        let store = self.store.clone();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();

            match runtime {
                Ok(rt) => rt.block_on(async {
                    match store.load(&PhotoSource::Stored(name)).await {
                        Ok(decoded) => {
                            let _ = tx.send(WorkEvent::ImageLoaded(Box::new(decoded)));
                        }
                        Err(e) => {
                            let _ = tx.send(WorkEvent::LoadFailed(e.to_string()));
                        }
                    }
                }),
                Err(e) => {
                    let _ = tx.send(WorkEvent::LoadFailed(e.to_string()));
                }
            }
        });
    }

    /// Swaps in a newly loaded image.
    ///
    /// The selection and any in-flight drag die with the old session; the
    /// scale factor is recomputed for the new image.
    fn install_image(&mut self, decoded: DecodedImage) {
        let (max_w, max_h) = canvas_budget();
        match CropSession::open(decoded.width(), decoded.height(), max_w, max_h) {
            Ok(session) => {
                self.session = session;
                self.color_image = Some(Self::to_color_image(&decoded.image));
                self.image_texture = None;
                self.source = decoded.image;
                self.filename_input = store::default_output_name(&decoded.name);
                self.source_name = decoded.name;
                self.state = UiState::Idle;
            }
            Err(e) => {
                self.state = UiState::Error(e.to_string());
            }
        }
    }

    /// Processes events from background threads.
    fn process_work_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                WorkEvent::Gallery(names) => {
                    self.gallery = store::filter_image_names(&names);
                    self.gallery_error = None;
                }
                WorkEvent::GalleryFailed(err) => {
                    // Gallery failure degrades to an empty widget; cropping
                    // and saving stay fully usable.
                    self.gallery.clear();
                    self.gallery_error = Some(err);
                }
                WorkEvent::ImageLoaded(decoded) => {
                    self.install_image(*decoded);
                }
                WorkEvent::LoadFailed(err) => {
                    self.state = UiState::Error(err);
                }
                WorkEvent::Saved(receipt) => {
                    if let Ok(mut result) = self.result.lock() {
                        result.receipt = Some(receipt.clone());
                    }
                    self.state = UiState::Saved {
                        filename: receipt.filename,
                    };
                    // A fresh crop landed in the store; refresh the gallery.
                    self.gallery_requested = false;
                }
                WorkEvent::SaveFailed(err) => {
                    self.state = UiState::Error(err);
                }
            }
            ctx.request_repaint();
        }
    }

    /// Handles pointer interaction over the canvas.
    fn handle_canvas_input(
        &mut self,
        ctx: &egui::Context,
        response: &egui::Response,
        layout: &CanvasLayout,
    ) {
        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = layout.map(pos.x, pos.y);
                self.session.pointer_down(x, y);
                if matches!(self.state, UiState::Saved { .. } | UiState::Error(_)) {
                    self.state = UiState::Idle;
                }
            }
        } else if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                if layout.contains(pos.x, pos.y) {
                    let (x, y) = layout.map(pos.x, pos.y);
                    self.session.pointer_move(x, y);
                } else {
                    // Leaving the canvas mid-drag gets the same cleanup as a
                    // release.
                    self.session.pointer_up();
                }
            }
        }

        // The release may land outside the canvas or even outside the
        // window; the global check guarantees end-of-drag delivery.
        if self.session.is_dragging()
            && (response.drag_stopped() || ctx.input(|i| i.pointer.any_released()))
        {
            self.session.pointer_up();
        }

        // Hover affordances while no drag is active.
        if !self.session.is_dragging() {
            if let Some(pos) = response.hover_pos() {
                let (x, y) = layout.map(pos.x, pos.y);
                let icon = match self.session.cursor_hint(x, y) {
                    CursorHint::ResizeNwSe => egui::CursorIcon::ResizeNwSe,
                    CursorHint::ResizeNeSw => egui::CursorIcon::ResizeNeSw,
                    CursorHint::Move => egui::CursorIcon::Move,
                    CursorHint::Crosshair => egui::CursorIcon::Crosshair,
                };
                ctx.set_cursor_icon(icon);
            }
        }
    }

    /// Renders the side panel: density, size readout, filename, actions,
    /// gallery.
    fn render_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.heading("Crop photo");
        ui.label(&self.source_name);
        ui.separator();

        ui.label("Print density (px/inch):");
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.resolution_input).desired_width(80.0),
        );
        if response.changed() {
            self.settings.resolution = Resolution::parse(&self.resolution_input);
        }

        let readout = match self.session.physical_size_mm(self.settings.resolution) {
            Some((w_mm, h_mm)) => format!("W x H: {:.1} x {:.1} mm", w_mm, h_mm),
            None => "W x H: - mm".to_string(),
        };
        ui.label(readout);

        ui.add_space(8.0);
        ui.label("Save as:");
        ui.add(egui::TextEdit::singleline(&mut self.filename_input).desired_width(200.0));

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let can_save =
                self.session.rect().is_some() && !matches!(self.state, UiState::Busy(_));
            if ui
                .add_enabled(can_save, egui::Button::new("Save crop"))
                .clicked()
            {
                self.submit_crop();
            }
            if ui.button("Reset").clicked() {
                self.session.reset();
            }
            if ui.button("Close").clicked() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.add_space(8.0);
        match &self.state {
            UiState::Idle => {}
            UiState::Busy(label) => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(label);
                });
            }
            UiState::Saved { filename } => {
                ui.label(
                    egui::RichText::new(format!("Saved as {}", filename))
                        .color(egui::Color32::LIGHT_GREEN),
                );
            }
            UiState::Error(err) => {
                ui.label(egui::RichText::new(err).color(egui::Color32::RED));
            }
        }

        ui.separator();
        ui.label("Previous uploads:");
        if let Some(err) = &self.gallery_error {
            ui.label(
                egui::RichText::new(format!("Error loading: {}", err))
                    .small()
                    .color(egui::Color32::RED),
            );
        } else if self.gallery.is_empty() {
            ui.label(egui::RichText::new("No uploads").small());
        } else {
            let mut clicked = None;
            egui::ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
                for name in &self.gallery {
                    if ui
                        .selectable_label(*name == self.source_name, name.as_str())
                        .clicked()
                    {
                        clicked = Some(name.clone());
                    }
                }
            });
            if let Some(name) = clicked {
                self.request_stored_load(name);
            }
        }
    }

    /// Renders the crop canvas and runs the interaction for this frame.
    fn render_canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (canvas_w, canvas_h) = self.session.canvas_size();
        let size = egui::vec2(canvas_w as f32, canvas_h as f32);
        let canvas_rect = egui::Rect::from_center_size(ui.max_rect().center(), size);

        let layout = CanvasLayout::new(
            canvas_rect.min.x,
            canvas_rect.min.y,
            canvas_rect.width(),
            canvas_rect.height(),
            canvas_w,
            canvas_h,
        );

        // Handle selection input (unless a background operation is running)
        let response = ui.interact(canvas_rect, ui.id().with("crop_canvas"), egui::Sense::drag());
        if !matches!(self.state, UiState::Busy(_)) {
            self.handle_canvas_input(ctx, &response, &layout);
        }

        // Fixed redraw order: image, mask, outline, handles.
        let painter = ui.painter_at(canvas_rect);
        if let Some(texture) = &self.image_texture {
            painter.image(
                texture.id(),
                canvas_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        if let Some(rect) = self.session.rect() {
            let selection = selection_on_screen(&layout, rect);
            draw_mask(&painter, canvas_rect, selection, MASK_ALPHA);
            draw_outline(&painter, selection);
            draw_handles(&painter, &layout, rect);
        }
    }
}

impl eframe::App for CropTool {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        // Process any pending worker events
        self.process_work_events(ctx);

        if !self.gallery_requested {
            self.request_gallery();
        }

        // Upload texture on first frame (and after image swaps) using the
        // pre-converted data
        if self.image_texture.is_none() {
            if let Some(color_image) = self.color_image.take() {
                self.image_texture = Some(ctx.load_texture(
                    "crop_source",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }

        // Handle escape to close
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::SidePanel::right("controls")
            .min_width(260.0)
            .show(ctx, |ui| {
                self.render_controls(ui, ctx);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_canvas(ui, ctx);
        });

        // Keep polling while a background operation is in flight so its
        // terminal event is picked up promptly.
        if matches!(self.state, UiState::Busy(_)) {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }
    }
}

/// Launches the crop window and returns when the user closes it.
///
/// # Arguments
/// * `decoded` - The image to crop
/// * `store` - Upload store for gallery listing and saving
/// * `settings` - User settings (print density)
/// * `initial_output` - Output filename override, if any
///
/// # Returns
/// The receipt of the last saved crop, or `None` if nothing was saved.
pub fn run(
    decoded: DecodedImage,
    store: Arc<LocalStore>,
    settings: Settings,
    initial_output: Option<String>,
) -> Result<Option<UploadReceipt>> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_W, WINDOW_H])
            .with_title("Snapcrop"),
        ..Default::default()
    };

    let result = Arc::new(Mutex::new(CropOutcome::default()));
    let app_result = result.clone();

    eframe::run_native(
        "Snapcrop",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(CropTool::new(
                decoded,
                store,
                settings,
                initial_output,
                app_result,
            )?) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))?;

    // Extract result from shared state
    let lock = result
        .lock()
        .map_err(|_| AppError::ui("Failed to acquire result lock"))?;

    Ok(lock.receipt.clone())
}
