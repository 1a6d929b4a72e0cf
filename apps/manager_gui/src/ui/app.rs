use eframe::egui;
use egui::{Color32, RichText};
use shared::domain::{EntryKind, LogLevel, WindowState};
use zeroize::Zeroize;

use crate::backend_bridge::commands::WindowAction;
use crate::controller::ManagerController;
use crate::ui::view::{HeaderView, ListView, LogView, RefreshView, ViewTree};

/// Input buffers. They live in the shell, not in the view state, because
/// they are never persisted or sent until the user submits them.
#[derive(Default)]
struct Drafts {
    product: String,
    keyword: String,
    interval_secs: String,
    synced_interval_ms: Option<u64>,
    unlock_user: String,
    unlock_pass: String,
}

impl Drafts {
    fn forget_password(&mut self) {
        self.unlock_pass.zeroize();
    }

    fn entry_mut(&mut self, kind: EntryKind) -> &mut String {
        match kind {
            EntryKind::Products => &mut self.product,
            EntryKind::Keywords => &mut self.keyword,
        }
    }

    /// Follows the host's interval unless the user is mid-edit.
    fn sync_interval(&mut self, refresh: &RefreshView) {
        if self.synced_interval_ms != Some(refresh.interval_ms) {
            self.interval_secs = format_seconds(refresh.interval_ms);
            self.synced_interval_ms = Some(refresh.interval_ms);
        }
    }
}

impl Drop for Drafts {
    fn drop(&mut self) {
        self.forget_password();
    }
}

enum UiAction {
    Add(EntryKind),
    Delete(EntryKind, String),
    ToggleRefresh { running: bool },
    Window(WindowAction),
    ToggleMaximize { observed: Option<bool> },
    SetOnline(bool),
    Unlock,
    ClearLogs,
}

pub struct ManagerApp {
    controller: ManagerController,
    drafts: Drafts,
}

impl ManagerApp {
    pub fn new(controller: ManagerController) -> Self {
        Self {
            controller,
            drafts: Drafts::default(),
        }
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Add(kind) => {
                let input = std::mem::take(self.drafts.entry_mut(kind));
                if !self.controller.add_entry(kind, &input) {
                    // Keep the text so it can be corrected.
                    *self.drafts.entry_mut(kind) = input;
                }
            }
            UiAction::Delete(kind, entry) => self.controller.delete_entry(kind, &entry),
            UiAction::ToggleRefresh { running: true } => self.controller.stop_refresh(),
            UiAction::ToggleRefresh { running: false } => {
                self.controller.start_refresh(&self.drafts.interval_secs)
            }
            UiAction::Window(action) => self.controller.window(action),
            UiAction::ToggleMaximize { observed } => self.controller.toggle_maximize(observed),
            UiAction::SetOnline(online) => self.controller.set_online(online),
            UiAction::Unlock => {
                self.controller
                    .try_unlock(&self.drafts.unlock_user, &self.drafts.unlock_pass);
                self.drafts.forget_password();
            }
            UiAction::ClearLogs => self.controller.clear_logs(),
        }
    }
}

impl eframe::App for ManagerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.process_ui_events();
        if let Some(window) = self.controller.take_window_request() {
            apply_window_state(ctx, window);
        }

        let mut actions = Vec::new();
        let locked = self.controller.state().locked;
        let status = self.controller.status();
        let tree: &ViewTree = self.controller.tree();
        self.drafts.sync_interval(&tree.refresh);

        show_title_bar(ctx, &tree.header, &mut actions);
        show_status_bar(ctx, &tree.header, status, &mut actions);
        if locked {
            show_lock_screen(ctx, status, &mut self.drafts, &mut actions);
        } else {
            show_log_panel(ctx, &tree.log, &mut actions);
            egui::CentralPanel::default().show(ctx, |ui| {
                show_refresh_controls(ui, &tree.refresh, &mut self.drafts, &mut actions);
                ui.separator();
                ui.columns(2, |columns| {
                    for (column, kind) in columns.iter_mut().zip(EntryKind::ALL) {
                        show_list(column, tree.list(kind), self.drafts.entry_mut(kind), &mut actions);
                    }
                });
            });
        }

        for action in actions {
            self.apply(action);
        }

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

fn apply_window_state(ctx: &egui::Context, window: WindowState) {
    match window {
        WindowState::Normal => {
            ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(false));
            ctx.send_viewport_cmd(egui::ViewportCommand::Maximized(false));
        }
        WindowState::Maximized => ctx.send_viewport_cmd(egui::ViewportCommand::Maximized(true)),
        WindowState::Minimized => ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true)),
        WindowState::Closed => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
    }
}

fn show_title_bar(ctx: &egui::Context, header: &HeaderView, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::top("title_bar")
        .exact_height(34.0)
        .show(ctx, |ui| {
            let drag = ui.interact(
                ui.max_rect(),
                egui::Id::new("title_bar_drag"),
                egui::Sense::click_and_drag(),
            );
            let observed = ctx.input(|i| i.viewport().maximized);
            if drag.double_clicked() {
                actions.push(UiAction::ToggleMaximize { observed });
            } else if drag.drag_started_by(egui::PointerButton::Primary) {
                ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
            }

            ui.horizontal_centered(|ui| {
                ui.label(RichText::new(&header.title).strong());
                if header.locked {
                    ui.label(RichText::new("🔒 locked").weak());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("❌").on_hover_text("Close").clicked() {
                        actions.push(UiAction::Window(WindowAction::Close));
                    }
                    let (icon, hint) = if header.maximized {
                        ("🗗", "Restore")
                    } else {
                        ("🗖", "Maximize")
                    };
                    if ui.button(icon).on_hover_text(hint).clicked() {
                        actions.push(UiAction::ToggleMaximize { observed });
                    }
                    if ui.button("🗕").on_hover_text("Minimize").clicked() {
                        actions.push(UiAction::Window(WindowAction::Minimize));
                    }
                });
            });
        });
}

fn show_status_bar(
    ctx: &egui::Context,
    header: &HeaderView,
    status: &str,
    actions: &mut Vec<UiAction>,
) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let dot = if header.online {
                Color32::from_rgb(110, 200, 120)
            } else {
                Color32::from_rgb(235, 100, 100)
            };
            ui.label(RichText::new("●").color(dot));
            let mut online = header.online;
            if ui.checkbox(&mut online, header.connectivity_label).changed() {
                actions.push(UiAction::SetOnline(online));
            }
            ui.separator();
            ui.label(RichText::new(status).weak());
        });
    });
}

fn show_lock_screen(
    ctx: &egui::Context,
    status: &str,
    drafts: &mut Drafts,
    actions: &mut Vec<UiAction>,
) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.25);
            ui.heading("Manager is locked");
            ui.add_space(12.0);
            ui.add(
                egui::TextEdit::singleline(&mut drafts.unlock_user)
                    .hint_text("User")
                    .desired_width(240.0),
            );
            let pass = ui.add(
                egui::TextEdit::singleline(&mut drafts.unlock_pass)
                    .password(true)
                    .hint_text("Password")
                    .desired_width(240.0),
            );
            let submitted = pass.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Unlock").clicked() || submitted {
                actions.push(UiAction::Unlock);
            }
            ui.add_space(8.0);
            ui.label(RichText::new(status).weak());
        });
    });
}

fn show_refresh_controls(
    ui: &mut egui::Ui,
    refresh: &RefreshView,
    drafts: &mut Drafts,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("Auto-refresh").strong());
        ui.add_enabled(
            !refresh.enabled,
            egui::TextEdit::singleline(&mut drafts.interval_secs).desired_width(64.0),
        );
        ui.label("s");
        if ui.button(refresh.toggle_label).clicked() {
            actions.push(UiAction::ToggleRefresh {
                running: refresh.enabled,
            });
        }
        ui.label(RichText::new(&refresh.status_label).weak());
    });
}

fn show_list(ui: &mut egui::Ui, list: &ListView, draft: &mut String, actions: &mut Vec<UiAction>) {
    ui.horizontal(|ui| {
        ui.heading(list.title);
        ui.label(RichText::new(&list.count_label).weak());
    });

    ui.horizontal(|ui| {
        let input = ui.add_enabled(
            !list.full,
            egui::TextEdit::singleline(draft)
                .hint_text(format!("New {}", list.kind.label()))
                .desired_width((ui.available_width() - 56.0).max(80.0)),
        );
        let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.add_enabled(!list.full, egui::Button::new("Add")).clicked() || submitted {
            actions.push(UiAction::Add(list.kind));
        }
    });

    egui::ScrollArea::vertical()
        .id_salt(list.title)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            if let Some(hint) = list.empty_hint {
                ui.label(RichText::new(hint).weak().italics());
            }
            for row in &list.rows {
                ui.horizontal(|ui| {
                    if ui.small_button("✖").on_hover_text("Remove").clicked() {
                        actions.push(UiAction::Delete(list.kind, row.clone()));
                    }
                    ui.label(row);
                });
            }
        });
}

fn show_log_panel(ctx: &egui::Context, log: &LogView, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::bottom("activity_log")
        .resizable(true)
        .default_height(180.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Activity").strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("Clear").clicked() {
                        actions.push(UiAction::ClearLogs);
                    }
                });
            });
            egui::ScrollArea::vertical()
                .id_salt("activity_log_rows")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for row in &log.rows {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(&row.time).monospace().weak());
                            ui.label(
                                RichText::new(row.level.label())
                                    .monospace()
                                    .color(level_color(row.level)),
                            );
                            ui.label(&row.message);
                        });
                    }
                });
        });
}

fn level_color(level: LogLevel) -> Color32 {
    match level {
        LogLevel::Info => Color32::from_rgb(170, 180, 195),
        LogLevel::Success => Color32::from_rgb(110, 200, 120),
        LogLevel::Warning => Color32::from_rgb(230, 180, 80),
        LogLevel::Error => Color32::from_rgb(235, 100, 100),
    }
}

fn format_seconds(interval_ms: u64) -> String {
    format!("{}", interval_ms as f64 / 1000.0)
}
