use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};

use crate::filter::ElementKey;
use crate::panels::{Dashboard, PanelCatalog, load_panel_catalog};

mod render_utils;
mod search;
mod ui;

use self::search::PanelElement;

pub struct DashboardApp {
    catalog_path: Option<PathBuf>,
    state: AppState,
    reload_rx: Option<Receiver<Result<PanelCatalog, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<PanelCatalog, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    dashboard: Dashboard,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    hovered: Option<PanelElement>,
    show_counts: bool,
}

struct SearchMatchCache {
    query: String,
    matches: Arc<HashSet<PanelElement>>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, catalog_path: Option<PathBuf>) -> Self {
        let state = Self::start_load(catalog_path.clone());
        Self {
            catalog_path,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(catalog_path: Option<PathBuf>) -> Receiver<Result<PanelCatalog, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_panel_catalog(catalog_path.as_deref())
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(catalog_path: Option<PathBuf>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(catalog_path),
        }
    }

    fn source_label(&self) -> String {
        self.catalog_path
            .as_ref()
            .map_or_else(|| "catálogo embutido".to_owned(), |path| path.display().to_string())
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let source = self.source_label();

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(catalog) => AppState::Ready(Box::new(ViewModel::new(catalog))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Carregando painéis...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Falha ao carregar o catálogo de painéis");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Tentar novamente").clicked() {
                        transition = Some(Self::start_load(self.catalog_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.catalog_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(catalog) => AppState::Ready(Box::new(ViewModel::new(catalog))),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Leitura do catálogo interrompida".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn is_hovered(&self, panel_id: &str, key: &ElementKey) -> bool {
        self.hovered
            .as_ref()
            .is_some_and(|(hovered_panel, hovered_key)| hovered_panel == panel_id && hovered_key == key)
    }
}
