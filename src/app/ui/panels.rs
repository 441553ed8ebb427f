use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{
    self, Align, Align2, Color32, Context, FontId, Layout, RichText, Sense, Stroke, StrokeKind, Ui,
    vec2,
};

use crate::filter::{ClickScope, ElementKey, ElementState, Snapshot};
use crate::panels::{Dashboard, ElementSource, PanelCatalog, PanelDefinition};
use crate::util::{format_count, format_percent, truncate_label};

use super::super::render_utils::{
    SEARCH_MATCH_COLOR, blend_color, draw_share_bar, element_color, series_color,
};
use super::super::search::PanelElement;
use super::super::ViewModel;

const CARD_SIZE: [f32; 2] = [168.0, 58.0];
const BAR_HEIGHT: f32 = 20.0;
const BAR_LABEL_WIDTH: f32 = 150.0;

/// What a panel frame asked for while it was drawn. Applied once drawing is
/// done so the dashboard is not mutated mid-frame.
#[derive(Default)]
struct PanelActions {
    clicked: Option<ElementKey>,
    hovered: Option<ElementKey>,
    header_clicked: bool,
    clear_requested: bool,
    navigate_requested: bool,
}

impl ViewModel {
    pub(in crate::app) fn new(catalog: PanelCatalog) -> Self {
        Self {
            dashboard: Dashboard::new(catalog),
            search: String::new(),
            search_match_cache: None,
            hovered: None,
            show_counts: true,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Painel de saúde populacional");
                    ui.separator();
                    ui.label(format!("fonte: {source}"));
                    ui.label(format!("painéis: {}", self.dashboard.definitions().len()));
                    ui.label(format!(
                        "filtros ativos: {}",
                        self.dashboard.active_filter_count()
                    ));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Recarregar catálogo"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    let clear_all_button = ui.add_enabled(
                        self.dashboard.active_filter_count() > 0,
                        egui::Button::new("Limpar todos"),
                    );
                    if clear_all_button.clicked() {
                        self.dashboard.clear_all();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(request) = self.dashboard.navigation().last() {
                            ui.label(format!("última tabela: {}", request.key));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Recarregando painéis...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_dashboard(ui);
            }
        });
    }

    fn draw_dashboard(&mut self, ui: &mut Ui) {
        let search_matches = self.cached_search_matches();
        let definitions = self.dashboard.definitions().to_vec();
        let mut next_hovered = None;

        egui::ScrollArea::vertical()
            .id_salt("dashboard_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for definition in &definitions {
                    if let Some(key) = self.draw_panel(ui, definition, search_matches.as_deref()) {
                        next_hovered = Some((definition.id.clone(), key));
                    }
                    ui.add_space(10.0);
                }
            });

        self.hovered = next_hovered;
    }

    fn draw_panel(
        &mut self,
        ui: &mut Ui,
        definition: &Arc<PanelDefinition>,
        search_matches: Option<&HashSet<PanelElement>>,
    ) -> Option<ElementKey> {
        let mut actions = PanelActions::default();
        let panel_id = definition.id.as_str();
        let is_matched = |key: &ElementKey| {
            search_matches
                .is_some_and(|matches| matches.contains(&(panel_id.to_owned(), key.clone())))
        };

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());

            let snapshot = self
                .dashboard
                .panel_mut(panel_id)
                .map(|panel| panel.snapshot().clone());
            let panel = self.dashboard.panel(panel_id);
            let selection = panel.and_then(|panel| panel.selection());

            ui.horizontal(|ui| {
                let marker = if snapshot.is_some() { "▾" } else { "▸" };
                let header = ui
                    .add(
                        egui::Label::new(
                            RichText::new(format!("{marker} {}", definition.title)).heading(),
                        )
                        .sense(Sense::click()),
                    )
                    .on_hover_text("Clique para recolher ou expandir o painel.");
                actions.header_clicked = header.clicked();

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if definition.table_key.is_some() && ui.button("Ver tabela").clicked() {
                        actions.navigate_requested = true;
                    }
                    let clear_button =
                        ui.add_enabled(selection.is_some(), egui::Button::new("Limpar filtro"));
                    if clear_button.clicked() {
                        actions.clear_requested = true;
                    }
                });
            });

            let Some(snapshot) = snapshot else {
                ui.weak("Painel recolhido. O filtro salvo volta ao expandir.");
                return;
            };

            match selection {
                Some(selection) => {
                    ui.label(
                        RichText::new(format!(
                            "Filtrado por {} · {}",
                            selection.label(),
                            snapshot.origin.describe()
                        ))
                        .color(if snapshot.origin.is_filtered() {
                            Color32::from_rgb(245, 206, 93)
                        } else {
                            Color32::from_gray(200)
                        }),
                    );
                }
                None => {
                    ui.weak("Sem filtro. Clique em um cartão ou barra para filtrar.");
                }
            }
            ui.add_space(4.0);

            let state_of = |key: &ElementKey| {
                panel.map_or_else(ElementState::default, |panel| panel.element_state(key))
            };

            self.draw_metric_cards(
                ui,
                definition,
                &snapshot,
                &state_of,
                &is_matched,
                &mut actions,
            );
            self.draw_breakdowns(
                ui,
                definition,
                &snapshot,
                &state_of,
                &is_matched,
                &mut actions,
            );
        });

        let mut scope = ClickScope::default();
        if let Some(key) = actions.clicked {
            self.dashboard.click(panel_id, &key, &mut scope);
        }

        // Ancestors of a clicked element ignore the click.
        if actions.header_clicked && !scope.is_propagation_stopped() {
            if self.dashboard.is_mounted(panel_id) {
                self.dashboard.unmount(panel_id);
            } else {
                self.dashboard.mount(panel_id);
            }
        }

        if actions.clear_requested {
            self.dashboard.clear(panel_id);
        }
        if actions.navigate_requested {
            self.dashboard.navigate(panel_id);
        }
        actions.hovered
    }

    fn draw_metric_cards(
        &self,
        ui: &mut Ui,
        definition: &PanelDefinition,
        snapshot: &Snapshot,
        state_of: &dyn Fn(&ElementKey) -> ElementState,
        is_matched: &dyn Fn(&ElementKey) -> bool,
        actions: &mut PanelActions,
    ) {
        let dataset = &snapshot.dataset;
        if dataset.metrics.is_empty() && dataset.rates.is_empty() {
            return;
        }

        ui.horizontal_wrapped(|ui| {
            for (index, metric) in dataset.metrics.iter().enumerate() {
                let element = definition.elements.iter().find(|element| {
                    element.source == ElementSource::Metric(metric.key.clone())
                });
                let state = element
                    .map(|element| state_of(&element.key))
                    .unwrap_or_default();
                let outlined = element.is_some_and(|element| is_matched(&element.key));

                let (rect, response) = ui.allocate_exact_size(
                    vec2(CARD_SIZE[0], CARD_SIZE[1]),
                    if element.is_some() {
                        Sense::click()
                    } else {
                        Sense::hover()
                    },
                );
                let hovered = element.is_some_and(|element| {
                    response.hovered() || self.is_hovered(&definition.id, &element.key)
                });
                let fill = element_color(series_color(index), state);
                let painter = ui.painter_at(rect);
                let fill = if hovered {
                    blend_color(fill, Color32::WHITE, 0.12)
                } else {
                    fill
                };
                painter.rect_filled(rect, 6.0, fill);
                if outlined {
                    painter.rect_stroke(
                        rect,
                        6.0,
                        Stroke::new(1.5, SEARCH_MATCH_COLOR),
                        StrokeKind::Outside,
                    );
                }
                painter.text(
                    rect.left_top() + vec2(10.0, 8.0),
                    Align2::LEFT_TOP,
                    truncate_label(&metric.label, 22),
                    FontId::proportional(12.0),
                    Color32::from_gray(235),
                );
                painter.text(
                    rect.left_bottom() + vec2(10.0, -8.0),
                    Align2::LEFT_BOTTOM,
                    format_count(metric.count),
                    FontId::proportional(20.0),
                    Color32::WHITE,
                );

                if let Some(element) = element {
                    let response = response.on_hover_text(format!(
                        "{}: {} (clique para filtrar)",
                        element.label,
                        format_count(metric.count)
                    ));
                    if response.hovered() {
                        actions.hovered = Some(element.key.clone());
                    }
                    if response.clicked() {
                        actions.clicked = Some(element.key.clone());
                    }
                }
            }

            for rate in &dataset.rates {
                ui.vertical(|ui| {
                    ui.small(rate.label.as_str());
                    ui.label(RichText::new(format_percent(rate.value)).size(20.0).strong());
                });
                ui.add_space(12.0);
            }
        });
        ui.add_space(6.0);
    }

    fn draw_breakdowns(
        &self,
        ui: &mut Ui,
        definition: &PanelDefinition,
        snapshot: &Snapshot,
        state_of: &dyn Fn(&ElementKey) -> ElementState,
        is_matched: &dyn Fn(&ElementKey) -> bool,
        actions: &mut PanelActions,
    ) {
        for breakdown in &snapshot.dataset.breakdowns {
            ui.label(RichText::new(breakdown.label.as_str()).strong());

            for (index, entry) in breakdown.entries.iter().enumerate() {
                let key = breakdown
                    .dimension
                    .as_ref()
                    .map(|dimension| ElementKey::new(dimension.as_str(), entry.key.as_str()));
                let state = key.as_ref().map(|key| state_of(key)).unwrap_or_default();
                let outlined = key.as_ref().is_some_and(|key| is_matched(key));
                let percentage = entry.percentage.unwrap_or(0.0);

                let row = ui.horizontal(|ui| {
                    ui.add_sized(
                        [BAR_LABEL_WIDTH, BAR_HEIGHT],
                        egui::Label::new(truncate_label(&entry.label, 24)).truncate(),
                    );

                    let width = (ui.available_width() - 8.0).max(80.0);
                    let (rect, response) = ui.allocate_exact_size(
                        vec2(width, BAR_HEIGHT),
                        if key.is_some() {
                            Sense::click()
                        } else {
                            Sense::hover()
                        },
                    );

                    let text = if self.show_counts {
                        format!(
                            "{}  ({})",
                            format_percent(percentage),
                            format_count(entry.count)
                        )
                    } else {
                        format_percent(percentage)
                    };
                    let mut color = element_color(series_color(index), state);
                    if response.hovered()
                        || key
                            .as_ref()
                            .is_some_and(|key| self.is_hovered(&definition.id, key))
                    {
                        color = blend_color(color, Color32::WHITE, 0.12);
                    }
                    draw_share_bar(
                        &ui.painter_at(rect),
                        rect,
                        percentage,
                        color,
                        &text,
                        outlined,
                    );
                    response
                });

                let Some(key) = key else {
                    continue;
                };

                let response = row.inner.on_hover_text(format!(
                    "{}: {} de {}",
                    entry.label,
                    format_count(entry.count),
                    format_count(breakdown.total())
                ));
                if response.hovered() {
                    actions.hovered = Some(key.clone());
                }
                if response.clicked() {
                    actions.clicked = Some(key);
                }
            }
            ui.add_space(6.0);
        }
    }
}
