use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, Ui};

use crate::filter::SnapshotOrigin;
use crate::util::format_percent;

use super::super::ViewModel;

const MAX_LISTED_REQUESTS: usize = 12;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Filtros e detalhes");
        ui.add_space(6.0);

        egui::ScrollArea::vertical()
            .id_salt("details_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_panel_details(ui);
                ui.separator();
                self.draw_navigation_log(ui);
            });
    }

    fn draw_panel_details(&mut self, ui: &mut Ui) {
        let definitions = self.dashboard.definitions().to_vec();
        for definition in &definitions {
            ui.label(RichText::new(definition.title.as_str()).strong());

            let Some(panel) = self.dashboard.panel_mut(&definition.id) else {
                ui.small("recolhido");
                ui.add_space(4.0);
                continue;
            };

            let selection = panel.selection().map(|selection| {
                format!("{} ({})", selection.label(), selection.key())
            });
            let base = Arc::clone(&panel.definition().base);
            let snapshot = panel.snapshot().clone();
            let origin = snapshot.origin.clone();
            let computations = panel.computations();

            match selection {
                Some(selection) => ui.label(format!("Filtro: {selection}")),
                None => ui.label("Filtro: nenhum"),
            };
            if let SnapshotOrigin::Fallback(_) = origin {
                ui.colored_label(
                    Color32::from_rgb(236, 170, 76),
                    "Sem correlação cadastrada para este filtro.",
                );
            }
            ui.small(origin.describe());
            if origin.is_filtered() {
                for rate in &snapshot.dataset.rates {
                    if let Some(base_rate) = base.rate(&rate.key) {
                        ui.small(format!(
                            "{}: {} → {}",
                            rate.label,
                            format_percent(base_rate.value),
                            format_percent(rate.value)
                        ));
                    }
                }
            }
            ui.small(format!("recálculos: {computations}"));

            if !definition.query_context.is_null() {
                ui.collapsing(format!("Contexto da consulta · {}", definition.id), |ui| {
                    let context = serde_json::to_string_pretty(&definition.query_context)
                        .unwrap_or_else(|_| definition.query_context.to_string());
                    ui.monospace(context);
                });
            }
            ui.add_space(4.0);
        }
    }

    fn draw_navigation_log(&self, ui: &mut Ui) {
        ui.label(RichText::new("Navegação para tabelas").strong());

        let navigation = self.dashboard.navigation();
        if navigation.is_empty() {
            ui.small("Nenhuma tabela solicitada ainda.");
            return;
        }

        ui.small(format!("{} solicitação(ões)", navigation.len()));
        for request in navigation.requests().iter().rev().take(MAX_LISTED_REQUESTS) {
            let context = request.context.as_deref().unwrap_or("sem filtro");
            ui.label(format!("{} · {context}", request.key));
        }
    }
}
