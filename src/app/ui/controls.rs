use eframe::egui::{self, RichText, Ui};

use crate::filter::{ClickScope, ElementKey};

use super::super::ViewModel;

const MAX_LISTED_MATCHES: usize = 24;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controles");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Buscar indicador ou categoria")
            .on_hover_text("Destaca os elementos cujo rótulo corresponde à busca.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Digite para destacar elementos e clique em um resultado para filtrar.");

        let mut pending_click: Option<(String, ElementKey)> = None;
        if let Some(matches) = self.cached_search_matches() {
            let mut matches = matches.iter().cloned().collect::<Vec<_>>();
            matches.sort();

            ui.small(format!("{} resultado(s)", matches.len()));
            egui::ScrollArea::vertical()
                .id_salt("search_matches")
                .max_height(180.0)
                .show(ui, |ui| {
                    for (panel_id, key) in matches.into_iter().take(MAX_LISTED_MATCHES) {
                        let label = self
                            .dashboard
                            .definitions()
                            .iter()
                            .find(|definition| definition.id == panel_id)
                            .and_then(|definition| {
                                definition
                                    .element(&key)
                                    .map(|element| format!("{} · {}", definition.title, element.label))
                            })
                            .unwrap_or_else(|| format!("{panel_id} · {key}"));

                        let selected = self
                            .dashboard
                            .panel(&panel_id)
                            .and_then(|panel| panel.selection())
                            .is_some_and(|selection| selection.key() == &key);
                        if ui.selectable_label(selected, label).clicked() {
                            pending_click = Some((panel_id, key));
                        }
                    }
                });
        }

        if let Some((panel_id, key)) = pending_click {
            if !self.dashboard.is_mounted(&panel_id) {
                self.dashboard.mount(&panel_id);
            }
            let mut scope = ClickScope::default();
            self.dashboard.click(&panel_id, &key, &mut scope);
        }

        ui.separator();
        ui.label(RichText::new("Painéis").strong());

        let mut toggled = None;
        for definition in self.dashboard.definitions() {
            let mounted = self.dashboard.is_mounted(&definition.id);
            let response = ui
                .selectable_label(mounted, definition.title.as_str())
                .on_hover_text(if mounted {
                    "Clique para recolher o painel."
                } else {
                    "Clique para expandir o painel."
                });
            if response.clicked() {
                toggled = Some((definition.id.clone(), mounted));
            }
        }

        match toggled {
            Some((panel_id, true)) => self.dashboard.unmount(&panel_id),
            Some((panel_id, false)) => {
                self.dashboard.mount(&panel_id);
            }
            None => {}
        }

        ui.separator();
        ui.checkbox(&mut self.show_counts, "Mostrar contagens nas barras")
            .on_hover_text("Exibe a contagem absoluta ao lado do percentual.");
        ui.small(format!(
            "filtros salvos: {}",
            self.dashboard.stored_filter_count()
        ));
    }
}
