use auraform::core::color::Rgb;
use auraform::core::signals::{DIGIT_COUNT, LETTER_COUNT, digit_for_index, letter_for_index};
use auraform::{AudioBands, Formation, FrameView, SelectionState};
use egui::{ComboBox, Slider, Ui};

/// Selection widgets. Edits `selection` in place; the simulation picks the
/// change up at the start of the next frame.
pub fn selection_controls(ui: &mut Ui, selection: &mut SelectionState, max_count: usize) {
    ui.horizontal_wrapped(|ui| {
        ComboBox::from_label("shape")
            .selected_text(selection.shape.name())
            .show_ui(ui, |ui| {
                for f in Formation::ALL {
                    ui.selectable_value(&mut selection.shape, f, f.name());
                }
            });

        let mut rgb = selection.color.to_array();
        if ui.color_edit_button_rgb(&mut rgb).changed() {
            selection.color = Rgb::from_array(rgb);
        }

        ui.add(
            Slider::new(&mut selection.particle_count, 1..=max_count as i64)
                .logarithmic(true)
                .text("particles"),
        );

        match selection.shape {
            Formation::GlyphText => {
                ui.add(
                    Slider::new(&mut selection.char_index, 0..=LETTER_COUNT as i64 - 1)
                        .custom_formatter(|v, _| letter_for_index(v as i64).to_string())
                        .text("letter"),
                );
            }
            Formation::GlyphDigit => {
                ui.add(
                    Slider::new(&mut selection.num_index, 0..=DIGIT_COUNT as i64 - 1)
                        .custom_formatter(|v, _| digit_for_index(v as i64).to_string())
                        .text("digit"),
                );
            }
            _ => {}
        }
    });
}

pub fn status_line(ui: &mut Ui, view: &FrameView<'_>, audio: Option<&AudioBands>, hand: bool) {
    ui.horizontal(|ui| {
        match audio {
            Some(a) => ui.label(format!(
                "bass {:.2}  mid {:.2}  treble {:.2}",
                a.bass, a.mid, a.treble
            )),
            None => ui.label("audio: off"),
        };
        ui.separator();
        ui.label(if hand { "hand: tracked" } else { "hand: pointer" });
        ui.separator();
        ui.label(format!(
            "speed {:.3}  heat {:.2}  scale {:.2}",
            view.stats.mean_speed, view.stats.mean_heat, view.core.scale
        ));
    });
}
