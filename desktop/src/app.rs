use drill_core::history::{HistoryManager, HistoryRecord};
use drill_core::timecalc::{self, CalculationRecord, TimeOperation};
use drill_core::{
    parse_answer, Drill, DrillSummary, KeyValueStore, Operation, SaveOutcome, SoundCue,
    SoundManager,
};
use eframe::egui;
use log::{info, warn};
use std::path::PathBuf;

use crate::audio::AudioOutput;
use crate::config::{Exercise, Settings};
use crate::storage::{self, StoreFactory};

type Store = Box<dyn KeyValueStore>;

const CORRECT_COLOR: egui::Color32 = egui::Color32::from_rgb(50, 205, 50);
const WRONG_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 20, 60);

#[derive(PartialEq)]
enum FeedbackState {
    None,
    Correct,
    Incorrect { user_answer: f64 },
    Revealed { answer: f64 },
    Rejected(String),
}

#[derive(PartialEq)]
enum Phase {
    Idle,
    Answering,
    Results(DrillSummary),
}

struct DrillPanel {
    exercise: Exercise,
    drill: Drill<Store>,
    sound: SoundManager<Store>,
    phase: Phase,
    answer_input: String,
    feedback: FeedbackState,
    transfer_path: String,
    status: Option<String>,
    confirm_clear: bool,
}

impl DrillPanel {
    fn new(
        operation: Operation,
        exercise: Exercise,
        stores: &StoreFactory,
        audio: &AudioOutput,
    ) -> Self {
        Self {
            exercise,
            drill: Drill::new(operation, stores.open()),
            sound: SoundManager::new(stores.open(), operation.sound_key(), audio.backend()),
            phase: Phase::Idle,
            answer_input: String::new(),
            feedback: FeedbackState::None,
            transfer_path: format!("{}-history.json", operation.name()),
            status: None,
            confirm_clear: false,
        }
    }

    fn operation(&self) -> Operation {
        self.drill.generator().set_operation()
    }

    fn generate(&mut self) {
        self.drill.generator_mut().generate_question_set();
        self.sound.play_sound(SoundCue::Generate);
        self.phase = Phase::Answering;
        self.answer_input.clear();
        self.feedback = FeedbackState::None;
        self.status = None;
    }

    fn submit_answer(&mut self) {
        if self.drill.generator().current_question().is_none() {
            return;
        }

        let user_answer = match parse_answer(&self.answer_input) {
            Ok(n) => n,
            Err(e) => {
                self.feedback = FeedbackState::Rejected(e.to_string());
                self.answer_input.clear();
                return;
            }
        };

        self.answer_input.clear();
        if self.drill.generator_mut().set_user_answer(user_answer) {
            self.sound.play_sound(SoundCue::Correct);
            self.advance();
            self.feedback = FeedbackState::Correct;
        } else {
            self.feedback = FeedbackState::Incorrect { user_answer };
        }
    }

    fn show_answer(&mut self) {
        if let Some(answer) = self.drill.generator_mut().reveal_answer() {
            self.sound.play_sound(SoundCue::Click);
            self.feedback = FeedbackState::Revealed { answer };
        }
    }

    fn advance(&mut self) {
        self.answer_input.clear();
        self.feedback = FeedbackState::None;
        if self.drill.generator_mut().next_question().is_none() {
            self.complete_exercise();
        }
    }

    fn go_back(&mut self) {
        if self.drill.generator_mut().previous_question().is_some() {
            self.answer_input.clear();
            self.feedback = FeedbackState::None;
        }
    }

    fn complete_exercise(&mut self) {
        let summary = self.drill.complete();
        if summary.saved == SaveOutcome::Dropped {
            self.status = Some("History is unavailable, so this set was not saved.".to_string());
        }
        self.phase = Phase::Results(summary);
    }

    fn export_history(&mut self) {
        let path = PathBuf::from(self.transfer_path.trim());
        let result = self
            .drill
            .history()
            .export()
            .map_err(|e| e.to_string())
            .and_then(|json| storage::export_to_file(&path, &json));
        self.status = Some(match result {
            Ok(()) => format!("Exported history to {}", path.display()),
            Err(e) => {
                warn!("export failed: {e}");
                format!("Export failed: {e}")
            }
        });
    }

    fn import_history(&mut self) {
        let path = PathBuf::from(self.transfer_path.trim());
        let result = storage::import_from_file(&path).and_then(|json| {
            self.drill
                .history_mut()
                .import(&json)
                .map_err(|e| e.to_string())
        });
        self.status = Some(match result {
            Ok(count) => format!("Imported {count} records"),
            Err(e) => format!("Import failed: {e}"),
        });
    }

    fn ui(&mut self, ui: &mut egui::Ui, settings: &mut Settings) -> bool {
        let mut settings_changed = false;
        let operation = self.operation();

        ui.vertical_centered(|ui| {
            ui.heading(format!("{} Practice", self.exercise.label()));
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                if ui.button("Generate questions").clicked() {
                    self.generate();
                }
                let sound_label = if self.sound.is_sound_enabled() {
                    "🔊 Sound on"
                } else {
                    "🔇 Sound off"
                };
                if ui.button(sound_label).clicked() {
                    self.sound.toggle_sound();
                }
                if self.exercise == Exercise::Division
                    && ui
                        .checkbox(&mut settings.allow_decimals, "Allow decimal answers")
                        .changed()
                {
                    self.drill
                        .generator_mut()
                        .set_allow_decimals(settings.allow_decimals);
                    settings_changed = true;
                }
            });
            ui.add_space(20.0);

            match self.phase {
                Phase::Idle => {
                    ui.label("Press \"Generate questions\" to start a set of 10.");
                }
                Phase::Answering => self.answering_ui(ui, operation),
                Phase::Results(summary) => self.results_ui(ui, operation, summary),
            }
        });

        if let Some(status) = &self.status {
            ui.add_space(10.0);
            ui.label(status);
        }

        ui.add_space(20.0);
        ui.separator();
        self.history_ui(ui, operation, settings.history_rows);

        settings_changed
    }

    fn answering_ui(&mut self, ui: &mut egui::Ui, operation: Operation) {
        let generator = self.drill.generator();
        let Some(problem) = generator.current_question() else {
            return;
        };
        let display = problem.display(operation);
        let position = format!(
            "Question {} of {}",
            generator.current_question_number(),
            generator.total_questions()
        );
        let has_previous = generator.has_previous_question();
        let has_next = generator.has_next_question();

        ui.label(position);
        ui.label(egui::RichText::new(display).size(48.0).strong());
        ui.add_space(20.0);

        let response = ui.add(
            egui::TextEdit::singleline(&mut self.answer_input)
                .hint_text("Enter answer")
                .font(egui::TextStyle::Heading)
                .desired_width(150.0)
                .horizontal_align(egui::Align::Center),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.submit_answer();
        }
        response.request_focus();

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.add_enabled(has_previous, egui::Button::new("◀ Previous")).clicked() {
                self.sound.play_sound(SoundCue::Click);
                self.go_back();
            }
            if ui.add_sized([120.0, 40.0], egui::Button::new("Check")).clicked() {
                self.submit_answer();
            }
            if operation == Operation::Multiplication && ui.button("Show answer").clicked() {
                self.show_answer();
            }
            let next_label = if has_next { "Next ▶" } else { "Finish" };
            if ui.button(next_label).clicked() {
                self.sound.play_sound(SoundCue::Click);
                self.advance();
            }
        });

        ui.add_space(10.0);
        match &self.feedback {
            FeedbackState::None => {}
            FeedbackState::Correct => {
                ui.label(egui::RichText::new("Correct!").size(24.0).color(CORRECT_COLOR));
            }
            FeedbackState::Incorrect { user_answer } => {
                ui.label(
                    egui::RichText::new(format!(
                        "{user_answer} is not right. Try again or move on."
                    ))
                    .size(24.0)
                    .color(WRONG_COLOR),
                );
            }
            FeedbackState::Revealed { answer } => {
                ui.label(egui::RichText::new(format!("The answer is {answer}")).size(24.0));
            }
            FeedbackState::Rejected(message) => {
                ui.label(egui::RichText::new(message).color(WRONG_COLOR));
            }
        }
    }

    fn results_ui(&mut self, ui: &mut egui::Ui, operation: Operation, summary: DrillSummary) {
        ui.label(
            egui::RichText::new(format!(
                "You got {} out of {}",
                summary.correct, summary.total
            ))
            .size(32.0)
            .strong(),
        );
        ui.add_space(10.0);
        for problem in self.drill.generator().questions() {
            let color = if problem.is_correct == Some(true) {
                CORRECT_COLOR
            } else {
                WRONG_COLOR
            };
            ui.label(egui::RichText::new(problem.describe(operation.symbol())).color(color));
        }
        ui.add_space(10.0);
        if ui.button("Practice again").clicked() {
            self.generate();
        }
    }

    fn history_ui(&mut self, ui: &mut egui::Ui, operation: Operation, rows: usize) {
        let stats = self.drill.history().statistics();
        ui.horizontal(|ui| {
            ui.label(format!("History: {}", stats.total_records));
            ui.separator();
            ui.label(format!("Accuracy: {}%", stats.accuracy));
            ui.separator();
            ui.label(format!("Average score: {}/10", stats.average_score));
            if stats.best_score > 0 {
                ui.separator();
                ui.label(format!("Best: {}", stats.best_score));
            }
        });

        egui::ScrollArea::vertical()
            .id_salt(self.exercise.label())
            .max_height(180.0)
            .show(ui, |ui| {
                for line in self.drill.history().recent_lines(rows, operation.symbol()) {
                    ui.label(line);
                }
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            ui.label("File:");
            ui.text_edit_singleline(&mut self.transfer_path);
            if ui.button("Export").clicked() {
                self.export_history();
            }
            if ui.button("Import").clicked() {
                self.import_history();
            }
        });

        if self.confirm_clear {
            ui.horizontal(|ui| {
                ui.label("Clear all history?");
                if ui.button("Yes, clear").clicked() {
                    self.drill.history_mut().clear();
                    self.confirm_clear = false;
                }
                if ui.button("Cancel").clicked() {
                    self.confirm_clear = false;
                }
            });
        } else if ui.small_button("Clear history").clicked() {
            self.confirm_clear = true;
        }
    }
}

struct CalculatorPanel {
    history: HistoryManager<Store, CalculationRecord>,
    first_input: String,
    operation: TimeOperation,
    second_input: String,
    result: Option<(String, String)>,
    error: Option<String>,
    confirm_clear: bool,
}

impl CalculatorPanel {
    fn new(stores: &StoreFactory) -> Self {
        Self {
            history: HistoryManager::new(stores.open(), timecalc::calculation_policy()),
            first_input: String::new(),
            operation: TimeOperation::Add,
            second_input: String::new(),
            result: None,
            error: None,
            confirm_clear: false,
        }
    }

    fn calculate(&mut self) {
        let first = self.first_input.trim();
        let second = self.second_input.trim();
        match timecalc::evaluate(first, self.operation, second) {
            Ok(seconds) => {
                let result = timecalc::format_seconds(seconds);
                self.history.save(CalculationRecord::new(
                    first,
                    self.operation,
                    second,
                    result.clone(),
                ));
                self.result = Some((result, timecalc::format_with_units(seconds)));
                self.error = None;
            }
            Err(e) => {
                self.result = None;
                self.error = Some(e.to_string());
            }
        }
    }

    /// Puts a saved calculation back into the inputs so it can be edited.
    fn reload(&mut self, record: &CalculationRecord) {
        self.first_input = record.first_value.clone();
        self.operation = record.operation;
        self.second_input = record.second_value.clone();
        self.result = None;
        self.error = None;
    }

    fn ui(&mut self, ui: &mut egui::Ui, rows: usize) {
        ui.vertical_centered(|ui| {
            ui.heading("Time Calculator");
        });
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.first_input)
                    .hint_text("01:30:00")
                    .desired_width(100.0),
            );
            egui::ComboBox::from_id_salt("time-operation")
                .selected_text(self.operation.to_string())
                .show_ui(ui, |ui| {
                    for op in TimeOperation::ALL {
                        ui.selectable_value(&mut self.operation, op, op.to_string());
                    }
                });
            let hint = if self.operation.takes_time_operand() {
                "00:45:00"
            } else {
                "2"
            };
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.second_input)
                    .hint_text(hint)
                    .desired_width(100.0),
            );
            let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("=").clicked() || entered {
                self.calculate();
            }
        });

        ui.add_space(10.0);
        if let Some((result, words)) = &self.result {
            ui.label(egui::RichText::new(result).size(36.0).strong());
            ui.label(words);
        }
        if let Some(error) = &self.error {
            ui.label(egui::RichText::new(error).color(WRONG_COLOR));
        }

        ui.add_space(20.0);
        ui.separator();
        ui.label(format!("Saved calculations: {}", self.history.get_all().len()));

        let mut delete = None;
        let mut reload = None;
        egui::ScrollArea::vertical()
            .id_salt("time-history")
            .max_height(220.0)
            .show(ui, |ui| {
                for record in self.history.get_recent(rows) {
                    ui.horizontal(|ui| {
                        if ui
                            .link(record.summary())
                            .on_hover_text("Load into the calculator")
                            .clicked()
                        {
                            reload = Some(record.clone());
                        }
                        ui.weak(record.timestamp.format("%Y-%m-%d %H:%M").to_string());
                        if ui.small_button("✕").clicked() {
                            delete = Some(record.id.clone());
                        }
                    });
                }
            });
        if let Some(record) = reload {
            self.reload(&record);
        }
        if let Some(id) = delete {
            self.history.remove_where(|r| r.id == id);
        }

        if self.confirm_clear {
            ui.horizontal(|ui| {
                ui.label("Clear all calculations?");
                if ui.button("Yes, clear").clicked() {
                    self.history.clear();
                    self.confirm_clear = false;
                }
                if ui.button("Cancel").clicked() {
                    self.confirm_clear = false;
                }
            });
        } else if ui.small_button("Clear history").clicked() {
            self.confirm_clear = true;
        }
    }
}

pub struct DrillsApp {
    tab: Exercise,
    drills: Vec<DrillPanel>,
    calculator: CalculatorPanel,
    settings: Settings,
    settings_path: Option<PathBuf>,
    _audio: AudioOutput,
}

impl DrillsApp {
    pub fn new(
        settings: Settings,
        settings_path: Option<PathBuf>,
        stores: &StoreFactory,
        audio: AudioOutput,
    ) -> Self {
        let drills = Exercise::ALL
            .iter()
            .filter_map(|exercise| {
                exercise
                    .operation(settings.allow_decimals)
                    .map(|op| DrillPanel::new(op, *exercise, stores, &audio))
            })
            .collect();

        Self {
            tab: settings.default_exercise,
            drills,
            calculator: CalculatorPanel::new(stores),
            settings,
            settings_path,
            _audio: audio,
        }
    }

    fn save_settings(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        match self.settings.save_to(path) {
            Ok(()) => info!("settings saved to {}", path.display()),
            Err(e) => warn!("{e}"),
        }
    }
}

impl eframe::App for DrillsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("exercise-tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for exercise in Exercise::ALL {
                    ui.selectable_value(&mut self.tab, exercise, exercise.label());
                }
            });
        });

        let tab = self.tab;
        let mut settings_changed = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                if tab == Exercise::TimeCalculator {
                    self.calculator.ui(ui, self.settings.history_rows);
                } else if let Some(panel) = self.drills.iter_mut().find(|p| p.exercise == tab) {
                    settings_changed = panel.ui(ui, &mut self.settings);
                }
            });
        });

        if settings_changed {
            self.save_settings();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> CalculatorPanel {
        CalculatorPanel::new(&StoreFactory::new(None, 1024 * 1024))
    }

    #[test]
    fn test_calculate_saves_and_shows_result() {
        let mut panel = calculator();
        panel.first_input = "01:30:00".to_string();
        panel.second_input = " 00:45:00 ".to_string();
        panel.calculate();

        assert_eq!(
            panel.result,
            Some(("02:15:00".to_string(), "2 hours and 15 minutes".to_string()))
        );
        let saved = panel.history.get_all();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].summary(), "01:30:00 + 00:45:00 = 02:15:00");
    }

    #[test]
    fn test_invalid_input_shows_error_and_saves_nothing() {
        let mut panel = calculator();
        panel.first_input = "01:00:00".to_string();
        panel.operation = TimeOperation::Divide;
        panel.second_input = "0".to_string();
        panel.calculate();

        assert!(panel.result.is_none());
        assert!(panel.error.is_some());
        assert!(panel.history.get_all().is_empty());
    }

    #[test]
    fn test_reload_restores_inputs() {
        let mut panel = calculator();
        panel.first_input = "01:00:00".to_string();
        panel.operation = TimeOperation::Multiply;
        panel.second_input = "3".to_string();
        panel.calculate();

        panel.first_input.clear();
        panel.second_input.clear();
        panel.operation = TimeOperation::Add;

        let record = panel.history.get_all().remove(0);
        panel.reload(&record);
        assert_eq!(panel.first_input, "01:00:00");
        assert_eq!(panel.operation, TimeOperation::Multiply);
        assert_eq!(panel.second_input, "3");
        assert!(panel.result.is_none());
    }
}
