//! Note models: field layout and card templates.

use super::NoteRecord;
use crate::config::{DeckSettings, MovappSettings};

/// Which fields a model carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// CID, source, target, examples, audio.
    Vocabulary,
    /// CID, source, target, audio.
    Phrasebook,
}

/// One card template.
#[derive(Debug, Clone, PartialEq)]
pub struct CardTemplate {
    pub name: String,
    /// Question (front) format.
    pub qfmt: String,
    /// Answer (back) format.
    pub afmt: String,
}

/// A note type.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteModel {
    pub id: i64,
    pub name: String,
    pub kind: ModelKind,
    pub fields: Vec<String>,
    pub templates: Vec<CardTemplate>,
}

const CID: &str = "CID";
const EXAMPLES: &str = "EXAMPLES";
const AUDIO: &str = "AUDIO";

fn answer(parts: &[String]) -> String {
    let mut afmt = String::from("{{FrontSide}}<hr id=\"answer\" />");
    afmt.push_str(&parts.join("<br /><br />"));
    afmt
}

fn bold(field: &str) -> String {
    format!("<b>{{{{{}}}}}</b>", field)
}

fn field(field: &str) -> String {
    format!("{{{{{}}}}}", field)
}

impl NoteModel {
    /// Word pairs with examples and example audio, studied in both directions.
    pub fn vocabulary(settings: &DeckSettings) -> Self {
        let source = settings.source_label.as_str();
        let target = settings.target_label.as_str();

        Self {
            id: settings.model_id,
            name: settings.model_name.clone(),
            kind: ModelKind::Vocabulary,
            fields: vec![
                CID.to_string(),
                source.to_string(),
                target.to_string(),
                EXAMPLES.to_string(),
                AUDIO.to_string(),
            ],
            templates: vec![
                CardTemplate {
                    name: format!("{} -> {}", target, source),
                    qfmt: field(target),
                    afmt: answer(&[bold(source), field(EXAMPLES), field(AUDIO)]),
                },
                CardTemplate {
                    name: format!("{} -> {}", source, target),
                    qfmt: field(source),
                    afmt: answer(&[bold(target), field(EXAMPLES)]),
                },
            ],
        }
    }

    /// Phrases with a prerecorded pronunciation, studied target to source.
    pub fn phrasebook(settings: &MovappSettings, labels: &DeckSettings) -> Self {
        let source = labels.source_label.as_str();
        let target = labels.target_label.as_str();

        Self {
            id: settings.model_id,
            name: settings.model_name.clone(),
            kind: ModelKind::Phrasebook,
            fields: vec![
                CID.to_string(),
                source.to_string(),
                target.to_string(),
                AUDIO.to_string(),
            ],
            templates: vec![CardTemplate {
                name: format!("{} -> {}", target, source),
                qfmt: field(target),
                afmt: answer(&[bold(source), field(AUDIO)]),
            }],
        }
    }

    /// Field values of a note, in model field order.
    pub fn field_values(&self, note: &NoteRecord) -> Vec<String> {
        match self.kind {
            ModelKind::Vocabulary => vec![
                note.id.clone(),
                note.source_field.clone(),
                note.target_field.clone(),
                note.examples_field.clone(),
                note.audio_field.clone(),
            ],
            ModelKind::Phrasebook => vec![
                note.id.clone(),
                note.source_field.clone(),
                note.target_field.clone(),
                note.audio_field.clone(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> NoteRecord {
        NoteRecord {
            id: "1".to_string(),
            source_field: "kot".to_string(),
            target_field: "кіт".to_string(),
            examples_field: "<ul><li>To jest kot.</li></ul>".to_string(),
            audio_field: "[sound:1_x.mp3]".to_string(),
        }
    }

    #[test]
    fn test_vocabulary_templates() {
        let model = NoteModel::vocabulary(&DeckSettings::default());
        assert_eq!(model.fields, vec!["CID", "PL", "UA", "EXAMPLES", "AUDIO"]);
        assert_eq!(model.templates.len(), 2);
        assert_eq!(model.templates[0].name, "UA -> PL");
        assert_eq!(model.templates[0].qfmt, "{{UA}}");
        assert_eq!(
            model.templates[0].afmt,
            "{{FrontSide}}<hr id=\"answer\" /><b>{{PL}}</b><br /><br />{{EXAMPLES}}<br /><br />{{AUDIO}}"
        );
        assert_eq!(
            model.templates[1].afmt,
            "{{FrontSide}}<hr id=\"answer\" /><b>{{UA}}</b><br /><br />{{EXAMPLES}}"
        );
    }

    #[test]
    fn test_field_values_follow_model() {
        let vocabulary = NoteModel::vocabulary(&DeckSettings::default());
        assert_eq!(vocabulary.field_values(&note()).len(), 5);

        let phrasebook =
            NoteModel::phrasebook(&MovappSettings::default(), &DeckSettings::default());
        assert_eq!(
            phrasebook.field_values(&note()),
            vec!["1", "kot", "кіт", "[sound:1_x.mp3]"]
        );
        assert_eq!(phrasebook.id, 4864239187);
    }
}
