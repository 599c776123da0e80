use crate::annotation::{Annotation, AnnotationIndex};
use crate::cefr::CefrLevel;
use serde::Serialize;

const MAX_EXAMPLES: usize = 3;

/// Everything the detail view shows for one word or phrase. Absent data is
/// `None`/empty and the matching section is simply not drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordDetail {
    pub title: String,
    pub level: CefrLevel,
    pub level_color: &'static str,
    pub is_phrase: bool,
    pub definition: Option<String>,
    pub phonetic: Option<String>,
    pub frequency: Option<String>,
    pub examples: Vec<String>,
}

impl From<&Annotation> for WordDetail {
    fn from(annotation: &Annotation) -> Self {
        let level = annotation.level();
        let frequency = match annotation.frequency() {
            0 => None,
            n => Some(format!("{} occurrence(s)", n)),
        };
        Self {
            title: annotation.text().to_string(),
            level,
            level_color: level.color(),
            is_phrase: matches!(annotation, Annotation::Phrase(_)),
            definition: annotation.definition().map(str::to_string),
            phonetic: annotation.phonetic().map(str::to_string),
            frequency,
            examples: annotation.examples().iter().take(MAX_EXAMPLES).cloned().collect(),
        }
    }
}

/// Entry point of the detail view.
///
/// Opening remembers which control had focus; closing hands it back so the
/// surface can restore it.
#[derive(Debug, Default)]
pub struct DetailPresenter {
    open: Option<WordDetail>,
    return_focus: Option<String>,
}

impl DetailPresenter {
    /// Resolves a clicked token through the index. Unknown tokens open nothing.
    pub fn show(&mut self, index: &AnnotationIndex, token: &str, focused_control: Option<&str>) -> Option<&WordDetail> {
        let annotation = index.get(token)?;
        if self.open.is_none() {
            self.return_focus = focused_control.map(str::to_string);
        }
        self.open = Some(WordDetail::from(annotation));
        self.open.as_ref()
    }

    pub fn current(&self) -> Option<&WordDetail> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Closes the view and returns the control that should get focus back.
    pub fn close(&mut self) -> Option<String> {
        self.open = None;
        self.return_focus.take()
    }
}
