//! The display side of the client. Everything here is implemented by the
//! embedding UI; the core only decides what to show and when.

use crate::detail::WordDetail;
use crate::scoring::DifficultyScore;
use crate::views::{ListMarkup, StatsSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingContent<'a> {
    /// Placeholder while a large document is still rendering.
    Skeleton,
    /// Complete markup; replaces whatever was shown before.
    Markup(&'a str),
}

pub trait Surface {
    fn show_progress(&mut self, progress: u8, stage: &str);

    fn show_failure(&mut self, message: &str);

    fn show_results(&mut self, summary: &StatsSummary, score: &DifficultyScore);

    fn show_lists(&mut self, lists: &ListMarkup);

    fn show_reading(&mut self, content: ReadingContent<'_>);

    fn show_detail(&mut self, detail: &WordDetail);

    /// Returns keyboard focus to a control, typically after the detail view closes.
    fn restore_focus(&mut self, _control: &str) {}

    /// Back to the upload form.
    fn show_upload(&mut self) {}
}
