use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::Result;
use crate::i18n::{Translator, keys};
use crate::knowledge::KnowledgeBaseFile;
use crate::notify::Notifier;
use crate::view::ResultCard;

/// Writes result cards to stdout with colors
pub fn print_cards(cards: &[ResultCard], translator: &dyn Translator) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_cards(&mut stdout, cards, translator)
}

/// Writes result cards to any color-capable writer
pub fn write_cards<W: WriteColor>(
    out: &mut W,
    cards: &[ResultCard],
    translator: &dyn Translator,
) -> Result<()> {
    if cards.is_empty() {
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        writeln!(out, "{}", translator.translate(keys::NO_RESULTS))?;
        out.reset()?;
        return Ok(());
    }

    let distance_label = translator.translate(keys::DISTANCE);
    for (i, card) in cards.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }

        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(out, "{}. {}", i + 1, card.title)?;
        out.reset()?;

        out.set_color(ColorSpec::new().set_dimmed(true))?;
        writeln!(out, "  {}: {}", distance_label, card.distance)?;
        out.reset()?;

        for line in card.body.lines() {
            writeln!(out, "   {}", line)?;
        }
    }

    Ok(())
}

/// Writes a file listing, one `uuid  name` pair per line
pub fn write_files<W: WriteColor>(out: &mut W, files: &[KnowledgeBaseFile]) -> Result<()> {
    for file in files {
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        write!(out, "{}", file.uuid)?;
        out.reset()?;
        write!(out, "  {}", file.file_name)?;
        if let Some(status) = &file.status {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            write!(out, "  [{}]", status)?;
            out.reset()?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Notifier printing errors in red on stderr
#[derive(Debug, Default)]
pub struct StderrNotifier {
    raised: usize,
}

impl StderrNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of errors printed so far
    pub fn raised(&self) -> usize {
        self.raised
    }
}

impl Notifier for StderrNotifier {
    fn notify_error(&mut self, message: &str) {
        self.raised += 1;
        let mut stderr = StandardStream::stderr(ColorChoice::Auto);
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
        let _ = writeln!(stderr, "{}", message);
        let _ = stderr.reset();
    }
}
