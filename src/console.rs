//! Terminal fallback for cards the classifiers could not label

use anyhow::{bail, Context};
use setfinder_core::attributes::Attribute;
use setfinder_core::{AttributeLabel, Color, Count, Shade, Shape};
use setfinder_cv::traits::ManualLabeler;
use setfinder_cv::utils::ImageUtils;
use setfinder_cv::{Card, ManualLabel, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

const PREVIEW_FILE: &str = "pending-card.jpg";

/// Asks for each attribute on a terminal
///
/// The card in question is written to `<preview_dir>/pending-card.jpg` so
/// it can be opened next to the prompt, and removed once answered. Entering
/// `n` at any prompt marks the region as not a card.
pub struct ConsoleLabeler<R, W> {
    input: R,
    output: W,
    preview_dir: PathBuf,
}

impl<R: BufRead, W: Write> ConsoleLabeler<R, W> {
    pub fn new(input: R, output: W, preview_dir: impl Into<PathBuf>) -> Self {
        Self {
            input,
            output,
            preview_dir: preview_dir.into(),
        }
    }

    fn read_choice(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("Input closed while waiting for a label");
        }
        Ok(line.trim().to_lowercase())
    }

    /// `None` when the user says this is not a card
    fn ask<A: Attribute + std::fmt::Display>(&mut self) -> Result<Option<A>> {
        loop {
            writeln!(self.output, "Enter the card's {}:", A::NAME.to_uppercase())?;
            for (i, value) in A::ALL.iter().enumerate() {
                writeln!(self.output, "  {} for {}", i + 1, value)?;
            }
            write!(self.output, "  n if this is not a card: ")?;
            self.output.flush()?;

            let choice = self.read_choice()?;
            if choice == "n" {
                return Ok(None);
            }
            match choice.parse::<usize>() {
                Ok(n @ 1..=3) => return Ok(Some(A::ALL[n - 1])),
                _ => writeln!(self.output, "'{}' is not one of 1, 2, 3 or n", choice)?,
            }
        }
    }

    /// Ask for all four attributes, `None` for not a card
    pub fn ask_label(&mut self) -> Result<Option<AttributeLabel>> {
        loop {
            let Some(color) = self.ask::<Color>()? else {
                return Ok(None);
            };
            let Some(count) = self.ask::<Count>()? else {
                return Ok(None);
            };
            let Some(shade) = self.ask::<Shade>()? else {
                return Ok(None);
            };
            let Some(shape) = self.ask::<Shape>()? else {
                return Ok(None);
            };

            let label = AttributeLabel::new(color, count, shade, shape);
            write!(self.output, "Your choice: {}. Enter n to redo, anything else to accept: ", label)?;
            self.output.flush()?;
            if self.read_choice()? != "n" {
                return Ok(Some(label));
            }
        }
    }
}

impl<R: BufRead, W: Write> ManualLabeler for ConsoleLabeler<R, W> {
    fn request_label(&mut self, card: &Card) -> Result<ManualLabel> {
        std::fs::create_dir_all(&self.preview_dir)
            .with_context(|| format!("Failed to create {:?}", self.preview_dir))?;
        let preview = self.preview_dir.join(PREVIEW_FILE);
        ImageUtils::save_image(card.image.as_mat(), &preview)?;

        writeln!(
            self.output,
            "\nCard {} could not be labelled automatically; it is shown in {:?}",
            card.index, preview
        )?;

        let answer = self.ask_label();
        std::fs::remove_file(&preview)
            .with_context(|| format!("Failed to remove preview {:?}", preview))?;

        Ok(match answer? {
            Some(label) => ManualLabel::Label(label),
            None => ManualLabel::NotACard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setfinder_core::Quad;
    use setfinder_cv::CardImage;
    use std::io::Cursor;

    fn labeler(input: &str) -> ConsoleLabeler<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleLabeler::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), std::env::temp_dir())
    }

    #[test]
    fn test_reads_four_choices() -> Result<()> {
        let mut console = labeler("3\n3\n1\n3\n\n");
        let label = console.ask_label()?;
        assert_eq!(label.map(|l| l.to_string()).as_deref(), Some("purple-triple-solid-capsule"));

        let prompts = String::from_utf8(console.output)?;
        assert!(prompts.contains("Enter the card's COLOR:"));
        assert!(prompts.contains("2 for squiggle"));
        Ok(())
    }

    #[test]
    fn test_invalid_choice_is_asked_again() -> Result<()> {
        let mut console = labeler("7\nred\n1\n2\n2\n1\ny\n");
        let label = console.ask_label()?;
        assert_eq!(label.map(|l| l.to_string()).as_deref(), Some("red-double-stripes-diamond"));
        assert!(String::from_utf8(console.output)?.contains("'7' is not one of"));
        Ok(())
    }

    #[test]
    fn test_redo_and_not_a_card() -> Result<()> {
        let mut console = labeler("1\n1\n1\n1\nn\n2\n1\n1\n1\nok\n");
        assert_eq!(
            console.ask_label()?.map(|l| l.to_string()).as_deref(),
            Some("green-single-solid-diamond")
        );

        let mut console = labeler("1\nn\n");
        assert_eq!(console.ask_label()?, None);

        let mut console = labeler("1\n");
        assert!(console.ask_label().is_err());
        Ok(())
    }

    fn scratch_dir(name: &str) -> Result<PathBuf> {
        let dir = std::env::temp_dir().join(format!("setfinder-{name}-{}", std::process::id()));
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    #[test]
    fn test_preview_is_removed_after_answer() -> Result<()> {
        let dir = scratch_dir("preview")?;
        let card = Card {
            index: 5,
            image: CardImage::new(ImageUtils::rgb_to_mat(&image::RgbImage::new(45, 30))?),
            corners: Quad::rectangle(45, 30),
        };

        let mut console = ConsoleLabeler::new(Cursor::new(b"n\n".to_vec()), Vec::new(), &dir);
        assert_eq!(console.request_label(&card)?, ManualLabel::NotACard);
        assert!(!dir.join(PREVIEW_FILE).exists());
        assert!(String::from_utf8(console.output)?.contains("Card 5 could not be labelled"));

        // closed input is still an error, without leaving the preview behind
        let mut console = ConsoleLabeler::new(Cursor::new(Vec::new()), Vec::new(), &dir);
        assert!(console.request_label(&card).is_err());
        assert!(!dir.join(PREVIEW_FILE).exists());

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
