//! Turns classifier output into labelled cards

use crate::card::{Card, LabeledCard};
use crate::traits::ManualLabeler;
use crate::Result;
use setfinder_core::{AttributeLabel, PartialLabel};
use std::collections::VecDeque;

/// Answer of a manual labeler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualLabel {
    Label(AttributeLabel),
    /// The region is not a card and is dropped
    NotACard,
    /// No answer; the card stays unlabelled
    Unresolved,
}

/// What became of one card
#[derive(Debug, Clone)]
pub enum Assembled {
    /// Labelled by the classifiers
    Automatic(LabeledCard),
    /// Labelled by the manual labeler
    Manual(LabeledCard),
    /// Rejected as not a card
    NotACard(usize),
    /// Inconclusive and not labelled by hand either
    Unresolved(usize),
}

/// Attaches the final label to a card, asking the labeler when needed
pub struct LabelAssembler;

impl LabelAssembler {
    pub fn assemble(
        card: Card,
        partial: PartialLabel,
        labeler: &mut dyn ManualLabeler,
    ) -> Result<Assembled> {
        if let Some(label) = partial.resolve() {
            return Ok(Assembled::Automatic(LabeledCard::new(card, label)));
        }

        tracing::debug!(
            "Card {} needs a manual label, missing {:?}",
            card.index,
            partial.missing()
        );

        Ok(match labeler.request_label(&card)? {
            ManualLabel::Label(label) => Assembled::Manual(LabeledCard::new(card, label)),
            ManualLabel::NotACard => {
                tracing::info!("Card {} rejected as not a card", card.index);
                Assembled::NotACard(card.index)
            }
            ManualLabel::Unresolved => Assembled::Unresolved(card.index),
        })
    }
}

/// Replays canned answers in request order
#[derive(Debug, Default)]
pub struct ScriptedLabeler {
    answers: VecDeque<ManualLabel>,
    requested: Vec<usize>,
}

impl ScriptedLabeler {
    pub fn new<I: IntoIterator<Item = ManualLabel>>(answers: I) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            requested: Vec::new(),
        }
    }

    /// Indices of the cards that asked for a label
    pub fn requested(&self) -> &[usize] {
        &self.requested
    }
}

impl ManualLabeler for ScriptedLabeler {
    fn request_label(&mut self, card: &Card) -> Result<ManualLabel> {
        self.requested.push(card.index);
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("No scripted label left for card {}", card.index))
    }
}

/// Treats every card it is asked about as not a card
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingLabeler;

impl ManualLabeler for RejectingLabeler {
    fn request_label(&mut self, _card: &Card) -> Result<ManualLabel> {
        Ok(ManualLabel::NotACard)
    }
}

/// Leaves every card it is asked about unlabelled
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferringLabeler;

impl ManualLabeler for DeferringLabeler {
    fn request_label(&mut self, _card: &Card) -> Result<ManualLabel> {
        Ok(ManualLabel::Unresolved)
    }
}
