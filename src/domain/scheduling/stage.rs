//! Conversation stages of the sales script.
//!
//! Stages are ordered by a fixed priority number. Normal progression only
//! ever moves to a strictly higher number; `Handoff` is the one exception
//! and may be forced from any stage.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Discrete point in the scripted sales conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Greeting; nothing known about the request yet.
    #[default]
    Initial,

    /// The customer told us which item to clean.
    ItemIdentified,

    /// The customer's city is known.
    LocationCaptured,

    /// A quote has been shown and awaits an answer.
    QuotePresented,

    /// Collecting registration data from the customer.
    CustomerIdentified,

    /// Quote accepted; remaining mandatory data is being collected.
    QuoteConfirmed,

    /// The automated flow is over and a human operator takes the conversation.
    Handoff,
}

impl Stage {
    /// Every stage in progression order.
    pub const ALL: [Stage; 7] = [
        Stage::Initial,
        Stage::ItemIdentified,
        Stage::LocationCaptured,
        Stage::QuotePresented,
        Stage::CustomerIdentified,
        Stage::QuoteConfirmed,
        Stage::Handoff,
    ];

    /// Fixed priority number used for monotonic progression.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Initial => 1,
            Self::ItemIdentified => 2,
            Self::LocationCaptured => 3,
            Self::QuotePresented => 4,
            Self::CustomerIdentified => 5,
            Self::QuoteConfirmed => 6,
            Self::Handoff => 7,
        }
    }

    /// Snake-case name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::ItemIdentified => "item_identified",
            Self::LocationCaptured => "location_captured",
            Self::QuotePresented => "quote_presented",
            Self::CustomerIdentified => "customer_identified",
            Self::QuoteConfirmed => "quote_confirmed",
            Self::Handoff => "handoff",
        }
    }

    /// Maps a free-text stage hint to a stage.
    ///
    /// Matching ignores case, surrounding whitespace, and treats `-` and
    /// spaces like `_`. Unknown or empty hints map to `Initial`, which never
    /// wins the monotonic comparison and therefore means "no progression".
    pub fn from_hint(hint: &str) -> Self {
        let normalized: String = hint
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == normalized)
            .unwrap_or(Self::Initial)
    }

    /// Returns `candidate` if it ranks strictly above `self`, else `self`.
    pub fn advance(self, candidate: Stage) -> Stage {
        if candidate.priority() > self.priority() {
            candidate
        } else {
            self
        }
    }

    /// Returns true once the conversation belongs to a human operator.
    pub fn is_handoff(&self) -> bool {
        matches!(self, Self::Handoff)
    }

    /// Guidance handed to the language model while in this stage.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Initial => "Greet the customer and ask which item they want cleaned.",
            Self::ItemIdentified => {
                "Ask for a photo or the size of the item, then ask for the customer's city."
            }
            Self::LocationCaptured => {
                "Explain the bactericidal cleaning service and present the promotional quote."
            }
            Self::QuotePresented => "Answer doubts about the quote and ask whether to schedule.",
            Self::CustomerIdentified => {
                "Collect the remaining registration data; ask only for what is missing."
            }
            Self::QuoteConfirmed => {
                "The quote was accepted. Collect every missing mandatory field before closing."
            }
            Self::Handoff => "Do not continue the script; a human operator takes over.",
        }
    }

    /// Canned next message of the sales script for this stage.
    pub fn scripted_prompt(&self) -> &'static str {
        match self {
            Self::Initial => "Olá! Qual item deseja higienizar?",
            Self::ItemIdentified => {
                "Você tem uma foto do seu item pra mandar por gentileza? \
                 Se não tiver, me informe o tamanho. Em qual cidade você está?"
            }
            Self::LocationCaptured => {
                "Vou lhe mandar como funciona a nossa higienização! E logo em baixo o orçamento."
            }
            Self::QuotePresented => "Podemos seguir com o agendamento pelo valor promocional?",
            Self::CustomerIdentified | Self::QuoteConfirmed => {
                "Para cadastro e agendamento preciso dos seguintes dados: \
                 Rua e número (apto e andar se houver), Bairro, Nome completo, CPF e E-mail. \
                 Se possível envie a localização ou um ponto de referência."
            }
            Self::Handoff => {
                "Obrigada! Vou transferir você para nossa equipe finalizar o agendamento."
            }
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for Stage {
    fn can_transition_to(&self, target: &Self) -> bool {
        if self.is_handoff() {
            return false;
        }
        target.is_handoff() || target.priority() > self.priority()
    }

    fn valid_transitions(&self) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|target| self.can_transition_to(target))
            .collect()
    }
}
