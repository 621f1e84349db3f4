//! Stage progression rules.
//!
//! `StageMachine::next_stage` is a pure decision over the current stage,
//! this turn's extraction result, and the already-updated record. The rules
//! are evaluated in a fixed order and the first one that applies wins.

use super::completion::CompletionPolicy;
use super::customer::CustomerRecord;
use super::extraction::ExtractionResult;
use super::stage::Stage;

/// Decides the next conversation stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageMachine {
    policy: CompletionPolicy,
}

impl StageMachine {
    pub fn new(policy: CompletionPolicy) -> Self {
        Self { policy }
    }

    /// Computes the stage that follows `current`.
    ///
    /// # Rules (first match wins)
    /// 1. Record complete while in `QuoteConfirmed` → `Handoff`
    /// 2. Fresh identity data while collecting identity → `CustomerIdentified`
    /// 3. Quote accepted → `QuoteConfirmed` while data is missing, else `Handoff`
    /// 4. Fresh city after the item → `QuotePresented` if the quote is
    ///    undecided, else `LocationCaptured`
    /// 5. Customer wants to schedule → `Handoff`
    /// 6. Explicit `handoff` hint → `Handoff`
    /// 7. Map the hint (with a freshly extracted item as the floor)
    ///
    /// Every non-handoff outcome passes through [`Stage::advance`], so the
    /// stage never moves backwards. Unknown hints mean "no progression".
    pub fn next_stage(
        &self,
        current: Stage,
        extraction: &ExtractionResult,
        record: &CustomerRecord,
    ) -> Stage {
        if self.policy.can_handoff(record, current) {
            return Stage::Handoff;
        }

        if extraction.has_identity_data()
            && matches!(current, Stage::QuoteConfirmed | Stage::CustomerIdentified)
        {
            return current.advance(Stage::CustomerIdentified);
        }

        if extraction.accepted_quote() {
            return if self.policy.is_complete(record) {
                Stage::Handoff
            } else {
                current.advance(Stage::QuoteConfirmed)
            };
        }

        if extraction.city.is_some()
            && matches!(current, Stage::ItemIdentified | Stage::LocationCaptured)
        {
            let candidate = if record.service.quote_decision.is_decided() {
                Stage::LocationCaptured
            } else {
                Stage::QuotePresented
            };
            return current.advance(candidate);
        }

        if extraction.wants_to_schedule {
            return Stage::Handoff;
        }

        let hinted = extraction
            .detected_stage
            .as_deref()
            .map(Stage::from_hint)
            .unwrap_or_default();

        if hinted.is_handoff() {
            return Stage::Handoff;
        }

        let candidate = if extraction.item.is_some() {
            hinted.advance(Stage::ItemIdentified)
        } else {
            hinted
        };

        current.advance(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scheduling::completion::fixtures::{complete_record, remove};
    use crate::domain::scheduling::completion::MandatoryField;
    use crate::domain::scheduling::customer::{ItemType, QuoteDecision};
    use proptest::prelude::*;

    fn machine() -> StageMachine {
        StageMachine::default()
    }

    fn extraction_with(f: impl FnOnce(&mut ExtractionResult)) -> ExtractionResult {
        let mut extraction = ExtractionResult::default();
        f(&mut extraction);
        extraction
    }

    mod scenarios {
        use super::*;

        #[test]
        fn item_in_initial_stage_identifies_item() {
            let extraction = extraction_with(|e| e.item = Some("sofa".to_string()));
            let mut record = CustomerRecord::new();
            record.service.item = Some(ItemType::Sofa);

            assert_eq!(
                machine().next_stage(Stage::Initial, &extraction, &record),
                Stage::ItemIdentified
            );
        }

        #[test]
        fn city_after_item_presents_quote() {
            let extraction = extraction_with(|e| e.city = Some("Fortaleza".to_string()));
            let mut record = CustomerRecord::new();
            record.service.item = Some(ItemType::Sofa);
            record.location.city = Some("Fortaleza".to_string());

            assert_eq!(
                machine().next_stage(Stage::ItemIdentified, &extraction, &record),
                Stage::QuotePresented
            );
        }

        #[test]
        fn complete_record_in_quote_confirmed_hands_off() {
            assert_eq!(
                machine().next_stage(
                    Stage::QuoteConfirmed,
                    &ExtractionResult::default(),
                    &complete_record()
                ),
                Stage::Handoff
            );
        }
    }

    mod rules {
        use super::*;

        #[test]
        fn identity_data_while_confirmed_keeps_collecting() {
            let mut record = complete_record();
            remove(&mut record, MandatoryField::Email);
            let extraction = extraction_with(|e| e.full_name = Some("Maria".to_string()));

            assert_eq!(
                machine().next_stage(Stage::QuoteConfirmed, &extraction, &record),
                Stage::QuoteConfirmed
            );
            assert_eq!(
                machine().next_stage(Stage::CustomerIdentified, &extraction, &record),
                Stage::CustomerIdentified
            );
        }

        #[test]
        fn accepted_quote_with_missing_data_confirms_quote() {
            let mut record = CustomerRecord::new();
            record.service.item = Some(ItemType::Sofa);
            record.service.quote_decision = QuoteDecision::Accepted;
            let extraction = extraction_with(|e| e.accepts_quote = QuoteDecision::Accepted);

            assert_eq!(
                machine().next_stage(Stage::QuotePresented, &extraction, &record),
                Stage::QuoteConfirmed
            );
        }

        #[test]
        fn accepted_quote_with_complete_data_hands_off() {
            let extraction = extraction_with(|e| e.accepts_quote = QuoteDecision::Accepted);
            assert_eq!(
                machine().next_stage(Stage::QuotePresented, &extraction, &complete_record()),
                Stage::Handoff
            );
        }

        #[test]
        fn city_with_decided_quote_captures_location() {
            let mut record = CustomerRecord::new();
            record.service.quote_decision = QuoteDecision::Rejected;
            let extraction = extraction_with(|e| e.city = Some("Caucaia".to_string()));

            assert_eq!(
                machine().next_stage(Stage::ItemIdentified, &extraction, &record),
                Stage::LocationCaptured
            );
        }

        #[test]
        fn city_before_item_does_not_present_quote() {
            let extraction = extraction_with(|e| e.city = Some("Fortaleza".to_string()));
            assert_eq!(
                machine().next_stage(Stage::Initial, &extraction, &CustomerRecord::new()),
                Stage::Initial
            );
        }

        #[test]
        fn wanting_to_schedule_hands_off() {
            let extraction = extraction_with(|e| e.wants_to_schedule = true);
            assert_eq!(
                machine().next_stage(Stage::LocationCaptured, &extraction, &CustomerRecord::new()),
                Stage::Handoff
            );
        }

        #[test]
        fn explicit_handoff_hint_hands_off() {
            let extraction = extraction_with(|e| e.detected_stage = Some("HANDOFF".to_string()));
            assert_eq!(
                machine().next_stage(Stage::Initial, &extraction, &CustomerRecord::new()),
                Stage::Handoff
            );
        }

        #[test]
        fn hint_is_adopted_only_when_higher() {
            let forward = extraction_with(|e| e.detected_stage = Some("quote_presented".to_string()));
            let backward = extraction_with(|e| e.detected_stage = Some("item_identified".to_string()));
            let record = CustomerRecord::new();

            assert_eq!(
                machine().next_stage(Stage::LocationCaptured, &forward, &record),
                Stage::QuotePresented
            );
            assert_eq!(
                machine().next_stage(Stage::LocationCaptured, &backward, &record),
                Stage::LocationCaptured
            );
        }

        #[test]
        fn unknown_hint_means_no_progression() {
            let extraction = extraction_with(|e| e.detected_stage = Some("???".to_string()));
            assert_eq!(
                machine().next_stage(Stage::ItemIdentified, &extraction, &CustomerRecord::new()),
                Stage::ItemIdentified
            );
        }

        #[test]
        fn default_extraction_keeps_stage() {
            for stage in Stage::ALL.iter().filter(|s| **s != Stage::QuoteConfirmed) {
                assert_eq!(
                    machine().next_stage(*stage, &ExtractionResult::default(), &CustomerRecord::new()),
                    *stage
                );
            }
        }
    }

    fn stage_strategy() -> impl Strategy<Value = Stage> {
        (0usize..6).prop_map(|i| Stage::ALL[i])
    }

    fn extraction_strategy() -> impl Strategy<Value = ExtractionResult> {
        (
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            0u8..3,
            any::<bool>(),
            prop::option::of(0usize..8),
        )
            .prop_map(|(item, city, name, quote, schedule, hint)| ExtractionResult {
                item: item.then(|| "sofá".to_string()),
                city: city.then(|| "Fortaleza".to_string()),
                full_name: name.then(|| "Maria".to_string()),
                accepts_quote: match quote {
                    0 => QuoteDecision::Unknown,
                    1 => QuoteDecision::Accepted,
                    _ => QuoteDecision::Rejected,
                },
                wants_to_schedule: schedule,
                detected_stage: hint.map(|i| {
                    Stage::ALL
                        .get(i)
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                }),
                ..Default::default()
            })
    }

    proptest! {
        #[test]
        fn stage_never_moves_backwards(
            current in stage_strategy(),
            extraction in extraction_strategy(),
            missing in 0u16..256,
        ) {
            let mut record = complete_record();
            for (bit, field) in MandatoryField::ALL.iter().enumerate() {
                if missing & (1 << bit) != 0 {
                    remove(&mut record, *field);
                }
            }

            let next = machine().next_stage(current, &extraction, &record);

            prop_assert!(
                next == current || next.is_handoff() || next.priority() > current.priority(),
                "{:?} -> {:?}",
                current,
                next
            );
        }
    }
}
