//! Rule-based exception triage.
//!
//! A fixed battery of category-tagged patterns runs against the lowered
//! utterance. Every category that matches contributes exactly one finding;
//! categories are never short-circuited, so one message may raise several
//! findings at once. Context flags (off-hours, technical error) fire their
//! categories without looking at the text.

use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};

use super::completion::MandatoryField;
use super::customer::CustomerIdentity;
use super::validation::{is_valid_email, is_valid_national_id, is_valid_phone};

/// Category of an exceptional situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    OutOfScopeService,
    Complaint,
    Cancellation,
    OffHours,
    InvalidData,
    ComplexQuestion,
    CustomerResistance,
    TechnicalError,
}

impl ExceptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfScopeService => "out_of_scope_service",
            Self::Complaint => "complaint",
            Self::Cancellation => "cancellation",
            Self::OffHours => "off_hours",
            Self::InvalidData => "invalid_data",
            Self::ComplexQuestion => "complex_question",
            Self::CustomerResistance => "customer_resistance",
            Self::TechnicalError => "technical_error",
        }
    }
}

impl std::fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected exceptional condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionFinding {
    pub kind: ExceptionKind,
    /// Fixed per-category confidence in `[0, 1]`.
    pub confidence: f32,
    /// 1 = most urgent, 3 = least urgent.
    pub priority: u8,
    pub forces_handoff: bool,
    pub description: String,
    /// The offending field, for invalid-data findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<MandatoryField>,
}

/// Flags describing the circumstances of a turn, independent of its text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriageContext {
    pub outside_business_hours: bool,
    pub technical_error: bool,
}

/// Generic answer used when a category has no dedicated template.
pub const GENERIC_RESPONSE: &str =
    "Vou conectar você com nossa equipe para dar continuidade ao seu atendimento.";

struct CategoryRule {
    kind: ExceptionKind,
    confidence: f32,
    priority: u8,
    forces_handoff: bool,
    description: &'static str,
    patterns: &'static [&'static str],
}

static TEXT_RULES: [CategoryRule; 5] = [
    CategoryRule {
        kind: ExceptionKind::OutOfScopeService,
        confidence: 0.9,
        priority: 1,
        forces_handoff: true,
        description: "Requested service is outside the upholstery cleaning scope",
        patterns: &[
            r"banco.*carro",
            r"carro.*banco",
            r"assento.*carro",
            r"tapete.*carro",
            r"volante",
            r"painel.*carro",
            r"carpete.*residencial",
            r"piso",
            r"tapete.*comum",
            r"roupa",
            r"tecido.*roupa",
            r"cortina.*lavagem",
            r"móvel.*madeira",
            r"mesa.*madeira",
            r"guarda.*roupa",
        ],
    },
    CategoryRule {
        kind: ExceptionKind::Complaint,
        confidence: 0.85,
        priority: 1,
        forces_handoff: true,
        description: "Customer complaint about a previous service",
        patterns: &[
            r"não.*ficou.*bom",
            r"ficou.*pior",
            r"danificou",
            r"estragou",
            r"mancha.*não.*saiu",
            r"cheiro.*ruim",
            r"problema.*serviço",
            r"insatisfeito",
            r"não.*gostei",
            r"quero.*reclamar",
            r"técnico.*mal.*educado",
            r"atraso",
            r"não.*veio",
        ],
    },
    CategoryRule {
        kind: ExceptionKind::Cancellation,
        confidence: 0.8,
        priority: 1,
        forces_handoff: true,
        description: "Customer wants to cancel",
        patterns: &[
            r"cancelar.*agendamento",
            r"desmarcar",
            r"não.*quero.*mais",
            r"mudei.*ideia",
            r"cancelar.*serviço",
            r"não.*vai.*dar",
        ],
    },
    CategoryRule {
        kind: ExceptionKind::CustomerResistance,
        confidence: 0.7,
        priority: 2,
        forces_handoff: false,
        description: "Customer is reluctant to share data",
        patterns: &[
            r"não.*quero.*dar.*dados",
            r"muita.*pergunta",
            r"já.*disse",
            r"esse.*mesmo.*número",
            r"não.*precisa.*saber",
            r"por.*que.*precisa",
            r"muito.*burocrático",
        ],
    },
    CategoryRule {
        kind: ExceptionKind::ComplexQuestion,
        confidence: 0.8,
        priority: 1,
        forces_handoff: true,
        description: "Technical question that needs a specialist",
        patterns: &[
            r"que.*produto.*usa",
            r"é.*tóxico",
            r"faz.*mal.*pet",
            r"alergia.*produto",
            r"garantia.*quanto.*tempo",
            r"seguro.*dano",
            r"responsabilidade.*civil",
            r"como.*funciona.*equipamento",
            r"técnica.*limpeza",
        ],
    },
];

static COMPILED_RULES: Lazy<Vec<(&'static CategoryRule, RegexSet)>> = Lazy::new(|| {
    TEXT_RULES
        .iter()
        .map(|rule| {
            let set = RegexSet::new(rule.patterns).expect("valid triage patterns");
            (rule, set)
        })
        .collect()
});

impl CategoryRule {
    fn finding(&self) -> ExceptionFinding {
        ExceptionFinding {
            kind: self.kind,
            confidence: self.confidence,
            priority: self.priority,
            forces_handoff: self.forces_handoff,
            description: self.description.to_string(),
            field: None,
        }
    }
}

/// Stateless classifier over utterances and identity data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionTriage;

impl ExceptionTriage {
    pub fn new() -> Self {
        Self
    }

    /// Runs every category against the utterance and the context flags.
    ///
    /// Returns one finding per matching category, in battery order, followed
    /// by context-driven findings.
    pub fn detect(&self, text: &str, context: &TriageContext) -> Vec<ExceptionFinding> {
        let lowered = text.to_lowercase();

        let mut findings: Vec<ExceptionFinding> = COMPILED_RULES
            .iter()
            .filter(|(_, set)| set.is_match(&lowered))
            .map(|(rule, _)| rule.finding())
            .collect();

        if context.outside_business_hours {
            findings.push(ExceptionFinding {
                kind: ExceptionKind::OffHours,
                confidence: 1.0,
                priority: 1,
                forces_handoff: true,
                description: "Message received outside business hours".to_string(),
                field: None,
            });
        }

        if context.technical_error {
            findings.push(ExceptionFinding {
                kind: ExceptionKind::TechnicalError,
                confidence: 1.0,
                priority: 1,
                forces_handoff: true,
                description: "Message could not be processed automatically".to_string(),
                field: None,
            });
        }

        findings
    }

    /// Structural checks on identity data.
    ///
    /// Each present-but-malformed value yields an advisory `InvalidData`
    /// finding that never forces handoff. Absent values are not checked.
    pub fn validate(&self, identity: &CustomerIdentity) -> Vec<ExceptionFinding> {
        let checks: [(MandatoryField, Option<&str>, fn(&str) -> bool, f32); 3] = [
            (
                MandatoryField::NationalId,
                identity.national_id.as_deref(),
                is_valid_national_id,
                1.0,
            ),
            (
                MandatoryField::Phone,
                identity.phone.as_deref(),
                is_valid_phone,
                0.8,
            ),
            (
                MandatoryField::Email,
                identity.email.as_deref(),
                is_valid_email,
                0.9,
            ),
        ];

        checks
            .into_iter()
            .filter_map(|(field, value, is_valid, confidence)| {
                let value = value?;
                if is_valid(value) {
                    return None;
                }
                Some(ExceptionFinding {
                    kind: ExceptionKind::InvalidData,
                    confidence,
                    priority: 1,
                    forces_handoff: false,
                    description: format!("Invalid {}", field.label()),
                    field: Some(field),
                })
            })
            .collect()
    }

    /// Picks the finding that drives the response.
    ///
    /// The lowest priority number is the most urgent. Ties go to the higher
    /// confidence, then to the earliest finding in the list.
    pub fn select_principal<'a>(
        &self,
        findings: &'a [ExceptionFinding],
    ) -> Option<&'a ExceptionFinding> {
        findings.iter().reduce(|best, candidate| {
            let more_urgent = candidate.priority < best.priority;
            let same_urgency_more_confident =
                candidate.priority == best.priority && candidate.confidence > best.confidence;
            if more_urgent || same_urgency_more_confident {
                candidate
            } else {
                best
            }
        })
    }

    /// Canned answer for a category.
    pub fn response_template(&self, kind: ExceptionKind) -> &'static str {
        match kind {
            ExceptionKind::OutOfScopeService => {
                "Para esse tipo de serviço, vou conectar você com nossa equipe especializada."
            }
            ExceptionKind::Complaint => {
                "Entendo sua preocupação. Vou conectar você imediatamente com nossa equipe \
                 para resolver essa situação."
            }
            ExceptionKind::Cancellation => {
                "Vou conectar você com nossa equipe para processar o cancelamento."
            }
            ExceptionKind::OffHours => {
                "Nosso horário de atendimento é Segunda à Sexta das 08:00 às 18:00, \
                 Sábados das 08:00 às 12:00. Retornaremos em breve!"
            }
            ExceptionKind::CustomerResistance => {
                "Entendo. Esses dados são necessários apenas para o agendamento \
                 e são protegidos pela LGPD."
            }
            ExceptionKind::ComplexQuestion => {
                "Essa é uma excelente pergunta técnica. Vou conectar você com nosso especialista."
            }
            ExceptionKind::TechnicalError => {
                "Tivemos uma instabilidade no atendimento automático. \
                 Vou conectar você com nossa equipe."
            }
            ExceptionKind::InvalidData => GENERIC_RESPONSE,
        }
    }

    /// Re-prompt asking the customer to correct one field.
    pub fn reprompt_for(&self, field: MandatoryField) -> &'static str {
        match field {
            MandatoryField::NationalId => {
                "O CPF informado parece estar incorreto. Poderia verificar e informar novamente?"
            }
            MandatoryField::Phone => {
                "O telefone informado parece estar incompleto. Poderia informar com DDD?"
            }
            MandatoryField::Email => "O email informado parece estar incorreto. Poderia verificar?",
            _ => GENERIC_RESPONSE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(findings: &[ExceptionFinding]) -> Vec<ExceptionKind> {
        findings.iter().map(|f| f.kind).collect()
    }

    mod detect {
        use super::*;

        #[test]
        fn cancellation_request_yields_single_forcing_finding() {
            let findings =
                ExceptionTriage::new().detect("quero cancelar o agendamento", &TriageContext::default());

            assert_eq!(kinds(&findings), vec![ExceptionKind::Cancellation]);
            assert!(findings[0].forces_handoff);
            assert_eq!(findings[0].priority, 1);
        }

        #[test]
        fn plain_request_yields_nothing() {
            let findings = ExceptionTriage::new()
                .detect("Quero higienizar meu sofá de 3 lugares", &TriageContext::default());
            assert!(findings.is_empty());
        }

        #[test]
        fn matching_ignores_case() {
            let findings =
                ExceptionTriage::new().detect("QUERO RECLAMAR DO SERVIÇO", &TriageContext::default());
            assert_eq!(kinds(&findings), vec![ExceptionKind::Complaint]);
        }

        #[test]
        fn several_patterns_of_one_category_yield_one_finding() {
            let findings = ExceptionTriage::new().detect(
                "estragou o tecido e ficou pior, estou insatisfeito",
                &TriageContext::default(),
            );
            assert_eq!(kinds(&findings), vec![ExceptionKind::Complaint]);
        }

        #[test]
        fn complaint_and_resistance_co_occur() {
            let findings = ExceptionTriage::new().detect(
                "estou insatisfeito e já disse meu telefone",
                &TriageContext::default(),
            );
            assert_eq!(
                kinds(&findings),
                vec![ExceptionKind::Complaint, ExceptionKind::CustomerResistance]
            );
        }

        #[test]
        fn resistance_does_not_force_handoff() {
            let findings =
                ExceptionTriage::new().detect("muita pergunta", &TriageContext::default());
            assert_eq!(kinds(&findings), vec![ExceptionKind::CustomerResistance]);
            assert!(!findings[0].forces_handoff);
        }

        #[test]
        fn context_flags_fire_without_text() {
            let context = TriageContext {
                outside_business_hours: true,
                technical_error: true,
            };
            let findings = ExceptionTriage::new().detect("oi", &context);
            assert_eq!(
                kinds(&findings),
                vec![ExceptionKind::OffHours, ExceptionKind::TechnicalError]
            );
            assert!(findings.iter().all(|f| f.forces_handoff));
        }
    }

    mod validate {
        use super::*;

        #[test]
        fn repeated_digit_national_id_yields_one_advisory_finding() {
            let identity = CustomerIdentity {
                national_id: Some("11111111111".to_string()),
                ..Default::default()
            };
            let findings = ExceptionTriage::new().validate(&identity);

            assert_eq!(findings.len(), 1);
            assert_eq!(findings[0].kind, ExceptionKind::InvalidData);
            assert_eq!(findings[0].field, Some(MandatoryField::NationalId));
            assert!(!findings[0].forces_handoff);
        }

        #[test]
        fn absent_fields_are_not_checked() {
            let findings = ExceptionTriage::new().validate(&CustomerIdentity::default());
            assert!(findings.is_empty());
        }

        #[test]
        fn reports_each_invalid_field() {
            let identity = CustomerIdentity {
                phone: Some("9999".to_string()),
                email: Some("maria@".to_string()),
                national_id: Some("529.982.247-25".to_string()),
                ..Default::default()
            };
            let fields: Vec<_> = ExceptionTriage::new()
                .validate(&identity)
                .into_iter()
                .filter_map(|f| f.field)
                .collect();
            assert_eq!(fields, vec![MandatoryField::Phone, MandatoryField::Email]);
        }

        #[test]
        fn reprompt_names_the_field() {
            let triage = ExceptionTriage::new();
            assert!(triage.reprompt_for(MandatoryField::NationalId).contains("CPF"));
            assert!(triage.reprompt_for(MandatoryField::Phone).contains("DDD"));
            assert_eq!(triage.reprompt_for(MandatoryField::City), GENERIC_RESPONSE);
        }
    }

    mod principal {
        use super::*;

        fn finding(kind: ExceptionKind, priority: u8, confidence: f32) -> ExceptionFinding {
            ExceptionFinding {
                kind,
                confidence,
                priority,
                forces_handoff: true,
                description: String::new(),
                field: None,
            }
        }

        #[test]
        fn empty_list_has_no_principal() {
            assert!(ExceptionTriage::new().select_principal(&[]).is_none());
        }

        #[test]
        fn lowest_priority_number_wins() {
            let findings = vec![
                finding(ExceptionKind::CustomerResistance, 2, 0.7),
                finding(ExceptionKind::Complaint, 1, 0.85),
            ];
            let principal = ExceptionTriage::new().select_principal(&findings).unwrap();
            assert_eq!(principal.kind, ExceptionKind::Complaint);
        }

        #[test]
        fn equal_priority_prefers_higher_confidence() {
            let findings = vec![
                finding(ExceptionKind::Cancellation, 1, 0.8),
                finding(ExceptionKind::OutOfScopeService, 1, 0.9),
            ];
            let principal = ExceptionTriage::new().select_principal(&findings).unwrap();
            assert_eq!(principal.kind, ExceptionKind::OutOfScopeService);
        }

        #[test]
        fn full_tie_keeps_first() {
            let findings = vec![
                finding(ExceptionKind::Cancellation, 1, 0.8),
                finding(ExceptionKind::ComplexQuestion, 1, 0.8),
            ];
            let principal = ExceptionTriage::new().select_principal(&findings).unwrap();
            assert_eq!(principal.kind, ExceptionKind::Cancellation);
        }

        #[test]
        fn every_kind_has_a_template() {
            let triage = ExceptionTriage::new();
            for kind in [
                ExceptionKind::OutOfScopeService,
                ExceptionKind::Complaint,
                ExceptionKind::Cancellation,
                ExceptionKind::OffHours,
                ExceptionKind::InvalidData,
                ExceptionKind::ComplexQuestion,
                ExceptionKind::CustomerResistance,
                ExceptionKind::TechnicalError,
            ] {
                assert!(!triage.response_template(kind).is_empty(), "{kind}");
            }
        }
    }

    const SAMPLES: [(ExceptionKind, &str); 5] = [
        (ExceptionKind::OutOfScopeService, "lavar o volante"),
        (ExceptionKind::Complaint, "estou insatisfeito"),
        (ExceptionKind::Cancellation, "preciso desmarcar"),
        (ExceptionKind::CustomerResistance, "muito burocrático"),
        (ExceptionKind::ComplexQuestion, "tem seguro contra dano"),
    ];

    proptest! {
        #[test]
        fn one_finding_per_matching_category(mask in 0u8..32, off_hours in any::<bool>()) {
            let text = SAMPLES
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, (_, phrase))| *phrase)
                .collect::<Vec<_>>()
                .join(". ");
            let context = TriageContext { outside_business_hours: off_hours, technical_error: false };

            let triage = ExceptionTriage::new();
            let findings = triage.detect(&text, &context);

            let expected = mask.count_ones() as usize + usize::from(off_hours);
            prop_assert_eq!(findings.len(), expected);
            for (bit, (kind, _)) in SAMPLES.iter().enumerate() {
                let present = findings.iter().filter(|f| f.kind == *kind).count();
                prop_assert_eq!(present, usize::from(mask & (1 << bit) != 0));
            }

            let first = triage.select_principal(&findings).map(|f| f.kind);
            let second = triage.select_principal(&findings).map(|f| f.kind);
            prop_assert_eq!(first, second);
        }
    }
}
