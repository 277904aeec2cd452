//! Classifier kinds: label sets, prompts and answer normalization.

use lessonlens_core::{BatchItem, Error, Label};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const EDUCATIONAL_LEVELS: &[&str] = &["Grundschule", "Sek. I", "Sek. II", "Higher Education"];

pub const RESOURCE_TYPES: &[&str] = &[
    "course",
    "tutorial",
    "lecture_notes",
    "textbook",
    "practice_problems",
    "quiz",
    "video",
    "podcast",
    "software",
    "image",
    "simulation",
    "lesson_plan",
    "presentation",
    "professional_development",
    "interactive_tool",
    "reference_material",
    "lab_exercise",
    "assessment",
    "worksheet",
    "study_guide",
];

pub const SUBJECTS: &[&str] = &[
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "Computer Science",
    "German",
    "English",
    "Foreign Languages",
    "History",
    "Geography",
    "Social Studies",
    "Economics",
    "Art",
    "Music",
    "Physical Education",
    "Religion and Ethics",
];

pub const EDUCATIONAL_ROLES: &[&str] = &[
    "student",
    "teacher",
    "administrator",
    "mentor",
    "instructional_designer",
    "parent_guardian",
    "researcher",
    "support_staff",
];

/// Educational uses with what each one covers.
pub const EDUCATIONAL_USES: &[(&str, &str)] = &[
    ("assessment", "tests, quizzes and evaluation"),
    ("practice", "reinforcing skills through repetition: exercises, drills, worksheets"),
    ("tutorial", "direct instruction and guided learning: lessons, walkthroughs, demonstrations"),
    ("research", "investigation and inquiry-based learning"),
    ("discussion", "dialogue and critical thinking: debate topics, discussion prompts"),
    ("case_study", "analyzing real-world examples"),
    ("laboratory", "hands-on experimentation"),
    ("presentation", "presenting information: slides, visual aids"),
    ("reference", "looking up information: glossaries, reference material"),
    ("simulation", "practicing in simulated environments: virtual labs, role play"),
    ("collaborative", "group learning activities"),
    ("flipped_learning", "self-paced pre-class preparation"),
];

static EDUCATIONAL_USE_LABELS: LazyLock<Vec<&'static str>> =
    LazyLock::new(|| EDUCATIONAL_USES.iter().map(|(name, _)| *name).collect());

/// What a classifier is asked to decide about a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    EducationalLevel,
    ResourceType,
    Subject,
    EducationalRole,
    EducationalUse,
    /// Free text: what a learner is assessed on.
    Assesses,
    /// Free text: what a learner acquires.
    Teaches,
    /// Free-text summary for an information need; requires a facet.
    Snippet,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 8] = [
        ClassifierKind::EducationalLevel,
        ClassifierKind::ResourceType,
        ClassifierKind::Subject,
        ClassifierKind::EducationalRole,
        ClassifierKind::EducationalUse,
        ClassifierKind::Assesses,
        ClassifierKind::Teaches,
        ClassifierKind::Snippet,
    ];

    /// Content type tag used in cache keys.
    pub fn tag(self) -> &'static str {
        match self {
            ClassifierKind::EducationalLevel => "educational_level",
            ClassifierKind::ResourceType => "resource_type",
            ClassifierKind::Subject => "subject",
            ClassifierKind::EducationalRole => "educational_role",
            ClassifierKind::EducationalUse => "educational_use",
            ClassifierKind::Assesses => "assesses",
            ClassifierKind::Teaches => "teaches",
            ClassifierKind::Snippet => "snippet",
        }
    }

    /// Allowed labels, `None` for free text.
    pub fn labels(self) -> Option<&'static [&'static str]> {
        match self {
            ClassifierKind::EducationalLevel => Some(EDUCATIONAL_LEVELS),
            ClassifierKind::ResourceType => Some(RESOURCE_TYPES),
            ClassifierKind::Subject => Some(SUBJECTS),
            ClassifierKind::EducationalRole => Some(EDUCATIONAL_ROLES),
            ClassifierKind::EducationalUse => Some(EDUCATIONAL_USE_LABELS.as_slice()),
            ClassifierKind::Assesses | ClassifierKind::Teaches | ClassifierKind::Snippet => None,
        }
    }

    pub fn requires_facet(self) -> bool {
        matches!(self, ClassifierKind::Snippet)
    }

    fn instructions(self) -> String {
        let mut text = self.persona().to_string();
        if self == ClassifierKind::EducationalUse {
            for (name, covers) in EDUCATIONAL_USES {
                text.push_str(&format!("\n- {name}: {covers}"));
            }
        }
        text
    }

    fn persona(self) -> &'static str {
        match self {
            ClassifierKind::EducationalLevel => {
                "You are an experienced curriculum specialist. For each document below, determine ALL \
                 educational levels at which the content could be used effectively. Consider vocabulary \
                 complexity, concept difficulty and required background knowledge."
            }
            ClassifierKind::ResourceType => {
                "You are an experienced educational content curator. For each document below, identify ALL \
                 resource types that fit its format, structure and purpose."
            }
            ClassifierKind::Subject => {
                "You are an experienced teacher. For each document below, identify the school subjects \
                 the content belongs to."
            }
            ClassifierKind::EducationalRole => {
                "You are an experienced instructional designer. For each document below, identify ALL \
                 audiences the content is written for."
            }
            ClassifierKind::EducationalUse => {
                "You are an experienced instructional designer. For each document below, identify ALL \
                 educational uses it supports. The uses are:"
            }
            ClassifierKind::Assesses => {
                "You are an experienced assessment designer. For each document below, state in one short \
                 phrase which skills or knowledge a learner is assessed on when working with it."
            }
            ClassifierKind::Teaches => {
                "You are an experienced teacher. For each document below, state in one short phrase which \
                 skills or knowledge a learner acquires from it."
            }
            ClassifierKind::Snippet => {
                "You help a teacher who is searching for teaching material. For each document below, answer \
                 the teacher's information need from the document content. Summarize the answer in at most \
                 two sentences and highlight the parts that matter most to the teacher with simple HTML tags \
                 (<b>, <u>, <i>)."
            }
        }
    }

    fn answer_format(self) -> String {
        match self.labels() {
            Some(labels) => format!(
                "Allowed labels: {}.\n\nRespond only with a JSON object whose keys are exactly the document URLs \
                 above and whose values are lists of allowed labels. Use \"unsure\" for a document whose content \
                 does not allow a decision.",
                labels.join(", ")
            ),
            None if self == ClassifierKind::Snippet => {
                "Respond only with a JSON object whose keys are exactly the document URLs above and whose \
                 values are the summaries as strings. Use \"unsure\" for a document that does not address \
                 the information need."
                    .to_string()
            }
            None => "Respond only with a JSON object whose keys are exactly the document URLs above and whose \
                     values are the phrases as strings. Use \"unsure\" for a document whose content does not \
                     allow a decision."
                .to_string(),
        }
    }

    /// One prompt covering every item of a batch.
    pub fn build_prompt(self, items: &[BatchItem], facet: Option<&str>) -> String {
        let mut prompt = self.instructions();
        prompt.push_str("\n\n");

        if let Some(facet) = facet {
            prompt.push_str("Information need:\n");
            prompt.push_str(facet);
            prompt.push_str("\n\n");
        }

        for item in items {
            prompt.push_str("URL: ");
            prompt.push_str(&item.url);
            prompt.push_str("\nContent:\n\"\"\"\n");
            prompt.push_str(&item.content);
            prompt.push_str("\n\"\"\"\n\n");
        }

        prompt.push_str(&self.answer_format());
        prompt
    }

    /// Normalize a raw per-document answer into a label.
    ///
    /// Label set kinds keep only canonical labels, matched case-insensitively
    /// with spaces, hyphens and underscores treated alike.
    pub fn normalize(self, response: &Value) -> Label {
        let label = Label::from_response(response);
        let Some(allowed) = self.labels() else {
            return label;
        };

        let mut kept: Vec<String> = Vec::new();
        for value in label.into_values() {
            let folded = fold(&value);
            match allowed.iter().find(|candidate| fold(candidate) == folded) {
                Some(canonical) if !kept.iter().any(|k| k == canonical) => kept.push((*canonical).to_string()),
                Some(_) => {}
                None => tracing::debug!(kind = self.tag(), label = %value, "dropping unknown label"),
            }
        }

        match kept.len() {
            0 => Label::Unsure,
            1 => Label::Single(kept.remove(0)),
            _ => Label::Multiple(kept),
        }
    }
}

fn fold(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ClassifierKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "educational_level" => Ok(ClassifierKind::EducationalLevel),
            "resource_type" => Ok(ClassifierKind::ResourceType),
            "subject" => Ok(ClassifierKind::Subject),
            "educational_role" => Ok(ClassifierKind::EducationalRole),
            "educational_use" => Ok(ClassifierKind::EducationalUse),
            "assesses" => Ok(ClassifierKind::Assesses),
            "teaches" => Ok(ClassifierKind::Teaches),
            "snippet" => Ok(ClassifierKind::Snippet),
            other => Err(Error::InvalidInput(format!("unknown classifier kind: {other}"))),
        }
    }
}
