use std::fmt;

/// Label attached to the persuasive content a participant was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Condition {
    Hum,
    Llm,
    NoLabel,
}

impl Condition {
    /// Plotting order.
    pub const DISPLAY_ORDER: [Condition; 3] = [Condition::Llm, Condition::Hum, Condition::NoLabel];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "LLM" => Some(Self::Llm),
            "HUM" => Some(Self::Hum),
            "NONE" => Some(Self::NoLabel),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Llm => "LLM",
            Self::Hum => "HUM",
            Self::NoLabel => "NONE",
        }
    }

    /// Answer that counts as a correct perception of this condition. The
    /// unlabeled control has none.
    pub fn expected_perception(&self) -> Option<PerceivedLabel> {
        match self {
            Self::Hum => Some(PerceivedLabel::DefinitelyHuman),
            Self::Llm => Some(PerceivedLabel::DefinitelyAi),
            Self::NoLabel => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One of the four policy statements, numbered 1-4 as in the survey export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(u8);

impl Topic {
    pub const COUNT: usize = 4;

    pub const ALL: [Topic; Topic::COUNT] = [Topic(1), Topic(2), Topic(3), Topic(4)];

    pub fn new(number: u8) -> Option<Self> {
        if (1..=Self::COUNT as u8).contains(&number) {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Accepts integer cells as well as integral floats such as `3.0`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(number) = value.parse::<u8>() {
            return Self::new(number);
        }
        let number = value.parse::<f64>().ok()?;
        if number.fract() != 0.0 || number < 1.0 || number > Self::COUNT as f64 {
            return None;
        }
        Self::new(number as u8)
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    /// Zero-based position of this topic's response block.
    pub fn index(&self) -> usize {
        usize::from(self.0) - 1
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            1 => "Geoengineering",
            2 => "Drug Importation",
            3 => "College Athlete Salaries",
            _ => "Social Media Platform Liability",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Answer to "was this text written by a human or an AI?" (`LLM_HUMAN_2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerceivedLabel {
    DefinitelyHuman,
    PossiblyHuman,
    NotSure,
    PossiblyAi,
    DefinitelyAi,
}

impl PerceivedLabel {
    pub const ALL: [PerceivedLabel; 5] = [
        Self::DefinitelyHuman,
        Self::PossiblyHuman,
        Self::NotSure,
        Self::PossiblyAi,
        Self::DefinitelyAi,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|label| label.text() == value)
    }

    /// Answer text as exported by the survey platform.
    pub fn text(&self) -> &'static str {
        match self {
            Self::DefinitelyHuman => "Definitely human-written",
            Self::PossiblyHuman => "Possibly human-written",
            Self::NotSure => "Not sure",
            Self::PossiblyAi => "Possibly AI-generated",
            Self::DefinitelyAi => "Definitely AI-generated",
        }
    }

    pub fn ordinal(&self) -> u8 {
        match self {
            Self::DefinitelyHuman => 1,
            Self::PossiblyHuman => 2,
            Self::NotSure => 3,
            Self::PossiblyAi => 4,
            Self::DefinitelyAi => 5,
        }
    }

    /// Ordinal as a cell value; unrecognised answers are passed through.
    pub fn recode(value: &str) -> String {
        match Self::parse(value) {
            Some(label) => label.ordinal().to_string(),
            None => value.to_string(),
        }
    }
}
