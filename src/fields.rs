use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The abstract content slots a page is generated from. The four picture
/// fields share one spreadsheet prompt row under the sentinel name
/// `pictures`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldId {
    Title,
    Intro,
    Pic1,
    Pic2,
    Pic3,
    Pic4,
    Subtopics,
    Cost,
    Why,
    Faq,
}

pub const PICTURE_FIELDS: [FieldId; 4] =
    [FieldId::Pic1, FieldId::Pic2, FieldId::Pic3, FieldId::Pic4];

impl FieldId {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Title => "title",
            FieldId::Intro => "intro",
            FieldId::Pic1 => "pic1",
            FieldId::Pic2 => "pic2",
            FieldId::Pic3 => "pic3",
            FieldId::Pic4 => "pic4",
            FieldId::Subtopics => "subtopics",
            FieldId::Cost => "cost",
            FieldId::Why => "why",
            FieldId::Faq => "faq",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldId::Title => "Title",
            FieldId::Intro => "Introduction",
            FieldId::Pic1 => "Picture 1",
            FieldId::Pic2 => "Picture 2",
            FieldId::Pic3 => "Picture 3",
            FieldId::Pic4 => "Picture 4",
            FieldId::Subtopics => "Subtopics",
            FieldId::Cost => "Cost",
            FieldId::Why => "Why Choose Us",
            FieldId::Faq => "FAQ",
        }
    }

    /// The name the prompt sheet's key column uses for this field. All four
    /// picture fields resolve through the shared `pictures` row.
    pub fn sheet_name(&self) -> &'static str {
        if self.is_picture() {
            "pictures"
        } else {
            self.as_str()
        }
    }

    pub fn is_picture(&self) -> bool {
        matches!(
            self,
            FieldId::Pic1 | FieldId::Pic2 | FieldId::Pic3 | FieldId::Pic4
        )
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(FieldId::Title),
            "intro" => Ok(FieldId::Intro),
            "pic1" => Ok(FieldId::Pic1),
            "pic2" => Ok(FieldId::Pic2),
            "pic3" => Ok(FieldId::Pic3),
            "pic4" => Ok(FieldId::Pic4),
            "subtopics" => Ok(FieldId::Subtopics),
            "cost" => Ok(FieldId::Cost),
            "why" => Ok(FieldId::Why),
            "faq" => Ok(FieldId::Faq),
            other => Err(format!("unknown field \"{other}\"")),
        }
    }
}

/// The two content-generation modes a keyword can classify into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flow {
    #[serde(rename = "with subtopics")]
    WithSubtopics,
    #[serde(rename = "no subtopics")]
    NoSubtopics,
}

const SUBTOPIC_FLOW_FIELDS: [FieldId; 10] = [
    FieldId::Title,
    FieldId::Intro,
    FieldId::Subtopics,
    FieldId::Pic1,
    FieldId::Pic2,
    FieldId::Pic3,
    FieldId::Pic4,
    FieldId::Cost,
    FieldId::Why,
    FieldId::Faq,
];

const FLAT_FLOW_FIELDS: [FieldId; 9] = [
    FieldId::Title,
    FieldId::Intro,
    FieldId::Pic1,
    FieldId::Pic2,
    FieldId::Pic3,
    FieldId::Pic4,
    FieldId::Cost,
    FieldId::Why,
    FieldId::Faq,
];

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::WithSubtopics => "with subtopics",
            Flow::NoSubtopics => "no subtopics",
        }
    }

    /// The ordered field list generated for this flow. The flat flow has no
    /// subtopics field.
    pub fn fields(&self) -> &'static [FieldId] {
        match self {
            Flow::WithSubtopics => &SUBTOPIC_FLOW_FIELDS,
            Flow::NoSubtopics => &FLAT_FLOW_FIELDS,
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
