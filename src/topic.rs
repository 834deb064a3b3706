use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::Example;

/// Classification label for grouping examples by detected language feature.
/// Purely derived, never stored on the `Example` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Topic {
    Arrays,
    Strings,
    Loops,
    #[strum(serialize = "Control Flow")]
    ControlFlow,
    #[strum(serialize = "Classes & Objects")]
    ClassesAndObjects,
    Constructors,
    Inheritance,
    Polymorphism,
    Interfaces,
    #[strum(serialize = "Abstract Classes")]
    AbstractClasses,
    Exceptions,
    Collections,
    Generics,
    #[strum(serialize = "File I/O")]
    FileIo,
    Threads,
    #[strum(serialize = "Math & Utils")]
    MathAndUtils,
    Variables,
    Methods,
    Basics,
}

impl Topic {
    pub const ALL: [Topic; 19] = [
        Topic::Arrays,
        Topic::Strings,
        Topic::Loops,
        Topic::ControlFlow,
        Topic::ClassesAndObjects,
        Topic::Constructors,
        Topic::Inheritance,
        Topic::Polymorphism,
        Topic::Interfaces,
        Topic::AbstractClasses,
        Topic::Exceptions,
        Topic::Collections,
        Topic::Generics,
        Topic::FileIo,
        Topic::Threads,
        Topic::MathAndUtils,
        Topic::Variables,
        Topic::Methods,
        Topic::Basics,
    ];

    /// Case-insensitive lookup by display name, for the `--topic` flag.
    pub fn parse(s: &str) -> Option<Topic> {
        Topic::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
    }
}

// First-match-wins, specificity before generality. The order is load-bearing:
// reordering changes classification outcomes (a loop over an array is Arrays,
// not Loops). Patterns are written for lower-cased input.
static RULES: Lazy<Vec<(Topic, Regex)>> = Lazy::new(|| {
    [
        (Topic::Arrays, r"\b(array|int\[\]|new\s+int\[\])"),
        (
            Topic::Strings,
            r"\b(string|char\[\]|substring|equals|compareto|builder|buffer)",
        ),
        (Topic::Loops, r"\b(for\s*\(|while\s*\(|do\s*\{)"),
        (Topic::ControlFlow, r"\b(if\s*\(|switch\s*\()|case\s+|default\s*:"),
        (Topic::ClassesAndObjects, r"\b(public|private|protected)\s+class\b"),
        (Topic::Constructors, r"\bconstructor|this\s*\(|super\s*\("),
        (Topic::Inheritance, r"\bextends\b"),
        (
            Topic::Polymorphism,
            r"\boverride|@override|dynamic\s+dispatch|polymorphism",
        ),
        (Topic::Interfaces, r"\binterface\b"),
        (Topic::AbstractClasses, r"\babstract\s+class\b"),
        (
            Topic::Exceptions,
            r"\btry\s*\{|catch\s*\(|finally\b|throw\s+new\b|exception",
        ),
        (
            Topic::Collections,
            r"\b(list|arraylist|map|hashmap|set|hashset|iterator|collections)\b",
        ),
        (Topic::Generics, r"\b<\s*[a-z_]\w*\s*>\b"),
        (
            Topic::FileIo,
            r"\bfile|filereader|filewriter|buffered(reader|writer)|scanner\b",
        ),
        (
            Topic::Threads,
            r"\bthread|runnable|synchronized|wait\(|notify\(|notifyall\(",
        ),
        (Topic::MathAndUtils, r"\b(math|random|scanner)\b"),
        (
            Topic::Variables,
            r"\b(int|double|float|boolean|char|long|short|byte)\b",
        ),
        (Topic::Methods, r"\bmethod|void\s+[a-z_]\w*\(|return\b"),
    ]
    .into_iter()
    .map(|(topic, pat)| (topic, Regex::new(pat).unwrap()))
    .collect()
});

/// Maps an example to exactly one topic, checking each rule against the
/// lower-cased code body and the lower-cased title+filename.
pub fn derive_topic(example: &Example) -> Topic {
    let meta = format!("{} {}", example.title, example.filename).to_lowercase();
    let code = example.code.to_lowercase();

    for (topic, re) in RULES.iter() {
        if re.is_match(&code) || re.is_match(&meta) {
            return *topic;
        }
    }
    Topic::Basics
}
