//! Core values library used to annotate rankings.

const CORE_VALUES_LIBRARY: &[(&str, &str)] = &[
    ("autonomy", "The freedom to make your own choices and live life on your terms"),
    ("creativity", "The drive to express yourself and create something new and original"),
    ("security", "The need for stability, predictability, and safety in your life"),
    ("adventure", "The desire for new experiences, excitement, and exploration"),
    ("authenticity", "Being true to yourself and living according to your genuine nature"),
    ("compassion", "Deep care for others' wellbeing and desire to alleviate suffering"),
    ("justice", "The drive to ensure fairness and fight against inequality"),
    ("growth", "Continuous learning, improvement, and personal development"),
    ("community", "Strong connection and belonging with others who share your values"),
    ("integrity", "Living in alignment with your moral principles and being honest"),
    ("excellence", "The pursuit of high quality and doing your best in everything"),
    ("balance", "Harmony between different aspects of life and avoiding extremes"),
    ("courage", "The strength to face challenges and stand up for what's right"),
    ("wisdom", "The pursuit of deep understanding and sound judgment"),
    ("impact", "Making a meaningful difference in the world around you"),
];

/// Used for tags the library does not cover.
pub const GENERIC_DEFINITION: &str = "Core personal value";

/// Library definition for `value`, if any.
pub fn definition(value: &str) -> Option<&'static str> {
    CORE_VALUES_LIBRARY
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, def)| *def)
}

/// Library definition, or the generic fallback.
pub fn definition_or_generic(value: &str) -> &'static str {
    definition(value).unwrap_or(GENERIC_DEFINITION)
}

/// Title-case a snake_case value name (`self_worth` -> `Self Worth`).
pub fn display_name(value: &str) -> String {
    value
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
