text_enum! {
    /// Kinds of care a job can ask for. `General` is the catch-all.
    pub enum CareType {
        ElderlyCare => "elderly_care",
        PostOperative => "post_operative",
        Pediatric => "pediatric",
        Palliative => "palliative",
        DementiaCare => "dementia_care",
        DisabilitySupport => "disability_support",
        General => "general",
    }
}

impl CareType {
    /// Lenient lookup for labels coming from job postings. Unknown labels map
    /// to `General` so that missing metadata never blocks a hire.
    pub fn from_label(label: &str) -> CareType {
        let normalized: String = label
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "elderly" | "senior_care" => CareType::ElderlyCare,
            "post_surgical" | "post_op" => CareType::PostOperative,
            "paediatric" | "child_care" => CareType::Pediatric,
            "hospice" | "end_of_life" => CareType::Palliative,
            "memory_care" | "dementia" => CareType::DementiaCare,
            "disability" => CareType::DisabilitySupport,
            other => other.parse().unwrap_or(CareType::General),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CareType;

    #[test]
    fn labels_are_normalized() {
        assert_eq!(CareType::from_label("Elderly Care"), CareType::ElderlyCare);
        assert_eq!(CareType::from_label("post-surgical"), CareType::PostOperative);
        assert_eq!(CareType::from_label(" hospice "), CareType::Palliative);
        assert_eq!(CareType::from_label("pediatric"), CareType::Pediatric);
    }

    #[test]
    fn unknown_labels_fall_back_to_general() {
        assert_eq!(CareType::from_label("equine therapy"), CareType::General);
        assert_eq!(CareType::from_label(""), CareType::General);
    }
}
